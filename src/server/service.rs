use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::request::{parse_request, ParsedRequest};
use super::response::{health_endpoint, write_plain_error, write_response};
use crate::context::ResponseWriter;
use crate::engine::Engine;
use crate::middleware::{panic_message, INTERNAL_SERVER_ERROR};

pub const HEALTH_PATH: &str = "/health";

/// `may_minihttp` service driving an [`Engine`].
///
/// Cloned once per connection; the engine is shared read-only.
#[derive(Clone)]
pub struct AppService {
    pub engine: Arc<Engine>,
    /// Answer `GET /health` before routing
    pub health: bool,
}

impl AppService {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            health: false,
        }
    }

    #[must_use]
    pub fn with_health(mut self, enabled: bool) -> Self {
        self.health = enabled;
        self
    }
}

/// Run `request` through `engine`, converting a panic into a 500.
pub fn handle_request(engine: &Engine, request: ParsedRequest) -> ResponseWriter {
    let method = request.method.clone();
    let path = request.path.clone();
    match catch_unwind(AssertUnwindSafe(|| engine.handle_request(request))) {
        Ok(writer) => writer,
        Err(payload) => {
            error!(
                method = %method,
                path = %path,
                panic = %panic_message(payload.as_ref()),
                "Request handler panicked"
            );
            let mut writer = ResponseWriter::new();
            writer.set_header(crate::context::CONTENT_TYPE, crate::context::MIME_PLAIN);
            writer.write_header(500);
            writer.write(INTERNAL_SERVER_ERROR.as_bytes());
            writer
        }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let start = Instant::now();

        if self.health && req.method() == "GET" && req.path() == HEALTH_PATH {
            health_endpoint(res);
            return Ok(());
        }

        let parsed = match parse_request(req) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "Rejecting request with invalid method");
                write_plain_error(res, 400, "Bad Request");
                return Ok(());
            }
        };
        let method = parsed.method.clone();
        let path = parsed.path.clone();

        let writer = handle_request(&self.engine, parsed);
        let status = writer.status();
        write_response(res, writer);

        info!(
            method = %method,
            path = %path,
            status = status,
            duration_us = start.elapsed().as_micros() as u64,
            "Request complete"
        );
        Ok(())
    }
}
