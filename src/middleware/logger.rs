use std::time::Instant;
use tracing::{debug, info_span};

use super::Handler;
use crate::context::Context;

/// Logs status, URI and latency of every request it wraps.
///
/// Runs the rest of the chain first, so the logged status is the final one.
/// A chain that wrote nothing is logged with status `0`.
pub struct Logger;

impl Handler for Logger {
    fn call(&self, ctx: &mut Context) {
        let span = info_span!(
            "request",
            method = %ctx.method(),
            path = %ctx.path(),
            request_id = %ctx.request_id()
        );
        let _enter = span.enter();

        let start = Instant::now();
        ctx.advance();
        let elapsed = start.elapsed();
        let status = ctx.written_status().unwrap_or(0);

        debug!(
            status = status,
            uri = %ctx.uri(),
            latency_us = elapsed.as_micros() as u64,
            "[{}] {} in {:?}",
            status,
            ctx.uri(),
            elapsed
        );
    }
}
