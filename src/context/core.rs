use http::Method;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, warn};

use super::response::ResponseWriter;
use crate::binding::{self, BindError, FormRecord, FormValues};
use crate::middleware::HandlerRef;
use crate::router::Params;
use crate::server::ParsedRequest;
use crate::templates::{ResponsePayload, Templates};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const MIME_PLAIN: &str = "text/plain";
pub const MIME_JSON: &str = "application/json; charset=UTF-8";
pub const MIME_HTML: &str = "text/html; charset=utf-8";
pub const MIME_TEMPLATE: &str = "text/html; charset=UTF-8";

/// Prepended to every `html` response body.
const HTML_CHARSET_META: &str = "<meta charset='utf-8'>";

/// Per-request state threaded through the handler chain.
///
/// A context is created for one request, driven through its handler chain
/// with [`advance`](Context::advance), then consumed to produce the
/// response. It is never shared between requests.
pub struct Context {
    request: ParsedRequest,
    params: Params,
    request_id: String,
    handlers: Vec<HandlerRef>,
    /// Index of the handler currently running; `None` before the first
    cursor: Option<usize>,
    writer: ResponseWriter,
}

impl Context {
    pub fn new(request: ParsedRequest) -> Self {
        let request_id = request
            .headers
            .get("x-request-id")
            .and_then(|v| ulid::Ulid::from_string(v).ok())
            .unwrap_or_else(ulid::Ulid::new)
            .to_string();
        Self {
            request,
            params: Params::new(),
            request_id,
            handlers: Vec::new(),
            cursor: None,
            writer: ResponseWriter::new(),
        }
    }

    /// Install the handler chain and rewind the cursor.
    pub fn set_handlers(&mut self, handlers: Vec<HandlerRef>) {
        self.handlers = handlers;
        self.cursor = None;
    }

    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Run the next handler in the chain.
    ///
    /// Moves the cursor forward one slot and invokes that handler, if there
    /// is one. Control comes back here once that handler returns, which
    /// includes everything it advanced into. A handler that returns without
    /// calling `advance` therefore ends the chain.
    pub fn advance(&mut self) {
        let next = self.cursor.map_or(0, |i| i + 1);
        self.cursor = Some(next);
        if let Some(handler) = self.handlers.get(next).cloned() {
            handler.call(self);
        }
    }

    /// Position of the running handler, `None` before the chain starts.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    // ----- request ---------------------------------------------------------

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.request.method
    }

    /// Request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.request.path
    }

    /// Request target as received.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.request.uri
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Path parameter captured by the route, empty when absent.
    #[must_use]
    pub fn param(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or("")
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// First query string value for `key`, empty when absent.
    #[must_use]
    pub fn query(&self, key: &str) -> &str {
        first(&self.request.query, key)
    }

    /// First form value for `key`.
    ///
    /// Body values win over query values, as in a classic form post; empty
    /// when neither has the key.
    #[must_use]
    pub fn post_form(&self, key: &str) -> &str {
        match self.request.form.get(key).and_then(|v| v.first()) {
            Some(value) => value.as_str(),
            None => self.query(key),
        }
    }

    /// Request header, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.request.body
    }

    /// Body values merged over query values.
    #[must_use]
    pub fn form_values(&self) -> FormValues {
        let mut values = self.request.query.clone();
        for (k, v) in &self.request.form {
            values.insert(k.clone(), v.clone());
        }
        values
    }

    /// First value of every form key.
    #[must_use]
    pub fn form_map(&self) -> HashMap<String, String> {
        binding::first_values(&self.form_values())
    }

    /// Decode the submitted form into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when a value does not convert; the handler
    /// chooses the response.
    pub fn bind_form<T: FormRecord>(&self) -> Result<T, BindError> {
        binding::decode(&self.form_values())
    }

    // ----- response --------------------------------------------------------

    /// Commit the status code.
    pub fn status(&mut self, code: u16) {
        self.writer.write_header(code);
    }

    /// Status that will be sent.
    ///
    /// `200` when nothing has been written yet, since that is what goes on
    /// the wire. Use [`written_status`](Self::written_status) to tell the two
    /// apart.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.writer.status()
    }

    /// Status committed by the chain, `None` while nothing was written.
    #[must_use]
    pub fn written_status(&self) -> Option<u16> {
        self.writer.header_sent().then(|| self.writer.status())
    }

    /// Add a response header.
    ///
    /// Header lines outside a small set of common content types are interned
    /// for the life of the process, and at most 4096 distinct ones are kept.
    /// Once that table is full, new lines are dropped with a warning. Values
    /// that differ per request, such as session cookies, should not go
    /// through here on a long-running server.
    pub fn set_header(&mut self, key: &str, value: &str) {
        self.writer.set_header(key, value);
    }

    /// Plain-text response.
    pub fn string(&mut self, code: u16, body: impl AsRef<str>) {
        self.set_header(CONTENT_TYPE, MIME_PLAIN);
        self.status(code);
        self.writer.write(body.as_ref().as_bytes());
    }

    /// Plain-text error response.
    pub fn fail(&mut self, code: u16, message: impl AsRef<str>) {
        self.string(code, message);
    }

    /// JSON response, newline-terminated.
    ///
    /// Serialization happens before anything is committed; if it fails the
    /// response becomes a plain-text 500 instead.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: u16, value: &T) {
        match serde_json::to_vec(value) {
            Ok(mut bytes) => {
                bytes.push(b'\n');
                self.set_header(CONTENT_TYPE, MIME_JSON);
                self.status(code);
                self.writer.write(&bytes);
            }
            Err(err) => {
                error!(error = %err, path = %self.path(), "JSON serialization failed");
                self.string(500, err.to_string());
            }
        }
    }

    /// Raw bytes; the content type is left to the caller.
    pub fn data(&mut self, code: u16, bytes: &[u8]) {
        self.status(code);
        self.writer.write(bytes);
    }

    /// HTML response with a charset declaration in front of `html`.
    pub fn html(&mut self, code: u16, html: impl AsRef<str>) {
        self.set_header(CONTENT_TYPE, MIME_HTML);
        self.status(code);
        self.writer.write(HTML_CHARSET_META.as_bytes());
        self.writer.write(html.as_ref().as_bytes());
    }

    /// Render `filename` and send it as a `200` HTML response.
    ///
    /// # Panics
    ///
    /// Panics when the template cannot be loaded or rendered. A broken
    /// template is a deployment defect; the recovery boundary turns the
    /// panic into a 500 and logs it.
    #[allow(clippy::panic)]
    pub fn write_template(&mut self, templates: &Templates, filename: &str, payload: &ResponsePayload) {
        match templates.render(filename, payload) {
            Ok(bytes) => {
                self.set_header(CONTENT_TYPE, MIME_TEMPLATE);
                self.status(200);
                self.writer.write(&bytes);
            }
            Err(err) => {
                warn!(template = %filename, error = %err, "Template render failed");
                panic!("template {filename} failed: {err}");
            }
        }
    }

    #[must_use]
    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    /// Finish the request and hand back the buffered response.
    #[must_use]
    pub fn into_response(self) -> ResponseWriter {
        self.writer
    }
}

fn first<'a>(values: &'a FormValues, key: &str) -> &'a str {
    values
        .get(key)
        .and_then(|v| v.first())
        .map(String::as_str)
        .unwrap_or("")
}
