use may_minihttp::Response;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};
use tracing::warn;

use crate::context::ResponseWriter;

/// Upper bound on distinct dynamic header lines kept for the process.
const MAX_INTERNED_HEADERS: usize = 4096;

pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Header lines the pipeline emits routinely, served without allocation.
fn known_header(line: &str) -> Option<&'static str> {
    const KNOWN: &[&str] = &[
        "Content-Type: text/plain",
        "Content-Type: application/json; charset=UTF-8",
        "Content-Type: text/html; charset=utf-8",
        "Content-Type: text/html; charset=UTF-8",
        "Content-Type: application/json",
        "Content-Type: text/css",
        "Content-Type: application/javascript",
        "Content-Type: application/octet-stream",
        "Content-Type: image/svg+xml",
        "Content-Type: image/png",
        "Content-Type: image/jpeg",
        "Content-Type: image/gif",
        "Content-Type: image/x-icon",
    ];
    KNOWN.iter().copied().find(|k| *k == line)
}

/// Leaked header lines, reused by text.
///
/// `may_minihttp` only accepts `'static` header lines. Each distinct line is
/// leaked once and kept for the life of the process, up to `cap` entries;
/// past that, new lines are refused.
struct HeaderTable {
    lines: HashSet<&'static str>,
    cap: usize,
}

impl HeaderTable {
    fn new(cap: usize) -> Self {
        Self {
            lines: HashSet::new(),
            cap,
        }
    }

    fn intern(&mut self, line: String) -> Option<&'static str> {
        if let Some(existing) = self.lines.get(line.as_str()) {
            return Some(*existing);
        }
        if self.lines.len() >= self.cap {
            return None;
        }
        let leaked: &'static str = Box::leak(line.into_boxed_str());
        self.lines.insert(leaked);
        Some(leaked)
    }
}

fn intern_header(line: String) -> Option<&'static str> {
    if let Some(known) = known_header(&line) {
        return Some(known);
    }
    static INTERNED: OnceLock<Mutex<HeaderTable>> = OnceLock::new();
    INTERNED
        .get_or_init(|| Mutex::new(HeaderTable::new(MAX_INTERNED_HEADERS)))
        .lock()
        .ok()?
        .intern(line)
}

/// Copy a buffered response onto the wire.
pub fn write_response(res: &mut Response, writer: ResponseWriter) {
    let (status, headers, body) = writer.into_parts();
    res.status_code(status as usize, status_reason(status));
    for (name, value) in headers {
        match intern_header(format!("{name}: {value}")) {
            Some(line) => {
                res.header(line);
            }
            None => warn!(
                header = %name,
                limit = MAX_INTERNED_HEADERS,
                "Dropping response header, intern table full"
            ),
        }
    }
    res.body_vec(body);
}

/// Basic health check body, `{"status":"ok"}`.
pub fn health_endpoint(res: &mut Response) {
    res.status_code(200, "OK");
    res.header("Content-Type: application/json");
    res.body_vec(br#"{"status":"ok"}"#.to_vec());
}

/// Plain-text error written straight to the wire.
pub fn write_plain_error(res: &mut Response, status: u16, message: &str) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: text/plain");
    res.body_vec(message.as_bytes().to_vec());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(500), "Internal Server Error");
    }

    #[test]
    fn test_known_headers_are_not_leaked() {
        let line = intern_header("Content-Type: text/plain".to_string()).unwrap();
        assert!(std::ptr::eq(line, known_header("Content-Type: text/plain").unwrap()));
    }

    #[test]
    fn test_dynamic_header_is_reused() {
        let a = intern_header("X-Trace: abc".to_string()).unwrap();
        let b = intern_header("X-Trace: abc".to_string()).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_full_table_refuses_new_lines_but_keeps_old() {
        let mut table = HeaderTable::new(2);
        let a = table.intern("X-A: 1".to_string()).unwrap();
        assert!(table.intern("X-B: 2".to_string()).is_some());
        assert_eq!(table.intern("X-C: 3".to_string()), None);
        assert!(std::ptr::eq(a, table.intern("X-A: 1".to_string()).unwrap()));
    }
}
