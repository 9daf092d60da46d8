use tracing::warn;

/// Buffered response for a single request.
///
/// Mirrors the usual writer rules: headers may change until the status line
/// is committed, the first body write commits a `200` if no status was set,
/// and a second status is ignored. The buffer is handed to the transport
/// once the pipeline finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseWriter {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    header_sent: bool,
}

impl ResponseWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            header_sent: false,
        }
    }

    /// Set a header, replacing any earlier value for the same name.
    ///
    /// Names compare case-insensitively. Ignored once the status is sent.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if self.header_sent {
            warn!(header = %name, "Header set after status was written, ignored");
            return;
        }
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Commit the status line.
    pub fn write_header(&mut self, status: u16) {
        if self.header_sent {
            warn!(
                status = self.status,
                ignored = status,
                "Superfluous status write ignored"
            );
            return;
        }
        self.status = status;
        self.header_sent = true;
    }

    /// Append body bytes, committing `200` first if nothing was committed.
    pub fn write(&mut self, bytes: &[u8]) {
        if !self.header_sent {
            self.write_header(200);
        }
        self.body.extend_from_slice(bytes);
    }

    /// Drop everything written so far.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn header_sent(&self) -> bool {
        self.header_sent
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossily.
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Split into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (u16, Vec<(String, String)>, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_commits_ok() {
        let mut w = ResponseWriter::new();
        w.write(b"hi");
        assert!(w.header_sent());
        assert_eq!(w.status(), 200);
        assert_eq!(w.body(), b"hi");
    }

    #[test]
    fn test_second_status_ignored() {
        let mut w = ResponseWriter::new();
        w.write_header(201);
        w.write_header(500);
        assert_eq!(w.status(), 201);
    }

    #[test]
    fn test_header_replace_case_insensitive() {
        let mut w = ResponseWriter::new();
        w.set_header("Content-Type", "text/plain");
        w.set_header("content-type", "application/json");
        assert_eq!(w.headers().len(), 1);
        assert_eq!(w.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_header_after_commit_ignored() {
        let mut w = ResponseWriter::new();
        w.write_header(204);
        w.set_header("X-Late", "1");
        assert_eq!(w.header("X-Late"), None);
    }

    #[test]
    fn test_reset() {
        let mut w = ResponseWriter::new();
        w.set_header("X-A", "1");
        w.write_header(418);
        w.write(b"teapot");
        w.reset();
        assert_eq!(w, ResponseWriter::new());
    }
}
