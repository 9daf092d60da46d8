use crate::binding::FormValues;
use http::method::InvalidMethod;
use http::Method;
use may_minihttp::Request;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request data extracted from the wire, independent of the HTTP stack.
///
/// This is what a [`Context`](crate::context::Context) is built from, so
/// tests and benches can construct one without a socket.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub method: Method,
    /// Request target as received, query string included
    pub uri: String,
    /// Percent-decoded path component of `uri`
    pub path: String,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    /// Query string values
    pub query: FormValues,
    /// Url-encoded body values (empty for other content types)
    pub form: FormValues,
    pub body: Vec<u8>,
}

impl ParsedRequest {
    /// Request with no headers and no body.
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            path: decode_path(split_path(uri)),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            query: parse_query_params(uri),
            form: FormValues::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self.cookies = parse_cookies(&self.headers);
        self
    }

    /// Attach an url-encoded form body.
    #[must_use]
    pub fn with_form_body(mut self, body: &str) -> Self {
        self.headers
            .insert("content-type".to_string(), FORM_CONTENT_TYPE.to_string());
        self.body = body.as_bytes().to_vec();
        self.form = parse_form(&self.headers, &self.body);
        self
    }
}

fn split_path(uri: &str) -> &str {
    match uri.split('?').next() {
        Some(path) if !path.is_empty() => path,
        _ => "/",
    }
}

/// Percent-decode a request path. `+` stays literal; invalid UTF-8 is
/// replaced rather than rejected.
fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Parse the `Cookie` header into name/value pairs.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name.to_string(), value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the query string of `uri`, keeping repeated keys.
///
/// ```
/// use xia::server::parse_query_params;
///
/// let q = parse_query_params("/p?x=1&x=2&y=%20z");
/// assert_eq!(q["x"], vec!["1", "2"]);
/// assert_eq!(q["y"], vec![" z"]);
/// ```
pub fn parse_query_params(uri: &str) -> FormValues {
    match uri.split_once('?') {
        Some((_, query)) => collect_pairs(query.as_bytes()),
        None => FormValues::new(),
    }
}

/// Decode an url-encoded body; other content types yield no values.
pub fn parse_form(headers: &HashMap<String, String>, body: &[u8]) -> FormValues {
    let is_form = headers
        .get("content-type")
        .map(|ct| ct.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(false);
    if is_form && !body.is_empty() {
        collect_pairs(body)
    } else {
        FormValues::new()
    }
}

fn collect_pairs(input: &[u8]) -> FormValues {
    let mut values = FormValues::new();
    for (k, v) in url::form_urlencoded::parse(input) {
        values.entry(k.into_owned()).or_default().push(v.into_owned());
    }
    values
}

/// Extract everything the pipeline needs from a `may_minihttp::Request`.
///
/// # Errors
///
/// Returns [`InvalidMethod`] when the method token is not valid HTTP.
pub fn parse_request(req: Request) -> Result<ParsedRequest, InvalidMethod> {
    let method = Method::from_bytes(req.method().as_bytes())?;
    let uri = req.path().to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();
    debug!(
        header_count = headers.len(),
        header_names = ?headers.keys().take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );

    let cookies = parse_cookies(&headers);
    let query = parse_query_params(&uri);

    let mut body = Vec::new();
    if let Ok(size) = req.body().read_to_end(&mut body) {
        if size > 0 {
            debug!(
                content_length = size,
                content_type = headers.get("content-type").map(String::as_str).unwrap_or(""),
                "Request body read"
            );
        }
    }
    let form = parse_form(&headers, &body);

    let path = decode_path(split_path(&uri));
    info!(
        method = %method,
        path = %path,
        query_count = query.len(),
        form_count = form.len(),
        "HTTP request parsed"
    );

    Ok(ParsedRequest {
        method,
        uri,
        path,
        headers,
        cookies,
        query,
        form,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let mut h = HashMap::new();
        h.insert("cookie".to_string(), "a=b; c=d; ;e".to_string());
        let cookies = parse_cookies(&h);
        assert_eq!(cookies.get("a"), Some(&"b".to_string()));
        assert_eq!(cookies.get("c"), Some(&"d".to_string()));
        assert_eq!(cookies.get("e"), Some(&String::new()));
        assert_eq!(cookies.len(), 3);
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=2&x=3");
        assert_eq!(q.get("x"), Some(&vec!["1".to_string(), "3".to_string()]));
        assert_eq!(q.get("y"), Some(&vec!["2".to_string()]));
        assert!(parse_query_params("/p").is_empty());
    }

    #[test]
    fn test_form_needs_content_type() {
        let mut h = HashMap::new();
        assert!(parse_form(&h, b"a=1").is_empty());
        h.insert(
            "content-type".to_string(),
            "application/x-www-form-urlencoded; charset=utf-8".to_string(),
        );
        assert_eq!(parse_form(&h, b"a=1&b=x+y")["b"], vec!["x y".to_string()]);
    }

    #[test]
    fn test_parsed_request_builders() {
        let req = ParsedRequest::new(Method::POST, "/login?next=%2Fhome")
            .with_header("Cookie", "sid=42")
            .with_form_body("username=xia");
        assert_eq!(req.path, "/login");
        assert_eq!(req.query["next"], vec!["/home".to_string()]);
        assert_eq!(req.cookies["sid"], "42");
        assert_eq!(req.form["username"], vec!["xia".to_string()]);
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let req = ParsedRequest::new(Method::GET, "/hello/J%C3%B6rg?q=a%20b");
        assert_eq!(req.path, "/hello/Jörg");
        assert_eq!(req.uri, "/hello/J%C3%B6rg?q=a%20b");
        assert_eq!(ParsedRequest::new(Method::GET, "/a+b/my%20file.css").path, "/a+b/my file.css");
    }

    #[test]
    fn test_empty_path_defaults_to_root() {
        assert_eq!(ParsedRequest::new(Method::GET, "?a=1").path, "/");
    }
}
