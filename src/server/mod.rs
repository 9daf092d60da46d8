//! HTTP transport on `may_minihttp`.
//!
//! [`AppService`] turns each wire request into a [`ParsedRequest`], runs it
//! through the engine inside a panic boundary and writes the buffered
//! response back. [`HttpServer`] binds it to an address.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_form, parse_query_params, parse_request, ParsedRequest};
pub use response::{health_endpoint, status_reason, write_plain_error, write_response};
pub use service::{handle_request, AppService, HEALTH_PATH};
