//! # Request Context
//!
//! One [`Context`] exists per request. It carries the parsed request, the
//! path parameters, the buffered response and the handler chain assembled
//! for that request.
//!
//! ## Pipeline
//!
//! The chain is driven by an explicit cursor rather than nested calls. The
//! cursor starts before the first handler; [`Context::advance`] moves it one
//! slot and runs that handler. A middleware that needs to act after the rest
//! of the chain calls `advance` itself and continues when it returns:
//!
//! ```text
//! A-enter -> advance -> B-enter -> advance -> handler
//!                                  B-exit  <-
//!         A-exit <-
//! ```
//!
//! A handler that returns without advancing stops the chain there. There is
//! no other cancellation signal.
//!
//! ## Response helpers
//!
//! `string`, `fail`, `json`, `data` and `html` each commit a status and write
//! a body. The response is buffered and handed to the server once the chain
//! returns; a second status write is ignored with a warning.

mod core;
mod response;

pub use core::{Context, CONTENT_TYPE, MIME_HTML, MIME_JSON, MIME_PLAIN, MIME_TEMPLATE};
pub use response::ResponseWriter;
