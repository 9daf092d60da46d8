mod core;
mod logger;
mod recovery;

pub use core::{handler_ref, Handler, HandlerRef};
pub use logger::Logger;
pub use recovery::{panic_message, Recovery, INTERNAL_SERVER_ERROR};
