use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

use super::Handler;
use crate::context::Context;

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Converts a panic anywhere further down the chain into a 500.
///
/// Whatever the chain wrote before panicking is discarded.
pub struct Recovery;

impl Handler for Recovery {
    fn call(&self, ctx: &mut Context) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| ctx.advance())) {
            error!(
                method = %ctx.method(),
                path = %ctx.path(),
                request_id = %ctx.request_id(),
                panic = %panic_message(payload.as_ref()),
                "Handler panicked"
            );
            ctx.writer_mut().reset();
            ctx.fail(500, INTERNAL_SERVER_ERROR);
        }
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
