use std::sync::Arc;

use crate::context::Context;

/// A step in the request pipeline.
///
/// Route handlers and middleware share this one shape. A middleware that
/// wants to run code after the rest of the chain calls
/// [`Context::advance`] and continues once it returns; one that returns
/// without advancing ends the chain.
///
/// Any `Fn(&mut Context) + Send + Sync` closure is a handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Context) {
        self(ctx)
    }
}

/// Shared handle to a registered handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Box a handler for storage in a route table or group.
pub fn handler_ref<H: Handler>(handler: H) -> HandlerRef {
    Arc::new(handler)
}
