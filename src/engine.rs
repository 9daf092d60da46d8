//! # Engine
//!
//! The [`Engine`] owns the route table and every router group. Groups are
//! stored in a flat list in creation order and refer to their parent by
//! index; a [`RouterGroup`] is a short-lived handle onto one of them.
//!
//! ## Dispatch
//!
//! For each request the engine assembles a handler chain and drives it
//! through [`Context::advance`]:
//!
//! 1. resolve method and path against the route table;
//! 2. on a match, take the middleware of every group whose prefix is a
//!    string prefix of the path, in creation order, then append the route
//!    handler;
//! 3. on a miss, the chain is a single handler answering
//!    `404 NOT FOUND: <path>`. Group middleware does not run.
//!
//! Prefix containment is lexical: a group at `/api` also contributes to
//! `/apix/...`. Groups contribute only their own middleware; a child does not
//! pull in its parent's.
//!
//! ```
//! use xia::{Context, Engine};
//!
//! let mut engine = Engine::new();
//! engine.get("/p/:lang/doc", |c: &mut Context| {
//!     let body = format!("doc for {}", c.param("lang"));
//!     c.string(200, body);
//! });
//!
//! let res = engine.handle_request(xia::server::ParsedRequest::new(http::Method::GET, "/p/go/doc"));
//! assert_eq!(res.body_string(), "doc for go");
//! ```

use http::Method;
use std::sync::Arc;
use tracing::debug;

use crate::context::{Context, ResponseWriter};
use crate::group::RouterGroup;
use crate::middleware::{handler_ref, Handler, HandlerRef, Logger};
use crate::router::{RouteMatch, Router};
use crate::server::ParsedRequest;

/// Index of a group inside its engine.
pub type GroupId = usize;

/// The group every engine starts with, prefix ``.
pub const ROOT_GROUP: GroupId = 0;

pub(crate) struct GroupData {
    pub(crate) prefix: String,
    pub(crate) parent: Option<GroupId>,
    pub(crate) middleware: Vec<HandlerRef>,
}

/// Answers every unresolved request.
struct NotFound;

impl Handler for NotFound {
    fn call(&self, ctx: &mut Context) {
        let body = format!("404 NOT FOUND: {}\n", ctx.path());
        ctx.string(404, body);
    }
}

pub struct Engine {
    pub(crate) router: Router<HandlerRef>,
    pub(crate) groups: Vec<GroupData>,
    not_found: HandlerRef,
}

impl Engine {
    /// Engine with only the root group and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            groups: vec![GroupData {
                prefix: String::new(),
                parent: None,
                middleware: Vec::new(),
            }],
            not_found: handler_ref(NotFound),
        }
    }

    /// Engine with a `/` group running the request logger.
    #[must_use]
    pub fn classic() -> Self {
        let mut engine = Self::new();
        engine.group("/").use_middleware(Logger);
        engine
    }

    /// Handle onto the root group.
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup::new(self, ROOT_GROUP)
    }

    /// Derive a group from the root; its prefix is `suffix`.
    pub fn group(&mut self, suffix: &str) -> RouterGroup<'_> {
        let id = self.derive(ROOT_GROUP, suffix);
        RouterGroup::new(self, id)
    }

    /// Handle onto an existing group.
    pub fn group_mut(&mut self, id: GroupId) -> Option<RouterGroup<'_>> {
        if id < self.groups.len() {
            Some(RouterGroup::new(self, id))
        } else {
            None
        }
    }

    pub(crate) fn derive(&mut self, parent: GroupId, suffix: &str) -> GroupId {
        let prefix = format!("{}{}", self.groups[parent].prefix, suffix);
        debug!(parent = parent, prefix = %prefix, "Group derived");
        self.groups.push(GroupData {
            prefix,
            parent: Some(parent),
            middleware: Vec::new(),
        });
        self.groups.len() - 1
    }

    /// Add middleware to the root group.
    pub fn use_middleware<H: Handler>(&mut self, middleware: H) -> &mut Self {
        self.groups[ROOT_GROUP].middleware.push(handler_ref(middleware));
        self
    }

    pub fn handle<H: Handler>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self {
        self.root().handle(method, pattern, handler);
        self
    }

    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::GET, pattern, handler)
    }

    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::POST, pattern, handler)
    }

    pub fn put<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::PUT, pattern, handler)
    }

    pub fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Serve files below `root` at `relative/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: &str) -> &mut Self {
        self.root().static_files(relative, root);
        self
    }

    /// Middleware of every group whose prefix is a string prefix of `path`,
    /// groups in creation order.
    #[must_use]
    pub fn collect_middleware(&self, path: &str) -> Vec<HandlerRef> {
        self.groups
            .iter()
            .filter(|g| path.starts_with(g.prefix.as_str()))
            .flat_map(|g| g.middleware.iter().map(Arc::clone))
            .collect()
    }

    /// Resolve against the route table without building a chain.
    ///
    /// # Errors
    ///
    /// Returns [`RouteNotFound`](crate::router::RouteNotFound) on a miss.
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
    ) -> Result<RouteMatch<'_, HandlerRef>, crate::router::RouteNotFound> {
        self.router.resolve(method, path)
    }

    /// Build the chain for `ctx` and run it.
    pub fn dispatch(&self, ctx: &mut Context) {
        let path = ctx.path().to_string();
        let chain = match self.router.resolve(ctx.method(), &path) {
            Ok(RouteMatch {
                handler, params, ..
            }) => {
                let mut chain = self.collect_middleware(&path);
                chain.push(Arc::clone(handler));
                ctx.set_params(params);
                chain
            }
            Err(_) => vec![Arc::clone(&self.not_found)],
        };
        ctx.set_handlers(chain);
        ctx.advance();
    }

    /// Run one request through the engine and return the buffered response.
    #[must_use]
    pub fn handle_request(&self, request: ParsedRequest) -> ResponseWriter {
        let mut ctx = Context::new(request);
        self.dispatch(&mut ctx);
        ctx.into_response()
    }

    /// Registered `(method, pattern)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.router.routes()
    }

    /// Prefixes of all groups in creation order.
    pub fn group_prefixes(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.prefix.as_str())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
