use http::Method;

use crate::engine::{Engine, GroupId};
use crate::middleware::{handler_ref, Handler};
use crate::static_files::{StaticHandler, FILEPATH_PARAM};

/// Mutable handle onto one group of an [`Engine`].
///
/// Routes registered through the handle are prefixed with the group's
/// prefix. The handle borrows the engine, so keep the [`id`](Self::id) and
/// use [`Engine::group_mut`] to come back to a group later.
pub struct RouterGroup<'a> {
    engine: &'a mut Engine,
    id: GroupId,
}

impl<'a> RouterGroup<'a> {
    pub(crate) fn new(engine: &'a mut Engine, id: GroupId) -> Self {
        Self { engine, id }
    }

    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.id].prefix
    }

    #[must_use]
    pub fn parent(&self) -> Option<GroupId> {
        self.engine.groups[self.id].parent
    }

    /// Derive a child group; its prefix is this prefix followed by `suffix`.
    pub fn group(&mut self, suffix: &str) -> RouterGroup<'_> {
        let id = self.engine.derive(self.id, suffix);
        RouterGroup::new(self.engine, id)
    }

    /// Append middleware, run for every path starting with this prefix.
    pub fn use_middleware<H: Handler>(&mut self, middleware: H) -> &mut Self {
        self.engine.groups[self.id]
            .middleware
            .push(handler_ref(middleware));
        self
    }

    /// Register `handler` at this prefix followed by `pattern`.
    pub fn handle<H: Handler>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self {
        let pattern = self.absolute(pattern);
        self.engine
            .router
            .add_route(method, &pattern, handler_ref(handler));
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

    /// Serve the files below `root` at `<prefix><relative>/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: &str) -> &mut Self {
        let pattern = format!("{}/*{}", relative.trim_end_matches('/'), FILEPATH_PARAM);
        self.get(&pattern, StaticHandler::new(root))
    }

    fn absolute(&self, pattern: &str) -> String {
        if pattern.starts_with('/') {
            format!("{}{}", self.prefix(), pattern)
        } else {
            format!("{}/{}", self.prefix(), pattern)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::server::ParsedRequest;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_prefix_composition() {
        let mut engine = Engine::new();
        let mut api = engine.group("/api");
        assert_eq!(api.prefix(), "/api");
        assert_eq!(api.parent(), Some(crate::engine::ROOT_GROUP));
        let v2 = api.group("/v2");
        assert_eq!(v2.prefix(), "/api/v2");
    }

    #[test]
    fn test_relative_pattern_gets_slash() {
        let mut engine = Engine::new();
        engine
            .group("/api")
            .get("users/:id", |c: &mut Context| {
                let id = c.param("id").to_string();
                c.string(200, id);
            })
            .post("/users", |c: &mut Context| c.string(201, "created"));

        let res = engine.handle_request(ParsedRequest::new(Method::GET, "/api/users/9"));
        assert_eq!(res.body_string(), "9");
        let res = engine.handle_request(ParsedRequest::new(Method::POST, "/api/users"));
        assert_eq!(res.status(), 201);
    }

    #[test]
    fn test_static_files_route() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/site.css"), "h1{}").unwrap();

        let mut engine = Engine::new();
        engine
            .group("/assets")
            .static_files("/public", &dir.path().to_string_lossy());
        assert_eq!(
            engine.routes().map(|(_, p)| p).collect::<Vec<_>>(),
            vec!["/assets/public/*filepath"]
        );

        let res = engine.handle_request(ParsedRequest::new(Method::GET, "/assets/public/css/site.css"));
        assert_eq!(res.status(), 200);
        assert_eq!(res.header("Content-Type"), Some("text/css"));
        assert_eq!(res.body(), b"h1{}");

        let res = engine.handle_request(ParsedRequest::new(Method::GET, "/assets/public/missing.css"));
        assert_eq!(res.status(), 404);
    }
}
