//! # xia
//!
//! **xia** is a small gin-style HTTP router running on the `may` coroutine
//! runtime through `may_minihttp`.
//!
//! ## Overview
//!
//! Routes are registered per method as `/`-separated patterns with literal,
//! named (`:name`) and wildcard (`*name`) segments, held in one segment trie
//! per method. Router groups add a path prefix and their own middleware.
//! Every request gets a [`Context`] that carries the request, the captured
//! parameters, a buffered response and the handler chain, which is driven one
//! step at a time by [`Context::advance`].
//!
//! ## Architecture
//!
//! - **[`router`]** - pattern parsing, the segment trie and the route table
//! - **[`context`]** - per-request state, pipeline cursor and response helpers
//! - **[`middleware`]** - the [`Handler`] trait, request logger and panic recovery
//! - **[`engine`]** / **[`group`]** - group registry, prefix composition and dispatch
//! - **[`binding`]** - decoding url-encoded forms into typed records
//! - **[`templates`]** - `minijinja` rendering with an optional compile cache
//! - **[`static_files`]** - serving a directory under a wildcard route
//! - **[`server`]** - `may_minihttp` service, response writing and server handle
//! - **[`config`]** / **[`runtime_config`]** - INI settings and runtime tuning
//! - **[`logging`]** - `tracing` subscriber setup with daily log files
//! - **[`cli`]** - the `xia` binary
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService<br/>(may_minihttp)
//!     participant Engine
//!     participant Router as Route table
//!     participant Chain as Handler chain
//!
//!     Client->>Server: GET /api/users/7
//!     Server->>Server: parse_request (headers, query, form)
//!     Server->>Engine: handle_request (inside catch_unwind)
//!     Engine->>Router: resolve(GET, /api/users/7)
//!     alt match
//!         Router-->>Engine: handler + {id: 7}
//!         Engine->>Engine: middleware of groups whose prefix matches
//!         Engine->>Chain: advance()
//!         Chain->>Chain: middleware... then handler
//!     else miss
//!         Engine->>Chain: advance() on the 404 handler only
//!     end
//!     Chain-->>Server: ResponseWriter
//!     Server-->>Client: status, headers, body
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xia::server::{AppService, HttpServer};
//! use xia::{Context, Engine};
//!
//! let mut engine = Engine::classic();
//! engine.get("/hello/:name", |c: &mut Context| {
//!     let body = format!("hello {}", c.param("name"));
//!     c.string(200, body);
//! });
//! {
//!     let mut api = engine.group("/api");
//!     api.get("/ping", |c: &mut Context| c.json(200, &serde_json::json!({"pong": true})));
//! }
//!
//! let service = AppService::new(Arc::new(engine)).with_health(true);
//! let handle = HttpServer(service).start("0.0.0.0:9999").unwrap();
//! handle.join().unwrap();
//! ```

pub mod binding;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod group;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod static_files;
pub mod templates;

pub use binding::{BindError, FieldKind, FieldSpec, FieldValue, FormRecord};
pub use context::{Context, ResponseWriter};
pub use engine::{Engine, GroupId};
pub use group::RouterGroup;
pub use middleware::{handler_ref, Handler, HandlerRef, Logger, Recovery};
pub use router::{Params, RouteNotFound, Router};
pub use templates::{ResponsePayload, Templates};
