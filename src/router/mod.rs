//! # Router Module
//!
//! Path matching and route resolution for xia.
//!
//! ## Overview
//!
//! Routes are registered as `/`-separated patterns made of three kinds of
//! segments:
//!
//! - literal segments (`users`), matched exactly;
//! - named segments (`:id`), capturing one path segment under `id`;
//! - a trailing wildcard (`*filepath`), capturing the rest of the path,
//!   joined by `/`, under `filepath`.
//!
//! Each HTTP method gets its own [`RouteTrie`]. [`Router`] owns the tries
//! and the handlers, keyed by `(method, registered pattern)`, so every
//! concrete path matching `/p/:lang/doc` reaches the same handler.
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use xia::router::Router;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/p/:lang/doc", "doc");
//! router.add_route(Method::GET, "/static/*filepath", "assets");
//!
//! let m = router.resolve(&Method::GET, "/p/go/doc").unwrap();
//! assert_eq!(*m.handler, "doc");
//! assert_eq!(m.param("lang"), Some("go"));
//!
//! let m = router.resolve(&Method::GET, "/static/css/a.css").unwrap();
//! assert_eq!(m.param("filepath"), Some("css/a.css"));
//!
//! assert!(router.resolve(&Method::POST, "/p/go/doc").is_err());
//! ```
//!
//! ## Matching order
//!
//! There is no priority scheme: children are tried in registration order
//! and the first complete match wins. Sibling parameters such as `:a` and
//! `:b` at the same depth are both kept; the one registered first shadows
//! the other wherever both would match.

mod core;
mod pattern;
mod trie;

pub use core::{Params, RouteMatch, RouteNotFound, Router};
pub use pattern::{param_key, parse_pattern, SegmentKind, Segments};
pub use trie::RouteTrie;
