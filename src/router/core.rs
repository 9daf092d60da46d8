//! Route table: one trie per method plus the handler store.
//!
//! Resolution runs for every request, so it only does in-memory work: parse
//! the path into borrowed segments, walk the method's trie, then look the
//! handler up by `(method, matched pattern)`.

use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::pattern::parse_pattern;
use super::trie::RouteTrie;

/// Parameters captured from the request path, keyed by name without sigil.
pub type Params = HashMap<String, String>;

/// No route serves the requested method and path.
///
/// This is an expected outcome; the dispatcher answers it with a 404.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNotFound {
    pub method: Method,
    pub path: String,
}

impl fmt::Display for RouteNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no route for {} {}", self.method, self.path)
    }
}

impl std::error::Error for RouteNotFound {}

/// Successful resolution of a request.
#[derive(Debug)]
pub struct RouteMatch<'r, H> {
    /// Handler registered for the matched pattern
    pub handler: &'r H,
    /// The pattern as it was registered (e.g. `/p/:lang/doc`)
    pub pattern: &'r str,
    /// Captures from named and wildcard segments
    pub params: Params,
}

impl<H> RouteMatch<'_, H> {
    /// Get a captured parameter by name.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Maps methods to tries and `(method, pattern)` pairs to handlers.
///
/// Generic over the handler type so the table can be exercised without an
/// HTTP stack; the engine stores `HandlerRef`s.
///
/// Built during setup and read-only afterwards. The engine shares it behind an
/// `Arc`, so lookups take no locks.
#[derive(Debug, Clone)]
pub struct Router<H> {
    roots: HashMap<Method, RouteTrie>,
    handlers: HashMap<(Method, String), H>,
    /// Registration order, for listing
    order: Vec<(Method, String)>,
}

impl<H> Router<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            roots: HashMap::new(),
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// A pattern without a leading `/` gets one. Registering the same
    /// `(method, pattern)` again replaces the previous handler.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: H) {
        let pattern = if pattern.is_empty() || pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("/{pattern}")
        };

        info!(method = %method, pattern = %pattern, "Add new router");

        {
            // `segments` borrows `pattern`, which is moved into the key below.
            let segments = parse_pattern(&pattern);
            self.roots
                .entry(method.clone())
                .or_default()
                .insert(&segments, &pattern);
        }

        let key = (method, pattern);
        if self.handlers.insert(key.clone(), handler).is_some() {
            debug!(method = %key.0, pattern = %key.1, "Replaced existing handler");
        } else {
            self.order.push(key);
        }
    }

    /// Resolve a request to its handler and path parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RouteNotFound`] when no trie exists for `method` or no
    /// registered pattern matches `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch<'_, H>, RouteNotFound> {
        let match_start = Instant::now();
        let not_found = || RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        };

        let Some(root) = self.roots.get(method) else {
            warn!(method = %method, path = %path, "No routes registered for method");
            return Err(not_found());
        };

        let segments = parse_pattern(path);
        let mut params = Params::new();
        let matched = root
            .search(&segments, &mut params)
            .and_then(|pattern| {
                self.handlers
                    .get_key_value(&(method.clone(), pattern.to_string()))
                    .map(|((_, pattern), handler)| (pattern.as_str(), handler))
            });

        let duration = match_start.elapsed();
        match matched {
            Some((pattern, handler)) => {
                if duration > Duration::from_millis(1) {
                    warn!(
                        method = %method,
                        path = %path,
                        pattern = %pattern,
                        duration_us = duration.as_micros() as u64,
                        "Slow route match"
                    );
                } else {
                    debug!(
                        method = %method,
                        path = %path,
                        pattern = %pattern,
                        param_count = params.len(),
                        duration_us = duration.as_micros() as u64,
                        "Route matched"
                    );
                }
                Ok(RouteMatch {
                    handler,
                    pattern,
                    params,
                })
            }
            None => {
                warn!(
                    method = %method,
                    path = %path,
                    duration_us = duration.as_micros() as u64,
                    "No route matched"
                );
                Err(not_found())
            }
        }
    }

    /// Registered `(method, pattern)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.order.iter().map(|(m, p)| (m, p.as_str()))
    }

    /// Number of distinct `(method, pattern)` registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The trie for `method`, if any route was registered for it.
    #[must_use]
    pub fn trie(&self, method: &Method) -> Option<&RouteTrie> {
        self.roots.get(method)
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}
