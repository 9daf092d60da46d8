//! Segment trie used for per-method route matching
//!
//! Every registered pattern is stored as a path of nodes, one node per
//! segment. Shared prefixes (e.g. `/api/v1/`) are stored once. Literal and
//! parameter nodes live side by side in a single child list, kept in
//! registration order, so lookups try candidates in the order routes were
//! added.
//!
//! ## Matching
//!
//! Lookup is a depth-first search with backtracking. At each depth the
//! candidates are the children whose segment equals the input token plus every
//! named (`:x`) and wildcard (`*x`) child. The first candidate that leads to a
//! terminal node wins. A wildcard node ends the search immediately and binds
//! the rest of the input, joined by `/`.
//!
//! Intermediate nodes that exist only as prefixes of deeper routes have an
//! empty pattern and never match on their own.
//!
//! ## Cost
//!
//! Worst case is exponential in the number of sibling parameter children per
//! depth. Route trees are shallow and one parameter child per level is the
//! common case, so in practice a lookup is a handful of string compares.

use super::core::Params;
use super::pattern::{param_key, SegmentKind};

/// Node in the route trie.
///
/// Children are exclusively owned; the structure is a plain tree.
#[derive(Debug, Clone)]
struct TrieNode {
    /// Segment text as registered (sigil included for parameters)
    segment: String,
    kind: SegmentKind,
    /// Full pattern of the route terminating here, empty when none does
    pattern: String,
    children: Vec<TrieNode>,
}

impl TrieNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            kind: SegmentKind::of(segment),
            pattern: String::new(),
            children: Vec::new(),
        }
    }

    fn insert(&mut self, segments: &[&str], pattern: &str) {
        let Some((&segment, remaining)) = segments.split_first() else {
            self.pattern = pattern.to_string();
            return;
        };

        // Exact text match only: `:id` and `:name` stay separate siblings.
        let index = match self.children.iter().position(|c| c.segment == segment) {
            Some(index) => index,
            None => {
                self.children.push(TrieNode::new(segment));
                self.children.len() - 1
            }
        };
        self.children[index].insert(remaining, pattern);
    }

    /// `depth` is the number of input segments consumed to reach this node.
    fn search<'t>(&'t self, parts: &[&str], depth: usize, params: &mut Params) -> Option<&'t str> {
        if depth == parts.len() || self.kind == SegmentKind::Wildcard {
            if self.pattern.is_empty() {
                return None;
            }
            return Some(&self.pattern);
        }

        let part = parts[depth];
        for child in self
            .children
            .iter()
            .filter(|c| c.segment == part || c.kind.is_param())
        {
            let bound = child.bind(parts, depth, params);
            if let Some(pattern) = child.search(parts, depth + 1, params) {
                return Some(pattern);
            }
            // Backtrack: put back whatever the key held before this candidate
            if let Some((key, previous)) = bound {
                match previous {
                    Some(value) => {
                        params.insert(key.to_string(), value);
                    }
                    None => {
                        params.remove(key);
                    }
                }
            }
        }

        None
    }

    /// Record the capture this node makes when entered at `depth`.
    ///
    /// Returns the key and the value it replaced, if an outer node on the
    /// active path had already bound the same name.
    fn bind<'t>(
        &'t self,
        parts: &[&str],
        depth: usize,
        params: &mut Params,
    ) -> Option<(&'t str, Option<String>)> {
        let value = match self.kind {
            SegmentKind::Literal => return None,
            SegmentKind::Named => parts[depth].to_string(),
            SegmentKind::Wildcard => parts[depth..].join("/"),
        };
        let key = param_key(&self.segment);
        let previous = params.insert(key.to_string(), value);
        Some((key, previous))
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(TrieNode::count).sum::<usize>()
    }
}

/// Prefix tree over path segments for a single HTTP method.
///
/// # Example
///
/// ```
/// use xia::router::{parse_pattern, Params, RouteTrie};
///
/// let mut trie = RouteTrie::new();
/// trie.insert(&parse_pattern("/p/:lang/doc"), "/p/:lang/doc");
///
/// let mut params = Params::new();
/// let matched = trie.search(&parse_pattern("/p/go/doc"), &mut params);
/// assert_eq!(matched, Some("/p/:lang/doc"));
/// assert_eq!(params.get("lang").map(String::as_str), Some("go"));
/// ```
#[derive(Debug, Clone)]
pub struct RouteTrie {
    root: TrieNode,
}

impl RouteTrie {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: TrieNode::new(""),
        }
    }

    /// Add `segments` as a path of nodes and stamp `pattern` on its last node.
    ///
    /// Re-inserting the same segments reuses the existing nodes.
    pub fn insert(&mut self, segments: &[&str], pattern: &str) {
        self.root.insert(segments, pattern);
    }

    /// Find the registered pattern matching `segments`.
    ///
    /// On success `params` holds exactly the captures made along the matched
    /// branch. On failure it is left as it was passed in.
    pub fn search<'t>(&'t self, segments: &[&str], params: &mut Params) -> Option<&'t str> {
        self.root.search(segments, 0, params)
    }

    /// Total number of nodes, the root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.root.count()
    }
}

impl Default for RouteTrie {
    fn default() -> Self {
        Self::new()
    }
}
