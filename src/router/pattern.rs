use smallvec::SmallVec;

/// Inline capacity for parsed segments; deeper paths spill to the heap.
pub const MAX_INLINE_SEGMENTS: usize = 8;

/// Parsed pattern or request path, borrowed from the input string.
pub type Segments<'a> = SmallVec<[&'a str; MAX_INLINE_SEGMENTS]>;

/// Classification of a single `/`-delimited token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Matches an identical input token only.
    Literal,
    /// `:name`, captures exactly one input token.
    Named,
    /// `*name`, captures every remaining token joined by `/`.
    Wildcard,
}

impl SegmentKind {
    /// Classify a segment by its leading sigil.
    #[must_use]
    pub fn of(segment: &str) -> Self {
        match segment.as_bytes().first() {
            Some(b':') => SegmentKind::Named,
            Some(b'*') => SegmentKind::Wildcard,
            _ => SegmentKind::Literal,
        }
    }

    /// True for named and wildcard segments.
    #[must_use]
    pub fn is_param(self) -> bool {
        !matches!(self, SegmentKind::Literal)
    }
}

/// Split a pattern (or request path) into its non-empty segments.
///
/// Empty tokens are dropped, so `/a//b` parses like `/a/b`. The first token
/// starting with `*` is kept and ends the parse; anything after it is
/// discarded, which is what limits a pattern to one trailing wildcard.
///
/// Names after `:` or `*` are not validated: `/:` and `/*` are accepted and
/// capture under the empty key.
///
/// ```
/// use xia::router::parse_pattern;
///
/// assert_eq!(parse_pattern("/p/:lang/doc").as_slice(), &["p", ":lang", "doc"]);
/// assert_eq!(parse_pattern("/static/*path/ignored").as_slice(), &["static", "*path"]);
/// ```
#[must_use]
pub fn parse_pattern(pattern: &str) -> Segments<'_> {
    let mut parts = Segments::new();
    for item in pattern.split('/').filter(|s| !s.is_empty()) {
        parts.push(item);
        if item.starts_with('*') {
            break;
        }
    }
    parts
}

/// Key a named or wildcard segment captures under (the segment minus its sigil).
#[must_use]
pub fn param_key(segment: &str) -> &str {
    segment.get(1..).unwrap_or("")
}
