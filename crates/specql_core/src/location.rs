//! Source positions: byte spans and their line/column projection.
//!
//! The AST and diagnostics carry [`Span`]s (cheap, hashable byte ranges that
//! double as node identities for overlay annotations); the wire error model
//! needs 1-based `{line, column}` pairs. [`LineMap`] bridges the two and is
//! built once per source string.

use serde::{Deserialize, Serialize};

/// A half-open byte range in source text.
///
/// Spans identify AST nodes: two distinct nodes never share a span, which is
/// what lets the operation overlay key its annotations by span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// First byte of the spanned text.
    pub start: u32,
    /// One past the last byte of the spanned text.
    pub end: u32,
}

impl Span {
    /// Creates a span over `start..end`.
    #[must_use]
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A zero-length span at a position. The parser uses these as placeholder
    /// positions when recovering from a missing token.
    #[must_use]
    #[inline]
    pub const fn empty(pos: u32) -> Self {
        Self::new(pos, pos)
    }
}

/// A 1-based line/column position in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1.
    pub column: u32,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column positions.
///
/// Built once per source string; lookups are binary searches over the
/// recorded line start offsets.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Builds a line map for the given source.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// Returns the location of a byte offset.
    #[must_use]
    pub fn location(&self, offset: u32) -> Location {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        Location {
            line: line_idx as u32 + 1,
            column: offset - self.line_starts[line_idx] + 1,
        }
    }

    /// Returns the location of a span's start.
    #[must_use]
    pub fn span_location(&self, span: Span) -> Location {
        self.location(span.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_spans_pin_a_position() {
        let span = Span::empty(7);
        assert_eq!(span.start, span.end);
        assert_eq!(span.start, 7);
    }

    #[test]
    fn test_spans_are_usable_as_node_keys() {
        // Distinct nodes have distinct spans; equal spans hash equal.
        use std::collections::HashSet;
        let mut keys = HashSet::new();
        keys.insert(Span::new(2, 5));
        keys.insert(Span::new(2, 5));
        keys.insert(Span::new(8, 12));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_single_line() {
        let map = LineMap::new("{ dog { nome } }");
        assert_eq!(map.location(0), Location::new(1, 1));
        assert_eq!(map.location(8), Location::new(1, 9));
    }

    #[test]
    fn test_multi_line() {
        let map = LineMap::new("query {\n  dog\n}");
        assert_eq!(map.location(0), Location::new(1, 1));
        assert_eq!(map.location(8), Location::new(2, 1));
        assert_eq!(map.location(10), Location::new(2, 3));
        assert_eq!(map.location(14), Location::new(3, 1));
    }

    #[test]
    fn test_offset_at_line_start() {
        let map = LineMap::new("a\nb\nc");
        assert_eq!(map.location(2), Location::new(2, 1));
        assert_eq!(map.location(4), Location::new(3, 1));
    }

    #[test]
    fn test_span_location_points_at_the_start() {
        let source = "{\n  pets {\n    nome\n  }\n}";
        let map = LineMap::new(source);
        let nome_at = source.find("nome").unwrap() as u32;
        let span = Span::new(nome_at, nome_at + 4);
        assert_eq!(map.span_location(span), Location::new(3, 5));
    }
}
