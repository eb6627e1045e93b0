//! Source positions for diagnostics.
//!
//! [`Span`] marks where a type expression (or any other template construct)
//! appeared in the source so that diagnostics can point at it.

use std::fmt;

/// A single-line range of source text, identified by its starting position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Smallest span covering both `self` and `other` when they share a line.
    ///
    /// Spans on different lines keep the position of `self` and sum lengths.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line != other.line {
            return Span::new(self.line, self.col, self.len + other.len);
        }
        let start = self.col.min(other.col);
        let end = (self.col + self.len).max(other.col + other.len);
        Span::new(self.line, start, end - start)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        assert_eq!(Span::new(3, 15, 5).to_string(), "3:15");
    }

    #[test]
    fn merge_covers_both() {
        let name = Span::new(1, 1, 4);
        let close = Span::new(1, 9, 1);
        let merged = name.merge(close);
        assert_eq!(merged, Span::new(1, 1, 9));
        assert_eq!(close.merge(name), Span::new(1, 1, 9));
    }

    #[test]
    fn merge_across_lines_keeps_first_position() {
        let merged = Span::new(1, 5, 10).merge(Span::new(3, 10, 5));
        assert_eq!(merged, Span::new(1, 5, 15));
    }
}
