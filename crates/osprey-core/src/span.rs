//! Source location tracking for diagnostics.
//!
//! Provides [`Span`] to track where expressions and diagnostics occur in source code.

use std::cmp::Ordering;
use std::fmt;

/// A span of source code, represented by its starting position and length.
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

    /// Compare the start positions of two spans.
    #[inline]
    pub fn cmp_start(&self, other: &Span) -> Ordering {
        (self.line, self.col).cmp(&(other.line, other.col))
    }

    /// Whether this span starts strictly before `other`.
    #[inline]
    pub fn starts_before(&self, other: &Span) -> bool {
        self.cmp_start(other) == Ordering::Less
    }

    /// Merge two spans into one covering both.
    ///
    /// Multi-line merges keep the earlier start and approximate the length.
    pub fn merge(self, other: Span) -> Span {
        let (first, second) = if other.starts_before(&self) {
            (other, self)
        } else {
            (self, other)
        };
        if first.line == second.line {
            let end_col = (second.col + second.len).max(first.col + first.len);
            Span {
                line: first.line,
                col: first.col,
                len: end_col - first.col,
            }
        } else {
            Span {
                line: first.line,
                col: first.col,
                len: first.len + second.len,
            }
        }
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
