//! Source positions: byte-offset spans plus lazy line/column resolution.
//!
//! Tokens and AST nodes only ever carry a [`Span`] (file + byte range).
//! Line/column numbers are resolved on demand via [`LineIndex`], built
//! once per file when an error actually needs to be rendered — most
//! compilations never hit an error and never pay for it.

use super::file_id::FileId;

/// A byte-offset range within one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: FileId,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { file, start, end }
    }

    pub fn empty(file: FileId, at: u32) -> Self {
        Self::new(file, at, at)
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Combine two spans in the same file into their smallest enclosing span.
    pub fn cover(self, other: Span) -> Span {
        debug_assert_eq!(self.file, other.file);
        Span::new(
            self.file,
            self.start.min(other.start),
            self.end.max(other.end),
        )
    }
}

/// 1-based line and column, as used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets to line/column for one source file.
///
/// Built lazily: a full scan of the source text for newline offsets,
/// then binary search per lookup.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// Resolve a byte offset to a 1-based line/column.
    ///
    /// Column counts Unicode code points from the start of the line, not
    /// bytes, so multi-byte UTF-8 sequences count as one column each.
    pub fn line_col(&self, source: &str, offset: u32) -> LineCol {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        let column = source
            .get(line_start as usize..offset as usize)
            .map(|s| s.chars().count() as u32)
            .unwrap_or(0);
        LineCol {
            line: line_idx as u32 + 1,
            column: column + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_first_line() {
        let src = "package foo;\nleaf bar;\n";
        let idx = LineIndex::new(src);
        let lc = idx.line_col(src, 0);
        assert_eq!(lc, LineCol { line: 1, column: 1 });
    }

    #[test]
    fn resolves_second_line() {
        let src = "package foo;\nleaf bar;\n";
        let idx = LineIndex::new(src);
        let lc = idx.line_col(src, 13); // 'l' of "leaf"
        assert_eq!(lc, LineCol { line: 2, column: 1 });
    }

    #[test]
    fn span_cover_takes_the_enclosing_range() {
        let file = FileId(0);
        let a = Span::new(file, 5, 10);
        let b = Span::new(file, 8, 20);
        assert_eq!(a.cover(b), Span::new(file, 5, 20));
    }
}
