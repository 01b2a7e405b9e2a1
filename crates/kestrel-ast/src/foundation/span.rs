//! Source locations for kernel statements.
//!
//! Kernels are captured from host source files, so every statement and
//! expression carries a [`Span`] back into the original text. Diagnostics
//! resolve spans through a [`SourceMap`] to print `file:line:col` and a
//! snippet of the offending line.
//!
//! # Examples
//!
//! ```
//! # use kestrel_ast::foundation::span::*;
//! # use std::path::PathBuf;
//! let mut map = SourceMap::new();
//! let file = map.add_file(PathBuf::from("kernel.py"), "a, b = b, a\n".to_string());
//! let span = Span::new(file, 0, 4, 1);
//!
//! assert_eq!(map.snippet(&span), "a, b");
//! assert_eq!(map.line_col(&span), (1, 1));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Byte range inside one captured source file.
///
/// `line` caches the 1-based line of `start` so diagnostics can be
/// produced without a [`SourceMap`] at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index into [`SourceMap`] files
    pub file_id: u16,
    /// Byte offset of the first character
    pub start: u32,
    /// Byte offset one past the last character
    pub end: u32,
    /// 1-based line of `start`
    pub line: u32,
}

/// All source files captured for one program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// One captured source file with a line index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path the kernel was captured from
    pub path: PathBuf,
    /// Full source text
    pub text: String,
    /// Byte offset of each line start, plus an EOF sentinel
    line_starts: Vec<u32>,
}

impl Span {
    pub fn new(file_id: u16, start: u32, end: u32, line: u32) -> Self {
        Self {
            file_id,
            start,
            end,
            line,
        }
    }

    /// Span for nodes synthesized by the compiler or built programmatically.
    pub fn detached() -> Self {
        Self::new(0, 0, 0, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// # Panics
    /// Panics if the spans belong to different files.
    pub fn to(&self, other: &Span) -> Span {
        assert_eq!(
            self.file_id, other.file_id,
            "cannot join spans from different files"
        );
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
        }
    }
}

impl SourceMap {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a file and return its id.
    pub fn add_file(&mut self, path: PathBuf, text: String) -> u16 {
        let id = self.files.len();
        assert!(id < u16::MAX as usize, "too many source files");
        self.files.push(SourceFile::new(path, text));
        id as u16
    }

    pub fn get(&self, file_id: u16) -> Option<&SourceFile> {
        self.files.get(file_id as usize)
    }

    pub fn file(&self, span: &Span) -> Option<&SourceFile> {
        self.get(span.file_id)
    }

    /// Path of the file a span points into, or `<unknown>` for detached spans.
    pub fn file_path(&self, span: &Span) -> &Path {
        self.file(span)
            .map(|f| f.path.as_path())
            .unwrap_or_else(|| Path::new("<unknown>"))
    }

    /// Text covered by a span. Empty when the span is out of range.
    pub fn snippet(&self, span: &Span) -> &str {
        self.file(span)
            .and_then(|f| f.text.get(span.start as usize..span.end as usize))
            .unwrap_or("")
    }

    /// 1-based (line, column) of a span's start.
    ///
    /// Falls back to the cached line when the file is not registered.
    pub fn line_col(&self, span: &Span) -> (u32, u32) {
        match self.file(span) {
            Some(file) => file.line_col(span.start),
            None => (span.line, 1),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceFile {
    pub fn new(path: PathBuf, text: String) -> Self {
        let line_starts = index_lines(&text);
        Self {
            path,
            text,
            line_starts,
        }
    }

    /// 1-based (line, column) for a byte offset, clamped to EOF.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.text.len() as u32);
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx.min(self.line_count().saturating_sub(1)),
            Err(idx) => idx.saturating_sub(1),
        };
        ((idx + 1) as u32, offset - self.line_starts[idx] + 1)
    }

    /// Text of a 1-based line without its trailing newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line as usize - 1] as usize;
        let end = self.line_starts[line as usize] as usize;
        Some(self.text[start..end].trim_end_matches(['\n', '\r']))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }
}

fn index_lines(text: &str) -> Vec<u32> {
    let mut starts = vec![0];
    starts.extend(
        text.char_indices()
            .filter(|&(_, ch)| ch == '\n')
            .map(|(idx, _)| (idx + 1) as u32),
    );
    if starts.last() != Some(&(text.len() as u32)) {
        starts.push(text.len() as u32);
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel_file() -> SourceFile {
        SourceFile::new(
            PathBuf::from("kernel.py"),
            "a, b = 0, 1\na, b = b, a + b\n".to_string(),
        )
    }

    #[test]
    fn test_line_index() {
        assert_eq!(index_lines("x\ny"), vec![0, 2, 3]);
        assert_eq!(index_lines("x\n"), vec![0, 2]);
        assert_eq!(index_lines(""), vec![0]);
    }

    #[test]
    fn test_line_col() {
        let file = kernel_file();
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(7), (1, 8));
        assert_eq!(file.line_col(12), (2, 1));
        assert_eq!(file.line_col(19), (2, 8));
    }

    #[test]
    fn test_line_text_strips_newline() {
        let file = kernel_file();
        assert_eq!(file.line_text(1), Some("a, b = 0, 1"));
        assert_eq!(file.line_text(2), Some("a, b = b, a + b"));
        assert_eq!(file.line_text(3), None);
        assert_eq!(file.line_text(0), None);
    }

    #[test]
    fn test_span_join() {
        let a = Span::new(0, 4, 8, 1);
        let b = Span::new(0, 10, 14, 2);
        let joined = a.to(&b);
        assert_eq!((joined.start, joined.end, joined.line), (4, 14, 1));
        assert_eq!(joined.len(), 10);
    }

    #[test]
    #[should_panic(expected = "different files")]
    fn test_span_join_across_files_panics() {
        let _ = Span::new(0, 0, 1, 1).to(&Span::new(1, 0, 1, 1));
    }

    #[test]
    fn test_detached_span_lookup() {
        let map = SourceMap::new();
        let span = Span::detached();
        assert!(span.is_empty());
        assert_eq!(map.snippet(&span), "");
        assert_eq!(map.line_col(&span), (1, 1));
        assert_eq!(map.file_path(&span), Path::new("<unknown>"));
    }

    #[test]
    fn test_source_map_snippet() {
        let mut map = SourceMap::new();
        let id = map.add_file(PathBuf::from("k.py"), "c, d = static(b, a)".to_string());
        assert_eq!(map.snippet(&Span::new(id, 7, 19, 1)), "static(b, a)");
        assert_eq!(map.len(), 1);
    }
}
