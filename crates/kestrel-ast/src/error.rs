//! Compile-time diagnostics.
//!
//! Every misuse the compiler can detect is reported as a [`CompileError`]
//! before any code is generated; nothing is deferred to a runtime fault in
//! the compiled kernel.
//!
//! # Design
//!
//! - `CompileError` - one diagnostic with a primary span, message and an
//!   optional structured [`ErrorDetail`] (counts, types, operand kind)
//! - `ErrorKind` - stable category tag, see [`ErrorKind::tag`]
//! - `DiagnosticFormatter` - renders diagnostics with source snippets
//!
//! # Examples
//!
//! ```
//! # use kestrel_ast::error::*;
//! # use kestrel_ast::foundation::Span;
//! let error = CompileError::new(
//!     ErrorKind::ArityMismatch,
//!     Span::detached(),
//!     "cannot unpack 3 values into 2 targets".to_string(),
//! )
//! .with_detail(ErrorDetail::Arity { expected: 2, actual: 3 });
//!
//! assert_eq!(error.kind.tag(), "ArityMismatch");
//! ```

use crate::foundation::{DataType, SourceMap, Span};
use std::fmt;

/// Compilation diagnostic with source location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Category of this error
    pub kind: ErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Statement or expression the error is about
    pub span: Span,
    /// Human-readable explanation
    pub message: String,
    /// Machine-readable payload for the error kind
    pub detail: Option<ErrorDetail>,
    /// Related source locations
    pub labels: Vec<Label>,
    /// Hints and extra context
    pub notes: Vec<String>,
}

/// Category of a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Number of assignment targets differs from the source's element count
    ArityMismatch,
    /// A value cannot be converted to the storage type it is assigned to
    TypeMismatch,
    /// Destructuring statement without targets
    EmptyTargetList,
    /// Source has no defined unpacking
    UnsupportedSource,
    /// Reference to an undeclared field, local, global or function
    UndefinedName,
    /// Host function called with the wrong number of arguments
    WrongArgCount,
    /// Compile-time index outside a field's extents or a value's components
    IndexOutOfBounds,
    /// Ragged matrix literal or mismatched vector operands
    ShapeMismatch,
    /// Expression that is not valid in its position
    InvalidExpression,
    /// Bug in the compiler
    Internal,
}

/// Structured payload attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    /// Target count vs. source element count
    Arity { expected: usize, actual: usize },
    /// Element `target_index` has type `found`, target requires `expected`
    Type {
        target_index: usize,
        expected: DataType,
        found: DataType,
    },
    /// Kind of the source value that could not be unpacked
    Source { actual_kind: String },
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// Secondary labeled span in a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl CompileError {
    /// Creates an error-severity diagnostic with no detail, labels or notes.
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            span,
            message,
            detail: None,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::new(kind, span, message)
        }
    }

    pub fn internal(span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, span, message.into())
    }

    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_label(mut self, span: Span, message: String) -> Self {
        self.labels.push(Label { span, message });
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl ErrorKind {
    /// Stable identifier for tooling and tests. Never changes between releases.
    pub fn tag(self) -> &'static str {
        match self {
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::EmptyTargetList => "EmptyTargetList",
            ErrorKind::UnsupportedSource => "UnsupportedSource",
            ErrorKind::UndefinedName => "UndefinedName",
            ErrorKind::WrongArgCount => "WrongArgCount",
            ErrorKind::IndexOutOfBounds => "IndexOutOfBounds",
            ErrorKind::ShapeMismatch => "ShapeMismatch",
            ErrorKind::InvalidExpression => "InvalidExpression",
            ErrorKind::Internal => "Internal",
        }
    }

    /// Human-readable name used in rendered diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::ArityMismatch => "arity mismatch",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::EmptyTargetList => "empty target list",
            ErrorKind::UnsupportedSource => "unsupported unpack source",
            ErrorKind::UndefinedName => "undefined name",
            ErrorKind::WrongArgCount => "wrong argument count",
            ErrorKind::IndexOutOfBounds => "index out of bounds",
            ErrorKind::ShapeMismatch => "shape mismatch",
            ErrorKind::InvalidExpression => "invalid expression",
            ErrorKind::Internal => "internal compiler error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.name(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Result type for single-diagnostic operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Renders diagnostics with file location, the offending source line and a
/// caret underline.
///
/// ```text
/// error: arity mismatch: cannot unpack 3 values into 2 targets
///   --> kernel.py:4:5
///    |
///  4 |     a[None], b[None] = 2, 3, 4
///    |     ^^^^^^^^^^^^^^^^^^^^^^^^^^
///    = help: the number of targets must equal the number of values
/// ```
pub struct DiagnosticFormatter<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    pub fn format(&self, error: &CompileError) -> String {
        let mut out = format!(
            "{}: {}: {}\n",
            error.severity,
            error.kind.name(),
            error.message
        );

        let (line, col) = self.sources.line_col(&error.span);
        out.push_str(&format!(
            "  --> {}:{}:{}\n",
            self.sources.file_path(&error.span).display(),
            line,
            col
        ));

        if let Some(text) = self
            .sources
            .file(&error.span)
            .and_then(|file| file.line_text(line))
        {
            let gutter = " ".repeat(line.to_string().len());
            out.push_str(&format!(" {gutter} |\n"));
            out.push_str(&format!(" {line} | {text}\n"));
            let start = col as usize - 1;
            let width = (error.span.len() as usize)
                .min(text.len().saturating_sub(start))
                .max(1);
            out.push_str(&format!(
                " {gutter} | {}{}\n",
                " ".repeat(start),
                "^".repeat(width)
            ));
        }

        for label in &error.labels {
            let (l, c) = self.sources.line_col(&label.span);
            out.push_str(&format!(
                "   = note: {} (at {}:{}:{})\n",
                label.message,
                self.sources.file_path(&label.span).display(),
                l,
                c
            ));
        }

        for note in &error.notes {
            out.push_str(&format!("   = help: {note}\n"));
        }

        out
    }

    /// Formats several diagnostics separated by blank lines.
    pub fn format_all(&self, errors: &[CompileError]) -> String {
        errors
            .iter()
            .map(|e| self.format(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::PrimitiveType;
    use std::path::PathBuf;

    fn sources() -> SourceMap {
        let mut map = SourceMap::new();
        map.add_file(
            PathBuf::from("kernel.py"),
            "def func():\n    a[None], b[None] = 2, 3, 4\n".to_string(),
        );
        map
    }

    fn statement_span() -> Span {
        // "a[None], b[None] = 2, 3, 4" on line 2
        Span::new(0, 16, 42, 2)
    }

    #[test]
    fn test_error_creation() {
        let err = CompileError::new(
            ErrorKind::ArityMismatch,
            statement_span(),
            "cannot unpack".to_string(),
        );
        assert_eq!(err.severity, Severity::Error);
        assert!(err.detail.is_none());
        assert!(err.labels.is_empty());
        assert!(err.is_error());
    }

    #[test]
    fn test_warning_keeps_kind() {
        let warn = CompileError::warning(
            ErrorKind::TypeMismatch,
            Span::detached(),
            "lossy conversion".to_string(),
        );
        assert_eq!(warn.severity, Severity::Warning);
        assert_eq!(warn.kind, ErrorKind::TypeMismatch);
        assert!(!warn.is_error());
    }

    #[test]
    fn test_detail_and_chaining() {
        let err = CompileError::new(
            ErrorKind::TypeMismatch,
            Span::detached(),
            "mismatch".to_string(),
        )
        .with_detail(ErrorDetail::Type {
            target_index: 1,
            expected: PrimitiveType::F32.into(),
            found: DataType::vector(PrimitiveType::I32, 3),
        })
        .with_note("unpack the vector first".to_string())
        .with_label(Span::detached(), "target declared here".to_string());

        assert!(matches!(
            err.detail,
            Some(ErrorDetail::Type {
                target_index: 1,
                ..
            })
        ));
        assert_eq!(err.notes.len(), 1);
        assert_eq!(err.labels.len(), 1);
    }

    #[test]
    fn test_stable_tags() {
        assert_eq!(ErrorKind::ArityMismatch.tag(), "ArityMismatch");
        assert_eq!(ErrorKind::TypeMismatch.tag(), "TypeMismatch");
        assert_eq!(ErrorKind::EmptyTargetList.tag(), "EmptyTargetList");
        assert_eq!(ErrorKind::UnsupportedSource.tag(), "UnsupportedSource");
        assert_eq!(ErrorKind::UnsupportedSource.to_string(), "UnsupportedSource");
    }

    #[test]
    fn test_display() {
        let err = CompileError::new(
            ErrorKind::ArityMismatch,
            Span::detached(),
            "cannot unpack 3 values into 2 targets".to_string(),
        );
        assert_eq!(
            err.to_string(),
            "error: arity mismatch: cannot unpack 3 values into 2 targets"
        );
    }

    #[test]
    fn test_formatter_snippet_and_underline() {
        let sources = sources();
        let err = CompileError::new(
            ErrorKind::ArityMismatch,
            statement_span(),
            "cannot unpack 3 values into 2 targets".to_string(),
        )
        .with_note("the number of targets must equal the number of values".to_string());

        let out = DiagnosticFormatter::new(&sources).format(&err);
        assert!(out.starts_with("error: arity mismatch: cannot unpack 3 values into 2 targets"));
        assert!(out.contains("kernel.py:2:5"));
        assert!(out.contains(" 2 |     a[None], b[None] = 2, 3, 4"));
        assert!(out.contains(&format!("   |     {}", "^".repeat(26))));
        assert!(out.contains("= help: the number of targets"));
    }

    #[test]
    fn test_formatter_detached_span() {
        let sources = SourceMap::new();
        let err = CompileError::internal(Span::detached(), "no source");
        let out = DiagnosticFormatter::new(&sources).format(&err);
        assert!(out.contains("<unknown>:1:1"));
        assert!(!out.contains('^'));
    }

    #[test]
    fn test_format_all() {
        let sources = sources();
        let errors = vec![
            CompileError::new(ErrorKind::UndefinedName, statement_span(), "first".to_string()),
            CompileError::new(ErrorKind::UndefinedName, statement_span(), "second".to_string()),
        ];
        let out = DiagnosticFormatter::new(&sources).format_all(&errors);
        assert!(out.contains("first"));
        assert!(out.contains("second"));
    }
}
