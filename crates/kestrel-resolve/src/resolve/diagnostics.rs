//! Diagnostic accumulation and the destructuring error constructors.
//!
//! [`Diagnostics`] is the only state that crosses statements while a kernel
//! is resolved. It applies the configured [`DiagnosticPolicy`] and error cap;
//! the constructors below give each destructuring failure a stable kind,
//! structured detail and wording.

use kestrel_ast::error::{CompileError, ErrorDetail, ErrorKind};
use kestrel_ast::foundation::{DataType, Span};
use tracing::warn;

use crate::config::{DiagnosticPolicy, ResolveOptions};

/// Error list for one kernel.
#[derive(Debug)]
pub struct Diagnostics {
    policy: DiagnosticPolicy,
    max_errors: Option<usize>,
    errors: Vec<CompileError>,
    dropped: usize,
}

impl Diagnostics {
    pub fn new(options: &ResolveOptions) -> Self {
        Self {
            policy: options.policy,
            max_errors: options.max_errors,
            errors: Vec::new(),
            dropped: 0,
        }
    }

    pub fn report(&mut self, error: CompileError) {
        if self.is_full() {
            if self.dropped == 0 {
                warn!(
                    cap = self.errors.len(),
                    "error cap reached, further diagnostics are dropped"
                );
            }
            self.dropped += 1;
            return;
        }
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = CompileError>) {
        for error in errors {
            self.report(error);
        }
    }

    fn is_full(&self) -> bool {
        self.max_errors.is_some_and(|cap| self.errors.len() >= cap)
    }

    /// Whether the driver should stop visiting statements.
    pub fn should_stop(&self) -> bool {
        match self.policy {
            DiagnosticPolicy::StopAtFirst => self.has_errors(),
            DiagnosticPolicy::Accumulate => self.is_full(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(CompileError::is_error)
    }

    /// Number of diagnostics discarded because of the error cap.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_errors(self) -> Vec<CompileError> {
        self.errors
    }
}

/// `targets` targets, `actual` source elements.
pub fn arity_mismatch(span: Span, targets: usize, actual: usize, source_kind: &str) -> CompileError {
    let message = if actual == 1 {
        format!("cannot unpack a {source_kind} into {targets} targets")
    } else {
        format!("cannot unpack {actual} values into {targets} targets")
    };
    CompileError::new(ErrorKind::ArityMismatch, span, message)
        .with_detail(ErrorDetail::Arity {
            expected: targets,
            actual,
        })
        .with_note(format!(
            "the target list expects {targets} values, the source provides {actual}"
        ))
}

/// Arity error for a matrix source, which is never unpacked whatever its size.
pub fn matrix_not_unpackable(span: Span, targets: usize, matrix: &DataType) -> CompileError {
    arity_mismatch(span, targets, 1, &matrix.kind_name()).with_note(
        "matrices are never unpacked; index their components explicitly".to_string(),
    )
}

pub fn type_mismatch(
    span: Span,
    target_index: usize,
    expected: &DataType,
    found: &DataType,
) -> CompileError {
    CompileError::new(
        ErrorKind::TypeMismatch,
        span,
        format!("cannot assign {found} to target {target_index} of type {expected}"),
    )
    .with_detail(ErrorDetail::Type {
        target_index,
        expected: expected.clone(),
        found: found.clone(),
    })
}

pub fn empty_target_list(span: Span) -> CompileError {
    CompileError::new(
        ErrorKind::EmptyTargetList,
        span,
        "assignment has no targets".to_string(),
    )
}

pub fn unsupported_source(span: Span, targets: usize, actual_kind: &str) -> CompileError {
    CompileError::new(
        ErrorKind::UnsupportedSource,
        span,
        format!("cannot unpack {actual_kind} into {targets} targets"),
    )
    .with_detail(ErrorDetail::Source {
        actual_kind: actual_kind.to_string(),
    })
    .with_note(
        "only tuples, fixed-size vectors and field shapes can be unpacked".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::foundation::PrimitiveType;

    fn error(n: usize) -> CompileError {
        empty_target_list(Span::new(0, n as u32, n as u32 + 1, 1))
    }

    #[test]
    fn test_accumulate_keeps_going() {
        let mut diags = Diagnostics::new(&ResolveOptions::default());
        diags.report(error(0));
        assert!(!diags.should_stop());
        diags.report(error(1));
        assert_eq!(diags.into_errors().len(), 2);
    }

    #[test]
    fn test_stop_at_first() {
        let mut diags = Diagnostics::new(&ResolveOptions::default().stop_at_first());
        assert!(!diags.should_stop());
        diags.report(error(0));
        assert!(diags.should_stop());
    }

    #[test]
    fn test_cap_drops_extra_errors() {
        let options = ResolveOptions {
            max_errors: Some(2),
            ..ResolveOptions::default()
        };
        let mut diags = Diagnostics::new(&options);
        diags.extend((0..5).map(error));
        assert!(diags.should_stop());
        assert_eq!(diags.dropped(), 3);
        assert_eq!(diags.into_errors().len(), 2);
    }

    #[test]
    fn test_arity_wording() {
        let err = arity_mismatch(Span::detached(), 2, 3, "3-tuple");
        assert_eq!(err.message, "cannot unpack 3 values into 2 targets");
        assert_eq!(
            err.detail,
            Some(ErrorDetail::Arity {
                expected: 2,
                actual: 3
            })
        );

        let err = arity_mismatch(Span::detached(), 2, 1, "scalar");
        assert_eq!(err.message, "cannot unpack a scalar into 2 targets");
    }

    #[test]
    fn test_matrix_note() {
        let err = matrix_not_unpackable(
            Span::detached(),
            4,
            &DataType::matrix(PrimitiveType::I32, 2, 2),
        );
        assert_eq!(err.kind, ErrorKind::ArityMismatch);
        assert_eq!(err.message, "cannot unpack a 2x2 matrix into 4 targets");
        assert!(err.notes.iter().any(|n| n.contains("never unpacked")));
    }
}
