//! Arity and type validation.
//!
//! Pairs targets with source elements. An arity failure short-circuits;
//! when the counts agree every pair is checked and all type errors of the
//! statement are reported together.

use indexmap::IndexMap;
use kestrel_ast::error::{CompileError, ErrorKind};
use kestrel_ast::foundation::{DataType, PrimitiveType, Span};
use kestrel_ir::Place;

use super::classify::{SourceDescriptor, SourceElement};
use super::collect::ResolvedTarget;
use crate::resolve::diagnostics::{
    arity_mismatch, matrix_not_unpackable, type_mismatch, unsupported_source,
};

/// One validated `(element → target)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub place: Place,
    pub element: SourceElement,
    /// Element-wise conversion applied on store
    pub cast: Option<PrimitiveType>,
    /// Type of the local this store declares, if it declares one
    pub declares: Option<DataType>,
}

pub fn validate(
    targets: &[ResolvedTarget],
    descriptor: &SourceDescriptor,
    span: Span,
) -> Result<Vec<Assignment>, Vec<CompileError>> {
    let m = targets.len();
    let elements: Vec<&SourceElement> = match descriptor {
        SourceDescriptor::Singular(e) if m == 1 => vec![e],
        SourceDescriptor::Singular(e) if e.ty.is_matrix() => {
            return Err(vec![matrix_not_unpackable(span, m, &e.ty)]);
        }
        SourceDescriptor::Singular(e) => {
            return Err(vec![arity_mismatch(span, m, 1, &e.ty.kind_name())]);
        }
        SourceDescriptor::Unsupported(e) if m == 1 => vec![e],
        SourceDescriptor::Unsupported(e) => {
            return Err(vec![unsupported_source(span, m, &e.ty.kind_name())]);
        }
        SourceDescriptor::Tuple(u)
        | SourceDescriptor::FixedVector(u)
        | SourceDescriptor::ShapeTuple(u) => {
            if u.elements.len() != m {
                return Err(vec![arity_mismatch(
                    span,
                    m,
                    u.elements.len(),
                    &descriptor.kind_name(),
                )]);
            }
            u.elements.iter().collect()
        }
    };

    // Locals declared earlier in this same statement
    let mut pending: IndexMap<&str, DataType> = IndexMap::new();
    let mut assignments = Vec::with_capacity(m);
    let mut errors = Vec::new();

    for (i, (target, element)) in targets.iter().zip(elements).enumerate() {
        let declared = match (&target.ty, &target.place) {
            (Some(ty), _) => Some(ty.clone()),
            (None, Place::Local(name)) => pending.get(name.as_str()).cloned(),
            (None, Place::FieldElement { .. }) => None,
        };

        match declared {
            Some(expected) => {
                if !element.ty.assignable_to(&expected) {
                    errors.push(type_mismatch(target.target.span, i, &expected, &element.ty));
                    continue;
                }
                assignments.push(Assignment {
                    place: target.place.clone(),
                    element: element.clone(),
                    cast: store_cast(&element.ty, &expected),
                    declares: None,
                });
            }
            None => {
                if !matches!(
                    element.ty,
                    DataType::Primitive(_) | DataType::Vector { .. } | DataType::Matrix { .. }
                ) {
                    errors.push(CompileError::new(
                        ErrorKind::TypeMismatch,
                        target.target.span,
                        format!(
                            "cannot bind {} to local target {i}",
                            element.ty.kind_name()
                        ),
                    ));
                    continue;
                }
                if let Place::Local(name) = &target.place {
                    pending.insert(name.as_str(), element.ty.clone());
                }
                assignments.push(Assignment {
                    place: target.place.clone(),
                    element: element.clone(),
                    cast: None,
                    declares: Some(element.ty.clone()),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(assignments)
    } else {
        Err(errors)
    }
}

/// Conversion needed to store a `from` value into a `to` slot.
pub fn store_cast(from: &DataType, to: &DataType) -> Option<PrimitiveType> {
    match (from.element_type(), to.element_type()) {
        (Some(f), Some(t)) if f != t => Some(t),
        _ => None,
    }
}
