//! Runtime values and field storage for the reference interpreter.

use indexmap::IndexMap;
use kestrel_ast::foundation::{DataType, FieldDecl, PrimitiveType, TypedConstant};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{InterpretError, InterpretResult};

/// A value produced while executing a kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Scalar(TypedConstant),
    Vector(Vec<TypedConstant>),
    Matrix {
        rows: u8,
        cols: u8,
        /// Row-major components
        data: Vec<TypedConstant>,
    },
    Tuple(Vec<Value>),
}

impl Value {
    /// Zero value of a storable type.
    pub fn zero(ty: &DataType) -> Option<Value> {
        match ty {
            DataType::Primitive(p) => Some(Value::Scalar(TypedConstant::zero(*p))),
            DataType::Vector { elem, n } => {
                Some(Value::Vector(vec![TypedConstant::zero(*elem); *n as usize]))
            }
            DataType::Matrix { elem, rows, cols } => Some(Value::Matrix {
                rows: *rows,
                cols: *cols,
                data: vec![TypedConstant::zero(*elem); *rows as usize * *cols as usize],
            }),
            DataType::Tuple(_) | DataType::Opaque(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<TypedConstant> {
        match self {
            Value::Scalar(c) => Some(*c),
            _ => None,
        }
    }

    /// Convert every numeric component to `ty`.
    pub fn cast(&self, ty: PrimitiveType) -> InterpretResult<Value> {
        Ok(match self {
            Value::Scalar(c) => Value::Scalar(c.cast(ty)),
            Value::Vector(items) => Value::Vector(items.iter().map(|c| c.cast(ty)).collect()),
            Value::Matrix { rows, cols, data } => Value::Matrix {
                rows: *rows,
                cols: *cols,
                data: data.iter().map(|c| c.cast(ty)).collect(),
            },
            Value::Tuple(_) => {
                return Err(InterpretError::TypeError(format!(
                    "cannot convert a tuple to {ty}"
                )))
            }
        })
    }

    /// Whether this value has the structure `ty` requires (ignoring element type).
    pub fn fits(&self, ty: &DataType) -> bool {
        match (self, ty) {
            (Value::Scalar(_), DataType::Primitive(_)) => true,
            (Value::Vector(items), DataType::Vector { n, .. }) => items.len() == *n as usize,
            (Value::Matrix { rows, cols, .. }, DataType::Matrix { rows: r, cols: c, .. }) => {
                rows == r && cols == c
            }
            _ => false,
        }
    }
}

impl From<TypedConstant> for Value {
    fn from(c: TypedConstant) -> Self {
        Value::Scalar(c)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(c) => write!(f, "{c}"),
            Value::Vector(items) => {
                let items: Vec<String> = items.iter().map(|c| c.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Matrix { rows, cols, data } => {
                let items: Vec<String> = data.iter().map(|c| c.to_string()).collect();
                write!(f, "{rows}x{cols}[{}]", items.join(", "))
            }
            Value::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", items.join(", "))
            }
        }
    }
}

/// Dense storage for one field.
#[derive(Debug, Clone)]
struct FieldData {
    decl: FieldDecl,
    slots: Vec<Value>,
}

/// Host-owned field containers, addressed by name.
#[derive(Debug, Clone, Default)]
pub struct FieldStorage {
    fields: IndexMap<String, FieldData>,
}

impl FieldStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zero-initialized field. Replaces any field with the same name.
    pub fn declare(&mut self, name: impl Into<String>, decl: FieldDecl) -> InterpretResult<()> {
        let name = name.into();
        let zero = Value::zero(&decl.element).ok_or_else(|| {
            InterpretError::TypeError(format!(
                "field '{name}' cannot hold values of type {}",
                decl.element
            ))
        })?;
        let slots = vec![zero; decl.shape.slot_count()];
        self.fields.insert(name, FieldData { decl, slots });
        Ok(())
    }

    pub fn decl(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.get(name).map(|f| &f.decl)
    }

    /// Declarations of every field, in declaration order.
    pub fn decls(&self) -> impl Iterator<Item = (&str, &FieldDecl)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), &f.decl))
    }

    fn slot(&self, name: &str, index: &[i64]) -> InterpretResult<(&FieldData, usize)> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| InterpretError::UnknownField(name.to_string()))?;
        let offset =
            field
                .decl
                .shape
                .linear_index(index)
                .ok_or_else(|| InterpretError::IndexOutOfBounds {
                    field: name.to_string(),
                    index: index.to_vec(),
                })?;
        Ok((field, offset))
    }

    pub fn get(&self, name: &str, index: &[i64]) -> InterpretResult<Value> {
        let (field, offset) = self.slot(name, index)?;
        Ok(field.slots[offset].clone())
    }

    /// Write a slot, converting to the field's element type.
    pub fn set(&mut self, name: &str, index: &[i64], value: Value) -> InterpretResult<()> {
        let (field, offset) = self.slot(name, index)?;
        let element = field.decl.element.clone();
        if !value.fits(&element) {
            return Err(InterpretError::TypeError(format!(
                "cannot store {value} into field '{name}' of {element}"
            )));
        }
        let value = match element.element_type() {
            Some(ty) => value.cast(ty)?,
            None => value,
        };
        if let Some(field) = self.fields.get_mut(name) {
            field.slots[offset] = value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::foundation::Shape;

    #[test]
    fn test_declare_zero_initializes() {
        let mut storage = FieldStorage::new();
        storage
            .declare("d", FieldDecl::new(PrimitiveType::F32, vec![2, 3]))
            .unwrap();
        assert_eq!(
            storage.get("d", &[1, 2]).unwrap(),
            Value::Scalar(TypedConstant::f32(0.0))
        );
    }

    #[test]
    fn test_set_converts_to_element_type() {
        let mut storage = FieldStorage::new();
        storage
            .declare("a", FieldDecl::scalar(PrimitiveType::F32))
            .unwrap();
        storage
            .set("a", &[], Value::Scalar(TypedConstant::i32(2)))
            .unwrap();
        assert_eq!(
            storage.get("a", &[]).unwrap(),
            Value::Scalar(TypedConstant::f32(2.0))
        );
    }

    #[test]
    fn test_out_of_bounds_and_unknown() {
        let mut storage = FieldStorage::new();
        storage
            .declare("a", FieldDecl::new(PrimitiveType::I32, Shape::new(vec![4])))
            .unwrap();
        assert!(matches!(
            storage.get("a", &[4]),
            Err(InterpretError::IndexOutOfBounds { .. })
        ));
        assert!(matches!(
            storage.get("missing", &[]),
            Err(InterpretError::UnknownField(_))
        ));
    }

    #[test]
    fn test_set_rejects_wrong_structure() {
        let mut storage = FieldStorage::new();
        storage
            .declare("a", FieldDecl::scalar(PrimitiveType::F32))
            .unwrap();
        let err = storage
            .set("a", &[], Value::Vector(vec![TypedConstant::f32(1.0)]))
            .unwrap_err();
        assert!(matches!(err, InterpretError::TypeError(_)));
    }

    #[test]
    fn test_tuple_fields_rejected() {
        let mut storage = FieldStorage::new();
        let decl = FieldDecl::new(DataType::Tuple(vec![]), Shape::scalar());
        assert!(storage.declare("t", decl).is_err());
    }
}
