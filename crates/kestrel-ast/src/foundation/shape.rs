//! Extents of field containers.
//!
//! A field is a dense multi-dimensional container of slots. Its [`Shape`]
//! lists the extent of each axis; a rank-0 shape is a single slot addressed
//! with an empty index (`a[None]` in host syntax).
//!
//! # Examples
//!
//! ```
//! # use kestrel_ast::foundation::shape::*;
//! let scalar = Shape::scalar();
//! assert_eq!(scalar.rank(), 0);
//! assert_eq!(scalar.slot_count(), 1);
//!
//! let grid = Shape::new(vec![2, 3, 4]);
//! assert_eq!(grid.rank(), 3);
//! assert_eq!(grid.slot_count(), 24);
//! assert_eq!(grid.linear_index(&[1, 2, 3]), Some(23));
//! assert_eq!(grid.linear_index(&[2, 0, 0]), None);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-axis extents of a field, axis 0 first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape {
    dims: Vec<u32>,
}

impl Shape {
    pub fn new(dims: Vec<u32>) -> Self {
        Self { dims }
    }

    /// Rank-0 shape holding exactly one slot.
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    /// Total number of slots (1 for rank 0).
    pub fn slot_count(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }

    /// Row-major offset of `index`, or `None` if it has the wrong rank or
    /// any coordinate is out of range.
    pub fn linear_index(&self, index: &[i64]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        for (&i, &extent) in index.iter().zip(&self.dims) {
            if i < 0 || i >= extent as i64 {
                return None;
            }
            offset = offset * extent as usize + i as usize;
        }
        Some(offset)
    }

    pub fn contains(&self, index: &[i64]) -> bool {
        self.linear_index(index).is_some()
    }
}

impl From<Vec<u32>> for Shape {
    fn from(dims: Vec<u32>) -> Self {
        Shape::new(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        if self.dims.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape_addresses_empty_index() {
        let s = Shape::scalar();
        assert_eq!(s.linear_index(&[]), Some(0));
        assert_eq!(s.linear_index(&[0]), None);
    }

    #[test]
    fn test_row_major_offsets() {
        let s = Shape::new(vec![2, 3]);
        assert_eq!(s.linear_index(&[0, 0]), Some(0));
        assert_eq!(s.linear_index(&[0, 2]), Some(2));
        assert_eq!(s.linear_index(&[1, 0]), Some(3));
        assert_eq!(s.linear_index(&[1, 2]), Some(5));
        assert!(!s.contains(&[-1, 0]));
        assert!(!s.contains(&[0, 3]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::new(vec![8]).to_string(), "(8,)");
        assert_eq!(Shape::new(vec![2, 3, 4]).to_string(), "(2, 3, 4)");
    }
}
