//! Reference interpreter for lowered kernels.
//!
//! Executes [`KernelIr`] instruction by instruction against a host-owned
//! [`FieldStorage`] and a table of [`HostFunctions`]. It is the semantic
//! reference for backends: evaluation order, casts on store and loop
//! semantics all follow the IR exactly.
//!
//! # Examples
//!
//! ```rust,ignore
//! let mut fields = FieldStorage::new();
//! fields.declare("a", FieldDecl::scalar(PrimitiveType::F32))?;
//! let mut functions = HostFunctions::new();
//! let result = Interpreter::new(&mut fields, &mut functions).run(&kernel_ir, &[])?;
//! ```

mod value;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use indexmap::IndexMap;
use kestrel_ast::ast::BinaryOp;
use kestrel_ast::foundation::{PrimitiveType, TypedConstant};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{Instr, KernelIr, LoweredExpr, Place, TempId};

pub use value::{FieldStorage, Value};

/// Errors raised while executing a kernel.
///
/// Compile-time-detectable misuse never reaches the interpreter; these cover
/// malformed IR and failures of host-provided state.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("temporary {0} read before it was evaluated")]
    UnknownTemp(TempId),

    #[error("unknown local '{0}'")]
    UnknownLocal(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("index {index:?} is out of bounds for field '{field}'")]
    IndexOutOfBounds { field: String, index: Vec<i64> },

    #[error("type error: {0}")]
    TypeError(String),

    #[error("integer division by zero")]
    DivisionByZero,

    #[error("kernel '{kernel}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        kernel: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown host function '{0}'")]
    UnknownFunction(String),

    #[error("host function '{func}' failed: {message}")]
    HostFunction { func: String, message: String },
}

/// Result type for interpreter operations.
pub type InterpretResult<T> = Result<T, InterpretError>;

type HostFn = Box<dyn FnMut(&[Value]) -> Result<Value, String>>;

/// Host functions callable from kernels, by name.
#[derive(Default)]
pub struct HostFunctions {
    functions: IndexMap<String, HostFn>,
}

impl HostFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: FnMut(&[Value]) -> Result<Value, String> + 'static,
    {
        self.functions.insert(name.into(), Box::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn call(&mut self, name: &str, args: &[Value]) -> InterpretResult<Value> {
        let f = self
            .functions
            .get_mut(name)
            .ok_or_else(|| InterpretError::UnknownFunction(name.to_string()))?;
        f(args).map_err(|message| InterpretError::HostFunction {
            func: name.to_string(),
            message,
        })
    }
}

impl std::fmt::Debug for HostFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.functions.keys()).finish()
    }
}

enum Flow {
    Next,
    Return(Value),
}

/// Per-launch interpreter state.
pub struct Interpreter<'a> {
    fields: &'a mut FieldStorage,
    functions: &'a mut HostFunctions,
    temps: Vec<Option<Value>>,
    locals: HashMap<String, Value>,
}

impl<'a> Interpreter<'a> {
    pub fn new(fields: &'a mut FieldStorage, functions: &'a mut HostFunctions) -> Self {
        Self {
            fields,
            functions,
            temps: Vec::new(),
            locals: HashMap::new(),
        }
    }

    /// Launch a kernel with positional arguments.
    ///
    /// Arguments are converted to the declared parameter types. Returns the
    /// value of the first `Return` executed, if any.
    pub fn run(&mut self, kernel: &KernelIr, args: &[Value]) -> InterpretResult<Option<Value>> {
        if args.len() != kernel.params.len() {
            return Err(InterpretError::ArgumentCount {
                kernel: kernel.name.clone(),
                expected: kernel.params.len(),
                actual: args.len(),
            });
        }

        debug!(kernel = %kernel.name, args = args.len(), "launching kernel");

        self.temps = vec![None; kernel.temp_count as usize];
        self.locals.clear();
        for ((name, ty), arg) in kernel.params.iter().zip(args) {
            let value = match ty.element_type() {
                Some(p) if arg.fits(ty) => arg.cast(p)?,
                _ => {
                    return Err(InterpretError::TypeError(format!(
                        "argument '{name}' expects {ty}, got {arg}"
                    )))
                }
            };
            self.locals.insert(name.clone(), value);
        }

        let result = match self.exec_block(&kernel.body)? {
            Flow::Return(value) => match kernel.ret.as_ref().and_then(|t| t.element_type()) {
                Some(p) => Some(value.cast(p)?),
                None => Some(value),
            },
            Flow::Next => None,
        };
        debug!(kernel = %kernel.name, "kernel finished");
        Ok(result)
    }

    fn exec_block(&mut self, body: &[Instr]) -> InterpretResult<Flow> {
        for instr in body {
            if let Flow::Return(value) = self.exec(instr)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, instr: &Instr) -> InterpretResult<Flow> {
        match instr {
            Instr::Eval { dest, value, .. } => {
                let v = self.eval(value)?;
                trace!(temp = %dest, value = %v, "eval");
                let slot = self
                    .temps
                    .get_mut(dest.0 as usize)
                    .ok_or(InterpretError::UnknownTemp(*dest))?;
                *slot = Some(v);
            }
            Instr::Store { src, place, cast } => {
                let mut v = self.temp(*src)?.clone();
                if let Some(ty) = cast {
                    v = v.cast(*ty)?;
                }
                trace!(place = %place, value = %v, "store");
                match place {
                    Place::FieldElement { field, index } => self.fields.set(field, index, v)?,
                    Place::Local(name) => {
                        self.locals.insert(name.clone(), v);
                    }
                }
            }
            Instr::Loop {
                var,
                start,
                end,
                body,
            } => {
                let start = self.eval_index(start)?;
                let end = self.eval_index(end)?;
                for i in start..end {
                    self.locals
                        .insert(var.clone(), Value::Scalar(TypedConstant::i32(i as i32)));
                    if let Flow::Return(value) = self.exec_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Instr::Return(value) => return Ok(Flow::Return(self.eval(value)?)),
        }
        Ok(Flow::Next)
    }

    fn temp(&self, id: TempId) -> InterpretResult<&Value> {
        self.temps
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(InterpretError::UnknownTemp(id))
    }

    fn eval_index(&mut self, expr: &LoweredExpr) -> InterpretResult<i64> {
        match self.eval(expr)? {
            Value::Scalar(c) => Ok(c.as_i64()),
            other => Err(InterpretError::TypeError(format!(
                "loop bound must be a scalar, got {other}"
            ))),
        }
    }

    fn eval(&mut self, expr: &LoweredExpr) -> InterpretResult<Value> {
        Ok(match expr {
            LoweredExpr::Const(c) => Value::Scalar(*c),
            LoweredExpr::Temp(id) => self.temp(*id)?.clone(),
            LoweredExpr::Load(Place::FieldElement { field, index }) => {
                self.fields.get(field, index)?
            }
            LoweredExpr::Load(Place::Local(name)) => self
                .locals
                .get(name)
                .cloned()
                .ok_or_else(|| InterpretError::UnknownLocal(name.clone()))?,
            LoweredExpr::Tuple(items) => Value::Tuple(self.eval_all(items)?),
            LoweredExpr::Vector(items) => {
                Value::Vector(scalars(self.eval_all(items)?, "vector component")?)
            }
            LoweredExpr::Matrix {
                rows,
                cols,
                elements,
            } => Value::Matrix {
                rows: *rows,
                cols: *cols,
                data: scalars(self.eval_all(elements)?, "matrix component")?,
            },
            LoweredExpr::Component { base, index } => {
                let base = self.eval(base)?;
                component(base, *index)?
            }
            LoweredExpr::Cast { ty, value } => self.eval(value)?.cast(*ty)?,
            LoweredExpr::Binary { op, ty, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, *ty, &lhs, &rhs)?
            }
            LoweredExpr::Call { func, args } => {
                let args = self.eval_all(args)?;
                self.functions.call(func, &args)?
            }
        })
    }

    /// Evaluate operands strictly left to right.
    fn eval_all(&mut self, items: &[LoweredExpr]) -> InterpretResult<Vec<Value>> {
        items.iter().map(|e| self.eval(e)).collect()
    }
}

fn scalars(values: Vec<Value>, what: &str) -> InterpretResult<Vec<TypedConstant>> {
    values
        .into_iter()
        .map(|v| {
            v.as_scalar()
                .ok_or_else(|| InterpretError::TypeError(format!("{what} must be a scalar, got {v}")))
        })
        .collect()
}

fn component(base: Value, index: usize) -> InterpretResult<Value> {
    let len;
    let item = match base {
        Value::Vector(items) => {
            len = items.len();
            items.get(index).copied().map(Value::Scalar)
        }
        Value::Tuple(mut items) => {
            len = items.len();
            (index < len).then(|| items.swap_remove(index))
        }
        other => {
            return Err(InterpretError::TypeError(format!(
                "cannot take component {index} of {other}"
            )))
        }
    };
    item.ok_or_else(|| InterpretError::TypeError(format!("component {index} out of range for length {len}")))
}

fn binary(op: BinaryOp, ty: PrimitiveType, lhs: &Value, rhs: &Value) -> InterpretResult<Value> {
    match (lhs, rhs) {
        (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(scalar_op(op, ty, *a, *b)?)),
        (Value::Vector(a), Value::Vector(b)) if a.len() == b.len() => Ok(Value::Vector(
            a.iter()
                .zip(b)
                .map(|(x, y)| scalar_op(op, ty, *x, *y))
                .collect::<InterpretResult<_>>()?,
        )),
        _ => Err(InterpretError::TypeError(format!(
            "unsupported operands for '{}': {lhs} and {rhs}",
            op.symbol()
        ))),
    }
}

fn scalar_op(
    op: BinaryOp,
    ty: PrimitiveType,
    a: TypedConstant,
    b: TypedConstant,
) -> InterpretResult<TypedConstant> {
    let (a, b) = (a.cast(ty), b.cast(ty));
    if ty.is_real() {
        let (x, y) = (a.as_f64(), b.as_f64());
        let r = match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
        };
        Ok(TypedConstant::float(ty, r))
    } else {
        let (x, y) = (a.as_i64(), b.as_i64());
        let r = match op {
            BinaryOp::Add => x.wrapping_add(y),
            BinaryOp::Sub => x.wrapping_sub(y),
            BinaryOp::Mul => x.wrapping_mul(y),
            BinaryOp::Div => {
                if y == 0 {
                    return Err(InterpretError::DivisionByZero);
                }
                x.wrapping_div(y)
            }
        };
        Ok(TypedConstant::int(ty, r))
    }
}
