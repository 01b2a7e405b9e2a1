//! Facts available while resolving a kernel.

use indexmap::IndexMap;
use kestrel_ast::foundation::{DataType, FieldDecl, FunctionSig, HostValue};

use crate::config::ResolveOptions;

/// What the host program knows at compile time: its fields, the module-level
/// values a kernel may capture, and the functions a kernel may call.
#[derive(Debug, Clone, Default)]
pub struct HostFacts {
    pub fields: IndexMap<String, FieldDecl>,
    pub globals: IndexMap<String, HostValue>,
    pub functions: IndexMap<String, FunctionSig>,
}

impl HostFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, decl: FieldDecl) -> Self {
        self.fields.insert(name.into(), decl);
        self
    }

    pub fn with_global(mut self, name: impl Into<String>, value: HostValue) -> Self {
        self.globals.insert(name.into(), value);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, sig: FunctionSig) -> Self {
        self.functions.insert(name.into(), sig);
        self
    }
}

/// Resolution state for one kernel.
///
/// Locals are declared in order and rebinding keeps the first type. A loop
/// body opens a nested scope: names first bound inside it are dropped when the
/// loop ends (see [`ResolveContext::enter_scope`]).
#[derive(Debug)]
pub struct ResolveContext<'a> {
    pub host: &'a HostFacts,
    pub options: &'a ResolveOptions,
    locals: IndexMap<String, DataType>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(host: &'a HostFacts, options: &'a ResolveOptions) -> Self {
        Self {
            host,
            options,
            locals: IndexMap::new(),
        }
    }

    pub fn local(&self, name: &str) -> Option<&DataType> {
        self.locals.get(name)
    }

    /// Bind `name` with `ty` unless it is already declared.
    pub fn declare_local(&mut self, name: impl Into<String>, ty: DataType) {
        self.locals.entry(name.into()).or_insert(ty);
    }

    /// Mark the current set of locals before resolving a nested block.
    pub fn enter_scope(&self) -> usize {
        self.locals.len()
    }

    /// Forget every local declared since `mark`.
    pub fn exit_scope(&mut self, mark: usize) {
        self.locals.truncate(mark);
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.host.fields.get(name)
    }

    pub fn global(&self, name: &str) -> Option<&HostValue> {
        self.host.globals.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSig> {
        self.host.functions.get(name)
    }

    /// Static type a captured host value takes inside a kernel.
    pub fn host_value_type(&self, value: &HostValue) -> DataType {
        match value {
            HostValue::Int(_) => self.options.default_int.into(),
            HostValue::Float(_) => self.options.default_float.into(),
            HostValue::Sequence(items) => {
                DataType::Tuple(items.iter().map(|v| self.host_value_type(v)).collect())
            }
            HostValue::Opaque(what) => DataType::opaque(what.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::foundation::PrimitiveType;

    #[test]
    fn test_first_declaration_wins() {
        let host = HostFacts::new();
        let options = ResolveOptions::default();
        let mut ctx = ResolveContext::new(&host, &options);
        ctx.declare_local("x", PrimitiveType::F32.into());
        ctx.declare_local("x", PrimitiveType::I32.into());
        assert_eq!(ctx.local("x"), Some(&PrimitiveType::F32.into()));
    }

    #[test]
    fn test_exit_scope_drops_inner_locals() {
        let host = HostFacts::new();
        let options = ResolveOptions::default();
        let mut ctx = ResolveContext::new(&host, &options);
        ctx.declare_local("outer", PrimitiveType::F32.into());
        let mark = ctx.enter_scope();
        ctx.declare_local("outer", PrimitiveType::I32.into());
        ctx.declare_local("inner", PrimitiveType::I32.into());
        ctx.exit_scope(mark);
        assert_eq!(ctx.local("outer"), Some(&PrimitiveType::F32.into()));
        assert_eq!(ctx.local("inner"), None);
    }

    #[test]
    fn test_host_value_types_follow_options() {
        let host = HostFacts::new();
        let options = ResolveOptions {
            default_int: PrimitiveType::I64,
            ..ResolveOptions::default()
        };
        let ctx = ResolveContext::new(&host, &options);
        let value = HostValue::Sequence(vec![HostValue::Int(1), HostValue::Float(2.5)]);
        assert_eq!(
            ctx.host_value_type(&value),
            DataType::Tuple(vec![PrimitiveType::I64.into(), PrimitiveType::F32.into()])
        );
        assert_eq!(
            ctx.host_value_type(&HostValue::Opaque("host dict".to_string())),
            DataType::opaque("host dict")
        );
    }
}
