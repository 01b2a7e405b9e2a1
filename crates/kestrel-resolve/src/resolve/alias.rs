//! Static alias resolution pass
//!
//! Binds kernel-local names to host fields at compile time and substitutes
//! them, so later passes only ever see real field names.
//!
//! # What This Pass Does
//!
//! 1. **Binds aliases** - `c, d = static(b, a)` maps `c → b` and `d → a`
//! 2. **Substitutes references** - `c[None]`, `c.shape` and handle uses of `c`
//!    in later statements become references to `b`
//! 3. **Removes bind statements** - they produce no code
//!
//! All sources of one binding are resolved before any of its names are bound,
//! so `a, b = static(b, a)` swaps the two names rather than chaining them.
//!
//! # Pipeline Position
//!
//! ```text
//! Kernel AST → Alias Resolution → Typing / Unpack / Lowering
//!                    ^^^^^^
//!                 YOU ARE HERE
//! ```

use indexmap::IndexMap;
use kestrel_ast::ast::{Expr, ExprKind, Kernel, Stmt, StmtKind, Target, TargetKind};
use kestrel_ast::error::{CompileError, ErrorKind};
use tracing::trace;

use super::context::HostFacts;
use super::diagnostics::{arity_mismatch, unsupported_source};

/// Name → field substitutions in effect at a point in the kernel body.
#[derive(Debug, Default)]
struct Aliases {
    map: IndexMap<String, String>,
}

impl Aliases {
    fn resolve(&self, name: &mut String) {
        if let Some(field) = self.map.get(name.as_str()) {
            *name = field.clone();
        }
    }

    fn expr(&self, mut expr: Expr) -> Expr {
        if !self.map.is_empty() {
            expr.rename_fields(&mut |name| self.resolve(name));
        }
        expr
    }

    fn target(&self, mut target: Target) -> Target {
        if let TargetKind::FieldElement { field, .. } = &mut target.kind {
            self.resolve(field);
        }
        target
    }
}

/// Substitute every static alias in `kernel` and drop the bind statements.
pub fn resolve_aliases(kernel: &Kernel, host: &HostFacts) -> Result<Kernel, Vec<CompileError>> {
    let mut aliases = Aliases::default();
    let mut errors = Vec::new();
    let body = resolve_block(&kernel.body, host, &mut aliases, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(Kernel {
        body,
        ..kernel.clone()
    })
}

fn resolve_block(
    body: &[Stmt],
    host: &HostFacts,
    aliases: &mut Aliases,
    errors: &mut Vec<CompileError>,
) -> Vec<Stmt> {
    let mut out = Vec::with_capacity(body.len());
    for stmt in body {
        let kind = match &stmt.kind {
            StmtKind::StaticBind { names, sources } => {
                match bind(stmt, names, sources, host, aliases) {
                    Ok(bound) => {
                        for (name, field) in bound {
                            trace!(alias = %name, field = %field, "static alias");
                            aliases.map.insert(name, field);
                        }
                    }
                    Err(e) => errors.extend(e),
                }
                continue;
            }
            StmtKind::Assign { target, value } => StmtKind::Assign {
                target: aliases.target(target.clone()),
                value: aliases.expr(value.clone()),
            },
            StmtKind::Unpack { targets, source } => StmtKind::Unpack {
                targets: targets.iter().cloned().map(|t| aliases.target(t)).collect(),
                source: aliases.expr(source.clone()),
            },
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => StmtKind::For {
                var: var.clone(),
                start: aliases.expr(start.clone()),
                end: aliases.expr(end.clone()),
                body: resolve_block(body, host, aliases, errors),
            },
            StmtKind::Return(value) => StmtKind::Return(aliases.expr(value.clone())),
        };
        out.push(Stmt::new(kind, stmt.span));
    }
    out
}

/// Resolve one binding's sources to field names, before any name is bound.
fn bind(
    stmt: &Stmt,
    names: &[String],
    sources: &[Expr],
    host: &HostFacts,
    aliases: &Aliases,
) -> Result<Vec<(String, String)>, Vec<CompileError>> {
    if names.is_empty() {
        return Err(vec![CompileError::new(
            ErrorKind::EmptyTargetList,
            stmt.span,
            "static binding has no names".to_string(),
        )]);
    }
    if names.len() != sources.len() {
        let kind = format!("{}-tuple", sources.len());
        return Err(vec![arity_mismatch(
            stmt.span,
            names.len(),
            sources.len(),
            &kind,
        )]);
    }

    let mut bound = Vec::with_capacity(names.len());
    let mut errors = Vec::new();
    for (name, source) in names.iter().zip(sources) {
        let source = aliases.expr(source.clone());
        match &source.kind {
            ExprKind::FieldHandle(field) if host.fields.contains_key(field) => {
                bound.push((name.clone(), field.clone()));
            }
            ExprKind::FieldHandle(field) => errors.push(CompileError::new(
                ErrorKind::UndefinedName,
                source.span,
                format!("undefined field '{field}'"),
            )),
            _ => errors.push(
                unsupported_source(source.span, names.len(), &format!("expression `{source}`"))
                    .with_note("static bindings only accept field handles".to_string()),
            ),
        }
    }
    if errors.is_empty() {
        Ok(bound)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ast::ast::build::*;
    use kestrel_ast::foundation::{FieldDecl, PrimitiveType};

    fn host() -> HostFacts {
        HostFacts::new()
            .with_field("a", FieldDecl::scalar(PrimitiveType::F32))
            .with_field("b", FieldDecl::scalar(PrimitiveType::F32))
    }

    #[test]
    fn test_bindings_are_substituted_and_removed() {
        let kernel = Kernel::new(
            "k",
            vec![
                static_bind(&["c", "d"], vec![handle("b"), handle("a")]),
                unpack(
                    vec![elem_target("c", &[]), elem_target("d", &[])],
                    tuple(vec![elem("d", &[]), elem("c", &[])]),
                ),
            ],
        );
        let resolved = resolve_aliases(&kernel, &host()).unwrap();
        assert_eq!(
            resolved.body,
            vec![unpack(
                vec![elem_target("b", &[]), elem_target("a", &[])],
                tuple(vec![elem("a", &[]), elem("b", &[])]),
            )]
        );
    }

    #[test]
    fn test_sources_resolve_before_names_bind() {
        let kernel = Kernel::new(
            "k",
            vec![
                static_bind(&["a", "b"], vec![handle("b"), handle("a")]),
                assign(elem_target("a", &[]), lit_f32(1.0)),
            ],
        );
        let resolved = resolve_aliases(&kernel, &host()).unwrap();
        assert_eq!(
            resolved.body,
            vec![assign(elem_target("b", &[]), lit_f32(1.0))]
        );
    }

    #[test]
    fn test_alias_of_alias() {
        let kernel = Kernel::new(
            "k",
            vec![
                static_bind(&["c"], vec![handle("a")]),
                static_bind(&["e"], vec![handle("c")]),
                ret(elem("e", &[])),
            ],
        );
        let resolved = resolve_aliases(&kernel, &host()).unwrap();
        assert_eq!(resolved.body, vec![ret(elem("a", &[]))]);
    }

    #[test]
    fn test_binding_arity_mismatch() {
        let kernel = Kernel::new(
            "k",
            vec![static_bind(&["c", "d"], vec![handle("a")])],
        );
        let errors = resolve_aliases(&kernel, &host()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ArityMismatch);
    }

    #[test]
    fn test_binding_requires_field_handles() {
        let kernel = Kernel::new(
            "k",
            vec![static_bind(&["c", "d"], vec![lit_i32(1), handle("zz")])],
        );
        let errors = resolve_aliases(&kernel, &host()).unwrap_err();
        let kinds: Vec<ErrorKind> = errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ErrorKind::UnsupportedSource, ErrorKind::UndefinedName]
        );
    }
}
