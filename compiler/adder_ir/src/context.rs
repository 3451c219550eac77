//! Evaluation-context rewriting.
//!
//! Assignment and deletion targets are parsed as ordinary expressions and
//! then rewritten from Load to Store/Del. The rewrite is a pure function
//! over the closed expression union: interior nodes that need no change are
//! reused by move, and the tree has no cycles so no back-references exist.

use crate::{Expr, ExprContext, ExprKind};

/// Return `expr` with its evaluation context set to `ctx`.
///
/// Containers (tuples, lists, starred) propagate the context to their
/// elements. Expressions that carry no context are returned unchanged;
/// whether they are *legal* targets is the grammar's concern, not this
/// function's.
#[must_use]
pub fn set_context(expr: Expr, ctx: ExprContext) -> Expr {
    let Expr { kind, range } = expr;
    let kind = match kind {
        ExprKind::Name { id, .. } => ExprKind::Name { id, ctx },
        ExprKind::Attribute { value, attr, .. } => ExprKind::Attribute { value, attr, ctx },
        ExprKind::Subscript { value, slice, .. } => ExprKind::Subscript { value, slice, ctx },
        ExprKind::Starred { value, .. } => ExprKind::Starred {
            value: Box::new(set_context(*value, ctx)),
            ctx,
        },
        ExprKind::Tuple { elts, .. } => ExprKind::Tuple {
            elts: elts.into_iter().map(|e| set_context(e, ctx)).collect(),
            ctx,
        },
        ExprKind::List { elts, .. } => ExprKind::List {
            elts: elts.into_iter().map(|e| set_context(e, ctx)).collect(),
            ctx,
        },
        other => other,
    };
    Expr { kind, range }
}
