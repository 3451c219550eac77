//! Diagnostic-pass-only analyses.
//!
//! These productions exist solely to detect and report specific malformed
//! constructs. The optimistic pass never runs them; the driver enables
//! them for the recovery re-parse so the single reported diagnostic names
//! the precise offender.

use adder_ir::{CmpOp, Expr, ExprKind, Stmt};

use crate::Parser;

/// What kind of target position an expression appeared in.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum TargetsType {
    StarTargets,
    DelTargets,
    ForTargets,
}

/// Locate the subexpression that makes `expr` invalid as a target, if any.
///
/// Containers recurse into their elements; names, attributes and
/// subscripts are fine; anything else is its own offender.
pub(crate) fn invalid_target(expr: &Expr, targets_type: TargetsType) -> Option<&Expr> {
    match &expr.kind {
        ExprKind::List { elts, .. } | ExprKind::Tuple { elts, .. } => elts
            .iter()
            .find_map(|child| invalid_target(child, targets_type)),
        ExprKind::Starred { value, .. } => {
            if targets_type == TargetsType::DelTargets {
                return Some(expr);
            }
            invalid_target(value, targets_type)
        }
        ExprKind::Compare { ops, left, .. } => {
            if targets_type == TargetsType::ForTargets {
                if ops.first() == Some(&CmpOp::In) {
                    return invalid_target(left, targets_type);
                }
                return None;
            }
            Some(expr)
        }
        ExprKind::Name { .. } | ExprKind::Subscript { .. } | ExprKind::Attribute { .. } => None,
        _ => Some(expr),
    }
}

impl<'e> Parser<'e> {
    /// Report an invalid assignment/deletion target, naming the offending
    /// subexpression when one can be located.
    pub(crate) fn raise_invalid_target<T>(
        &mut self,
        targets_type: TargetsType,
        expr: &Expr,
    ) -> Option<T> {
        if let Some(invalid) = invalid_target(expr, targets_type) {
            let message = match targets_type {
                TargetsType::StarTargets | TargetsType::ForTargets => {
                    format!("cannot assign to {}", invalid.expr_name())
                }
                TargetsType::DelTargets => format!("cannot delete {}", invalid.expr_name()),
            };
            let range = invalid.range;
            return self.raise_syntax_error_known_location(range, &message);
        }
        self.raise_syntax_error("invalid syntax")
    }

    /// A malformed parameter list: report at the token that broke it.
    pub(crate) fn invalid_parameters(&mut self) -> Option<Stmt> {
        self.raise_syntax_error("invalid syntax")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adder_ir::{ConstantValue, ExprContext, SourceRange};

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, SourceRange::new(1, 0, 1, 1))
    }

    fn name(id: &str) -> Expr {
        expr(ExprKind::Name {
            id: id.to_string(),
            ctx: ExprContext::Load,
        })
    }

    #[test]
    fn names_and_attributes_are_valid_targets() {
        assert!(invalid_target(&name("x"), TargetsType::StarTargets).is_none());
        let attr = expr(ExprKind::Attribute {
            value: Box::new(name("a")),
            attr: "b".to_string(),
            ctx: ExprContext::Load,
        });
        assert!(invalid_target(&attr, TargetsType::StarTargets).is_none());
    }

    #[test]
    fn literals_are_invalid_targets() {
        let lit = expr(ExprKind::Constant {
            value: ConstantValue::Int(1),
            kind: None,
        });
        let found = invalid_target(&lit, TargetsType::StarTargets);
        assert!(found.is_some());
    }

    #[test]
    fn tuple_recursion_finds_nested_offender() {
        let call = expr(ExprKind::Call {
            func: Box::new(name("f")),
            args: Vec::new(),
            keywords: Vec::new(),
        });
        let tuple = expr(ExprKind::Tuple {
            elts: vec![name("a"), call],
            ctx: ExprContext::Load,
        });
        let found = invalid_target(&tuple, TargetsType::StarTargets);
        assert!(matches!(found.map(|e| &e.kind), Some(ExprKind::Call { .. })));
    }

    #[test]
    fn starred_is_invalid_for_del() {
        let starred = expr(ExprKind::Starred {
            value: Box::new(name("a")),
            ctx: ExprContext::Load,
        });
        assert!(invalid_target(&starred, TargetsType::DelTargets).is_some());
        assert!(invalid_target(&starred, TargetsType::StarTargets).is_none());
    }
}
