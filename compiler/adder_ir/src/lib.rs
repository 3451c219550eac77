//! Shared data model for the Adder frontend.
//!
//! Tokens, source ranges, decoded constants and the syntax-tree catalogue
//! consumed by the parser and downstream phases.

mod ast;
mod constant;
mod context;
mod source_range;
mod token;

pub use ast::{
    Arg, Arguments, BoolOp, CmpOp, Expr, ExprContext, ExprKind, Keyword, ModTy, Operator, Stmt,
    StmtKind, TypeIgnore, UnaryOp,
};
pub use constant::ConstantValue;
pub use context::set_context;
pub use source_range::SourceRange;
pub use token::{Token, TokenKind};

/// Compile-time size assertion for frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}
