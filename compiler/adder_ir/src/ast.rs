//! Abstract syntax tree node shapes.
//!
//! Closed tagged unions with exhaustive matching; every node carries a
//! [`SourceRange`]. Construction happens through plain struct literals in
//! the grammar; the shapes carry no validation logic.

use crate::{ConstantValue, SourceRange};

/// Evaluation context of an assignable expression.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprContext {
    Load,
    Store,
    Del,
}

/// Binary arithmetic and bitwise operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

/// Boolean short-circuit operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

/// An expression node.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: SourceRange,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    NamedExpr {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    /// One interpolated fragment of an f-string.
    FormattedValue {
        value: Box<Expr>,
        conversion: Option<char>,
        format_spec: Option<Box<Expr>>,
    },
    /// An interpolated string: literal and formatted fragments in order.
    JoinedStr {
        values: Vec<Expr>,
    },
    Constant {
        value: ConstantValue,
        /// The `u` string-prefix marker, when present.
        kind: Option<String>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        ctx: ExprContext,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
        ctx: ExprContext,
    },
    Starred {
        value: Box<Expr>,
        ctx: ExprContext,
    },
    Name {
        id: String,
        ctx: ExprContext,
    },
    List {
        elts: Vec<Expr>,
        ctx: ExprContext,
    },
    Tuple {
        elts: Vec<Expr>,
        ctx: ExprContext,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, range: SourceRange) -> Self {
        Expr { kind, range }
    }

    /// Classify an expression for diagnostics ("cannot assign to ...").
    pub fn expr_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Attribute { .. } => "attribute",
            ExprKind::Subscript { .. } => "subscript",
            ExprKind::Starred { .. } => "starred",
            ExprKind::Name { .. } => "name",
            ExprKind::Tuple { .. } => "tuple",
            ExprKind::List { .. } => "list",
            ExprKind::Call { .. } => "function call",
            ExprKind::BoolOp { .. } | ExprKind::BinOp { .. } | ExprKind::UnaryOp { .. } => {
                "expression"
            }
            ExprKind::JoinedStr { .. } | ExprKind::FormattedValue { .. } => "f-string expression",
            ExprKind::Constant { value, .. } => value.kind_name(),
            ExprKind::Compare { .. } => "comparison",
            ExprKind::IfExp { .. } => "conditional expression",
            ExprKind::NamedExpr { .. } => "named expression",
            ExprKind::Slice { .. } => "slice",
        }
    }
}

/// A keyword argument in a call: `name=value` (or `**value` when `arg` is
/// absent).
#[derive(Clone, PartialEq, Debug)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
    pub range: SourceRange,
}

/// A single formal parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Arg {
    pub arg: String,
    pub annotation: Option<Expr>,
    pub range: SourceRange,
}

/// Formal parameter list of a function definition.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Arguments {
    pub args: Vec<Arg>,
    /// Defaults align with the tail of `args`.
    pub defaults: Vec<Expr>,
    pub vararg: Option<Arg>,
    pub kwarg: Option<Arg>,
}

/// A statement node.
#[derive(Clone, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: SourceRange,
}

#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    FunctionDef {
        name: String,
        params: Arguments,
        body: Vec<Stmt>,
        returns: Option<Box<Expr>>,
    },
    Return {
        value: Option<Box<Expr>>,
    },
    Delete {
        targets: Vec<Expr>,
    },
    Assign {
        targets: Vec<Expr>,
        value: Box<Expr>,
    },
    For {
        target: Box<Expr>,
        iter: Box<Expr>,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Box<Expr>,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    If {
        test: Box<Expr>,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    Global {
        names: Vec<String>,
    },
    Nonlocal {
        names: Vec<String>,
    },
    ExprStmt {
        value: Box<Expr>,
    },
    Pass,
    Break,
    Continue,
}

impl Stmt {
    pub fn new(kind: StmtKind, range: SourceRange) -> Self {
        Stmt { kind, range }
    }
}

/// A `# type: ignore` pseudo-token archived out of the token stream.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeIgnore {
    pub lineno: u32,
    pub tag: String,
    pub range: SourceRange,
}

/// A parsed top-level unit.
#[derive(Clone, PartialEq, Debug)]
pub enum ModTy {
    Module {
        body: Vec<Stmt>,
        type_ignores: Vec<TypeIgnore>,
        range: SourceRange,
    },
    Interactive {
        body: Vec<Stmt>,
        range: SourceRange,
    },
    Expression {
        body: Box<Expr>,
        range: SourceRange,
    },
}
