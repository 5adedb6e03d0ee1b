use crate::types::CellError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A parsed formula tree. Trees are never deep-cloned on cell mutation —
/// they're always held behind `Arc` by the owning [`crate::domain::Cell`] —
/// so cloning `Expr` here is only ever a shallow structural copy for the
/// handful of transforms (rename, translate) that must build a new tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Expr {
    Number(Decimal),
    Text(String),
    Bool(bool),
    ErrorLiteral(CellError),

    CellRef {
        /// `None` means unqualified; resolved against the containing cell's
        /// own sheet at evaluation and dependency-extraction time.
        sheet: Option<String>,
        col: u32,
        row: u32,
        col_locked: bool,
        row_locked: bool,
    },

    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },

    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// An explicitly parenthesised subexpression. Precedence alone can't
    /// tell us whether the author wrote `(a + b) * c` or some equivalent
    /// without parens, so the parser records it as its own node and
    /// stringify re-emits the parens verbatim.
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOp {
    Plus,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Negate => "-",
        }
    }
}
