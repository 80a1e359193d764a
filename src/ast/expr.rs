//! Expression nodes and operators.

use std::collections::BTreeSet;
use std::fmt;

use crate::poly::Polynomial;

use super::arena::{DefId, ExprId, VarId};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Whether this operator is a comparison.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    /// The comparison with the opposite truth value, if any.
    ///
    /// Arithmetic operators have no inverse; lowering a branch over one
    /// raises [`crate::error::CompileError::NonInvertibleCondition`].
    #[must_use]
    pub fn inverse(self) -> Option<BinOp> {
        Some(match self {
            BinOp::Eq => BinOp::Ne,
            BinOp::Ne => BinOp::Eq,
            BinOp::Lt => BinOp::Ge,
            BinOp::Le => BinOp::Gt,
            BinOp::Gt => BinOp::Le,
            BinOp::Ge => BinOp::Lt,
            _ => return None,
        })
    }

    /// Evaluate the operator on constant operands.
    ///
    /// Arithmetic wraps around in two's complement. Division truncates
    /// toward zero and modulus takes the sign of the dividend (the native
    /// `i64` semantics). Comparisons yield 0 or 1.
    ///
    /// Returns `None` for division or modulo by zero.
    #[must_use]
    pub fn eval(self, a: i64, b: i64) -> Option<i64> {
        Some(match self {
            BinOp::Add => a.wrapping_add(b),
            BinOp::Sub => a.wrapping_sub(b),
            BinOp::Mul => a.wrapping_mul(b),
            BinOp::Div => {
                if b == 0 {
                    return None;
                }
                a.wrapping_div(b)
            }
            BinOp::Mod => {
                if b == 0 {
                    return None;
                }
                a.wrapping_rem(b)
            }
            BinOp::Eq => i64::from(a == b),
            BinOp::Ne => i64::from(a != b),
            BinOp::Lt => i64::from(a < b),
            BinOp::Le => i64::from(a <= b),
            BinOp::Gt => i64::from(a > b),
            BinOp::Ge => i64::from(a >= b),
        })
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        };
        f.write_str(op)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Identity.
    Plus,
    /// Arithmetic negation.
    Neg,
}

impl UnaryOp {
    /// Evaluate on a constant operand, wrapping on overflow.
    #[must_use]
    pub fn eval(self, v: i64) -> i64 {
        match self {
            UnaryOp::Plus => v,
            UnaryOp::Neg => v.wrapping_neg(),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
        })
    }
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal integer.
    Int(i64),
    /// A canonical polynomial produced by the expression folder.
    Poly(Polynomial),
    /// Raw scalar variable read (pre-SSA, or never reached by a definition).
    Var(VarId),
    /// Scalar read of a specific SSA definition.
    SsaVar(DefId),
    /// Array element read with one subscript per declared dimension.
    ArrayRead {
        var: VarId,
        indices: Vec<ExprId>,
    },
    /// Terminal integer read. Side-effecting; never folded.
    InputInt,
    /// Binary operation.
    Binary {
        op: BinOp,
        left: ExprId,
        right: ExprId,
    },
    /// Unary operation.
    Unary { op: UnaryOp, value: ExprId },
    /// Merge of the definitions reaching a join point.
    Phi(BTreeSet<DefId>),
}

impl Expr {
    /// The literal value, if this node is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::Int(v) => Some(*v),
            _ => None,
        }
    }
}
