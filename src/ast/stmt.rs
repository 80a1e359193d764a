//! Statement nodes.

use crate::cfg::BlockId;
use crate::token::Loc;

use super::arena::{ExprId, StmtId};
use super::lvalue::LValue;

/// A statement plus the bookkeeping shared by every statement kind.
#[derive(Debug, Clone)]
pub struct Stmt {
    /// The statement itself.
    pub kind: StmtKind,
    /// Set by the dead-code eliminator; physical removal happens in a sweep.
    pub dead: bool,
}

impl Stmt {
    /// Create a live statement.
    #[must_use]
    pub fn new(kind: StmtKind) -> Self {
        Self { kind, dead: false }
    }

    /// Mark this statement dead.
    pub fn mark_dead(&mut self) {
        self.dead = true;
    }
}

/// Statement kinds.
///
/// `While` and `For` exist only between parsing and the parser's structured
/// lowering; the CFG builder rejects them.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Assignment.
    Let { target: LValue, value: ExprId },
    /// Unconditional jump. `block` is filled in during CFG label resolution.
    Goto {
        label: String,
        loc: Loc,
        block: Option<BlockId>,
    },
    /// Jump target.
    Label { name: String, loc: Loc },
    /// Conditional with a single-statement body and no else.
    If { cond: ExprId, body: StmtId },
    /// Pre-lowering structured loop.
    While { cond: ExprId, body: Vec<StmtId> },
    /// Pre-lowering counted loop with optional step (defaults to 1).
    For {
        var: LValue,
        lo: ExprId,
        hi: ExprId,
        step: ExprId,
        body: Vec<StmtId>,
    },
    /// Print an integer followed by a newline.
    Print(ExprId),
    /// Emit a string to the terminal without a newline.
    Prompt(String),
    /// Read a decimal integer into an array element.
    ///
    /// Scalar `input` is desugared by the parser into a `Let` whose RHS is
    /// [`super::Expr::InputInt`], so it participates in SSA renaming.
    Input(LValue),
    /// Program terminator.
    End,
    /// Comment; no effect.
    Rem(String),
}

impl StmtKind {
    /// Whether this statement unconditionally leaves the block (nothing
    /// after it in the same block can execute).
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(self, StmtKind::Goto { .. } | StmtKind::End)
    }
}
