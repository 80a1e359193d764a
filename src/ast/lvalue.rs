//! Assignment targets and SSA definitions.

use crate::cfg::BlockId;

use super::arena::{DefId, ExprId, StmtId, VarId};

/// The left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    /// A scalar target before SSA conversion.
    Var(VarId),
    /// A scalar target after SSA conversion.
    Ssa(DefId),
    /// An array element store. Array cells are never SSA-renamed.
    Array {
        var: VarId,
        indices: Vec<ExprId>,
    },
}

impl LValue {
    /// The underlying declaration for scalar targets (raw or SSA), `None`
    /// for array stores.
    #[must_use]
    pub fn scalar_var(&self, defs: &[SsaDef]) -> Option<VarId> {
        match self {
            LValue::Var(v) => Some(*v),
            LValue::Ssa(d) => Some(defs[d.index()].var),
            LValue::Array { .. } => None,
        }
    }
}

/// A single SSA assignment site.
///
/// One `SsaDef` exists per scalar assignment statement; it is the unique
/// l-value of that statement for the rest of the compile. `ref_count`
/// tracks how many live reads (SSA var reads, phi arguments, polynomial
/// monomials) name this definition.
#[derive(Debug, Clone)]
pub struct SsaDef {
    /// The variable this definition writes.
    pub var: VarId,
    /// SSA version of the variable, assigned at creation and never reused.
    pub version: usize,
    /// Block containing the defining statement.
    pub block: BlockId,
    /// The defining statement.
    pub stmt: StmtId,
    /// Number of live read sites naming this definition.
    pub ref_count: usize,
    /// Known constant value, recorded by the expression folder.
    pub constant: Option<i64>,
}

impl SsaDef {
    /// Record that this definition always holds `value`.
    pub fn set_constant(&mut self, value: i64) {
        self.constant = Some(value);
    }
}
