//! Basic blocks and reaching-definition sets.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ast::{DefId, StmtId, VarId};

/// Unique identifier for a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    /// The entry block id (the builder always creates it first).
    pub const ENTRY: BlockId = BlockId(0);

    /// The position of this block in the arena table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// A reaching-definition set: for each scalar variable, the SSA definitions
/// that may be live at a program point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarDefSet {
    defs: BTreeMap<VarId, BTreeSet<DefId>>,
}

impl VarDefSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.defs.clear();
    }

    /// A definition kills every other definition of its variable.
    pub fn replace_definition(&mut self, var: VarId, def: DefId) {
        let set = self.defs.entry(var).or_default();
        set.clear();
        set.insert(def);
    }

    /// Replace the whole set for a variable.
    pub fn set_defs(&mut self, var: VarId, defs: BTreeSet<DefId>) {
        if defs.is_empty() {
            self.defs.remove(&var);
        } else {
            self.defs.insert(var, defs);
        }
    }

    /// Merge another set into this one (set union per variable).
    pub fn union_with(&mut self, other: &VarDefSet) {
        for (&var, defs) in &other.defs {
            if defs.is_empty() {
                continue;
            }
            self.defs.entry(var).or_default().extend(defs.iter().copied());
        }
    }

    /// The definitions reaching for one variable.
    #[must_use]
    pub fn defs_for(&self, var: VarId) -> Option<&BTreeSet<DefId>> {
        self.defs.get(&var)
    }

    /// Iterate over all (variable, definitions) entries.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &BTreeSet<DefId>)> {
        self.defs.iter().map(|(&v, s)| (v, s))
    }

    /// Whether no definitions are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// A basic block: a maximal straight-line statement sequence with one entry
/// and one exit.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    /// Stable identifier, assigned in creation order.
    pub id: BlockId,
    /// Statements in execution order. Only the final statement may transfer
    /// control (`goto`, conditional goto, or `end`).
    pub stmts: Vec<StmtId>,
    /// Blocks control can flow to.
    pub successors: BTreeSet<BlockId>,
    /// Blocks control can arrive from.
    pub predecessors: BTreeSet<BlockId>,
    /// Reaching definitions at block entry.
    pub var_def_in: VarDefSet,
    /// Reaching definitions at block exit.
    pub var_def_out: VarDefSet,
    /// Set when the block is pruned as unreachable.
    pub deleted: bool,
    /// Fall-through target, if the block can reach the lexically next block.
    pub direct_successor: Option<BlockId>,
}

impl Default for BlockId {
    fn default() -> Self {
        BlockId::ENTRY
    }
}

impl BasicBlock {
    /// Create an empty block.
    #[must_use]
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Whether the block holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_definition_kills_previous() {
        let mut set = VarDefSet::new();
        let v = VarId(0);
        set.replace_definition(v, DefId(0));
        set.replace_definition(v, DefId(1));
        let defs = set.defs_for(v).unwrap();
        assert_eq!(defs.len(), 1);
        assert!(defs.contains(&DefId(1)));
    }

    #[test]
    fn union_merges_per_variable() {
        let v = VarId(0);
        let mut a = VarDefSet::new();
        a.replace_definition(v, DefId(0));
        let mut b = VarDefSet::new();
        b.replace_definition(v, DefId(1));

        a.union_with(&b);
        assert_eq!(a.defs_for(v).unwrap().len(), 2);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let v0 = VarId(0);
        let v1 = VarId(1);
        let mut a = VarDefSet::new();
        a.replace_definition(v0, DefId(0));
        a.replace_definition(v1, DefId(1));
        let mut b = VarDefSet::new();
        b.replace_definition(v1, DefId(1));
        b.replace_definition(v0, DefId(0));
        assert_eq!(a, b);
    }

    #[test]
    fn block_id_display() {
        assert_eq!(BlockId(4).to_string(), "B4");
    }
}
