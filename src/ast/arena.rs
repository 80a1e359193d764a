//! The AST arena: owns every IR node and hands out typed indices.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::cfg::{BasicBlock, BlockId};
use crate::token::Loc;

use super::decl::{VarDecl, VarKind};
use super::expr::Expr;
use super::lvalue::{LValue, SsaDef};
use super::stmt::{Stmt, StmtKind};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// The position of this node in its arena table.
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id! {
    /// Index of an expression node.
    ExprId
}
arena_id! {
    /// Index of a statement node.
    StmtId
}
arena_id! {
    /// Index of a variable declaration.
    VarId
}
arena_id! {
    /// Index of an SSA definition.
    DefId
}

/// Arena owning all IR nodes for one compile session.
///
/// Construction happens during parsing and the middle-end passes; nothing is
/// freed until the whole arena is dropped. Logically removed nodes (dead
/// statements, eliminated definitions) simply stop being referenced.
#[derive(Debug, Default)]
pub struct Ast {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    vars: Vec<VarDecl>,
    defs: Vec<SsaDef>,
    blocks: Vec<BasicBlock>,

    var_names: IndexMap<String, VarId>,
    label_names: BTreeSet<String>,

    /// Structured program body (until the CFG builder consumes it).
    body: Vec<StmtId>,
    /// Basic blocks in creation order (once the CFG builder has run).
    block_order: Vec<BlockId>,

    title: Option<String>,
    next_synth_label: u32,
}

impl Ast {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- node factories ----

    /// Allocate an expression node.
    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// Allocate a statement node.
    pub fn add_stmt(&mut self, kind: StmtKind) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt::new(kind));
        id
    }

    /// Declare a variable. Returns `None` when the name is already taken.
    pub fn declare_var(
        &mut self,
        name: impl Into<String>,
        loc: Loc,
        kind: VarKind,
    ) -> Option<VarId> {
        let name = name.into();
        if self.var_names.contains_key(&name) {
            return None;
        }
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarDecl::new(name.clone(), loc, kind));
        self.var_names.insert(name, id);
        Some(id)
    }

    /// Look up a variable by name.
    #[must_use]
    pub fn lookup_var(&self, name: &str) -> Option<VarId> {
        self.var_names.get(name).copied()
    }

    /// Register a label name. Returns `false` when it already exists.
    pub fn declare_label(&mut self, name: impl Into<String>) -> bool {
        self.label_names.insert(name.into())
    }

    /// Generate a label name that cannot collide with user labels
    /// (`@` is not lexable in an identifier).
    pub fn fresh_label(&mut self) -> String {
        let name = format!("@{}", self.next_synth_label);
        self.next_synth_label += 1;
        self.label_names.insert(name.clone());
        name
    }

    /// Allocate an empty basic block.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id));
        id
    }

    /// Create a fresh SSA definition for `var` at the given site.
    ///
    /// Bumps the variable's `definition_count` and version counter.
    pub fn new_ssa_def(&mut self, var: VarId, block: BlockId, stmt: StmtId) -> DefId {
        let id = DefId(self.defs.len() as u32);
        let decl = &mut self.vars[var.index()];
        let version = decl.next_version;
        decl.next_version += 1;
        decl.definition_count += 1;
        self.defs.push(SsaDef {
            var,
            version,
            block,
            stmt,
            ref_count: 0,
            constant: None,
        });
        id
    }

    // ---- accessors ----

    /// Immutable access to an expression.
    #[must_use]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Mutable access to an expression.
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    /// Immutable access to a statement.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Mutable access to a statement.
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    /// Immutable access to a declaration.
    #[must_use]
    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.index()]
    }

    /// Mutable access to a declaration.
    pub fn var_mut(&mut self, id: VarId) -> &mut VarDecl {
        &mut self.vars[id.index()]
    }

    /// Immutable access to an SSA definition.
    #[must_use]
    pub fn def(&self, id: DefId) -> &SsaDef {
        &self.defs[id.index()]
    }

    /// Mutable access to an SSA definition.
    pub fn def_mut(&mut self, id: DefId) -> &mut SsaDef {
        &mut self.defs[id.index()]
    }

    /// Immutable access to a basic block.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// Mutable access to a basic block.
    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    /// All declared variables in declaration order.
    pub fn var_ids(&self) -> impl Iterator<Item = VarId> {
        (0..self.vars.len() as u32).map(VarId)
    }

    /// All SSA definitions ever created (including eliminated ones).
    pub fn def_ids(&self) -> impl Iterator<Item = DefId> {
        (0..self.defs.len() as u32).map(DefId)
    }

    /// Number of statements allocated.
    #[must_use]
    pub fn stmt_count(&self) -> usize {
        self.stmts.len()
    }

    /// Number of basic blocks allocated.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // ---- program shape ----

    /// The structured body (valid until the CFG builder consumes it).
    #[must_use]
    pub fn body(&self) -> &[StmtId] {
        &self.body
    }

    /// Replace the structured body.
    pub fn set_body(&mut self, body: Vec<StmtId>) {
        self.body = body;
    }

    /// Basic blocks in creation order, empty before CFG construction.
    #[must_use]
    pub fn block_order(&self) -> &[BlockId] {
        &self.block_order
    }

    /// Install the basic-block sequence, replacing the structured body.
    pub fn set_block_order(&mut self, order: Vec<BlockId>) {
        self.block_order = order;
        self.body.clear();
    }

    /// The entry block, if the CFG has been built.
    #[must_use]
    pub fn entry_block(&self) -> Option<BlockId> {
        self.block_order.first().copied()
    }

    /// Optional program title from the source header.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the program title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    // ---- reference counting ----

    /// Add one to the ref count of every SSA read inside `id`'s subtree.
    pub fn bump_expr_refs(&mut self, id: ExprId) {
        self.adjust_expr_refs(id, true);
    }

    /// Remove one from the ref count of every SSA read inside `id`'s subtree.
    pub fn release_expr_refs(&mut self, id: ExprId) {
        self.adjust_expr_refs(id, false);
    }

    fn adjust_expr_refs(&mut self, id: ExprId, inc: bool) {
        match self.exprs[id.index()].clone() {
            Expr::SsaVar(d) => self.adjust_def_ref(d, inc),
            Expr::Phi(args) => {
                for d in args {
                    self.adjust_def_ref(d, inc);
                }
            }
            Expr::Poly(p) => {
                for d in p.def_occurrences() {
                    self.adjust_def_ref(d, inc);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.adjust_expr_refs(left, inc);
                self.adjust_expr_refs(right, inc);
            }
            Expr::Unary { value, .. } => self.adjust_expr_refs(value, inc),
            Expr::ArrayRead { indices, .. } => {
                for i in indices {
                    self.adjust_expr_refs(i, inc);
                }
            }
            Expr::Int(_) | Expr::Var(_) | Expr::InputInt => {}
        }
    }

    fn adjust_def_ref(&mut self, id: DefId, inc: bool) {
        let def = &mut self.defs[id.index()];
        if inc {
            def.ref_count += 1;
        } else {
            debug_assert!(def.ref_count > 0, "ref count underflow on {:?}", id);
            def.ref_count = def.ref_count.saturating_sub(1);
        }
    }

    /// Replace an expression node, keeping ref counts balanced.
    ///
    /// The old subtree's reads are released and the new node's reads are
    /// counted. Children of the new node must either be fresh or belong to
    /// subtrees not released here.
    pub fn replace_expr(&mut self, id: ExprId, new: Expr) {
        self.release_expr_refs(id);
        self.exprs[id.index()] = new;
        self.bump_expr_refs(id);
    }

    /// Release every SSA read contained in a statement (used when a dead
    /// statement is swept out of a block).
    pub fn release_stmt_refs(&mut self, sid: StmtId) {
        match self.stmts[sid.index()].kind.clone() {
            StmtKind::Let { target, value } => {
                self.release_expr_refs(value);
                if let LValue::Array { indices, .. } = target {
                    for i in indices {
                        self.release_expr_refs(i);
                    }
                }
            }
            StmtKind::Print(e) => self.release_expr_refs(e),
            StmtKind::Input(LValue::Array { indices, .. }) => {
                for i in indices {
                    self.release_expr_refs(i);
                }
            }
            StmtKind::Input(_) => {}
            StmtKind::If { cond, body } => {
                self.release_expr_refs(cond);
                self.release_stmt_refs(body);
            }
            StmtKind::While { cond, body } => {
                self.release_expr_refs(cond);
                for s in body {
                    self.release_stmt_refs(s);
                }
            }
            StmtKind::For {
                lo, hi, step, body, ..
            } => {
                self.release_expr_refs(lo);
                self.release_expr_refs(hi);
                self.release_expr_refs(step);
                for s in body {
                    self.release_stmt_refs(s);
                }
            }
            StmtKind::Goto { .. }
            | StmtKind::Label { .. }
            | StmtKind::Prompt(_)
            | StmtKind::End
            | StmtKind::Rem(_) => {}
        }
    }

    /// The declaration written by an l-value (raw or SSA scalar targets).
    #[must_use]
    pub fn lvalue_var(&self, lv: &LValue) -> Option<VarId> {
        match lv {
            LValue::Var(v) => Some(*v),
            LValue::Ssa(d) => Some(self.def(*d).var),
            LValue::Array { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn declares_and_looks_up_vars() {
        let mut ast = Ast::new();
        let x = ast.declare_var("x", Loc::new(1, 1), VarKind::Int).unwrap();
        assert_eq!(ast.lookup_var("x"), Some(x));
        assert!(ast.declare_var("x", Loc::new(2, 1), VarKind::Int).is_none());
        assert_eq!(ast.lookup_var("y"), None);
    }

    #[test]
    fn synthetic_labels_are_unique_and_registered() {
        let mut ast = Ast::new();
        let a = ast.fresh_label();
        let b = ast.fresh_label();
        assert_ne!(a, b);
        assert!(a.starts_with('@'));
        assert!(!ast.declare_label(a.clone()));
    }

    #[test]
    fn ssa_defs_track_versions_and_counts() {
        let mut ast = Ast::new();
        let x = ast.declare_var("x", Loc::SYNTHETIC, VarKind::Int).unwrap();
        let b = ast.new_block();
        let e = ast.add_expr(Expr::Int(0));
        let s = ast.add_stmt(StmtKind::Print(e));
        let d0 = ast.new_ssa_def(x, b, s);
        let d1 = ast.new_ssa_def(x, b, s);
        assert_eq!(ast.def(d0).version, 0);
        assert_eq!(ast.def(d1).version, 1);
        assert_eq!(ast.var(x).definition_count, 2);
    }

    #[test]
    fn ref_counts_follow_replacement() {
        let mut ast = Ast::new();
        let x = ast.declare_var("x", Loc::SYNTHETIC, VarKind::Int).unwrap();
        let b = ast.new_block();
        let zero = ast.add_expr(Expr::Int(0));
        let s = ast.add_stmt(StmtKind::Print(zero));
        let d = ast.new_ssa_def(x, b, s);

        let read = ast.add_expr(Expr::SsaVar(d));
        ast.bump_expr_refs(read);
        assert_eq!(ast.def(d).ref_count, 1);

        ast.replace_expr(read, Expr::Int(7));
        assert_eq!(ast.def(d).ref_count, 0);
    }
}
