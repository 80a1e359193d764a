//! Phi materialization and read renaming.
//!
//! After SSA construction every scalar read is bound to the definition that
//! reaches it. Walking each block top-down, the active definition for a
//! variable is the latest local write, or the block's in-set: a single
//! reaching definition is used directly, two or more materialize a phi
//! definition at the top of the block carrying exactly the reaching set.
//! Reads with an empty reaching set stay raw and are handled by default
//! initialization after the optimizer.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{Ast, DefId, Expr, ExprId, LValue, StmtId, StmtKind, VarId};
use crate::cfg::BlockId;

/// Materialize phi definitions and rewrite scalar reads to SSA reads.
pub fn build_phi_nodes(ast: &mut Ast) {
    let mut phi_count = 0usize;
    for b in ast.block_order().to_vec() {
        let mut ctx = BlockCtx {
            block: b,
            active: BTreeMap::new(),
            phis: Vec::new(),
        };

        for sid in ast.block(b).stmts.clone() {
            rewrite_stmt_reads(ast, sid, &mut ctx);
            record_write(ast, sid, &mut ctx.active);
        }

        if ctx.phis.is_empty() {
            continue;
        }
        phi_count += ctx.phis.len();

        // phis sit at the top of the block, after a leading label if any
        let insert_at = usize::from(matches!(
            ast.block(b).stmts.first().map(|&s| &ast.stmt(s).kind),
            Some(StmtKind::Label { .. })
        ));
        let phis = ctx.phis;
        ast.block_mut(b)
            .stmts
            .splice(insert_at..insert_at, phis);
    }
    debug!(phis = phi_count, "phi nodes materialized");
}

struct BlockCtx {
    block: BlockId,
    /// Latest definition per variable at the current walk position.
    active: BTreeMap<VarId, DefId>,
    /// Phi statements created for this block, in creation order.
    phis: Vec<StmtId>,
}

fn rewrite_stmt_reads(ast: &mut Ast, sid: StmtId, ctx: &mut BlockCtx) {
    match ast.stmt(sid).kind.clone() {
        StmtKind::Let { target, value } => {
            self_indices(ast, &target, ctx);
            rewrite_expr_reads(ast, value, ctx);
        }
        StmtKind::Input(target) => self_indices(ast, &target, ctx),
        StmtKind::Print(e) => rewrite_expr_reads(ast, e, ctx),
        StmtKind::If { cond, body } => {
            rewrite_expr_reads(ast, cond, ctx);
            rewrite_stmt_reads(ast, body, ctx);
        }
        _ => {}
    }
}

fn self_indices(ast: &mut Ast, target: &LValue, ctx: &mut BlockCtx) {
    if let LValue::Array { indices, .. } = target {
        for &i in indices {
            rewrite_expr_reads(ast, i, ctx);
        }
    }
}

fn rewrite_expr_reads(ast: &mut Ast, e: ExprId, ctx: &mut BlockCtx) {
    match ast.expr(e).clone() {
        Expr::Var(v) => {
            if let Some(def) = resolve_read(ast, v, ctx) {
                ast.replace_expr(e, Expr::SsaVar(def));
            }
        }
        Expr::Binary { left, right, .. } => {
            rewrite_expr_reads(ast, left, ctx);
            rewrite_expr_reads(ast, right, ctx);
        }
        Expr::Unary { value, .. } => rewrite_expr_reads(ast, value, ctx),
        Expr::ArrayRead { indices, .. } => {
            for i in indices {
                rewrite_expr_reads(ast, i, ctx);
            }
        }
        _ => {}
    }
}

/// The definition a read of `v` observes at the current walk position, or
/// `None` when no definition reaches it.
fn resolve_read(ast: &mut Ast, v: VarId, ctx: &mut BlockCtx) -> Option<DefId> {
    if let Some(&def) = ctx.active.get(&v) {
        return Some(def);
    }

    let reaching: Vec<DefId> = ast
        .block(ctx.block)
        .var_def_in
        .defs_for(v)
        .map(|s| s.iter().copied().collect())
        .unwrap_or_default();

    match reaching.len() {
        0 => None,
        1 => {
            let def = reaching[0];
            ctx.active.insert(v, def);
            Some(def)
        }
        _ => {
            let phi_expr = ast.add_expr(Expr::Phi(reaching.iter().copied().collect()));
            let sid = ast.add_stmt(StmtKind::Let {
                target: LValue::Var(v),
                value: phi_expr,
            });
            let def = ast.new_ssa_def(v, ctx.block, sid);
            if let StmtKind::Let { target, .. } = &mut ast.stmt_mut(sid).kind {
                *target = LValue::Ssa(def);
            }
            // each phi argument is a read of that definition
            ast.bump_expr_refs(phi_expr);

            ast.block_mut(ctx.block)
                .var_def_in
                .set_defs(v, std::iter::once(def).collect());
            ctx.phis.push(sid);
            ctx.active.insert(v, def);
            Some(def)
        }
    }
}

fn record_write(ast: &Ast, sid: StmtId, active: &mut BTreeMap<VarId, DefId>) {
    match &ast.stmt(sid).kind {
        StmtKind::Let {
            target: LValue::Ssa(d),
            ..
        }
        | StmtKind::Input(LValue::Ssa(d)) => {
            active.insert(ast.def(*d).var, *d);
        }
        StmtKind::If { body, .. } => record_write(ast, *body, active),
        _ => {}
    }
}
