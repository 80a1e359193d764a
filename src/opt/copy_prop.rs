//! Copy propagation.
//!
//! A copy is a `let` whose RHS is exactly one SSA read. Every other read of
//! the copy's definition is redirected to the source definition — in plain
//! SSA reads, in phi argument sets, and inside polynomial monomials. The
//! copy itself then has no readers left and dead-code elimination removes
//! it on the next round. Phi expressions are never copy sources; a phi
//! that collapsed to a single argument is first rewritten into a copy by
//! the redundant-variable pass.

use tracing::trace;

use crate::ast::{Ast, DefId, Expr, ExprId, LValue, StmtId, StmtKind};

/// Propagate all copies found in live code. Returns whether any read was
/// redirected.
pub fn propagate_copies(ast: &mut Ast) -> bool {
    let mut copies: Vec<(DefId, DefId)> = Vec::new();
    for &b in ast.block_order() {
        if ast.block(b).deleted {
            continue;
        }
        for &sid in &ast.block(b).stmts {
            if ast.stmt(sid).dead {
                continue;
            }
            let StmtKind::Let {
                target: LValue::Ssa(def),
                value,
            } = &ast.stmt(sid).kind
            else {
                continue;
            };
            if let Expr::SsaVar(source) = ast.expr(*value) {
                copies.push((*def, *source));
            }
        }
    }

    let mut changed = false;
    for (def, source) in copies {
        trace!(?def, ?source, "propagating copy");
        changed |= redirect_reads(ast, def, source);
    }
    changed
}

/// Replace every read of `from` with a read of `to` across live code.
fn redirect_reads(ast: &mut Ast, from: DefId, to: DefId) -> bool {
    let mut changed = false;
    for &b in &ast.block_order().to_vec() {
        if ast.block(b).deleted {
            continue;
        }
        for sid in ast.block(b).stmts.clone() {
            if ast.stmt(sid).dead {
                continue;
            }
            changed |= redirect_stmt(ast, sid, from, to);
        }
    }
    changed
}

fn redirect_stmt(ast: &mut Ast, sid: StmtId, from: DefId, to: DefId) -> bool {
    let mut changed = false;
    match ast.stmt(sid).kind.clone() {
        StmtKind::Let { target, value } => {
            // leave the copy's own RHS alone: it reads the source, and the
            // defining statement of `from` must keep its single read
            let is_the_copy = matches!(&target, LValue::Ssa(d) if *d == from);
            if !is_the_copy {
                changed |= redirect_expr(ast, value, from, to);
            }
            if let LValue::Array { indices, .. } = target {
                for i in indices {
                    changed |= redirect_expr(ast, i, from, to);
                }
            }
        }
        StmtKind::Print(e) => changed |= redirect_expr(ast, e, from, to),
        StmtKind::Input(LValue::Array { indices, .. }) => {
            for i in indices {
                changed |= redirect_expr(ast, i, from, to);
            }
        }
        StmtKind::If { cond, body } => {
            changed |= redirect_expr(ast, cond, from, to);
            changed |= redirect_stmt(ast, body, from, to);
        }
        _ => {}
    }
    changed
}

fn redirect_expr(ast: &mut Ast, e: ExprId, from: DefId, to: DefId) -> bool {
    match ast.expr(e).clone() {
        Expr::SsaVar(d) if d == from => {
            ast.replace_expr(e, Expr::SsaVar(to));
            true
        }
        Expr::Phi(args) if args.contains(&from) => {
            let renamed: std::collections::BTreeSet<_> = args
                .into_iter()
                .map(|d| if d == from { to } else { d })
                .collect();
            ast.replace_expr(e, Expr::Phi(renamed));
            true
        }
        Expr::Poly(p) if p.mentions(from) => {
            ast.replace_expr(e, Expr::Poly(p.rename_def(from, to)));
            true
        }
        Expr::Binary { left, right, .. } => {
            let mut changed = redirect_expr(ast, left, from, to);
            changed |= redirect_expr(ast, right, from, to);
            changed
        }
        Expr::Unary { value, .. } => redirect_expr(ast, value, from, to),
        Expr::ArrayRead { indices, .. } => {
            let mut changed = false;
            for i in indices {
                changed |= redirect_expr(ast, i, from, to);
            }
            changed
        }
        _ => false,
    }
}
