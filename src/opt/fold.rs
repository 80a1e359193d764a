//! Expression folding.
//!
//! A bottom-up rewrite over every live expression: literal operands fold to
//! literals, reads of constant-valued definitions become literals, and the
//! additive/multiplicative operators fuse into canonical polynomials. A
//! `let` whose RHS becomes a literal records the value on its SSA
//! definition; an `if` whose condition becomes a literal is replaced by its
//! body or marked dead, with the corresponding CFG edge dropped.

use tracing::trace;

use crate::ast::{Ast, BinOp, Expr, ExprId, LValue, StmtId, StmtKind, UnaryOp};
use crate::cfg::BlockId;
use crate::error::{CompileError, Result};
use crate::poly::Polynomial;

/// Fold expressions across the whole program. Returns whether anything
/// changed.
///
/// # Errors
///
/// Fails on a constant division by zero or a constant out-of-bounds array
/// subscript.
pub fn fold_expressions(ast: &mut Ast) -> Result<bool> {
    let mut changed = false;
    for b in ast.block_order().to_vec() {
        if ast.block(b).deleted {
            continue;
        }
        for sid in ast.block(b).stmts.clone() {
            if ast.stmt(sid).dead {
                continue;
            }
            changed |= fold_stmt(ast, b, sid)?;
        }
    }
    Ok(changed)
}

fn fold_stmt(ast: &mut Ast, block: BlockId, sid: StmtId) -> Result<bool> {
    let mut changed = false;
    match ast.stmt(sid).kind.clone() {
        StmtKind::Let { target, value } => {
            if let LValue::Array { indices, .. } = &target {
                for &i in indices {
                    changed |= fold_expr(ast, i)?;
                }
            }
            changed |= fold_expr(ast, value)?;
            if let (LValue::Ssa(def), Expr::Int(v)) = (&target, ast.expr(value)) {
                let def = *def;
                let v = *v;
                if ast.def(def).constant != Some(v) {
                    ast.def_mut(def).set_constant(v);
                    trace!(value = v, "definition folded to a constant");
                    changed = true;
                }
            }
        }
        StmtKind::Print(e) => changed |= fold_expr(ast, e)?,
        StmtKind::Input(LValue::Array { indices, .. }) => {
            for i in indices {
                changed |= fold_expr(ast, i)?;
            }
        }
        StmtKind::If { cond, body } => {
            changed |= fold_expr(ast, cond)?;
            if let Expr::Int(v) = *ast.expr(cond) {
                fold_branch(ast, block, sid, body, v != 0);
                changed = true;
            }
        }
        _ => {}
    }
    Ok(changed)
}

/// Resolve a conditional branch whose condition folded to a literal.
///
/// Taken: the `if` is replaced by its body (an unconditional goto) and the
/// fall-through edge is dropped. Not taken: the `if` is marked dead and the
/// taken edge is dropped.
fn fold_branch(ast: &mut Ast, block: BlockId, sid: StmtId, body: StmtId, taken: bool) {
    let target = match &ast.stmt(body).kind {
        StmtKind::Goto {
            block: Some(t), ..
        } => Some(*t),
        _ => None,
    };

    if taken {
        let body_kind = ast.stmt(body).kind.clone();
        ast.stmt_mut(sid).kind = body_kind;
        if let Some(next) = ast.block(block).direct_successor {
            if Some(next) != target {
                remove_edge(ast, block, next);
            }
            ast.block_mut(block).direct_successor = None;
        }
    } else {
        ast.stmt_mut(sid).mark_dead();
        if let Some(t) = target {
            if ast.block(block).direct_successor != Some(t) {
                remove_edge(ast, block, t);
            }
        }
    }
}

fn remove_edge(ast: &mut Ast, from: BlockId, to: BlockId) {
    ast.block_mut(from).successors.remove(&to);
    ast.block_mut(to).predecessors.remove(&from);
}

/// Fold one expression bottom-up. Returns whether the subtree changed.
fn fold_expr(ast: &mut Ast, e: ExprId) -> Result<bool> {
    let mut changed = false;
    match ast.expr(e).clone() {
        Expr::Binary { op, left, right } => {
            changed |= fold_expr(ast, left)?;
            changed |= fold_expr(ast, right)?;

            if let (Expr::Int(a), Expr::Int(b)) = (ast.expr(left), ast.expr(right)) {
                let value = op.eval(*a, *b).ok_or(CompileError::DivisionByZero)?;
                ast.replace_expr(e, Expr::Int(value));
                return Ok(true);
            }

            if matches!(op, BinOp::Add | BinOp::Sub | BinOp::Mul) {
                if let (Some(l), Some(r)) = (as_polynomial(ast, left), as_polynomial(ast, right))
                {
                    let fused = match op {
                        BinOp::Add => l.add(&r),
                        BinOp::Sub => l.sub(&r),
                        _ => l.mul(&r),
                    };
                    install_polynomial(ast, e, fused);
                    return Ok(true);
                }
            }
            Ok(changed)
        }
        Expr::Unary { op, value } => {
            changed |= fold_expr(ast, value)?;
            if let Expr::Int(v) = *ast.expr(value) {
                ast.replace_expr(e, Expr::Int(op.eval(v)));
                return Ok(true);
            }
            if let Some(p) = as_polynomial(ast, value) {
                let p = match op {
                    UnaryOp::Plus => p,
                    UnaryOp::Neg => p.neg(),
                };
                install_polynomial(ast, e, p);
                return Ok(true);
            }
            Ok(changed)
        }
        Expr::SsaVar(def) => {
            if let Some(v) = ast.def(def).constant {
                ast.replace_expr(e, Expr::Int(v));
                return Ok(true);
            }
            Ok(false)
        }
        Expr::Poly(p) => {
            // a definition may have become constant after the polynomial
            // was built
            let mut substituted = p.clone();
            for def in p.def_occurrences() {
                if let Some(v) = ast.def(def).constant {
                    substituted = substituted.substitute_const(def, v);
                }
            }
            if substituted != p {
                install_polynomial(ast, e, substituted);
                return Ok(true);
            }
            Ok(false)
        }
        Expr::ArrayRead { var, indices } => {
            for &i in &indices {
                changed |= fold_expr(ast, i)?;
            }
            check_bounds(ast, var, &indices)?;
            Ok(changed)
        }
        Expr::Int(_) | Expr::Var(_) | Expr::InputInt | Expr::Phi(_) => Ok(false),
    }
}

/// A constant subscript must stay inside the declared extent.
fn check_bounds(ast: &Ast, var: crate::ast::VarId, indices: &[ExprId]) -> Result<()> {
    let decl = ast.var(var);
    for (&index, &extent) in indices.iter().zip(decl.extents()) {
        if let Expr::Int(v) = ast.expr(index) {
            if *v < 0 || *v >= extent {
                return Err(CompileError::IndexOutOfBounds {
                    name: decl.name.clone(),
                    index: *v,
                    extent,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Build the polynomial view of an already-folded operand, if it has one.
fn as_polynomial(ast: &Ast, e: ExprId) -> Option<Polynomial> {
    match ast.expr(e) {
        Expr::Int(v) => Some(Polynomial::constant(*v)),
        Expr::SsaVar(d) => Some(Polynomial::var(*d)),
        Expr::Poly(p) => Some(p.clone()),
        _ => None,
    }
}

/// Install a fused polynomial, degrading to a literal or a plain SSA read
/// when the polynomial is trivial.
fn install_polynomial(ast: &mut Ast, e: ExprId, p: Polynomial) {
    if let Ok(v) = p.constant_value() {
        ast.replace_expr(e, Expr::Int(v));
    } else if let Some(def) = p.as_single_var() {
        ast.replace_expr(e, Expr::SsaVar(def));
    } else {
        ast.replace_expr(e, Expr::Poly(p));
    }
}
