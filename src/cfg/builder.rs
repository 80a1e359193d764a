//! Flattening the structured body into basic blocks.
//!
//! The walk is a single pass: labels open blocks, control transfers close
//! them. `if` statements whose body is not a `goto` are lowered here by
//! inverting the condition and branching around the body through a
//! synthetic label, after which every block ends in at most one transfer.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::ast::{Ast, Expr, ExprId, StmtId, StmtKind};
use crate::error::{CompileError, Result};
use crate::token::Loc;

use super::block::BlockId;

/// Build the control-flow graph, replacing the program body with the block
/// sequence.
///
/// # Errors
///
/// Fails on a `goto` naming an unknown label, on a condition that cannot be
/// inverted, or on a structured loop that survived parser lowering.
pub fn build_cfg(ast: &mut Ast) -> Result<()> {
    let body: Vec<StmtId> = ast.body().to_vec();
    let flat = flatten(ast, &body)?;
    let (order, labels) = partition(ast, &flat);
    resolve_and_wire(ast, &order, &labels)?;
    debug!(blocks = order.len(), "built control flow graph");
    ast.set_block_order(order);
    Ok(())
}

fn flatten(ast: &mut Ast, stmts: &[StmtId]) -> Result<Vec<StmtId>> {
    let mut out = Vec::new();
    for &sid in stmts {
        flatten_stmt(ast, sid, &mut out)?;
    }
    Ok(out)
}

fn flatten_stmt(ast: &mut Ast, sid: StmtId, out: &mut Vec<StmtId>) -> Result<()> {
    match ast.stmt(sid).kind.clone() {
        StmtKind::If { cond, body } => {
            if matches!(ast.stmt(body).kind, StmtKind::Goto { .. }) {
                out.push(sid);
                return Ok(());
            }
            // `if (c) then S` becomes `if (!c) goto skip; S; label skip`.
            invert_condition(ast, cond)?;
            let skip = ast.fresh_label();
            let jump = ast.add_stmt(StmtKind::Goto {
                label: skip.clone(),
                loc: Loc::SYNTHETIC,
                block: None,
            });
            if let StmtKind::If { body: b, .. } = &mut ast.stmt_mut(sid).kind {
                *b = jump;
            }
            out.push(sid);
            flatten_stmt(ast, body, out)?;
            out.push(ast.add_stmt(StmtKind::Label {
                name: skip,
                loc: Loc::SYNTHETIC,
            }));
            Ok(())
        }
        StmtKind::While { .. } | StmtKind::For { .. } => Err(CompileError::malformed(
            "structured loop reached the CFG builder",
        )
        .into()),
        _ => {
            out.push(sid);
            Ok(())
        }
    }
}

fn invert_condition(ast: &mut Ast, cond: ExprId) -> Result<()> {
    let op = match ast.expr(cond) {
        Expr::Binary { op, .. } => *op,
        _ => {
            return Err(CompileError::NonInvertibleCondition {
                message: "condition is not a comparison".to_string(),
            }
            .into())
        }
    };
    let Some(inverse) = op.inverse() else {
        return Err(CompileError::NonInvertibleCondition {
            message: format!("operator {op} has no inverse"),
        }
        .into());
    };
    if let Expr::Binary { op, .. } = ast.expr_mut(cond) {
        *op = inverse;
    }
    Ok(())
}

fn open_next(
    ast: &mut Ast,
    order: &mut Vec<BlockId>,
    current: BlockId,
    fallthrough: bool,
) -> BlockId {
    let next = ast.new_block();
    if fallthrough {
        ast.block_mut(current).direct_successor = Some(next);
    }
    order.push(next);
    next
}

fn partition(ast: &mut Ast, flat: &[StmtId]) -> (Vec<BlockId>, BTreeMap<String, BlockId>) {
    let mut labels = BTreeMap::new();
    let mut order = vec![ast.new_block()];
    let mut current = order[0];

    for &sid in flat {
        match ast.stmt(sid).kind.clone() {
            StmtKind::Label { name, .. } => {
                if !ast.block(current).is_empty() {
                    let last = *ast.block(current).stmts.last().unwrap();
                    let fallthrough = !ast.stmt(last).kind.is_terminator();
                    current = open_next(ast, &mut order, current, fallthrough);
                }
                labels.insert(name, current);
                ast.block_mut(current).stmts.push(sid);
            }
            StmtKind::Goto { .. } | StmtKind::End => {
                ast.block_mut(current).stmts.push(sid);
                current = open_next(ast, &mut order, current, false);
            }
            StmtKind::If { .. } => {
                ast.block_mut(current).stmts.push(sid);
                current = open_next(ast, &mut order, current, true);
            }
            _ => ast.block_mut(current).stmts.push(sid),
        }
    }

    // The walk may leave a trailing block nothing can reach.
    if ast.block(current).is_empty() {
        let referenced = labels.values().any(|&b| b == current)
            || order
                .iter()
                .any(|&b| ast.block(b).direct_successor == Some(current));
        if !referenced {
            ast.block_mut(current).deleted = true;
            order.pop();
        }
    }

    (order, labels)
}

fn resolve_and_wire(
    ast: &mut Ast,
    order: &[BlockId],
    labels: &BTreeMap<String, BlockId>,
) -> Result<()> {
    for &b in order {
        for sid in ast.block(b).stmts.clone() {
            resolve_stmt(ast, sid, labels)?;
        }
    }

    for &b in order {
        let (last_kind, fallthrough) = {
            let block = ast.block(b);
            (
                block.stmts.last().map(|&s| ast.stmt(s).kind.clone()),
                block.direct_successor,
            )
        };
        let mut successors = BTreeSet::new();
        match last_kind {
            Some(StmtKind::Goto { block: target, .. }) => {
                successors.extend(target);
            }
            Some(StmtKind::If { body, .. }) => {
                if let StmtKind::Goto { block: target, .. } = &ast.stmt(body).kind {
                    successors.extend(*target);
                }
                successors.extend(fallthrough);
            }
            Some(StmtKind::End) => {}
            _ => successors.extend(fallthrough),
        }
        ast.block_mut(b).successors = successors;
    }

    for &b in order {
        for succ in ast.block(b).successors.clone() {
            ast.block_mut(succ).predecessors.insert(b);
        }
    }

    Ok(())
}

fn resolve_stmt(ast: &mut Ast, sid: StmtId, labels: &BTreeMap<String, BlockId>) -> Result<()> {
    match ast.stmt(sid).kind.clone() {
        StmtKind::Goto { label, loc, .. } => {
            let target = labels
                .get(&label)
                .copied()
                .ok_or(CompileError::UnresolvedLabel { name: label, loc })?;
            if let StmtKind::Goto { block, .. } = &mut ast.stmt_mut(sid).kind {
                *block = Some(target);
            }
            Ok(())
        }
        StmtKind::If { body, .. } => resolve_stmt(ast, body, labels),
        _ => Ok(()),
    }
}
