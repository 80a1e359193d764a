//! Dead-code elimination.
//!
//! Marks and sweeps three kinds of dead code: stores to unreferenced SSA
//! definitions with pure right-hand sides, blocks unreachable from the
//! entry, and statements following an unconditional transfer inside a
//! block. The sweep physically removes marked statements, releases the
//! reads they contained, decrements definition counts, and prunes removed
//! definitions out of surviving phi argument sets.

use tracing::trace;

use crate::ast::{Ast, DefId, Expr, ExprId, LValue, StmtId, StmtKind};
use crate::cfg::{unreachable_blocks, BlockId};

/// Run one mark-and-sweep round. Returns whether anything was removed.
pub fn eliminate_dead_code(ast: &mut Ast) -> bool {
    let mut changed = false;

    changed |= mark_dead_stores(ast);
    changed |= prune_unreachable_blocks(ast);
    changed |= mark_trailing_statements(ast);
    changed |= sweep(ast);

    changed
}

/// An unreferenced definition whose RHS cannot be observed is dead.
fn mark_dead_stores(ast: &mut Ast) -> bool {
    let mut changed = false;
    for &b in &ast.block_order().to_vec() {
        if ast.block(b).deleted {
            continue;
        }
        for sid in ast.block(b).stmts.clone() {
            if ast.stmt(sid).dead {
                continue;
            }
            let StmtKind::Let {
                target: LValue::Ssa(def),
                value,
            } = ast.stmt(sid).kind.clone()
            else {
                continue;
            };
            if ast.def(def).ref_count == 0 && expr_is_pure(ast, value) {
                ast.stmt_mut(sid).mark_dead();
                changed = true;
            }
        }
    }
    changed
}

fn prune_unreachable_blocks(ast: &mut Ast) -> bool {
    let dead = unreachable_blocks(ast);
    for &b in &dead {
        trace!(block = %b, "pruning unreachable block");
        delete_block(ast, b);
    }
    !dead.is_empty()
}

fn delete_block(ast: &mut Ast, b: BlockId) {
    for succ in ast.block(b).successors.clone() {
        ast.block_mut(succ).predecessors.remove(&b);
    }
    for pred in ast.block(b).predecessors.clone() {
        ast.block_mut(pred).successors.remove(&b);
    }
    let block = ast.block_mut(b);
    block.successors.clear();
    block.predecessors.clear();
    block.direct_successor = None;
    block.deleted = true;
    for sid in ast.block(b).stmts.clone() {
        ast.stmt_mut(sid).mark_dead();
    }
}

/// Nothing after an unconditional `goto` or `end` can execute.
fn mark_trailing_statements(ast: &mut Ast) -> bool {
    let mut changed = false;
    for &b in &ast.block_order().to_vec() {
        if ast.block(b).deleted {
            continue;
        }
        let mut terminated = false;
        for sid in ast.block(b).stmts.clone() {
            if terminated && !ast.stmt(sid).dead {
                ast.stmt_mut(sid).mark_dead();
                changed = true;
            }
            if !ast.stmt(sid).dead && ast.stmt(sid).kind.is_terminator() {
                terminated = true;
            }
        }
    }
    changed
}

/// Physically remove marked statements and keep the bookkeeping honest.
fn sweep(ast: &mut Ast) -> bool {
    let mut removed_defs: Vec<DefId> = Vec::new();
    let mut any = false;

    for &b in &ast.block_order().to_vec() {
        let deleted = ast.block(b).deleted;
        let stmts = ast.block(b).stmts.clone();
        let mut kept = Vec::with_capacity(stmts.len());
        for sid in stmts {
            if !deleted && !ast.stmt(sid).dead {
                kept.push(sid);
                continue;
            }
            ast.stmt_mut(sid).mark_dead();
            ast.release_stmt_refs(sid);
            collect_defs(ast, sid, &mut removed_defs);
            any = true;
        }
        ast.block_mut(b).stmts = kept;
    }

    for &def in &removed_defs {
        let var = ast.def(def).var;
        let decl = ast.var_mut(var);
        decl.definition_count = decl.definition_count.saturating_sub(1);
    }
    if !removed_defs.is_empty() {
        prune_phi_arguments(ast, &removed_defs);
    }

    any
}

fn collect_defs(ast: &Ast, sid: StmtId, out: &mut Vec<DefId>) {
    match &ast.stmt(sid).kind {
        StmtKind::Let {
            target: LValue::Ssa(d),
            ..
        }
        | StmtKind::Input(LValue::Ssa(d)) => out.push(*d),
        StmtKind::If { body, .. } => collect_defs(ast, *body, out),
        _ => {}
    }
}

/// Drop removed definitions from surviving phi argument sets. A phi left
/// with no arguments merges nothing: no definition reaches it, so it takes
/// the default value.
fn prune_phi_arguments(ast: &mut Ast, removed: &[DefId]) {
    for &b in &ast.block_order().to_vec() {
        if ast.block(b).deleted {
            continue;
        }
        for sid in ast.block(b).stmts.clone() {
            let StmtKind::Let { value, .. } = ast.stmt(sid).kind.clone() else {
                continue;
            };
            let Expr::Phi(args) = ast.expr(value).clone() else {
                continue;
            };
            let pruned: std::collections::BTreeSet<_> = args
                .iter()
                .copied()
                .filter(|d| !removed.contains(d))
                .collect();
            if pruned.len() == args.len() {
                continue;
            }
            if pruned.is_empty() {
                ast.replace_expr(value, Expr::Int(0));
            } else {
                ast.replace_expr(value, Expr::Phi(pruned));
            }
        }
    }
}

/// Whether removing an evaluation of this expression is unobservable.
///
/// Terminal reads are side effects; an array read with a non-constant
/// subscript might be out of bounds, so it stays.
pub(crate) fn expr_is_pure(ast: &Ast, e: ExprId) -> bool {
    match ast.expr(e) {
        Expr::InputInt => false,
        Expr::ArrayRead { indices, .. } => indices
            .iter()
            .all(|&i| matches!(ast.expr(i), Expr::Int(_))),
        Expr::Binary { left, right, .. } => expr_is_pure(ast, *left) && expr_is_pure(ast, *right),
        Expr::Unary { value, .. } => expr_is_pure(ast, *value),
        Expr::Int(_) | Expr::Var(_) | Expr::SsaVar(_) | Expr::Poly(_) | Expr::Phi(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::ssa::{build_phi_nodes, build_ssa};

    fn prepared(src: &str) -> Ast {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();
        build_ssa(&mut ast).unwrap();
        build_phi_nodes(&mut ast);
        ast
    }

    fn live_lets(ast: &Ast) -> usize {
        let mut count = 0;
        for &b in ast.block_order() {
            if ast.block(b).deleted {
                continue;
            }
            for &sid in &ast.block(b).stmts {
                if matches!(ast.stmt(sid).kind, StmtKind::Let { .. }) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn dead_store_is_removed() {
        let mut ast = prepared("var int a\nbegin\nlet a := 1\nlet a := 2\nprint a\nend\n");
        assert!(eliminate_dead_code(&mut ast));
        assert_eq!(live_lets(&ast), 1);
        let a = ast.lookup_var("a").unwrap();
        assert_eq!(ast.var(a).definition_count, 1);
    }

    #[test]
    fn input_definitions_survive_without_readers() {
        let mut ast = prepared("var int a\nbegin\ninput a\nend\n");
        assert!(!eliminate_dead_code(&mut ast));
        assert_eq!(live_lets(&ast), 1);
    }

    #[test]
    fn unreachable_block_is_pruned() {
        let mut ast = prepared("begin\ngoto skip\nprint 1\nlabel skip\nprint 2\nend\n");
        assert!(eliminate_dead_code(&mut ast));

        let order = ast.block_order().to_vec();
        assert!(ast.block(order[1]).deleted);
        assert!(ast.block(order[1]).stmts.is_empty());
        // only one print survives
        let mut prints = 0;
        for &b in &order {
            if ast.block(b).deleted {
                continue;
            }
            for &sid in &ast.block(b).stmts {
                if matches!(ast.stmt(sid).kind, StmtKind::Print(_)) {
                    prints += 1;
                }
            }
        }
        assert_eq!(prints, 1);
    }

    #[test]
    fn statements_after_a_goto_die() {
        // a true branch folded into a goto leaves trailing statements behind
        let mut ast = prepared("begin\nif (1 = 1) then goto done\nprint 1\nlabel done\nend\n");
        crate::opt::fold_expressions(&mut ast).unwrap();
        assert!(eliminate_dead_code(&mut ast));

        let entry = ast.entry_block().unwrap();
        let last = *ast.block(entry).stmts.last().unwrap();
        assert!(matches!(ast.stmt(last).kind, StmtKind::Goto { .. }));
    }

    #[test]
    fn removed_definition_leaves_phi_arguments() {
        // the loop phi keeps the entry definition alive; deleting an
        // unreachable definition elsewhere prunes it from the phi
        let mut ast = prepared(
            "var int i\nbegin\nlet i := 0\nlabel top\nlet i := i + 1\nif (i < 3) then goto top\nend\n",
        );
        assert!(!eliminate_dead_code(&mut ast));
        // both definitions feed the phi, nothing to remove
        let i = ast.lookup_var("i").unwrap();
        assert_eq!(ast.var(i).definition_count, 3); // two stores plus the phi
    }

    #[test]
    fn literal_rhs_is_pure() {
        let mut ast = prepared("var int a\nbegin\nlet a := 1\nend\n");
        let entry = ast.entry_block().unwrap();
        let StmtKind::Let { value, .. } = ast.stmt(ast.block(entry).stmts[0]).kind.clone() else {
            panic!("expected let");
        };
        assert!(expr_is_pure(&ast, value));
    }
}
