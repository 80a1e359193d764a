//! Iterative reaching-definitions worklist.
//!
//! Each block's out-set is the transfer of its in-set through the block's
//! statements: a scalar write replaces the variable's reaching set with the
//! single definition created at that statement. The lattice is finite (at
//! most one definition per assignment site) and the transfer is monotone,
//! so the FIFO worklist converges; a hard iteration bound guards against
//! bugs that would otherwise loop forever.

use std::collections::VecDeque;

use tracing::debug;

use crate::ast::{Ast, LValue, StmtKind};
use crate::cfg::VarDefSet;
use crate::error::{CompileError, Result};

/// Convert every scalar assignment to SSA form and populate the per-block
/// reaching-definition sets.
///
/// # Errors
///
/// Returns [`CompileError::InvariantViolation`] if the fixed point fails to
/// converge within the safety bound.
pub fn build_ssa(ast: &mut Ast) -> Result<()> {
    let order = ast.block_order().to_vec();
    for &b in &order {
        ast.block_mut(b).var_def_in.clear();
        ast.block_mut(b).var_def_out.clear();
    }

    let assignment_sites = count_scalar_writes(ast);
    let bound = 10 * order.len() * (assignment_sites + 1) + 10;

    let mut queue: VecDeque<_> = order.iter().copied().collect();
    let mut processed = 0usize;

    while let Some(b) = queue.pop_front() {
        processed += 1;
        if processed > bound {
            return Err(CompileError::invariant(
                "reaching-definitions worklist failed to converge",
            )
            .into());
        }

        let old_out = ast.block(b).var_def_out.clone();

        let mut in_set = VarDefSet::new();
        for p in ast.block(b).predecessors.clone() {
            in_set.union_with(&ast.block(p).var_def_out);
        }

        let mut out = in_set.clone();
        for sid in ast.block(b).stmts.clone() {
            transfer(ast, b, sid, &mut out);
        }

        ast.block_mut(b).var_def_in = in_set;
        if out != old_out {
            for s in ast.block(b).successors.clone() {
                queue.push_back(s);
            }
        }
        ast.block_mut(b).var_def_out = out;
    }

    debug!(iterations = processed, sites = assignment_sites, "ssa fixed point reached");
    Ok(())
}

/// Apply one statement to the running out-set, creating an SSA definition
/// for a scalar write the first time it is seen.
fn transfer(ast: &mut Ast, block: crate::cfg::BlockId, sid: crate::ast::StmtId, out: &mut VarDefSet) {
    match ast.stmt(sid).kind.clone() {
        StmtKind::Let { target, .. } => match target {
            LValue::Var(v) => {
                let def = ast.new_ssa_def(v, block, sid);
                if let StmtKind::Let { target, .. } = &mut ast.stmt_mut(sid).kind {
                    *target = LValue::Ssa(def);
                }
                out.replace_definition(v, def);
            }
            LValue::Ssa(def) => {
                // already converted on an earlier visit
                out.replace_definition(ast.def(def).var, def);
            }
            LValue::Array { .. } => {}
        },
        StmtKind::Input(target) => match target {
            LValue::Var(v) => {
                let def = ast.new_ssa_def(v, block, sid);
                if let StmtKind::Input(target) = &mut ast.stmt_mut(sid).kind {
                    *target = LValue::Ssa(def);
                }
                out.replace_definition(v, def);
            }
            LValue::Ssa(def) => {
                out.replace_definition(ast.def(def).var, def);
            }
            LValue::Array { .. } => {}
        },
        _ => {}
    }
}

fn count_scalar_writes(ast: &Ast) -> usize {
    let mut count = 0;
    for &b in ast.block_order() {
        for &sid in &ast.block(b).stmts {
            match &ast.stmt(sid).kind {
                StmtKind::Let { target, .. } | StmtKind::Input(target) => {
                    if !matches!(target, LValue::Array { .. }) {
                        count += 1;
                    }
                }
                _ => {}
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn ssa_for(src: &str) -> Ast {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();
        build_ssa(&mut ast).unwrap();
        ast
    }

    #[test]
    fn every_scalar_let_gets_a_unique_def() {
        let ast = ssa_for("var int a\nbegin\nlet a := 1\nlet a := 2\nprint a\nend\n");
        let mut defs = Vec::new();
        for &b in ast.block_order() {
            for &sid in &ast.block(b).stmts {
                if let StmtKind::Let { target, .. } = &ast.stmt(sid).kind {
                    let LValue::Ssa(d) = target else {
                        panic!("scalar let not converted to SSA");
                    };
                    defs.push(*d);
                }
            }
        }
        assert_eq!(defs.len(), 2);
        assert_ne!(defs[0], defs[1]);
        let a = ast.lookup_var("a").unwrap();
        assert_eq!(ast.var(a).definition_count, 2);
    }

    #[test]
    fn array_stores_are_not_renamed() {
        let ast = ssa_for("var list[4] a\nbegin\nlet a[0] := 1\nend\n");
        let entry = ast.entry_block().unwrap();
        let sid = ast.block(entry).stmts[0];
        let StmtKind::Let { target, .. } = &ast.stmt(sid).kind else {
            panic!("expected let");
        };
        assert!(matches!(target, LValue::Array { .. }));
    }

    #[test]
    fn loop_in_set_is_union_of_predecessor_outs() {
        let ast = ssa_for(
            "var int i\nbegin\nlet i := 0\nlabel top\nprint i\nlet i := i + 1\nif (i < 3) then goto top\nend\n",
        );
        let order = ast.block_order();
        let i = ast.lookup_var("i").unwrap();

        // loop header sees the entry def and its own redefinition
        let header = ast.block(order[1]);
        let reaching = header.var_def_in.defs_for(i).unwrap();
        assert_eq!(reaching.len(), 2);

        // invariant: in = union of predecessor outs
        for &b in order {
            let mut expected = VarDefSet::new();
            for &p in &ast.block(b).predecessors {
                expected.union_with(&ast.block(p).var_def_out);
            }
            assert_eq!(ast.block(b).var_def_in, expected, "in-set mismatch for {b}");
        }
    }

    #[test]
    fn second_run_is_stable() {
        let mut ast = {
            let tokens = Lexer::new("var int a\nbegin\nlet a := 1\nprint a\nend\n")
                .tokenize()
                .unwrap();
            Parser::new(tokens).parse().unwrap()
        };
        build_cfg(&mut ast).unwrap();
        build_ssa(&mut ast).unwrap();
        let a = ast.lookup_var("a").unwrap();
        let count = ast.var(a).definition_count;
        build_ssa(&mut ast).unwrap();
        assert_eq!(ast.var(a).definition_count, count);
    }
}
