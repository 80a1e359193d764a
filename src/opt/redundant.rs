//! Redundant-variable removal.
//!
//! Two cleanups that fall out of the other passes: a phi whose argument set
//! shrank to a single definition is rewritten into a plain copy (which copy
//! propagation and DCE then dissolve), and an unreferenced pure definition
//! exposed by copy propagation is marked dead ahead of the next sweep.

use tracing::trace;

use crate::ast::{Ast, Expr, LValue, StmtKind};

use super::dce::expr_is_pure;

/// Run one round over live code. Returns whether anything changed.
pub fn remove_redundant_variables(ast: &mut Ast) -> bool {
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

            if let Expr::Phi(args) = ast.expr(value) {
                if let [only] = args.iter().copied().collect::<Vec<_>>()[..] {
                    trace!(?def, ?only, "collapsing single-argument phi to a copy");
                    ast.replace_expr(value, Expr::SsaVar(only));
                    changed = true;
                }
                continue;
            }

            if ast.def(def).ref_count == 0 && expr_is_pure(ast, value) {
                ast.stmt_mut(sid).mark_dead();
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DefId, StmtId};
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

    fn find_phi(ast: &Ast) -> Option<(StmtId, Vec<DefId>)> {
        for &b in ast.block_order() {
            for &sid in &ast.block(b).stmts {
                if let StmtKind::Let { value, .. } = &ast.stmt(sid).kind {
                    if let Expr::Phi(args) = ast.expr(*value) {
                        return Some((sid, args.iter().copied().collect()));
                    }
                }
            }
        }
        None
    }

    #[test]
    fn single_argument_phi_becomes_a_copy() {
        let mut ast = prepared(
            "var int i\nbegin\nlet i := 0\nlabel top\nlet i := i + 1\nif (i < 3) then goto top\nend\n",
        );
        // shrink the phi by hand to the degenerate single-argument form
        let (sid, args) = find_phi(&ast).expect("loop builds a phi");
        let StmtKind::Let { value, .. } = ast.stmt(sid).kind.clone() else {
            unreachable!()
        };
        let keep = args[0];
        ast.replace_expr(value, Expr::Phi(std::iter::once(keep).collect()));

        assert!(remove_redundant_variables(&mut ast));
        assert_eq!(*ast.expr(value), Expr::SsaVar(keep));
    }

    #[test]
    fn unreferenced_pure_definition_is_marked_dead() {
        let mut ast = prepared("var int a\nbegin\nlet a := 1\nlet a := 2\nprint a\nend\n");
        assert!(remove_redundant_variables(&mut ast));
        let entry = ast.entry_block().unwrap();
        assert!(ast.stmt(ast.block(entry).stmts[0]).dead);
    }

    #[test]
    fn live_phis_are_left_alone() {
        let mut ast = prepared(
            "var int i\nbegin\nlet i := 0\nlabel top\nlet i := i + 1\nif (i < 3) then goto top\nend\n",
        );
        assert!(!remove_redundant_variables(&mut ast));
        let (_, args) = find_phi(&ast).expect("loop builds a phi");
        assert_eq!(args.len(), 2);
    }
}
