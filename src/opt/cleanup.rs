//! Post-optimization cleanup: unused-variable elimination and default
//! initialization.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::ast::{Ast, Expr, ExprId, LValue, StmtId, StmtKind, VarId};
use crate::cfg::BlockId;

/// Mark scalars with no remaining definitions and no read sites as
/// eliminated; the code generator skips them.
pub fn eliminate_unused_vars(ast: &mut Ast) {
    let mut used: BTreeSet<VarId> = BTreeSet::new();
    for &b in ast.block_order() {
        if ast.block(b).deleted {
            continue;
        }
        for &sid in &ast.block(b).stmts {
            collect_stmt_vars(ast, sid, &mut used);
        }
    }

    let mut eliminated = 0usize;
    for v in ast.var_ids().collect::<Vec<_>>() {
        let decl = ast.var(v);
        if decl.is_scalar() && decl.definition_count == 0 && !used.contains(&v) {
            ast.var_mut(v).eliminated = true;
            eliminated += 1;
        }
    }
    debug!(eliminated, "unused variables removed");
}

/// Prepend `let v := 0` in the entry block for every non-eliminated scalar
/// that is not definitely assigned before its first use.
pub fn default_initialize_vars(ast: &mut Ast) {
    let Some(entry) = ast.entry_block() else {
        return;
    };
    let needy = vars_needing_default_init(ast);
    if needy.is_empty() {
        return;
    }

    let insert_at = usize::from(matches!(
        ast.block(entry).stmts.first().map(|&s| &ast.stmt(s).kind),
        Some(StmtKind::Label { .. })
    ));

    let mut inits = Vec::new();
    for v in needy {
        if ast.var(v).eliminated {
            continue;
        }
        debug!(var = %ast.var(v).name, "default-initializing");
        let value = ast.add_expr(Expr::Int(0));
        let sid = ast.add_stmt(StmtKind::Let {
            target: LValue::Var(v),
            value,
        });
        let def = ast.new_ssa_def(v, entry, sid);
        if let StmtKind::Let { target, .. } = &mut ast.stmt_mut(sid).kind {
            *target = LValue::Ssa(def);
        }
        inits.push(sid);
    }
    ast.block_mut(entry).stmts.splice(insert_at..insert_at, inits);
}

/// Forward must-assign fixed point: a variable read at a point where it is
/// not assigned on every path from the entry needs a default value.
fn vars_needing_default_init(ast: &Ast) -> BTreeSet<VarId> {
    let order: Vec<BlockId> = ast
        .block_order()
        .iter()
        .copied()
        .filter(|&b| !ast.block(b).deleted)
        .collect();
    let Some(&entry) = order.first() else {
        return BTreeSet::new();
    };

    // None means "not yet computed", the top of the intersection lattice
    let mut outs: BTreeMap<BlockId, Option<BTreeSet<VarId>>> =
        order.iter().map(|&b| (b, None)).collect();

    let bound = 10 * (order.len() + 1) * (ast.var_ids().count() + 2);
    let mut queue: VecDeque<BlockId> = order.iter().copied().collect();
    let mut processed = 0usize;

    while let Some(b) = queue.pop_front() {
        processed += 1;
        if processed > bound {
            // backstop against a non-terminating loop. A monotone pass over
            // this finite lattice converges in at most blocks * vars steps,
            // far under the bound; a snapshot frozen here would carry no
            // completeness guarantee.
            break;
        }

        let in_set = block_in_set(ast, b, entry, &outs);
        let mut out = in_set;
        for &sid in &ast.block(b).stmts {
            apply_writes(ast, sid, &mut out);
        }

        if outs.get(&b) != Some(&Some(out.clone())) {
            outs.insert(b, Some(out));
            for &s in &ast.block(b).successors {
                queue.push_back(s);
            }
        }
    }

    let mut needy = BTreeSet::new();
    for &b in &order {
        let mut assigned = block_in_set(ast, b, entry, &outs);
        for &sid in &ast.block(b).stmts {
            collect_unassigned_reads(ast, sid, &assigned, &mut needy);
            apply_writes(ast, sid, &mut assigned);
        }
    }
    needy
}

fn block_in_set(
    ast: &Ast,
    b: BlockId,
    entry: BlockId,
    outs: &BTreeMap<BlockId, Option<BTreeSet<VarId>>>,
) -> BTreeSet<VarId> {
    if b == entry {
        return BTreeSet::new();
    }
    let mut result: Option<BTreeSet<VarId>> = None;
    for p in &ast.block(b).predecessors {
        let Some(Some(pred_out)) = outs.get(p) else {
            continue; // unprocessed predecessor contributes the universe
        };
        result = Some(match result {
            None => pred_out.clone(),
            Some(acc) => acc.intersection(pred_out).copied().collect(),
        });
    }
    result.unwrap_or_default()
}

fn apply_writes(ast: &Ast, sid: StmtId, assigned: &mut BTreeSet<VarId>) {
    match &ast.stmt(sid).kind {
        StmtKind::Let { target, .. } | StmtKind::Input(target) => {
            if let Some(v) = ast.lvalue_var(target) {
                assigned.insert(v);
            }
        }
        // a conditional body runs on one path only; it cannot make a
        // variable definitely assigned afterwards
        StmtKind::If { .. } => {}
        _ => {}
    }
}

fn collect_unassigned_reads(
    ast: &Ast,
    sid: StmtId,
    assigned: &BTreeSet<VarId>,
    needy: &mut BTreeSet<VarId>,
) {
    let mut reads = BTreeSet::new();
    collect_stmt_reads(ast, sid, &mut reads);
    for v in reads {
        if ast.var(v).is_scalar() && !assigned.contains(&v) {
            needy.insert(v);
        }
    }
}

fn collect_stmt_reads(ast: &Ast, sid: StmtId, out: &mut BTreeSet<VarId>) {
    match &ast.stmt(sid).kind {
        StmtKind::Let { target, value } => {
            if let LValue::Array { indices, .. } = target {
                for &i in indices {
                    collect_expr_vars(ast, i, out);
                }
            }
            collect_expr_vars(ast, *value, out);
        }
        StmtKind::Input(LValue::Array { indices, .. }) => {
            for &i in indices {
                collect_expr_vars(ast, i, out);
            }
        }
        StmtKind::Print(e) => collect_expr_vars(ast, *e, out),
        StmtKind::If { cond, body } => {
            collect_expr_vars(ast, *cond, out);
            collect_stmt_reads(ast, *body, out);
        }
        _ => {}
    }
}

fn collect_stmt_vars(ast: &Ast, sid: StmtId, out: &mut BTreeSet<VarId>) {
    collect_stmt_reads(ast, sid, out);
    match &ast.stmt(sid).kind {
        StmtKind::Let { target, .. } | StmtKind::Input(target) => {
            if let Some(v) = ast.lvalue_var(target) {
                out.insert(v);
            } else if let LValue::Array { var, .. } = target {
                out.insert(*var);
            }
        }
        StmtKind::If { body, .. } => collect_stmt_vars(ast, *body, out),
        _ => {}
    }
}

fn collect_expr_vars(ast: &Ast, e: ExprId, out: &mut BTreeSet<VarId>) {
    match ast.expr(e) {
        Expr::Var(v) => {
            out.insert(*v);
        }
        Expr::SsaVar(d) => {
            out.insert(ast.def(*d).var);
        }
        Expr::Phi(args) => {
            for &d in args {
                out.insert(ast.def(d).var);
            }
        }
        Expr::Poly(p) => {
            for d in p.def_occurrences() {
                out.insert(ast.def(d).var);
            }
        }
        Expr::ArrayRead { var, indices } => {
            out.insert(*var);
            for &i in indices {
                collect_expr_vars(ast, i, out);
            }
        }
        Expr::Binary { left, right, .. } => {
            collect_expr_vars(ast, *left, out);
            collect_expr_vars(ast, *right, out);
        }
        Expr::Unary { value, .. } => collect_expr_vars(ast, *value, out),
        Expr::Int(_) | Expr::InputInt => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::opt::run_pass_loop;
    use crate::ssa::{build_phi_nodes, build_ssa};

    fn optimized(src: &str) -> Ast {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();
        build_ssa(&mut ast).unwrap();
        build_phi_nodes(&mut ast);
        run_pass_loop(&mut ast).unwrap();
        ast
    }

    #[test]
    fn folded_away_variables_are_eliminated() {
        let mut ast = optimized("var int x int y\nbegin\nlet x := 2 + 3\nlet y := x * 4\nprint y\nend\n");
        eliminate_unused_vars(&mut ast);
        let x = ast.lookup_var("x").unwrap();
        let y = ast.lookup_var("y").unwrap();
        assert!(ast.var(x).eliminated);
        assert!(ast.var(y).eliminated);
    }

    #[test]
    fn live_variables_stay() {
        let mut ast = optimized("var int a\nbegin\ninput a\nprint a\nend\n");
        eliminate_unused_vars(&mut ast);
        let a = ast.lookup_var("a").unwrap();
        assert!(!ast.var(a).eliminated);
    }

    #[test]
    fn read_before_any_write_gets_an_initializer() {
        let mut ast = optimized("var int x\nbegin\nprint x\nend\n");
        eliminate_unused_vars(&mut ast);
        default_initialize_vars(&mut ast);

        let entry = ast.entry_block().unwrap();
        let first = ast.block(entry).stmts[0];
        let StmtKind::Let { target, value } = &ast.stmt(first).kind else {
            panic!("expected an initializer");
        };
        assert!(matches!(target, LValue::Ssa(_)));
        assert_eq!(*ast.expr(*value), Expr::Int(0));
    }

    #[test]
    fn conditionally_assigned_variable_gets_an_initializer() {
        let src = "var int x int c\nbegin\ninput c\nif (c = 1) then let x := c + c\nprint x\nend\n";
        let mut ast = optimized(src);
        default_initialize_vars(&mut ast);

        let x = ast.lookup_var("x").unwrap();
        let entry = ast.entry_block().unwrap();
        let first = ast.block(entry).stmts[0];
        let StmtKind::Let { target, .. } = &ast.stmt(first).kind else {
            panic!("expected an initializer");
        };
        assert_eq!(ast.lvalue_var(target), Some(x));
    }

    #[test]
    fn definitely_assigned_variables_are_not_touched() {
        let src = "var int i\nbegin\nlet i := 0\nlabel top\nlet i := i + 1\nif (i < 3) then goto top\nend\n";
        let mut ast = optimized(src);
        let before = ast.block(ast.entry_block().unwrap()).stmts.len();
        default_initialize_vars(&mut ast);
        assert_eq!(ast.block(ast.entry_block().unwrap()).stmts.len(), before);
    }
}
