//! IR invariant checks.
//!
//! These recompute the redundant bookkeeping (edge sets, reference counts,
//! definition counts) from scratch and compare it against the stored
//! values. A mismatch means a pass has a bug; it surfaces as
//! [`CompileError::InvariantViolation`]. Tests run the checks after every
//! pipeline stage.

use std::collections::BTreeMap;

use crate::ast::{Ast, DefId, Expr, ExprId, LValue, StmtId, StmtKind, VarId};
use crate::error::{CompileError, Result};

/// Check every structural invariant of the IR.
///
/// # Errors
///
/// Returns [`CompileError::InvariantViolation`] describing the first
/// violation found.
pub fn check_invariants(ast: &Ast) -> Result<()> {
    check_edges(ast)?;
    check_ssa_uniqueness(ast)?;
    check_counts(ast)?;
    check_polynomials(ast)?;
    Ok(())
}

/// Successor and predecessor sets must mirror each other.
fn check_edges(ast: &Ast) -> Result<()> {
    for &b in ast.block_order() {
        if ast.block(b).deleted {
            continue;
        }
        for &s in &ast.block(b).successors {
            if ast.block(s).deleted {
                return Err(CompileError::invariant(format!(
                    "{b} has deleted successor {s}"
                ))
                .into());
            }
            if !ast.block(s).predecessors.contains(&b) {
                return Err(CompileError::invariant(format!(
                    "{b} -> {s} missing the reverse predecessor edge"
                ))
                .into());
            }
        }
        for &p in &ast.block(b).predecessors {
            if !ast.block(p).successors.contains(&b) {
                return Err(CompileError::invariant(format!(
                    "{p} -> {b} missing the forward successor edge"
                ))
                .into());
            }
        }
    }
    Ok(())
}

/// After SSA conversion every scalar assignment target is a distinct
/// definition.
fn check_ssa_uniqueness(ast: &Ast) -> Result<()> {
    let mut seen: BTreeMap<DefId, StmtId> = BTreeMap::new();
    for_each_live_stmt(ast, &mut |sid| {
        match &ast.stmt(sid).kind {
            StmtKind::Let { target, .. } | StmtKind::Input(target) => match target {
                LValue::Var(v) => {
                    return Err(CompileError::invariant(format!(
                        "scalar assignment to {:?} was never SSA-converted",
                        ast.var(*v).name
                    ))
                    .into());
                }
                LValue::Ssa(d) => {
                    if let Some(prior) = seen.insert(*d, sid) {
                        return Err(CompileError::invariant(format!(
                            "definition {d:?} assigned by two statements ({prior:?}, {sid:?})"
                        ))
                        .into());
                    }
                }
                LValue::Array { .. } => {}
            },
            _ => {}
        }
        Ok(())
    })
}

/// `ref_count` must equal the number of live reads of each definition and
/// `definition_count` the number of live definitions of each variable.
fn check_counts(ast: &Ast) -> Result<()> {
    let mut refs: BTreeMap<DefId, usize> = BTreeMap::new();
    let mut defs: BTreeMap<VarId, usize> = BTreeMap::new();

    for_each_live_stmt(ast, &mut |sid| {
        match &ast.stmt(sid).kind {
            StmtKind::Let { target, .. } | StmtKind::Input(target) => {
                if let LValue::Ssa(d) = target {
                    *defs.entry(ast.def(*d).var).or_insert(0) += 1;
                }
            }
            _ => {}
        }
        count_stmt_reads(ast, sid, &mut refs);
        Ok(())
    })?;

    for d in ast.def_ids() {
        let counted = refs.get(&d).copied().unwrap_or(0);
        if ast.def(d).ref_count != counted {
            return Err(CompileError::invariant(format!(
                "{d:?} has ref_count {} but {counted} live reads",
                ast.def(d).ref_count
            ))
            .into());
        }
    }
    for v in ast.var_ids() {
        let counted = defs.get(&v).copied().unwrap_or(0);
        if ast.var(v).definition_count != counted {
            return Err(CompileError::invariant(format!(
                "variable {:?} has definition_count {} but {counted} live definitions",
                ast.var(v).name,
                ast.var(v).definition_count
            ))
            .into());
        }
    }
    Ok(())
}

/// Polynomial nodes must stay canonical.
fn check_polynomials(ast: &Ast) -> Result<()> {
    let mut ok = Ok(());
    for_each_live_stmt(ast, &mut |sid| {
        for_each_stmt_expr(ast, sid, &mut |e| {
            if let Expr::Poly(p) = ast.expr(e) {
                if p.has_zero_coefficient() {
                    ok = Err(CompileError::invariant(
                        "polynomial with a zero coefficient".to_string(),
                    )
                    .into());
                }
            }
        });
        Ok(())
    })?;
    ok
}

fn for_each_live_stmt(
    ast: &Ast,
    f: &mut dyn FnMut(StmtId) -> Result<()>,
) -> Result<()> {
    for &b in ast.block_order() {
        if ast.block(b).deleted {
            continue;
        }
        for &sid in &ast.block(b).stmts {
            visit_stmt(ast, sid, f)?;
        }
    }
    Ok(())
}

fn visit_stmt(ast: &Ast, sid: StmtId, f: &mut dyn FnMut(StmtId) -> Result<()>) -> Result<()> {
    f(sid)?;
    if let StmtKind::If { body, .. } = &ast.stmt(sid).kind {
        visit_stmt(ast, *body, f)?;
    }
    Ok(())
}

/// Visit this statement's own expression roots (not the nested `if` body,
/// which [`for_each_live_stmt`] visits separately).
fn for_each_stmt_expr(ast: &Ast, sid: StmtId, f: &mut dyn FnMut(ExprId)) {
    let mut roots = Vec::new();
    match &ast.stmt(sid).kind {
        StmtKind::Let { target, value } => {
            if let LValue::Array { indices, .. } = target {
                roots.extend(indices.iter().copied());
            }
            roots.push(*value);
        }
        StmtKind::Input(LValue::Array { indices, .. }) => roots.extend(indices.iter().copied()),
        StmtKind::Print(e) => roots.push(*e),
        StmtKind::If { cond, .. } => roots.push(*cond),
        _ => {}
    }
    for root in roots {
        visit_expr(ast, root, f);
    }
}

fn visit_expr(ast: &Ast, e: ExprId, f: &mut dyn FnMut(ExprId)) {
    f(e);
    match ast.expr(e) {
        Expr::Binary { left, right, .. } => {
            visit_expr(ast, *left, f);
            visit_expr(ast, *right, f);
        }
        Expr::Unary { value, .. } => visit_expr(ast, *value, f),
        Expr::ArrayRead { indices, .. } => {
            for &i in indices {
                visit_expr(ast, i, f);
            }
        }
        _ => {}
    }
}

fn count_stmt_reads(ast: &Ast, sid: StmtId, refs: &mut BTreeMap<DefId, usize>) {
    for_each_stmt_expr(ast, sid, &mut |e| match ast.expr(e) {
        Expr::SsaVar(d) => *refs.entry(*d).or_insert(0) += 1,
        Expr::Phi(args) => {
            for &d in args {
                *refs.entry(d).or_insert(0) += 1;
            }
        }
        Expr::Poly(p) => {
            for d in p.def_occurrences() {
                *refs.entry(d).or_insert(0) += 1;
            }
        }
        _ => {}
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::opt;
    use crate::parser::Parser;
    use crate::ssa::{build_phi_nodes, build_ssa};

    fn pipeline(src: &str) -> Ast {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();
        build_ssa(&mut ast).unwrap();
        build_phi_nodes(&mut ast);
        ast
    }

    #[test]
    fn clean_pipeline_passes_all_checks() {
        let mut ast = pipeline(
            "var int i\nbegin\nlet i := 0\nlabel top\nprint i\nlet i := i + 1\nif (i < 3) then goto top\nend\n",
        );
        check_invariants(&ast).unwrap();
        opt::run_pass_loop(&mut ast).unwrap();
        check_invariants(&ast).unwrap();
    }

    #[test]
    fn broken_ref_count_is_reported() {
        let mut ast = pipeline("var int a\nbegin\nlet a := 1\nprint a\nend\n");
        // corrupt a ref count on purpose
        let d = ast.def_ids().next().unwrap();
        ast.def_mut(d).ref_count += 7;
        let err = check_invariants(&ast).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Compile(CompileError::InvariantViolation { .. })
        ));
    }
}
