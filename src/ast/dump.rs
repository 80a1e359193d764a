//! Textual listing of the IR, used by `--emit ir` and the test suite.

use std::fmt::Write as _;

use crate::ast::{Ast, Expr, ExprId, LValue, StmtId, StmtKind};

/// Render the block list with statements, edges, and SSA versions.
#[must_use]
pub fn listing(ast: &Ast) -> String {
    let mut out = String::new();
    if let Some(title) = ast.title() {
        let _ = writeln!(out, "title {title:?}");
    }
    for &b in ast.block_order() {
        let block = ast.block(b);
        if block.deleted {
            continue;
        }
        let succs: Vec<String> = block.successors.iter().map(|s| s.to_string()).collect();
        let preds: Vec<String> = block.predecessors.iter().map(|p| p.to_string()).collect();
        let _ = writeln!(
            out,
            "{b}:  preds=[{}] succs=[{}]",
            preds.join(", "),
            succs.join(", ")
        );
        for &sid in &block.stmts {
            let _ = writeln!(out, "  {}", render_stmt(ast, sid));
        }
    }
    out
}

fn render_stmt(ast: &Ast, sid: StmtId) -> String {
    match &ast.stmt(sid).kind {
        StmtKind::Let { target, value } => {
            format!(
                "let {} := {}",
                render_lvalue(ast, target),
                render_expr(ast, *value)
            )
        }
        StmtKind::Goto { label, .. } => format!("goto {label}"),
        StmtKind::Label { name, .. } => format!("label {name}:"),
        StmtKind::If { cond, body } => format!(
            "if ({}) then {}",
            render_expr(ast, *cond),
            render_stmt(ast, *body)
        ),
        StmtKind::While { cond, .. } => format!("while ({})", render_expr(ast, *cond)),
        StmtKind::For { .. } => "for".to_string(),
        StmtKind::Print(e) => format!("print {}", render_expr(ast, *e)),
        StmtKind::Prompt(s) => format!("prompt {s:?}"),
        StmtKind::Input(lv) => format!("input {}", render_lvalue(ast, lv)),
        StmtKind::End => "end".to_string(),
        StmtKind::Rem(text) => format!("rem {text}"),
    }
}

fn render_lvalue(ast: &Ast, lv: &LValue) -> String {
    match lv {
        LValue::Var(v) => ast.var(*v).name.clone(),
        LValue::Ssa(d) => {
            let def = ast.def(*d);
            format!("{}_{}", ast.var(def.var).name, def.version)
        }
        LValue::Array { var, indices } => {
            let mut s = ast.var(*var).name.clone();
            for &i in indices {
                let _ = write!(s, "[{}]", render_expr(ast, i));
            }
            s
        }
    }
}

/// Render an expression with SSA versions visible (`i_2`), polynomials as
/// coefficient-sorted sums, and phis as argument lists.
#[must_use]
pub fn render_expr(ast: &Ast, e: ExprId) -> String {
    match ast.expr(e) {
        Expr::Int(v) => v.to_string(),
        Expr::Var(v) => ast.var(*v).name.clone(),
        Expr::SsaVar(d) => {
            let def = ast.def(*d);
            format!("{}_{}", ast.var(def.var).name, def.version)
        }
        Expr::InputInt => "input_int()".to_string(),
        Expr::ArrayRead { var, indices } => {
            let mut s = ast.var(*var).name.clone();
            for &i in indices {
                let _ = write!(s, "[{}]", render_expr(ast, i));
            }
            s
        }
        Expr::Binary { op, left, right } => format!(
            "({} {} {})",
            render_expr(ast, *left),
            op,
            render_expr(ast, *right)
        ),
        Expr::Unary { op, value } => format!("({}{})", op, render_expr(ast, *value)),
        Expr::Phi(args) => {
            let args: Vec<String> = args
                .iter()
                .map(|&d| {
                    let def = ast.def(d);
                    format!("{}_{}", ast.var(def.var).name, def.version)
                })
                .collect();
            format!("phi({})", args.join(", "))
        }
        Expr::Poly(p) => {
            let mut parts = Vec::new();
            for (key, coeff) in p.terms() {
                let mut factors = Vec::new();
                if coeff != 1 || key.is_constant() {
                    factors.push(coeff.to_string());
                }
                for (d, exp) in key.powers() {
                    let def = ast.def(d);
                    let name = format!("{}_{}", ast.var(def.var).name, def.version);
                    for _ in 0..exp {
                        factors.push(name.clone());
                    }
                }
                parts.push(factors.join("*"));
            }
            if parts.is_empty() {
                "0".to_string()
            } else {
                parts.join(" + ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::ssa::{build_phi_nodes, build_ssa};

    #[test]
    fn listing_shows_blocks_and_versions() {
        let src = "var int i\nbegin\nlet i := 0\nlabel top\nprint i\nlet i := i + 1\nif (i < 3) then goto top\nend\n";
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();
        build_ssa(&mut ast).unwrap();
        build_phi_nodes(&mut ast);

        let listing = super::listing(&ast);
        assert!(listing.contains("B0:"));
        assert!(listing.contains("let i_0 := 0"));
        assert!(listing.contains("phi("));
        assert!(listing.contains("goto top"));
        assert!(listing.contains("end"));
    }
}
