//! C code generation.
//!
//! Consumes the optimized block list and emits a single C99 translation
//! unit. SSA versions are an analysis detail: every definition of a
//! variable renders as the variable's one storage location, which also
//! makes phi definitions no-ops — they are simply not emitted.

use std::fmt::Write as _;

use crate::ast::{Ast, Expr, ExprId, LValue, StmtId, StmtKind, VarKind};

/// Render the program as C source.
#[must_use]
pub fn generate_c(ast: &Ast) -> String {
    let mut out = String::new();
    if let Some(title) = ast.title() {
        let _ = writeln!(out, "/* {} */", title.replace("*/", "* /"));
    }
    out.push_str("#include <stdio.h>\n\n");

    for v in ast.var_ids() {
        let decl = ast.var(v);
        if decl.eliminated {
            continue;
        }
        match &decl.kind {
            VarKind::Int => {
                let _ = writeln!(out, "long long {};", ident(&decl.name));
            }
            VarKind::List { extents } => {
                let dims: String = extents.iter().map(|e| format!("[{e}]")).collect();
                let _ = writeln!(out, "long long {}{};", ident(&decl.name), dims);
            }
        }
    }

    out.push_str("\nint main(void)\n{\n");
    for &b in ast.block_order() {
        if ast.block(b).deleted {
            continue;
        }
        for &sid in &ast.block(b).stmts {
            emit_stmt(ast, sid, &mut out);
        }
    }
    out.push_str("}\n");
    out
}

fn emit_stmt(ast: &Ast, sid: StmtId, out: &mut String) {
    match &ast.stmt(sid).kind {
        StmtKind::Let { target, value } => {
            if matches!(ast.expr(*value), Expr::Phi(_)) {
                return;
            }
            if matches!(ast.expr(*value), Expr::InputInt) {
                let _ = writeln!(out, "    scanf(\"%lld\", &{});", render_lvalue(ast, target));
                return;
            }
            let _ = writeln!(
                out,
                "    {} = {};",
                render_lvalue(ast, target),
                render_expr(ast, *value)
            );
        }
        StmtKind::Goto { label, .. } => {
            let _ = writeln!(out, "    goto {};", label_name(label));
        }
        StmtKind::Label { name, .. } => {
            let _ = writeln!(out, "{}:;", label_name(name));
        }
        StmtKind::If { cond, body } => {
            let _ = write!(out, "    if ({}) ", render_expr(ast, *cond));
            // the body is an unconditional goto after CFG construction
            let mut body_text = String::new();
            emit_stmt(ast, *body, &mut body_text);
            out.push_str(body_text.trim_start());
            if !body_text.ends_with('\n') {
                out.push('\n');
            }
        }
        StmtKind::Print(e) => {
            let _ = writeln!(out, "    printf(\"%lld\\n\", {});", render_expr(ast, *e));
        }
        StmtKind::Prompt(text) => {
            let _ = writeln!(out, "    fputs(\"{}\", stdout);", escape(text));
        }
        StmtKind::Input(lv) => {
            let _ = writeln!(out, "    scanf(\"%lld\", &{});", render_lvalue(ast, lv));
        }
        StmtKind::End => out.push_str("    return 0;\n"),
        StmtKind::Rem(text) => {
            let _ = writeln!(out, "    /* {} */", text.replace("*/", "* /"));
        }
        StmtKind::While { .. } | StmtKind::For { .. } => {}
    }
}

fn render_lvalue(ast: &Ast, lv: &LValue) -> String {
    match lv {
        LValue::Var(v) => ident(&ast.var(*v).name),
        LValue::Ssa(d) => ident(&ast.var(ast.def(*d).var).name),
        LValue::Array { var, indices } => {
            let mut s = ident(&ast.var(*var).name);
            for &i in indices {
                let _ = write!(s, "[{}]", render_expr(ast, i));
            }
            s
        }
    }
}

fn render_expr(ast: &Ast, e: ExprId) -> String {
    match ast.expr(e) {
        Expr::Int(v) => literal(*v),
        Expr::Var(v) => ident(&ast.var(*v).name),
        Expr::SsaVar(d) => ident(&ast.var(ast.def(*d).var).name),
        Expr::InputInt => "0 /* unplaced input */".to_string(),
        Expr::ArrayRead { var, indices } => {
            let mut s = ident(&ast.var(*var).name);
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
        Expr::Poly(p) => {
            let mut terms = Vec::new();
            for (key, coeff) in p.terms() {
                let mut factors = vec![literal(coeff)];
                for (d, exp) in key.powers() {
                    let name = ident(&ast.var(ast.def(d).var).name);
                    for _ in 0..exp {
                        factors.push(name.clone());
                    }
                }
                terms.push(factors.join(" * "));
            }
            if terms.is_empty() {
                "0LL".to_string()
            } else {
                format!("({})", terms.join(" + "))
            }
        }
        Expr::Phi(_) => "0 /* unplaced phi */".to_string(),
    }
}

fn literal(v: i64) -> String {
    if v == i64::MIN {
        // the magnitude is not representable as a positive literal
        "(-9223372036854775807LL - 1LL)".to_string()
    } else {
        format!("{v}LL")
    }
}

/// Labels get a prefix so user names cannot collide with C identifiers or
/// with synthesized labels (which start with `@`).
fn label_name(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(rest) => format!("LS_{rest}"),
        None => format!("L_{name}"),
    }
}

/// Variable names that collide with a C keyword get a trailing underscore.
fn ident(name: &str) -> String {
    const C_KEYWORDS: &[&str] = &[
        "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
        "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "main",
        "register", "restrict", "return", "short", "signed", "sizeof", "static", "struct",
        "switch", "typedef", "union", "unsigned", "void", "volatile", "while",
    ];
    if C_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::opt::optimize;
    use crate::parser::Parser;

    fn compile(src: &str, optimized: bool) -> String {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();
        if optimized {
            optimize(&mut ast).unwrap();
        }
        generate_c(&ast)
    }

    #[test]
    fn straight_line_program_renders() {
        let c = compile("var int x\nbegin\nlet x := 1\nprint x + 1\nend\n", false);
        assert!(c.contains("long long x;"));
        assert!(c.contains("int main(void)"));
        assert!(c.contains("x = 1LL;"));
        assert!(c.contains("return 0;"));
    }

    #[test]
    fn optimized_constants_render_as_literals() {
        let c = compile(
            "var int x int y\nbegin\nlet x := 2 + 3\nlet y := x * 4\nprint y\nend\n",
            true,
        );
        assert!(c.contains("printf(\"%lld\\n\", 20LL);"));
        // both variables were eliminated
        assert!(!c.contains("long long x;"));
        assert!(!c.contains("long long y;"));
    }

    #[test]
    fn loops_render_labels_and_gotos() {
        let c = compile(
            "var int i\nbegin\nlet i := 0\nlabel top\nprint i\nlet i := i + 1\nif (i < 3) then goto top\nend\n",
            true,
        );
        assert!(c.contains("L_top:;"));
        assert!(c.contains("goto L_top;"));
        assert!(c.contains("if ("));
        // the phi definition is not emitted; i keeps one storage location
        assert_eq!(c.matches("long long i;").count(), 1);
        assert!(!c.contains("phi"));
    }

    #[test]
    fn input_renders_as_scanf() {
        let c = compile("var int a\nbegin\nprompt \"a? \"\ninput a\nprint a\nend\n", true);
        assert!(c.contains("fputs(\"a? \", stdout);"));
        assert!(c.contains("scanf(\"%lld\", &a);"));
    }

    #[test]
    fn arrays_declare_their_extents() {
        let c = compile(
            "var list[2][3] m\nbegin\nlet m[1][2] := 5\nprint m[1][2]\nend\n",
            false,
        );
        assert!(c.contains("long long m[2][3];"));
        assert!(c.contains("m[1][2] = 5LL;"));
    }

    #[test]
    fn keyword_variables_are_renamed() {
        let c = compile("var int register\nbegin\nlet register := 1\nprint register\nend\n", false);
        assert!(c.contains("long long register_;"));
    }

    #[test]
    fn prompt_strings_are_escaped() {
        let c = compile("begin\nprompt \"say \\ hi\"\nend\n", false);
        assert!(c.contains("fputs(\"say \\\\ hi\", stdout);"));
    }
}
