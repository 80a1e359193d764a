//! Recursive-descent parser producing the structured AST.
//!
//! The parser performs name resolution (unknown variables, subscript arity,
//! duplicate labels are parse errors) and lowers the structured loop forms
//! into `label`/`if`/`goto` primitives so the CFG builder only ever sees
//! flat control flow. Scalar `input` desugars into a `let` whose RHS is the
//! side-effecting input-integer expression, which lets it participate in
//! SSA renaming like any other definition.

use tracing::debug;

use crate::ast::{Ast, BinOp, Expr, ExprId, LValue, StmtId, StmtKind, UnaryOp, VarKind};
use crate::error::{ParseError, Result};
use crate::token::{Loc, Token, TokenKind};

/// Maximum array rank.
const MAX_DIMENSIONS: usize = 3;

/// Parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ast: Ast,
}

impl Parser {
    /// Create a parser. The token stream must end with `Eof` (the lexer
    /// guarantees this).
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    /// Parse a whole program and hand back the populated arena.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] encountered.
    pub fn parse(mut self) -> Result<Ast> {
        self.parse_header()?;
        let mut body = self.parse_statements(TokenKind::End)?;
        self.expect(TokenKind::End)?;
        body.push(self.ast.add_stmt(StmtKind::End));

        let body = self.lower_structured(body)?;
        debug!(statements = body.len(), "parsed program body");
        self.ast.set_body(body);
        Ok(self.ast)
    }

    // ---- token plumbing ----

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn loc(&self) -> Loc {
        self.current().loc
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(kind.to_string()))
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> crate::error::Error {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.current().text.clone(),
            loc: self.loc(),
        }
        .into()
    }

    // ---- header ----

    fn parse_header(&mut self) -> Result<()> {
        loop {
            match self.current().kind {
                TokenKind::Title => {
                    self.bump();
                    let title = self.expect(TokenKind::Str)?;
                    self.ast.set_title(title.text);
                }
                TokenKind::Var => {
                    self.bump();
                    while self.check(TokenKind::Int) || self.check(TokenKind::List) {
                        self.parse_var_decl()?;
                    }
                }
                TokenKind::Rem => {
                    self.bump();
                }
                TokenKind::Begin => {
                    self.bump();
                    return Ok(());
                }
                _ => return Err(self.unexpected("header item or begin")),
            }
        }
    }

    fn parse_var_decl(&mut self) -> Result<()> {
        if self.check(TokenKind::Int) {
            self.bump();
            let name = self.expect(TokenKind::Ident)?;
            self.declare(name, VarKind::Int)?;
            return Ok(());
        }

        self.expect(TokenKind::List)?;
        let mut extents = Vec::new();
        while self.check(TokenKind::LBracket) {
            if extents.len() == MAX_DIMENSIONS {
                return Err(self.unexpected("identifier (at most 3 dimensions)"));
            }
            self.bump();
            let number = self.expect(TokenKind::Number)?;
            let extent: i64 = number
                .text
                .parse()
                .map_err(|_| self.unexpected("array extent"))?;
            self.expect(TokenKind::RBracket)?;
            extents.push((extent, number.loc));
        }
        if extents.is_empty() {
            return Err(self.unexpected("["));
        }

        let name = self.expect(TokenKind::Ident)?;
        for &(extent, loc) in &extents {
            if extent <= 0 {
                return Err(ParseError::BadExtent {
                    name: name.text.clone(),
                    extent,
                    loc,
                }
                .into());
            }
        }
        let extents = extents.into_iter().map(|(e, _)| e).collect();
        self.declare(name, VarKind::List { extents })?;
        Ok(())
    }

    fn declare(&mut self, name: Token, kind: VarKind) -> Result<()> {
        if self
            .ast
            .declare_var(name.text.clone(), name.loc, kind)
            .is_none()
        {
            return Err(ParseError::DuplicateVariable {
                name: name.text,
                loc: name.loc,
            }
            .into());
        }
        Ok(())
    }

    // ---- statements ----

    fn parse_statements(&mut self, until: TokenKind) -> Result<Vec<StmtId>> {
        let mut stmts = Vec::new();
        while !self.check(until) {
            if self.check(TokenKind::Eof) {
                return Err(self.unexpected(until.to_string()));
            }
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<StmtId> {
        match self.current().kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Label => self.parse_label(),
            TokenKind::Goto => self.parse_goto(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Print => {
                self.bump();
                let value = self.parse_expression()?;
                Ok(self.ast.add_stmt(StmtKind::Print(value)))
            }
            TokenKind::Prompt => {
                self.bump();
                let text = self.expect(TokenKind::Str)?;
                Ok(self.ast.add_stmt(StmtKind::Prompt(text.text)))
            }
            TokenKind::Input => self.parse_input(),
            TokenKind::Rem => {
                let token = self.bump();
                Ok(self.ast.add_stmt(StmtKind::Rem(token.text)))
            }
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_let(&mut self) -> Result<StmtId> {
        self.bump();
        let target = self.parse_lvalue()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        Ok(self.ast.add_stmt(StmtKind::Let { target, value }))
    }

    fn parse_label(&mut self) -> Result<StmtId> {
        self.bump();
        let name = self.expect(TokenKind::Ident)?;
        if !self.ast.declare_label(name.text.clone()) {
            return Err(ParseError::DuplicateLabel {
                name: name.text,
                loc: name.loc,
            }
            .into());
        }
        Ok(self.ast.add_stmt(StmtKind::Label {
            name: name.text,
            loc: name.loc,
        }))
    }

    fn parse_goto(&mut self) -> Result<StmtId> {
        self.bump();
        let name = self.expect(TokenKind::Ident)?;
        Ok(self.ast.add_stmt(StmtKind::Goto {
            label: name.text,
            loc: name.loc,
            block: None,
        }))
    }

    fn parse_if(&mut self) -> Result<StmtId> {
        self.bump();
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_condition()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Then)?;
        if self.check(TokenKind::While) || self.check(TokenKind::For) {
            // a structured loop cannot fit in the single-statement body
            return Err(self.unexpected("statement"));
        }
        let body = self.parse_statement()?;
        Ok(self.ast.add_stmt(StmtKind::If { cond, body }))
    }

    fn parse_while(&mut self) -> Result<StmtId> {
        self.bump();
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_condition()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_statements(TokenKind::EndWhile)?;
        self.expect(TokenKind::EndWhile)?;
        Ok(self.ast.add_stmt(StmtKind::While { cond, body }))
    }

    fn parse_for(&mut self) -> Result<StmtId> {
        self.bump();
        let var = self.parse_lvalue()?;
        self.expect(TokenKind::Assign)?;
        let lo = self.parse_expression()?;
        self.expect(TokenKind::To)?;
        let hi = self.parse_expression()?;
        let step = if self.check(TokenKind::By) {
            self.bump();
            self.parse_expression()?
        } else {
            self.ast.add_expr(Expr::Int(1))
        };
        let body = self.parse_statements(TokenKind::EndFor)?;
        self.expect(TokenKind::EndFor)?;
        Ok(self.ast.add_stmt(StmtKind::For {
            var,
            lo,
            hi,
            step,
            body,
        }))
    }

    fn parse_input(&mut self) -> Result<StmtId> {
        self.bump();
        let target = self.parse_lvalue()?;
        match target {
            LValue::Var(_) | LValue::Ssa(_) => {
                let value = self.ast.add_expr(Expr::InputInt);
                Ok(self.ast.add_stmt(StmtKind::Let { target, value }))
            }
            LValue::Array { .. } => Ok(self.ast.add_stmt(StmtKind::Input(target))),
        }
    }

    // ---- l-values and expressions ----

    fn parse_lvalue(&mut self) -> Result<LValue> {
        let name = self.expect(TokenKind::Ident)?;
        let var = self
            .ast
            .lookup_var(&name.text)
            .ok_or_else(|| ParseError::UnknownVariable {
                name: name.text.clone(),
                loc: name.loc,
            })?;
        let indices = self.parse_subscripts(&name, var)?;
        if indices.is_empty() {
            Ok(LValue::Var(var))
        } else {
            Ok(LValue::Array { var, indices })
        }
    }

    fn parse_subscripts(&mut self, name: &Token, var: crate::ast::VarId) -> Result<Vec<ExprId>> {
        let mut indices = Vec::new();
        while self.check(TokenKind::LBracket) && indices.len() < MAX_DIMENSIONS {
            self.bump();
            indices.push(self.parse_expression()?);
            self.expect(TokenKind::RBracket)?;
        }
        let expected = self.ast.var(var).dimensions();
        if indices.len() != expected {
            return Err(ParseError::SubscriptMismatch {
                name: name.text.clone(),
                expected,
                found: indices.len(),
                loc: name.loc,
            }
            .into());
        }
        Ok(indices)
    }

    fn parse_condition(&mut self) -> Result<ExprId> {
        let left = self.parse_expression()?;
        let op = match binop_for(self.current().kind) {
            Some(op) if op.is_comparison() => op,
            _ => return Err(ParseError::ExpectedComparison { loc: self.loc() }.into()),
        };
        self.bump();
        let right = self.parse_expression()?;
        Ok(self.ast.add_expr(Expr::Binary { op, left, right }))
    }

    fn parse_expression(&mut self) -> Result<ExprId> {
        let mut result = self.parse_term()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Add => BinOp::Add,
                TokenKind::Sub => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_term()?;
            result = self.ast.add_expr(Expr::Binary {
                op,
                left: result,
                right,
            });
        }
        Ok(result)
    }

    fn parse_term(&mut self) -> Result<ExprId> {
        let mut result = self.parse_factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Mul => BinOp::Mul,
                TokenKind::Div => BinOp::Div,
                TokenKind::Mod => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_factor()?;
            result = self.ast.add_expr(Expr::Binary {
                op,
                left: result,
                right,
            });
        }
        Ok(result)
    }

    fn parse_factor(&mut self) -> Result<ExprId> {
        let unary = match self.current().kind {
            TokenKind::Add => {
                self.bump();
                Some(UnaryOp::Plus)
            }
            TokenKind::Sub => {
                self.bump();
                Some(UnaryOp::Neg)
            }
            _ => None,
        };

        let inner = match self.current().kind {
            TokenKind::Number => {
                let token = self.bump();
                let value: i64 = token
                    .text
                    .parse()
                    .map_err(|_| self.unexpected("integer literal"))?;
                self.ast.add_expr(Expr::Int(value))
            }
            TokenKind::Ident => self.parse_var_factor()?,
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                inner
            }
            _ => return Err(self.unexpected("expression")),
        };

        Ok(match unary {
            Some(op) => self.ast.add_expr(Expr::Unary { op, value: inner }),
            None => inner,
        })
    }

    fn parse_var_factor(&mut self) -> Result<ExprId> {
        let name = self.expect(TokenKind::Ident)?;
        let var = self
            .ast
            .lookup_var(&name.text)
            .ok_or_else(|| ParseError::UnknownVariable {
                name: name.text.clone(),
                loc: name.loc,
            })?;
        let indices = self.parse_subscripts(&name, var)?;
        if indices.is_empty() {
            Ok(self.ast.add_expr(Expr::Var(var)))
        } else {
            Ok(self.ast.add_expr(Expr::ArrayRead { var, indices }))
        }
    }

    // ---- structured lowering ----

    /// Expand `while` and `for` into label/if/goto primitives, innermost
    /// loops first.
    fn lower_structured(&mut self, stmts: Vec<StmtId>) -> Result<Vec<StmtId>> {
        let mut out = Vec::new();
        for sid in stmts {
            match self.ast.stmt(sid).kind.clone() {
                StmtKind::While { cond, body } => {
                    let body = self.lower_structured(body)?;
                    self.lower_while(cond, body, &mut out)?;
                }
                StmtKind::For {
                    var,
                    lo,
                    hi,
                    step,
                    body,
                } => {
                    let body = self.lower_structured(body)?;
                    self.lower_for(var, lo, hi, step, body, &mut out);
                }
                _ => out.push(sid),
            }
        }
        Ok(out)
    }

    /// `while (c) BODY endwhile` becomes:
    /// `label top; if (!c) goto done; BODY; goto top; label done`
    fn lower_while(&mut self, cond: ExprId, body: Vec<StmtId>, out: &mut Vec<StmtId>) -> Result<()> {
        let top = self.ast.fresh_label();
        let done = self.ast.fresh_label();

        let op = match self.ast.expr(cond) {
            Expr::Binary { op, .. } => *op,
            _ => {
                return Err(ParseError::ExpectedComparison {
                    loc: Loc::SYNTHETIC,
                }
                .into())
            }
        };
        let inverse = op.inverse().ok_or(ParseError::ExpectedComparison {
            loc: Loc::SYNTHETIC,
        })?;
        if let Expr::Binary { op, .. } = self.ast.expr_mut(cond) {
            *op = inverse;
        }

        out.push(self.ast.add_stmt(StmtKind::Label {
            name: top.clone(),
            loc: Loc::SYNTHETIC,
        }));
        let jump = self.ast.add_stmt(StmtKind::Goto {
            label: done.clone(),
            loc: Loc::SYNTHETIC,
            block: None,
        });
        out.push(self.ast.add_stmt(StmtKind::If { cond, body: jump }));
        out.extend(body);
        out.push(self.ast.add_stmt(StmtKind::Goto {
            label: top,
            loc: Loc::SYNTHETIC,
            block: None,
        }));
        out.push(self.ast.add_stmt(StmtKind::Label {
            name: done,
            loc: Loc::SYNTHETIC,
        }));
        Ok(())
    }

    /// `for v := lo to hi by s BODY endfor` becomes:
    /// `let v := lo; label top; BODY; let v := v + s; if (v <= hi) goto top`
    fn lower_for(
        &mut self,
        var: LValue,
        lo: ExprId,
        hi: ExprId,
        step: ExprId,
        body: Vec<StmtId>,
        out: &mut Vec<StmtId>,
    ) {
        let top = self.ast.fresh_label();

        out.push(self.ast.add_stmt(StmtKind::Let {
            target: var.clone(),
            value: lo,
        }));
        out.push(self.ast.add_stmt(StmtKind::Label {
            name: top.clone(),
            loc: Loc::SYNTHETIC,
        }));
        out.extend(body);

        let read = self.lvalue_read(&var);
        let incremented = self.ast.add_expr(Expr::Binary {
            op: BinOp::Add,
            left: read,
            right: step,
        });
        out.push(self.ast.add_stmt(StmtKind::Let {
            target: var.clone(),
            value: incremented,
        }));

        let read = self.lvalue_read(&var);
        let cond = self.ast.add_expr(Expr::Binary {
            op: BinOp::Le,
            left: read,
            right: hi,
        });
        let jump = self.ast.add_stmt(StmtKind::Goto {
            label: top,
            loc: Loc::SYNTHETIC,
            block: None,
        });
        out.push(self.ast.add_stmt(StmtKind::If { cond, body: jump }));
    }

    /// A fresh read expression for the storage an l-value names.
    fn lvalue_read(&mut self, lv: &LValue) -> ExprId {
        match lv {
            LValue::Var(v) => self.ast.add_expr(Expr::Var(*v)),
            LValue::Ssa(d) => self.ast.add_expr(Expr::SsaVar(*d)),
            LValue::Array { var, indices } => {
                let indices = indices
                    .iter()
                    .map(|&i| self.clone_expr(i))
                    .collect();
                self.ast.add_expr(Expr::ArrayRead { var: *var, indices })
            }
        }
    }

    /// Deep-copy an expression tree so lowering never aliases subtrees.
    fn clone_expr(&mut self, id: ExprId) -> ExprId {
        match self.ast.expr(id).clone() {
            Expr::Binary { op, left, right } => {
                let left = self.clone_expr(left);
                let right = self.clone_expr(right);
                self.ast.add_expr(Expr::Binary { op, left, right })
            }
            Expr::Unary { op, value } => {
                let value = self.clone_expr(value);
                self.ast.add_expr(Expr::Unary { op, value })
            }
            Expr::ArrayRead { var, indices } => {
                let indices = indices.into_iter().map(|i| self.clone_expr(i)).collect();
                self.ast.add_expr(Expr::ArrayRead { var, indices })
            }
            leaf => self.ast.add_expr(leaf),
        }
    }
}

fn binop_for(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::Add => BinOp::Add,
        TokenKind::Sub => BinOp::Sub,
        TokenKind::Mul => BinOp::Mul,
        TokenKind::Div => BinOp::Div,
        TokenKind::Mod => BinOp::Mod,
        TokenKind::Eq => BinOp::Eq,
        TokenKind::Ne => BinOp::Ne,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Le => BinOp::Le,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::Ge => BinOp::Ge,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Result<Ast> {
        Parser::new(Lexer::new(src).tokenize().unwrap()).parse()
    }

    fn kinds(ast: &Ast) -> Vec<String> {
        ast.body()
            .iter()
            .map(|&s| {
                let name = match &ast.stmt(s).kind {
                    StmtKind::Let { .. } => "let",
                    StmtKind::Goto { .. } => "goto",
                    StmtKind::Label { .. } => "label",
                    StmtKind::If { .. } => "if",
                    StmtKind::While { .. } => "while",
                    StmtKind::For { .. } => "for",
                    StmtKind::Print(_) => "print",
                    StmtKind::Prompt(_) => "prompt",
                    StmtKind::Input(_) => "input",
                    StmtKind::End => "end",
                    StmtKind::Rem(_) => "rem",
                };
                name.to_string()
            })
            .collect()
    }

    #[test]
    fn parses_simple_program() {
        let ast = parse("title \"demo\"\nvar int x\nbegin\nlet x := 1 + 2\nprint x\nend\n").unwrap();
        assert_eq!(ast.title(), Some("demo"));
        assert_eq!(kinds(&ast), vec!["let", "print", "end"]);
    }

    #[test]
    fn for_loop_lowers_to_primitives() {
        let ast = parse("var int i\nbegin\nfor i := 1 to 3\nprint i\nendfor\nend\n").unwrap();
        assert_eq!(
            kinds(&ast),
            vec!["let", "label", "print", "let", "if", "end"]
        );
    }

    #[test]
    fn while_loop_lowers_with_inverted_condition() {
        let ast = parse("var int i\nbegin\nwhile (i < 3)\nlet i := i + 1\nendwhile\nend\n").unwrap();
        assert_eq!(
            kinds(&ast),
            vec!["label", "if", "let", "goto", "label", "end"]
        );
        // the guard jumps out when i >= 3
        let guard = ast.body()[1];
        let StmtKind::If { cond, .. } = &ast.stmt(guard).kind else {
            panic!("expected guard");
        };
        let Expr::Binary { op, .. } = ast.expr(*cond) else {
            panic!("expected comparison");
        };
        assert_eq!(*op, BinOp::Ge);
    }

    #[test]
    fn nested_loops_lower_innermost_first() {
        let src = "var int i int j\nbegin\nfor i := 1 to 2\nwhile (j < 2)\nlet j := j + 1\nendwhile\nendfor\nend\n";
        let ast = parse(src).unwrap();
        assert!(!kinds(&ast).iter().any(|k| k == "while" || k == "for"));
    }

    #[test]
    fn scalar_input_desugars_to_let() {
        let ast = parse("var int x\nbegin\ninput x\nprint x\nend\n").unwrap();
        let StmtKind::Let { value, .. } = &ast.stmt(ast.body()[0]).kind else {
            panic!("expected desugared let");
        };
        assert!(matches!(ast.expr(*value), Expr::InputInt));
    }

    #[test]
    fn array_input_stays_a_statement() {
        let ast = parse("var list[5] a\nbegin\ninput a[2]\nend\n").unwrap();
        assert!(matches!(
            ast.stmt(ast.body()[0]).kind,
            StmtKind::Input(LValue::Array { .. })
        ));
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let err = parse("begin\nlet x := 1\nend\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let err = parse("begin\nlabel a\nlabel a\nend\n").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::DuplicateLabel { .. })));
    }

    #[test]
    fn subscript_arity_is_checked() {
        let err = parse("var list[2][3] m\nbegin\nlet m[1] := 0\nend\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::SubscriptMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn scalar_with_subscript_is_rejected() {
        let err = parse("var int x\nbegin\nprint x[0]\nend\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::SubscriptMismatch { expected: 0, .. })
        ));
    }

    #[test]
    fn condition_requires_comparison() {
        let err = parse("var int x\nbegin\nif (x + 1) then goto a\nlabel a\nend\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::ExpectedComparison { .. })
        ));
    }

    #[test]
    fn loop_cannot_be_an_if_body() {
        let err =
            parse("var int x\nbegin\nif (x = 0) then while (x < 1)\nendwhile\nend\n").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::UnexpectedToken { .. })));
    }

    #[test]
    fn three_dimensional_lists_parse() {
        let ast = parse("var list[2][3][4] cube\nbegin\nlet cube[0][1][2] := 9\nend\n").unwrap();
        let StmtKind::Let { target, .. } = &ast.stmt(ast.body()[0]).kind else {
            panic!("expected let");
        };
        let LValue::Array { indices, .. } = target else {
            panic!("expected array store");
        };
        assert_eq!(indices.len(), 3);
    }

    #[test]
    fn explicit_by_step_lowers_to_primitives() {
        let ast = parse("var int i\nbegin\nfor i := 10 to 0 by 0 - 2\nprint i\nendfor\nend\n").unwrap();
        assert_eq!(
            kinds(&ast),
            vec!["let", "label", "print", "let", "if", "end"]
        );
    }

    #[test]
    fn by_step_defaults_to_one() {
        let ast = parse("var int i\nbegin\nfor i := 1 to 3\nprint i\nendfor\nend\n").unwrap();
        // body is `let i := 1; label; print i; let i := i + 1; if ...`
        let increment = ast.body()[3];
        let StmtKind::Let { value, .. } = &ast.stmt(increment).kind else {
            panic!("expected the increment let");
        };
        let Expr::Binary { op, right, .. } = ast.expr(*value) else {
            panic!("expected an addition");
        };
        assert_eq!(*op, BinOp::Add);
        assert_eq!(*ast.expr(*right), Expr::Int(1));
    }
}
