//! Hand-rolled scanner turning source text into a token stream.
//!
//! The language is line-oriented only in its comments: `rem` swallows the
//! rest of its line. Everything else is free-form whitespace-separated.

use crate::error::LexError;
use crate::token::{Loc, Token, TokenKind};

/// Scanner over a source string.
pub struct Lexer<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over the given source text.
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Scan the entire input.
    ///
    /// The returned stream always ends with a single [`TokenKind::Eof`] token.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] on the first malformed character, string, or
    /// numeric literal.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let loc = self.loc();
            let Some(ch) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", loc));
                return Ok(tokens);
            };

            if ch.is_ascii_digit() {
                tokens.push(self.lex_number(loc)?);
            } else if ch.is_ascii_alphabetic() || ch == '_' {
                tokens.push(self.lex_word(loc));
            } else if ch == '"' {
                tokens.push(self.lex_string(loc)?);
            } else {
                tokens.push(self.lex_operator(ch, loc)?);
            }
        }
    }

    fn loc(&self) -> Loc {
        Loc::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn lex_number(&mut self, loc: Loc) -> Result<Token, LexError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.bump();
        }
        if text.parse::<i64>().is_err() {
            return Err(LexError::IntegerOutOfRange { text, loc });
        }
        Ok(Token::new(TokenKind::Number, text, loc))
    }

    fn lex_word(&mut self, loc: Loc) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            text.push(c);
            self.bump();
        }
        match TokenKind::keyword(&text) {
            Some(TokenKind::Rem) => {
                // A comment runs to the end of the line.
                let mut comment = String::new();
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    comment.push(c);
                    self.bump();
                }
                Token::new(TokenKind::Rem, comment.trim().to_string(), loc)
            }
            Some(kind) => Token::new(kind, text, loc),
            None => Token::new(TokenKind::Ident, text, loc),
        }
    }

    fn lex_string(&mut self, loc: Loc) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(LexError::UnterminatedString { loc }),
                Some('"') => {
                    self.bump();
                    return Ok(Token::new(TokenKind::Str, text, loc));
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
    }

    fn lex_operator(&mut self, ch: char, loc: Loc) -> Result<Token, LexError> {
        self.bump();
        let two = |lexer: &mut Self, kind: TokenKind, text: &str| {
            lexer.bump();
            Ok(Token::new(kind, text, loc))
        };
        match (ch, self.peek()) {
            (':', Some('=')) => two(self, TokenKind::Assign, ":="),
            ('<', Some('=')) => two(self, TokenKind::Le, "<="),
            ('<', Some('>')) => two(self, TokenKind::Ne, "<>"),
            ('>', Some('=')) => two(self, TokenKind::Ge, ">="),
            ('<', _) => Ok(Token::new(TokenKind::Lt, "<", loc)),
            ('>', _) => Ok(Token::new(TokenKind::Gt, ">", loc)),
            ('=', _) => Ok(Token::new(TokenKind::Eq, "=", loc)),
            ('+', _) => Ok(Token::new(TokenKind::Add, "+", loc)),
            ('-', _) => Ok(Token::new(TokenKind::Sub, "-", loc)),
            ('*', _) => Ok(Token::new(TokenKind::Mul, "*", loc)),
            ('/', _) => Ok(Token::new(TokenKind::Div, "/", loc)),
            ('%', _) => Ok(Token::new(TokenKind::Mod, "%", loc)),
            ('(', _) => Ok(Token::new(TokenKind::LParen, "(", loc)),
            (')', _) => Ok(Token::new(TokenKind::RParen, ")", loc)),
            ('[', _) => Ok(Token::new(TokenKind::LBracket, "[", loc)),
            (']', _) => Ok(Token::new(TokenKind::RBracket, "]", loc)),
            (',', _) => Ok(Token::new(TokenKind::Comma, ",", loc)),
            _ => Err(LexError::UnexpectedChar { ch, loc }),
        }
    }

    /// The source text this lexer was created over.
    #[must_use]
    pub fn source(&self) -> &'a str {
        self.src
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn scans_simple_let() {
        assert_eq!(
            kinds("let x := 1 + 2"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Add,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_comparisons() {
        assert_eq!(
            kinds("= <> < > <= >="),
            vec![
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rem_swallows_rest_of_line() {
        let tokens = Lexer::new("rem this is a comment\nprint 1").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Rem);
        assert_eq!(tokens[0].text, "this is a comment");
        assert_eq!(tokens[1].kind, TokenKind::Print);
    }

    #[test]
    fn string_literal() {
        let tokens = Lexer::new("prompt \"enter a number: \"").tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].text, "enter a number: ");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("prompt \"oops\nprint 1").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = Lexer::new("let x := 1\nprint x").tokenize().unwrap();
        let print = tokens.iter().find(|t| t.kind == TokenKind::Print).unwrap();
        assert_eq!(print.loc, Loc::new(2, 1));
    }

    #[test]
    fn oversized_integer_is_an_error() {
        let err = Lexer::new("let x := 99999999999999999999").tokenize().unwrap_err();
        assert!(matches!(err, LexError::IntegerOutOfRange { .. }));
    }

    #[test]
    fn unexpected_character() {
        let err = Lexer::new("let x := 1 ; 2").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: ';', .. }));
    }
}
