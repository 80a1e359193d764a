//! Error types returned by the library.
//!
//! Most public APIs return [`crate::Result`], which uses [`Error`] as the
//! error type. The variants provide access to more specific error categories
//! when needed. No error is recovered inside the compiler; the first failure
//! abandons the compile.

use std::io;

use thiserror::Error;

use crate::token::Loc;

/// Convenient result alias for the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top level error surfaced by the library APIs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Errors encountered while scanning source text.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Errors encountered while parsing the token stream.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Errors raised by the middle end (CFG, SSA, optimizer).
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// I/O failures when reading inputs or writing outputs.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors returned by the lexer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LexError {
    /// A character that cannot start any token.
    #[error("unexpected character {ch:?} at {loc}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Where it was found.
        loc: Loc,
    },

    /// A string literal with no closing quote on its line.
    #[error("unterminated string literal starting at {loc}")]
    UnterminatedString {
        /// Where the literal started.
        loc: Loc,
    },

    /// An integer literal that does not fit in a signed 64-bit value.
    #[error("integer literal {text:?} out of range at {loc}")]
    IntegerOutOfRange {
        /// The literal text.
        text: String,
        /// Where it was found.
        loc: Loc,
    },
}

/// Errors returned by the parser, including name-resolution failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The parser expected one construct and found another token.
    #[error("expected {expected} but found {found:?} at {loc}")]
    UnexpectedToken {
        /// Description of what was expected.
        expected: String,
        /// Text of the token that was found.
        found: String,
        /// Where it was found.
        loc: Loc,
    },

    /// A reference to a variable that was never declared.
    #[error("no such variable {name:?} at {loc}")]
    UnknownVariable {
        /// The undeclared name.
        name: String,
        /// Where it was referenced.
        loc: Loc,
    },

    /// Two variables declared with the same name.
    #[error("variable {name:?} redeclared at {loc}")]
    DuplicateVariable {
        /// The reused name.
        name: String,
        /// Where the second declaration appeared.
        loc: Loc,
    },

    /// A scalar used with subscripts, or an array used without them.
    #[error("variable {name:?} used with {found} subscripts but declared with {expected} at {loc}")]
    SubscriptMismatch {
        /// The variable name.
        name: String,
        /// Number of dimensions in the declaration (0 for scalars).
        expected: usize,
        /// Number of subscripts at the use site.
        found: usize,
        /// Where it was used.
        loc: Loc,
    },

    /// An array dimension that is zero or negative.
    #[error("list {name:?} declared with non-positive extent {extent} at {loc}")]
    BadExtent {
        /// The variable name.
        name: String,
        /// The rejected extent.
        extent: i64,
        /// Where it was declared.
        loc: Loc,
    },

    /// Two labels declared with the same name.
    #[error("label {name:?} already exists (redeclared at {loc})")]
    DuplicateLabel {
        /// The reused label name.
        name: String,
        /// Where the second declaration appeared.
        loc: Loc,
    },

    /// A condition that is not a comparison.
    #[error("expected comparison operator at {loc}")]
    ExpectedComparison {
        /// Where the condition appeared.
        loc: Loc,
    },
}

/// Errors raised by the middle end.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// A `goto` naming a label that was never declared.
    #[error("unresolved label {name:?} at {loc}")]
    UnresolvedLabel {
        /// The missing label name.
        name: String,
        /// Where the goto appeared.
        loc: Loc,
    },

    /// The IR handed to a pass was not in the shape it requires.
    #[error("malformed IR: {message}")]
    MalformedIr {
        /// What was wrong.
        message: String,
    },

    /// An `if` condition that cannot be inverted for branch lowering.
    #[error("cannot invert condition: {message}")]
    NonInvertibleCondition {
        /// Why the inversion failed.
        message: String,
    },

    /// A non-constant polynomial was evaluated as a constant.
    #[error("polynomial is not constant")]
    NonConstantPolynomial,

    /// A division or modulo whose operands folded to constants with a zero divisor.
    #[error("division by zero in constant expression")]
    DivisionByZero,

    /// An array subscript that folded to a constant outside the declared extent.
    #[error("index {index} out of bounds for list {name:?} (extent {extent})")]
    IndexOutOfBounds {
        /// The array name.
        name: String,
        /// The constant index value.
        index: i64,
        /// The declared extent of that dimension.
        extent: i64,
    },

    /// An internal invariant was violated; indicates a bug in a prior pass.
    #[error("invariant violation: {message}")]
    InvariantViolation {
        /// Which invariant failed.
        message: String,
    },
}

impl CompileError {
    /// Shorthand for [`CompileError::InvariantViolation`].
    pub fn invariant(message: impl Into<String>) -> Self {
        CompileError::InvariantViolation {
            message: message.into(),
        }
    }

    /// Shorthand for [`CompileError::MalformedIr`].
    pub fn malformed(message: impl Into<String>) -> Self {
        CompileError::MalformedIr {
            message: message.into(),
        }
    }
}
