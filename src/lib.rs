//! # Basil Compiler Library
//!
//! An optimizing compiler for Basil, a small BASIC-flavored imperative
//! language with integer scalars, fixed-size arrays, labels and gotos,
//! structured loops, and terminal I/O.
//!
//! ## Architecture Overview
//!
//! The compiler is a pipeline over a single arena-owned IR:
//!
//! ```text
//! Source -> Lexer -> Parser -> CFG -> SSA -> Optimizer -> C code
//!             |        |        |      |        |           |
//!          tokens    AST     blocks  defs   fixed point  codegen
//! ```
//!
//! The middle end converts scalar assignments to SSA form with an
//! iterative reaching-definitions fixed point, materializes phi
//! expressions at joins, and then loops four passes (expression folding,
//! dead-code elimination, copy propagation, redundant-variable removal)
//! until nothing changes.
//!
//! ## Quick Start
//!
//! ```
//! use basil::Compiler;
//!
//! let source = "var int x\nbegin\nlet x := 2 + 3\nprint x\nend\n";
//! let result = Compiler::new().compile_source(source)?;
//! assert!(result.c_source().contains("5LL"));
//! # Ok::<(), basil::Error>(())
//! ```

pub mod ast;
pub mod cfg;
pub mod cli;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod opt;
pub mod parser;
pub mod poly;
pub mod ssa;
pub mod token;
pub mod validate;

pub use error::{CompileError, Error, LexError, ParseError, Result};

use ast::Ast;

/// Compiler configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// Run the SSA optimizer. When false, compilation stops after CFG
    /// construction and the code generator works on the unoptimized blocks.
    pub optimize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Main entry point used by the CLI and tests.
#[derive(Debug, Default)]
pub struct Compiler {
    options: Options,
}

impl Compiler {
    /// Create a compiler with default options (optimizations on).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler with explicit options.
    #[must_use]
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    /// Compile source text down to an optimized CFG.
    ///
    /// # Errors
    ///
    /// Returns the first lexer, parser, or middle-end error; no partial
    /// result is produced.
    pub fn compile_source(&self, source: &str) -> Result<Compilation> {
        let tokens = lexer::Lexer::new(source).tokenize()?;
        let mut ast = parser::Parser::new(tokens).parse()?;
        cfg::build_cfg(&mut ast)?;
        if self.options.optimize {
            opt::optimize(&mut ast)?;
        }
        Ok(Compilation { ast })
    }
}

/// A finished compile: the arena with blocks in final form.
#[derive(Debug)]
pub struct Compilation {
    /// The IR arena, with the block list in its optimized shape.
    pub ast: Ast,
}

impl Compilation {
    /// The generated C translation unit.
    #[must_use]
    pub fn c_source(&self) -> String {
        codegen::generate_c(&self.ast)
    }

    /// A human-readable IR listing with SSA versions.
    #[must_use]
    pub fn listing(&self) -> String {
        ast::listing(&self.ast)
    }

    /// The CFG in Graphviz DOT format.
    #[must_use]
    pub fn dot(&self) -> String {
        cfg::to_dot(&self.ast)
    }

    /// A machine-readable CFG summary.
    #[must_use]
    pub fn summary(&self) -> cfg::CfgSummary {
        cfg::summarize(&self.ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_compiles_and_renders_every_format() {
        let source = "title \"demo\"\nvar int x\nbegin\nlet x := 1 + 1\nprint x\nend\n";
        let result = Compiler::new().compile_source(source).unwrap();

        assert!(result.c_source().contains("int main(void)"));
        assert!(result.listing().contains("B0:"));
        assert!(result.dot().starts_with("digraph CFG {"));
        assert_eq!(result.summary().title.as_deref(), Some("demo"));
    }

    #[test]
    fn unoptimized_mode_keeps_the_stores() {
        let source = "var int x\nbegin\nlet x := 2 + 3\nprint x\nend\n";
        let result = Compiler::with_options(Options { optimize: false })
            .compile_source(source)
            .unwrap();
        assert!(result.c_source().contains("x = (2LL + 3LL);"));
    }
}
