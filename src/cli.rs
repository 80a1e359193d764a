//! Command line interface for the Basil compiler.

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser as ClapParser, ValueEnum};

use crate::{Compiler, Options};

/// What the compiler should write out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Generated C source (default).
    C,
    /// Textual IR listing with SSA versions.
    Ir,
    /// CFG in Graphviz DOT format.
    Dot,
    /// CFG summary as JSON.
    Json,
}

/// An optimizing compiler for the Basil language.
#[derive(Debug, ClapParser)]
#[command(name = "basilc", version, about)]
pub struct Cli {
    /// Source file to compile.
    pub input: PathBuf,

    /// Output file (stdout when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "c")]
    pub emit: Emit,

    /// Skip the SSA optimizer.
    #[arg(long)]
    pub no_opt: bool,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Run the compile and write the requested output.
    ///
    /// # Errors
    ///
    /// Fails on I/O problems or any compile error, with enough context to
    /// print a useful cause chain.
    pub fn run(&self) -> anyhow::Result<()> {
        let source = fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;

        let compiler = Compiler::with_options(Options {
            optimize: !self.no_opt,
        });
        let result = compiler
            .compile_source(&source)
            .with_context(|| format!("failed to compile {}", self.input.display()))?;

        let text = match self.emit {
            Emit::C => result.c_source(),
            Emit::Ir => result.listing(),
            Emit::Dot => result.dot(),
            Emit::Json => serde_json::to_string_pretty(&result.summary())
                .context("failed to serialize the CFG summary")?,
        };

        match &self.output {
            Some(path) => fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_parsing() {
        let cli = Cli::parse_from(["basilc", "program.bas", "--emit", "dot", "-vv"]);
        assert_eq!(cli.emit, Emit::Dot);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.no_opt);
    }
}
