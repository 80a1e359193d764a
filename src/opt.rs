//! The multi-pass optimizer.
//!
//! After SSA and phi construction, the driver loops over the four passes
//! (expression folding, dead-code elimination, copy propagation,
//! redundant-variable removal) until a full round reports no progress. The
//! passes are monotone: they never resurrect removed definitions or add new
//! uses of unreferenced ones, so the loop terminates; a hard round bound
//! catches bugs that would otherwise spin forever. Two cleanup steps run
//! once at the end: unused variables are marked eliminated and scalars that
//! are not definitely assigned before first use get a default
//! initialization in the entry block.

mod cleanup;
mod copy_prop;
mod dce;
mod fold;
mod redundant;

use tracing::debug;

use crate::ast::Ast;
use crate::error::{CompileError, Result};
use crate::ssa;

pub use cleanup::{default_initialize_vars, eliminate_unused_vars};
pub use copy_prop::propagate_copies;
pub use dce::eliminate_dead_code;
pub use fold::fold_expressions;
pub use redundant::remove_redundant_variables;

/// Run SSA construction, the pass loop, and the final cleanup steps.
///
/// # Errors
///
/// Surfaces pass failures (constant division by zero, constant
/// out-of-bounds subscripts) and invariant violations.
pub fn optimize(ast: &mut Ast) -> Result<()> {
    ssa::build_ssa(ast)?;
    ssa::build_phi_nodes(ast);

    run_pass_loop(ast)?;

    eliminate_unused_vars(ast);
    default_initialize_vars(ast);
    Ok(())
}

/// Run passes G-J to their fixed point. Exposed separately so tests can
/// check that a second run changes nothing.
///
/// # Errors
///
/// See [`optimize`].
pub fn run_pass_loop(ast: &mut Ast) -> Result<()> {
    let bound = 10 * (ast.block_count() + ast.stmt_count()) + 10;
    let mut rounds = 0usize;
    loop {
        let mut progress = false;
        progress |= fold_expressions(ast)?;
        progress |= eliminate_dead_code(ast);
        progress |= propagate_copies(ast);
        progress |= remove_redundant_variables(ast);

        rounds += 1;
        if !progress {
            break;
        }
        if rounds > bound {
            return Err(
                CompileError::invariant("optimizer pass loop failed to reach a fixed point")
                    .into(),
            );
        }
    }
    debug!(rounds, "optimizer reached fixed point");
    Ok(())
}
