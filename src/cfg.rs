//! Control-flow graph construction and queries.
//!
//! The CFG builder flattens the structured program body into a list of
//! basic blocks stored in the arena, wires successor/predecessor edges, and
//! resolves `goto` labels to block ids.

mod block;
mod builder;
mod dot;
mod reachability;
mod summary;

pub use block::{BasicBlock, BlockId, VarDefSet};
pub use builder::build_cfg;
pub use dot::to_dot;
pub use reachability::{reachable_blocks, unreachable_blocks};
pub use summary::{summarize, BlockSummary, CfgSummary};
