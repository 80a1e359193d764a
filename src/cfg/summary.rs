//! Serializable summary of the block graph, used by `--emit json`.

use serde::Serialize;

use crate::ast::Ast;

/// A machine-readable description of the CFG after compilation.
#[derive(Debug, Serialize)]
pub struct CfgSummary {
    /// Program title from the source header, if any.
    pub title: Option<String>,
    /// One entry per block in id order.
    pub blocks: Vec<BlockSummary>,
    /// Names of variables removed by the optimizer.
    pub eliminated_vars: Vec<String>,
}

/// One block's shape.
#[derive(Debug, Serialize)]
pub struct BlockSummary {
    /// Block id.
    pub id: u32,
    /// Number of statements.
    pub statements: usize,
    /// Successor block ids.
    pub successors: Vec<u32>,
    /// Predecessor block ids.
    pub predecessors: Vec<u32>,
}

/// Summarize the CFG.
#[must_use]
pub fn summarize(ast: &Ast) -> CfgSummary {
    let blocks = ast
        .block_order()
        .iter()
        .map(|&id| {
            let block = ast.block(id);
            BlockSummary {
                id: id.0,
                statements: block.stmts.len(),
                successors: block.successors.iter().map(|b| b.0).collect(),
                predecessors: block.predecessors.iter().map(|b| b.0).collect(),
            }
        })
        .collect();

    let eliminated_vars = ast
        .var_ids()
        .filter(|&v| ast.var(v).eliminated)
        .map(|v| ast.var(v).name.clone())
        .collect();

    CfgSummary {
        title: ast.title().map(str::to_string),
        blocks,
        eliminated_vars,
    }
}
