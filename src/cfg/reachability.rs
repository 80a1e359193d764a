//! Reachability over the block graph.

use std::collections::BTreeSet;

use crate::ast::Ast;

use super::block::BlockId;

/// Blocks reachable from the entry block via successor edges.
///
/// Deleted blocks are skipped. This is the foundation for unreachable-code
/// pruning in the dead-code eliminator.
#[must_use]
pub fn reachable_blocks(ast: &Ast) -> BTreeSet<BlockId> {
    let mut visited = BTreeSet::new();
    let Some(entry) = ast.entry_block() else {
        return visited;
    };
    if ast.block(entry).deleted {
        return visited;
    }

    let mut stack = vec![entry];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        for &succ in &ast.block(id).successors {
            if !ast.block(succ).deleted {
                stack.push(succ);
            }
        }
    }
    visited
}

/// Blocks that cannot be reached from the entry and are not yet deleted.
#[must_use]
pub fn unreachable_blocks(ast: &Ast) -> BTreeSet<BlockId> {
    let reachable = reachable_blocks(ast);
    ast.block_order()
        .iter()
        .copied()
        .filter(|id| !reachable.contains(id) && !ast.block(*id).deleted)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    #[test]
    fn skipped_block_is_unreachable() {
        let src = "begin\ngoto skip\nprint 1\nlabel skip\nprint 2\nend\n";
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();

        let order = ast.block_order().to_vec();
        let dead = unreachable_blocks(&ast);
        assert_eq!(dead.len(), 1);
        assert!(dead.contains(&order[1]));
    }
}
