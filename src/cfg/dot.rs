//! DOT export of the CFG for visualization.

use crate::ast::{Ast, StmtKind};

use super::reachability::reachable_blocks;

/// Render the block graph in Graphviz DOT format.
///
/// Unreachable blocks are grey, the entry block green, end blocks red.
#[must_use]
pub fn to_dot(ast: &Ast) -> String {
    let mut dot = String::from("digraph CFG {\n");
    dot.push_str("  node [shape=box];\n");

    let reachable = reachable_blocks(ast);
    let entry = ast.entry_block();

    for &id in ast.block_order() {
        let block = ast.block(id);
        let label_name = block.stmts.first().and_then(|&s| match &ast.stmt(s).kind {
            StmtKind::Label { name, .. } => Some(name.clone()),
            _ => None,
        });
        let ends = block
            .stmts
            .last()
            .is_some_and(|&s| matches!(ast.stmt(s).kind, StmtKind::End));

        let mut label = format!("{id}");
        if let Some(name) = label_name {
            label.push_str(&format!("\\n{name}:"));
        }
        label.push_str(&format!("\\n{} stmts", block.stmts.len()));

        let style = if !reachable.contains(&id) {
            ", style=filled, fillcolor=lightgray"
        } else if Some(id) == entry {
            ", style=filled, fillcolor=lightgreen"
        } else if ends {
            ", style=filled, fillcolor=lightcoral"
        } else {
            ""
        };
        dot.push_str(&format!("  {id} [label=\"{label}\"{style}];\n"));
    }

    for &id in ast.block_order() {
        for &succ in &ast.block(id).successors {
            dot.push_str(&format!("  {id} -> {succ};\n"));
        }
    }

    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::build_cfg;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    #[test]
    fn dot_output_has_nodes_and_edges() {
        let src = "var int x\nbegin\nlet x := 1\nlabel top\nprint x\nend\n";
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut ast = Parser::new(tokens).parse().unwrap();
        build_cfg(&mut ast).unwrap();

        let dot = to_dot(&ast);
        assert!(dot.starts_with("digraph CFG {"));
        assert!(dot.contains("B0"));
        assert!(dot.contains("B0 -> B1;"));
        assert!(dot.contains("top:"));
    }
}
