//! Control-Flow Analyzer (C8, spec §4.8): for functions whose complexity
//! gate passes, emit one entry block, one block per control construct, and
//! one exit block, plus the call edges reachable from within.

use crate::parsing::ast_utils::{child_by_field, node_line_column, text_of};
use crate::storage::{BlockType, CallEdge, CallType, ControlFlowBlock};
use crate::symbol::SymbolId;
use tree_sitter::Node;

/// Scan bound: only the first `MAX_SCAN_LINES` lines of a function body are
/// analyzed (spec §4.8 "scan bound K=200").
const MAX_SCAN_LINES: u32 = 200;

struct Collector<'a> {
    source: &'a str,
    symbol_id: SymbolId,
    body_end_line: u32,
    blocks: Vec<ControlFlowBlock>,
    edges: Vec<CallEdge>,
}

fn line_of(node: Node) -> u32 {
    node_line_column(node).0
}

/// Entry point: `function_node` is the `function_definition`, `body` its
/// compound statement. Blocks are ordered by `start_line`, ties broken by
/// appearance order in the source.
pub fn analyze(function_node: Node, body: Node, source: &str, symbol_id: SymbolId) -> (Vec<ControlFlowBlock>, Vec<CallEdge>) {
    let start_line = line_of(function_node);
    let body_end_line = (line_of(body) + MAX_SCAN_LINES).min(node_line_column(body).2);

    let mut collector = Collector {
        source,
        symbol_id,
        body_end_line,
        blocks: Vec::new(),
        edges: Vec::new(),
    };

    collector.blocks.push(ControlFlowBlock {
        symbol_id,
        block_type: BlockType::Entry,
        start_line,
        end_line: start_line,
        condition: None,
        loop_type: None,
        complexity_contribution: 0.0,
    });

    collector.walk(body);

    let (_, _, exit_line, _) = node_line_column(body);
    collector.blocks.push(ControlFlowBlock {
        symbol_id,
        block_type: BlockType::Exit,
        start_line: exit_line,
        end_line: exit_line,
        condition: None,
        loop_type: None,
        complexity_contribution: 0.0,
    });

    collector
        .blocks
        .sort_by_key(|b| b.start_line);

    (collector.blocks, collector.edges)
}

impl<'a> Collector<'a> {
    fn walk(&mut self, node: Node) {
        if line_of(node) > self.body_end_line {
            return;
        }

        match node.kind() {
            "if_statement" => self.emit_conditional(node),
            "for_statement" | "for_range_loop" => self.emit_loop(node, "for"),
            "while_statement" => self.emit_loop(node, "while"),
            "do_statement" => self.emit_loop(node, "do_while"),
            "switch_statement" => self.emit_switch(node),
            "try_statement" => self.emit_exception(node, "try"),
            "catch_clause" => self.emit_exception(node, "catch"),
            "call_expression" => self.emit_call_edge(node),
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }
    }

    fn emit_conditional(&mut self, node: Node) {
        let (start, _, end, _) = node_line_column(node);
        let condition = child_by_field(node, "condition").map(|c| text_of(c, self.source).to_string());
        self.blocks.push(ControlFlowBlock {
            symbol_id: self.symbol_id,
            block_type: BlockType::Conditional,
            start_line: start,
            end_line: end,
            condition,
            loop_type: None,
            complexity_contribution: 1.0,
        });
    }

    fn emit_loop(&mut self, node: Node, loop_type: &str) {
        let (start, _, end, _) = node_line_column(node);
        let condition = child_by_field(node, "condition").map(|c| text_of(c, self.source).to_string());
        self.blocks.push(ControlFlowBlock {
            symbol_id: self.symbol_id,
            block_type: BlockType::Loop,
            start_line: start,
            end_line: end,
            condition,
            loop_type: Some(loop_type.to_string()),
            complexity_contribution: 2.0,
        });
    }

    fn emit_switch(&mut self, node: Node) {
        let (start, _, end, _) = node_line_column(node);
        let condition = child_by_field(node, "condition").map(|c| text_of(c, self.source).to_string());
        self.blocks.push(ControlFlowBlock {
            symbol_id: self.symbol_id,
            block_type: BlockType::Switch,
            start_line: start,
            end_line: end,
            condition,
            loop_type: None,
            complexity_contribution: 2.0,
        });
    }

    fn emit_exception(&mut self, node: Node, kind: &str) {
        let (start, _, end, _) = node_line_column(node);
        self.blocks.push(ControlFlowBlock {
            symbol_id: self.symbol_id,
            block_type: BlockType::Exception,
            start_line: start,
            end_line: end,
            condition: None,
            loop_type: Some(kind.to_string()),
            complexity_contribution: 1.0,
        });
    }

    fn emit_call_edge(&mut self, node: Node) {
        let Some(function_node) = child_by_field(node, "function") else {
            return;
        };
        let (target_name, call_type) = match function_node.kind() {
            "field_expression" => {
                let name = child_by_field(function_node, "field")
                    .map(|f| text_of(f, self.source).to_string())
                    .unwrap_or_default();
                (name, CallType::Method)
            }
            "identifier" => (text_of(function_node, self.source).to_string(), CallType::Direct),
            _ => (text_of(function_node, self.source).to_string(), CallType::Direct),
        };
        if target_name.is_empty() {
            return;
        }
        let (line, col, _, _) = node_line_column(node);
        self.edges.push(CallEdge {
            caller_symbol_id: self.symbol_id,
            target_name,
            resolved_callee_id: None,
            line,
            column: col,
            call_type,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ast_utils::child_by_field;
    use tree_sitter::Parser;

    fn parse(src: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .unwrap();
        parser.parse(src, None).unwrap()
    }

    fn find_function(root: Node) -> Node {
        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            if node.kind() == "function_definition" {
                return node;
            }
            if !cursor.goto_first_child() {
                panic!("no function_definition found");
            }
        }
    }

    #[test]
    fn if_for_switch_produce_entry_and_exit_plus_one_block_each() {
        let src = "void f() { if (a) { x(); } for (int i = 0; i < 3; i++) { y(); } switch (v) { case 1: break; } }";
        let tree = parse(src);
        let func = find_function(tree.root_node());
        let body = child_by_field(func, "body").unwrap();
        let symbol_id = SymbolId::new(1).unwrap();
        let (blocks, edges) = analyze(func, body, src, symbol_id);

        let entries = blocks.iter().filter(|b| b.block_type == BlockType::Entry).count();
        let exits = blocks.iter().filter(|b| b.block_type == BlockType::Exit).count();
        let conditionals = blocks.iter().filter(|b| b.block_type == BlockType::Conditional).count();
        let loops = blocks.iter().filter(|b| b.block_type == BlockType::Loop).count();
        let switches = blocks.iter().filter(|b| b.block_type == BlockType::Switch).count();

        assert_eq!(entries, 1);
        assert_eq!(exits, 1);
        assert_eq!(conditionals, 1);
        assert_eq!(loops, 1);
        assert_eq!(switches, 1);
        assert!(edges.iter().any(|e| e.target_name == "x"));
        assert!(edges.iter().any(|e| e.target_name == "y"));
    }

    #[test]
    fn blocks_are_ordered_by_start_line() {
        let src = "void f() {\n  if (a) { }\n  for (;;) { }\n}";
        let tree = parse(src);
        let func = find_function(tree.root_node());
        let body = child_by_field(func, "body").unwrap();
        let (blocks, _) = analyze(func, body, src, SymbolId::new(1).unwrap());
        let lines: Vec<u32> = blocks.iter().map(|b| b.start_line).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
    }
}
