//! Graphviz rendering of control-flow expressions

use crate::node::{FlowNode, FlowVisitor};
use std::fmt::Write as _;

#[derive(Default)]
struct DotWriter {
    out: String,
    next: usize,
    stack: Vec<usize>,
}

impl FlowVisitor for DotWriter {
    fn enter(&mut self, node: &FlowNode) {
        let id = self.next;
        self.next += 1;
        let shape = match node {
            FlowNode::Leaf(_) => "box",
            FlowNode::True | FlowNode::False => "plaintext",
            _ => "ellipse",
        };
        let label = node.label().replace('"', "\\\"");
        let _ = writeln!(self.out, "  n{id} [label=\"{label}\", shape={shape}];");
        if let Some(parent) = self.stack.last() {
            let _ = writeln!(self.out, "  n{parent} -> n{id};");
        }
        self.stack.push(id);
    }

    fn leave(&mut self, _node: &FlowNode) {
        self.stack.pop();
    }
}

/// Render an expression tree as a `digraph`
#[must_use]
pub fn to_dot(node: &FlowNode) -> String {
    let mut writer = DotWriter::default();
    writer.out.push_str("digraph ControlFlow {\n");
    node.visit(&mut writer);
    writer.out.push_str("}\n");
    writer.out
}
