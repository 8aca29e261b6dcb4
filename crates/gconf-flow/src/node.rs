//! Control-flow expression trees
//!
//! Expressions are built with named constructors instead of operators and
//! normalized on construction: `CFTrue`/`CFFalse` are simplified away and
//! nested chains of the same operator are flattened, so structurally equal
//! expressions compare equal and share one canonical text.

use std::fmt::{self, Display, Formatter};

/// Control-flow node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowNode {
    /// Algorithm or sequencer, by qualified name
    Leaf(String),
    /// Always passes
    True,
    /// Always fails
    False,
    /// AND with short-circuit: stop at the first failing child
    And(Vec<FlowNode>),
    /// OR with short-circuit: stop at the first passing child
    Or(Vec<FlowNode>),
    /// AND without short-circuit: every child runs
    Ordered(Vec<FlowNode>),
    /// Inverted decision
    Not(Box<FlowNode>),
    /// Child runs; its decision is ignored
    Ignore(Box<FlowNode>),
}

/// Leaf node for a configurable
pub fn leaf(name: impl Into<String>) -> FlowNode {
    FlowNode::Leaf(name.into())
}

/// Identity for [`sequence`]
#[must_use]
pub fn cf_true() -> FlowNode {
    FlowNode::True
}

/// Identity for [`alternative`]
#[must_use]
pub fn cf_false() -> FlowNode {
    FlowNode::False
}

/// Short-circuit AND of the nodes, in order
pub fn sequence(nodes: impl IntoIterator<Item = FlowNode>) -> FlowNode {
    nodes.into_iter().fold(FlowNode::True, and)
}

/// Short-circuit OR of the nodes, in order
pub fn alternative(nodes: impl IntoIterator<Item = FlowNode>) -> FlowNode {
    nodes.into_iter().fold(FlowNode::False, or)
}

/// AND of the nodes with every child executed
pub fn ordered(nodes: impl IntoIterator<Item = FlowNode>) -> FlowNode {
    let children: Vec<FlowNode> = nodes.into_iter().flat_map(|n| flatten(n, Op::Ordered)).collect();
    match children.len() {
        0 => FlowNode::True,
        1 => children.into_iter().next().unwrap_or(FlowNode::True),
        _ => FlowNode::Ordered(children),
    }
}

/// Sequence whose short-circuit policy is chosen by the caller
pub fn sequence_with(nodes: impl IntoIterator<Item = FlowNode>, short_circuit: bool) -> FlowNode {
    if short_circuit {
        sequence(nodes)
    } else {
        ordered(nodes)
    }
}

/// Inverted decision
#[must_use]
pub fn negate(node: FlowNode) -> FlowNode {
    match node {
        FlowNode::True => FlowNode::False,
        FlowNode::False => FlowNode::True,
        other => FlowNode::Not(Box::new(other)),
    }
}

/// Decision ignored
#[must_use]
pub fn ignore(node: FlowNode) -> FlowNode {
    match node {
        ignored @ FlowNode::Ignore(_) => ignored,
        other => FlowNode::Ignore(Box::new(other)),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
    Ordered,
}

fn flatten(node: FlowNode, op: Op) -> Vec<FlowNode> {
    match (node, op) {
        (FlowNode::And(children), Op::And)
        | (FlowNode::Or(children), Op::Or)
        | (FlowNode::Ordered(children), Op::Ordered) => children,
        (other, _) => vec![other],
    }
}

fn and(lhs: FlowNode, rhs: FlowNode) -> FlowNode {
    match (lhs, rhs) {
        (FlowNode::True, other) | (other, FlowNode::True) => other,
        (FlowNode::False, _) | (_, FlowNode::False) => FlowNode::False,
        (lhs, rhs) => {
            let mut children = flatten(lhs, Op::And);
            children.extend(flatten(rhs, Op::And));
            FlowNode::And(children)
        }
    }
}

fn or(lhs: FlowNode, rhs: FlowNode) -> FlowNode {
    match (lhs, rhs) {
        (FlowNode::False, other) | (other, FlowNode::False) => other,
        (FlowNode::True, _) | (_, FlowNode::True) => FlowNode::True,
        (lhs, rhs) => {
            let mut children = flatten(lhs, Op::Or);
            children.extend(flatten(rhs, Op::Or));
            FlowNode::Or(children)
        }
    }
}

impl FlowNode {
    /// Direct children
    #[must_use]
    pub fn children(&self) -> &[FlowNode] {
        match self {
            Self::And(children) | Self::Or(children) | Self::Ordered(children) => children,
            Self::Not(inner) | Self::Ignore(inner) => std::slice::from_ref(&**inner),
            Self::Leaf(_) | Self::True | Self::False => &[],
        }
    }

    /// Leaf names in depth-first order
    #[must_use]
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Self::Leaf(name) = self {
            out.push(name);
        }
        for child in self.children() {
            child.collect_leaves(out);
        }
    }

    /// Walk the tree, calling `enter` before and `leave` after the children
    pub fn visit<V: FlowVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.enter(self);
        for child in self.children() {
            child.visit(visitor);
        }
        visitor.leave(self);
    }

    /// Short label of the node kind
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Leaf(name) => name,
            Self::True => "CFTrue",
            Self::False => "CFFalse",
            Self::And(_) => "AND",
            Self::Or(_) => "OR",
            Self::Ordered(_) => "ORDERED",
            Self::Not(_) => "NOT",
            Self::Ignore(_) => "IGNORE",
        }
    }
}

/// Tree walker
pub trait FlowVisitor {
    /// Called before the children of `node`
    fn enter(&mut self, _node: &FlowNode) {}

    /// Called after the children of `node`
    fn leave(&mut self, node: &FlowNode);
}

impl Display for FlowNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let join = |f: &mut Formatter<'_>, children: &[FlowNode], sep: &str| -> fmt::Result {
            f.write_str("(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        };
        match self {
            Self::Leaf(name) => f.write_str(name),
            Self::True => f.write_str("CFTrue"),
            Self::False => f.write_str("CFFalse"),
            Self::And(children) => join(f, children, " & "),
            Self::Or(children) => join(f, children, " | "),
            Self::Ordered(children) => join(f, children, " >> "),
            Self::Not(inner) => write!(f, "~{inner}"),
            Self::Ignore(inner) => write!(f, "ignore({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_and_is_flattened() {
        let left = sequence([sequence([leaf("A"), leaf("B")]), leaf("C")]);
        let right = sequence([leaf("A"), sequence([leaf("B"), leaf("C")])]);
        assert_eq!(left, right);
        assert_eq!(left.to_string(), "(A & B & C)");
    }

    #[test]
    fn test_or_and_precedence_text() {
        let e = alternative([sequence([leaf("A"), negate(leaf("B"))]), ignore(leaf("C"))]);
        assert_eq!(e.to_string(), "((A & ~B) | ignore(C))");
    }

    #[test]
    fn test_true_false_identities() {
        assert_eq!(sequence([leaf("A"), cf_true()]), leaf("A"));
        assert_eq!(sequence([leaf("A"), cf_false()]), cf_false());
        assert_eq!(alternative([cf_false(), leaf("A")]), leaf("A"));
        assert_eq!(alternative([leaf("A"), cf_true()]), cf_true());
        assert_eq!(negate(cf_true()), cf_false());
        assert_eq!(sequence(Vec::new()), cf_true());
    }

    #[test]
    fn test_ordered_is_distinct_from_and() {
        let a = sequence([leaf("A"), leaf("B")]);
        let o = ordered([leaf("A"), leaf("B")]);
        assert_ne!(a, o);
        assert_eq!(o.to_string(), "(A >> B)");
        assert_eq!(sequence_with([leaf("A"), leaf("B")], false), o);
    }

    #[test]
    fn test_child_order_matters() {
        assert_ne!(
            sequence([leaf("A"), leaf("B")]),
            sequence([leaf("B"), leaf("A")])
        );
    }

    #[test]
    fn test_ignore_idempotent() {
        assert_eq!(ignore(ignore(leaf("A"))), ignore(leaf("A")));
    }

    #[test]
    fn test_leaves_and_visit() {
        struct Count(usize, usize);
        impl FlowVisitor for Count {
            fn enter(&mut self, _node: &FlowNode) {
                self.0 += 1;
            }
            fn leave(&mut self, _node: &FlowNode) {
                self.1 += 1;
            }
        }
        let e = alternative([sequence([leaf("A"), leaf("B")]), negate(leaf("C"))]);
        assert_eq!(e.leaves(), vec!["A", "B", "C"]);
        let mut count = Count(0, 0);
        e.visit(&mut count);
        assert_eq!((count.0, count.1), (6, 6));
    }
}
