//! Sequencer configurables
//!
//! Composite flow nodes materialize as `GaudiSequencer` instances named
//! `seq_<digest>`, where the digest is taken over the canonical expression
//! text. Structurally equal expressions therefore share one instance.

use crate::error::{FlowError, FlowResult};
use crate::graph::{member_names, MembershipGraph};
use crate::node::FlowNode;
use gconf_catalog::{Catalog, CatalogError, Configurable, QualifiedName, TypeRegistry};
use gconf_property::{ComponentKind, IntKind, PropertyResult, Schema, Source, TypeSpec, Value};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Component type of generated and user-defined sequencers
pub const SEQUENCER_TYPE: &str = "GaudiSequencer";

/// Ordered member list property
pub const MEMBERS: &str = "Members";

const MODE_OR: &str = "ModeOR";
const SHORT_CIRCUIT: &str = "ShortCircuit";
const INVERT: &str = "Invert";
const IGNORE_FILTER_PASSED: &str = "IgnoreFilterPassed";
const STOP_OVERRIDE: &str = "StopOverride";

/// Boolean decision flags of a sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequencerMode {
    /// Pass when any member passes
    pub mode_or: bool,
    /// Stop at the first member that decides the result
    pub short_circuit: bool,
    /// Invert the final decision
    pub invert: bool,
    /// Always pass, whatever the members decide
    pub ignore_filter_passed: bool,
    /// Keep running members after a failure
    pub stop_override: bool,
}

impl Default for SequencerMode {
    fn default() -> Self {
        Self {
            mode_or: false,
            short_circuit: true,
            invert: false,
            ignore_filter_passed: false,
            stop_override: false,
        }
    }
}

impl SequencerMode {
    /// Short-circuit AND
    #[must_use]
    pub fn and() -> Self {
        Self::default()
    }

    /// Short-circuit OR
    #[must_use]
    pub fn or() -> Self {
        Self {
            mode_or: true,
            ..Self::default()
        }
    }

    /// AND that runs every member
    #[must_use]
    pub fn ordered() -> Self {
        Self {
            short_circuit: false,
            ..Self::default()
        }
    }

    /// Same flags with the decision inverted
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Same flags with the decision ignored
    #[must_use]
    pub fn ignoring(mut self) -> Self {
        self.ignore_filter_passed = true;
        self
    }

    /// Read the flags stored on a configurable; missing keys keep defaults
    #[must_use]
    pub fn of(conf: &Configurable) -> Self {
        let flag = |key: &str, default: bool| {
            conf.value(key).and_then(Value::as_bool).unwrap_or(default)
        };
        let d = Self::default();
        Self {
            mode_or: flag(MODE_OR, d.mode_or),
            short_circuit: flag(SHORT_CIRCUIT, d.short_circuit),
            invert: flag(INVERT, d.invert),
            ignore_filter_passed: flag(IGNORE_FILTER_PASSED, d.ignore_filter_passed),
            stop_override: flag(STOP_OVERRIDE, d.stop_override),
        }
    }

    fn entries(self) -> [(&'static str, bool); 5] {
        [
            (MODE_OR, self.mode_or),
            (SHORT_CIRCUIT, self.short_circuit),
            (INVERT, self.invert),
            (IGNORE_FILTER_PASSED, self.ignore_filter_passed),
            (STOP_OVERRIDE, self.stop_override),
        ]
    }

    fn tags(self) -> Vec<&'static str> {
        let mut tags = Vec::new();
        if self.mode_or {
            tags.push("OR");
        }
        if !self.short_circuit {
            tags.push("NOSC");
        }
        if self.invert {
            tags.push("NOT");
        }
        if self.ignore_filter_passed {
            tags.push("IGNORE");
        }
        tags
    }
}

/// Schema of `GaudiSequencer`
///
/// # Errors
/// Only fails if a default does not fit its declaration.
pub fn sequencer_schema() -> PropertyResult<Schema> {
    let mut schema = Schema::new(SEQUENCER_TYPE, ComponentKind::Algorithm)
        .with_doc("Sequencer running its members under boolean decision logic");
    schema
        .declare(
            MEMBERS,
            TypeSpec::sequence(TypeSpec::String),
            Value::List(Vec::new()),
            "Ordered members as Type/Name",
        )?
        .declare(MODE_OR, TypeSpec::Bool, Value::Bool(false), "Use OR instead of AND")?
        .declare(
            SHORT_CIRCUIT,
            TypeSpec::Bool,
            Value::Bool(true),
            "Stop at the first member deciding the result",
        )?
        .declare(INVERT, TypeSpec::Bool, Value::Bool(false), "Invert the decision")?
        .declare(
            IGNORE_FILTER_PASSED,
            TypeSpec::Bool,
            Value::Bool(false),
            "Always pass",
        )?
        .declare(
            STOP_OVERRIDE,
            TypeSpec::Bool,
            Value::Bool(false),
            "Continue after a failing member",
        )?
        .declare("MeasureTime", TypeSpec::Bool, Value::Bool(false), "Time members")?
        .declare(
            "OutputLevel",
            TypeSpec::Int(IntKind::I32),
            Value::Int(0),
            "Message level; 0 inherits",
        )?;
    Ok(schema)
}

/// Register the sequencer type
///
/// # Errors
/// Propagates schema declaration failures.
pub fn register(types: &mut TypeRegistry) -> FlowResult<()> {
    types.register(sequencer_schema()?);
    Ok(())
}

/// Deterministic sequencer name for a composite node
///
/// The digest covers the node text, so leaves are expected to carry full
/// `Type/name` names; [`materialize`] rewrites them before naming.
#[must_use]
pub fn sequencer_name(node: &FlowNode) -> String {
    let digest = Sha256::digest(node.to_string().as_bytes());
    format!("seq_{}", &hex::encode(digest)[..16])
}

/// Same tree with every leaf replaced by its configurable's full name
fn canonical(catalog: &Catalog, node: &FlowNode) -> FlowResult<FlowNode> {
    let all = |children: &[FlowNode]| -> FlowResult<Vec<FlowNode>> {
        children.iter().map(|child| canonical(catalog, child)).collect()
    };
    Ok(match node {
        FlowNode::Leaf(name) => FlowNode::Leaf(member_conf(catalog, name)?.full_name()),
        FlowNode::True | FlowNode::False => node.clone(),
        FlowNode::And(children) => FlowNode::And(all(children)?),
        FlowNode::Or(children) => FlowNode::Or(all(children)?),
        FlowNode::Ordered(children) => FlowNode::Ordered(all(children)?),
        FlowNode::Not(inner) => FlowNode::Not(Box::new(canonical(catalog, inner)?)),
        FlowNode::Ignore(inner) => FlowNode::Ignore(Box::new(canonical(catalog, inner)?)),
    })
}

fn check_member(conf: &Configurable) -> FlowResult<()> {
    match conf.kind() {
        ComponentKind::Algorithm | ComponentKind::Generic => Ok(()),
        kind => Err(FlowError::NotAnAlgorithm {
            name: conf.name().to_string(),
            kind: kind.to_string(),
        }),
    }
}

fn member_conf<'a>(catalog: &'a Catalog, name: &str) -> FlowResult<&'a Configurable> {
    match catalog.lookup(name) {
        Some(conf) => Ok(conf),
        None => catalog
            .find_by_full_name(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()).into()),
    }
}

/// Append a member to a sequencer, rejecting membership cycles
///
/// # Errors
/// Fails when either side is missing, the target is not a sequencer, the
/// member is not an algorithm, or the edge would close a cycle.
pub fn add_member(catalog: &mut Catalog, sequencer: &str, member: &str) -> FlowResult<()> {
    if catalog.get(sequencer)?.type_name() != SEQUENCER_TYPE {
        return Err(FlowError::NotASequencer(sequencer.to_string()));
    }
    let conf = member_conf(catalog, member)?;
    check_member(conf)?;
    let member_name = conf.name().to_string();
    let full_name = conf.full_name();

    let mut graph = MembershipGraph::from_catalog(catalog);
    graph.add_edge(sequencer, &member_name)?;
    catalog.append(sequencer, MEMBERS, Value::list([full_name]), Source::Script)?;
    Ok(())
}

/// Create (or reuse) a named sequencer with the given flags and members
///
/// Flags equal to the schema defaults are left untouched so they are not
/// reported as overridden.
///
/// # Errors
/// Same as [`add_member`], plus type clashes on the name.
pub fn define_sequencer(
    catalog: &mut Catalog,
    name: &str,
    mode: SequencerMode,
    members: &[&str],
) -> FlowResult<QualifiedName> {
    let (qn, _) = catalog.ensure(SEQUENCER_TYPE, name)?;
    let key = qn.to_string();
    let defaults = SequencerMode::default().entries();
    for ((flag, value), (_, default)) in mode.entries().into_iter().zip(defaults) {
        if value != default {
            catalog.set(&key, flag, value, Source::Script)?;
        }
    }
    for member in members {
        add_member(catalog, &key, member)?;
    }
    Ok(qn)
}

/// Turn an expression into catalog entries, returning the top-level name
///
/// A leaf returns the named algorithm itself. Composite nodes become
/// sequencers, reused when an equal expression was materialized before.
///
/// # Errors
/// Fails when a leaf is missing or is not an algorithm.
pub fn materialize(catalog: &mut Catalog, node: &FlowNode) -> FlowResult<QualifiedName> {
    if let FlowNode::Leaf(name) = node {
        let conf = member_conf(catalog, name)?;
        check_member(conf)?;
        return Ok(conf.name().clone());
    }

    let name = sequencer_name(&canonical(catalog, node)?);
    if catalog.contains(&name) {
        tracing::debug!("reusing sequencer {} for {}", name, node);
        return Ok(name.parse()?);
    }

    let members = node
        .children()
        .iter()
        .map(|child| materialize(catalog, child).map(|qn| qn.to_string()))
        .collect::<FlowResult<Vec<String>>>()?;
    let member_refs: Vec<&str> = members.iter().map(String::as_str).collect();

    let mode = match node {
        FlowNode::Or(_) => SequencerMode::or(),
        FlowNode::Ordered(_) => SequencerMode::ordered(),
        FlowNode::Not(_) | FlowNode::False => SequencerMode::and().inverted(),
        FlowNode::Ignore(_) => SequencerMode::and().ignoring(),
        FlowNode::And(_) | FlowNode::True | FlowNode::Leaf(_) => SequencerMode::and(),
    };
    tracing::debug!("materializing {} as {}", node, name);
    define_sequencer(catalog, &name, mode, &member_refs)
}

/// Indented tree of a sequencer and its members
///
/// # Errors
/// Fails when the root is missing.
pub fn print_sequence(catalog: &Catalog, root: &str) -> FlowResult<String> {
    let mut out = String::new();
    let mut stack = Vec::new();
    print_node(catalog, member_conf(catalog, root)?, 0, &mut stack, &mut out);
    Ok(out)
}

fn print_node(
    catalog: &Catalog,
    conf: &Configurable,
    depth: usize,
    stack: &mut Vec<String>,
    out: &mut String,
) {
    let name = conf.name().to_string();
    let indent = "  ".repeat(depth);
    if conf.type_name() != SEQUENCER_TYPE {
        let _ = writeln!(out, "{indent}{}", conf.full_name());
        return;
    }
    let tags = SequencerMode::of(conf).tags();
    if tags.is_empty() {
        let _ = writeln!(out, "{indent}{}", conf.full_name());
    } else {
        let _ = writeln!(out, "{indent}{} [{}]", conf.full_name(), tags.join(","));
    }
    if stack.contains(&name) {
        return;
    }
    stack.push(name);
    for member in member_names(catalog, conf.value(MEMBERS)) {
        match catalog.lookup(&member) {
            Some(child) => print_node(catalog, child, depth + 1, stack, out),
            None => {
                let _ = writeln!(out, "{}{member} (missing)", "  ".repeat(depth + 1));
            }
        }
    }
    stack.pop();
}
