//! Sequencer membership graph
//!
//! Edges point from a sequencer to each of its members. The graph is rebuilt
//! from the catalog on demand; it is never the source of truth.

use crate::error::{FlowError, FlowResult};
use crate::sequencer::{MEMBERS, SEQUENCER_TYPE};
use gconf_catalog::Catalog;
use gconf_property::{ComponentRef, Value};
use petgraph::algo::toposort;
use petgraph::dot::{Config, Dot};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;

/// Directed membership graph over qualified names
#[derive(Debug, Clone, Default)]
pub struct MembershipGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    inner: DiGraphMap<usize, ()>,
}

impl MembershipGraph {
    /// Create empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of every sequencer in the catalog
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut graph = Self::new();
        for conf in catalog.iter().filter(|c| c.type_name() == SEQUENCER_TYPE) {
            let from = graph.node(&conf.name().to_string());
            for member in member_names(catalog, conf.value(MEMBERS)) {
                let to = graph.node(&member);
                graph.inner.add_edge(from, to, ());
            }
        }
        graph
    }

    fn node(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.inner.add_node(id);
        id
    }

    /// Add a membership edge, rejecting it when it closes a cycle
    ///
    /// # Errors
    /// Returns [`FlowError::Cycle`] and leaves the graph unchanged.
    pub fn add_edge(&mut self, sequencer: &str, member: &str) -> FlowResult<()> {
        if sequencer == member {
            return Err(FlowError::Cycle(sequencer.to_string()));
        }
        let from = self.node(sequencer);
        let to = self.node(member);
        self.inner.add_edge(from, to, ());

        if petgraph::algo::is_cyclic_directed(&self.inner) {
            self.inner.remove_edge(from, to);
            return Err(FlowError::Cycle(sequencer.to_string()));
        }
        Ok(())
    }

    /// Check if the graph is free of cycles
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.inner)
    }

    /// Names ordered so that every sequencer precedes its members
    ///
    /// # Errors
    /// Returns [`FlowError::Cycle`] naming a node on a cycle.
    pub fn topological_order(&self) -> FlowResult<Vec<&str>> {
        toposort(&self.inner, None)
            .map(|order| order.into_iter().map(|id| self.names[id].as_str()).collect())
            .map_err(|cycle| FlowError::Cycle(self.names[cycle.node_id()].clone()))
    }

    /// Direct members of a sequencer, in insertion order
    #[must_use]
    pub fn members(&self, sequencer: &str) -> Vec<&str> {
        let Some(&id) = self.index.get(sequencer) else {
            return Vec::new();
        };
        self.inner
            .neighbors_directed(id, Direction::Outgoing)
            .map(|n| self.names[n].as_str())
            .collect()
    }

    /// Nodes not contained in any sequencer
    #[must_use]
    pub fn roots(&self) -> Vec<&str> {
        self.inner
            .nodes()
            .filter(|n| {
                self.inner
                    .neighbors_directed(*n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|n| self.names[n].as_str())
            .collect()
    }

    /// Number of names in the graph
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of membership edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Graphviz rendering with qualified names as labels
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut labelled: DiGraphMap<&str, &str> = DiGraphMap::new();
        for name in &self.names {
            labelled.add_node(name.as_str());
        }
        for (from, to, _) in self.inner.all_edges() {
            labelled.add_edge(self.names[from].as_str(), self.names[to].as_str(), "");
        }
        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }
}

/// Qualified names of the members listed in a `Members` value
pub(crate) fn member_names(catalog: &Catalog, members: Option<&Value>) -> Vec<String> {
    members
        .and_then(Value::elements)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(|text| {
            catalog.find_by_full_name(text).map_or_else(
                || ComponentRef::parse(text).name,
                |c| c.name().to_string(),
            )
        })
        .collect()
}
