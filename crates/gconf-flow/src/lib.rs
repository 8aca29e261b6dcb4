//! gconf Control Flow
//!
//! Boolean composition of algorithms into sequencers.
//!
//! # Core Concepts
//!
//! - **FlowNode**: normalized expression tree (`sequence`, `alternative`,
//!   `ordered`, `negate`, `ignore`)
//! - **Sequencer**: `GaudiSequencer` configurable materialized from a node
//! - **MembershipGraph**: sequencer containment, kept acyclic
//!
//! # Example
//!
//! ```rust,ignore
//! use gconf_flow::{leaf, materialize, negate, sequence};
//!
//! let top = sequence([leaf("Filter"), negate(leaf("Veto")), leaf("Writer")]);
//! let name = materialize(&mut catalog, &top)?;
//! catalog.set("ApplicationMgr", "TopAlg", vec![format!("GaudiSequencer/{name}").into()], source)?;
//! ```

#![warn(unreachable_pub)]

pub mod dot;
pub mod error;
pub mod graph;
pub mod node;
pub mod sequencer;

// Re-exports
pub use dot::to_dot;
pub use error::{FlowError, FlowResult};
pub use graph::MembershipGraph;
pub use node::{
    alternative, cf_false, cf_true, ignore, leaf, negate, ordered, sequence, sequence_with,
    FlowNode, FlowVisitor,
};
pub use sequencer::{
    add_member, define_sequencer, materialize, print_sequence, register, sequencer_name,
    sequencer_schema, SequencerMode, MEMBERS, SEQUENCER_TYPE,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building control flow
    pub use crate::{
        alternative, ignore, leaf, materialize, negate, ordered, sequence, FlowError, FlowNode,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
