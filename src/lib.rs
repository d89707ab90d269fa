//! # Kairo - Workflow Graph Compiler and Validator
//!
//! **Kairo** is the core behind a visual workflow builder: it turns a
//! mutable, user-edited node/edge graph into a deterministic execution
//! order with human-readable labels, keeps the graph structurally sound
//! (no illegal cycles, no dangling branches, correct branch/loop
//! topology), and checks every node's configuration before the graph is
//! persisted. A small boolean logic language (`AND`/`OR`/custom
//! expressions like `(1 AND 2) OR 3`) is shared between branching,
//! filtering, loop exit, and runtime field visibility.
//!
//! The crate deliberately owns no rendering, no HTTP, and no execution
//! engine. The canvas feeds it mutations; the metadata/token/save
//! gateways are traits the host implements; the runtime evaluator decides
//! predicates against a form submission the host resolves.
//!
//! ## Core Workflow
//!
//! 1. **Edit**: the canvas proposes mutations (`AddNode`, `Connect`, ...)
//!    and `WorkflowGraph::apply` either rejects them with a
//!    `StructuralError` or returns the next snapshot with fresh
//!    order/labels.
//! 2. **Validate**: when a configuration panel closes, or at save time,
//!    `validate_node`/`validate_graph` check per-type completeness rules.
//! 3. **Save**: `SaveCoordinator` fetches a token if absent, validates
//!    fail-fast, assembles the `FlowPayload`, persists it once, and
//!    retries exactly once after an auth failure.
//! 4. **Run**: the form runtime calls `evaluate_conditions` with the same
//!    condition model to decide branches and visibility.
//!
//! ## Quick Start
//!
//! ```rust
//! use kairo::prelude::*;
//!
//! fn main() -> Result<(), StructuralError> {
//!     // A fresh flow holds exactly one Start and one End node.
//!     let graph = WorkflowGraph::new();
//!
//!     // Drop a Find step and wire Start -> Find -> End.
//!     let graph = graph.apply(Mutation::AddNode(Node::step(
//!         "find-1",
//!         ActionKind::Find,
//!         Position::new(250.0, 200.0),
//!     )))?;
//!     let graph = graph.apply(Mutation::Connect(ProposedLink::new("start", "find-1")))?;
//!     let graph = graph.apply(Mutation::Connect(ProposedLink::new("find-1", "end")))?;
//!
//!     // Order and labels are derived, never hand-edited.
//!     let find = graph.node("find-1").ok_or(StructuralError::NodeNotFound(
//!         "find-1".to_string(),
//!     ))?;
//!     assert_eq!(find.order, Some(2));
//!     assert_eq!(find.label, "Find_1_Level1");
//!
//!     // Illegal connections are rejected synchronously.
//!     let err = graph
//!         .apply(Mutation::Connect(ProposedLink::new("find-1", "find-1")))
//!         .unwrap_err();
//!     assert_eq!(err, StructuralError::SelfReference("find-1".to_string()));
//!     Ok(())
//! }
//! ```

pub mod condition;
pub mod config;
pub mod error;
pub mod eval;
pub mod graph;
pub mod logic;
pub mod metadata;
pub mod payload;
pub mod prelude;
pub mod save;
