//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the kairo crate so a host
//! application can pull in the whole editing surface with one `use`.
//!
//! # Example
//!
//! ```rust
//! use kairo::prelude::*;
//!
//! let graph = WorkflowGraph::new();
//! let graph = graph
//!     .apply(Mutation::AddNode(Node::step(
//!         "find-1",
//!         ActionKind::Find,
//!         Position::new(250.0, 200.0),
//!     )))
//!     .and_then(|g| g.apply(Mutation::Connect(ProposedLink::new("start", "find-1"))))
//!     .and_then(|g| g.apply(Mutation::Connect(ProposedLink::new("find-1", "end"))));
//! assert!(graph.is_ok());
//! ```

// Graph model and mutations
pub use crate::graph::{
    ActionKind, Edge, EdgeId, Handle, Mutation, Node, NodeConfig, NodeId, NodeKind, Position,
    ProposedLink, WorkflowGraph,
};

// Per-type node configurations
pub use crate::graph::{
    ConditionConfig, CreateUpdateConfig, FieldMapping, FieldRef, FilterConfig, FindConfig,
    FormatterConfig, FormatterOp, LoopConfig, PathOption, SheetConfig, SheetFindConfig,
};

// Conditions and the logic language
pub use crate::condition::{CompareOp, Condition, FieldValue};
pub use crate::logic::{LogicAst, LogicSpec, validate_expression};

// Design-time validation and runtime evaluation
pub use crate::config::{validate_graph, validate_node};
pub use crate::eval::{EvaluationContext, evaluate_condition, evaluate_conditions};

// Metadata, payload, save pipeline
pub use crate::metadata::{FieldDescriptor, FieldType, MetadataCache, MetadataGateway};
pub use crate::payload::{FlowPayload, NodeMapping, PersistedEdge, PersistedNode};
pub use crate::save::{
    AccessToken, SaveCoordinator, SaveGateway, SaveIdentity, SaveReceipt, TokenGateway,
};

// Error types
pub use crate::error::{
    ConfigError, EvalError, ExpressionError, GatewayError, SaveError, StructuralError,
};
