//! The workflow graph: node/edge storage, structural validation, and the
//! derived order/label views.

pub mod edge;
pub mod model;
pub mod node;

pub(crate) mod connect;
pub(crate) mod order;

pub use edge::{Edge, EdgeId, Handle};
pub use model::{Mutation, ProposedLink, WorkflowGraph};
pub use node::{
    ActionKind, ConditionConfig, CreateUpdateConfig, FieldMapping, FieldRef, FilterConfig,
    FindConfig, FormatterConfig, FormatterOp, LoopConfig, Node, NodeConfig, NodeId, NodeKind,
    PathOption, Position, SheetConfig, SheetFindConfig,
};
