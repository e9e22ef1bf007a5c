use crate::engine::types::{ArchitectureType, NodeKind};

/// Local failures of the graph engine.
///
/// These abort the triggering edit and leave the graph as it was.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} not found")]
    NodeNotFound(String),

    #[error("edge {0} not found")]
    EdgeNotFound(String),

    #[error("connection {0} not found")]
    ConnectionNotFound(String),

    #[error("a node with id {0} already exists")]
    DuplicateId(String),

    #[error("node {0} cannot be connected to itself")]
    SelfLoop(String),

    #[error("an edge from {from} to {to} already exists")]
    DuplicateEdge { from: String, to: String },

    #[error("connection {0} is not valid and cannot be committed")]
    InvalidConnection(String),

    #[error("node {id} is a {kind} layer and cannot take a {attempted} configuration")]
    KindMismatch {
        id: String,
        kind: NodeKind,
        attempted: NodeKind,
    },

    #[error("no template exists for {0} architectures")]
    UnsupportedTemplate(ArchitectureType),

    #[error("unknown layer type {0}")]
    UnknownNodeKind(String),

    #[error("unknown architecture type {0}")]
    UnknownArchitectureType(String),

    #[error("graph contains a cycle through node {0}")]
    Cycle(String),
}

impl GraphError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::NodeNotFound(_)
                | GraphError::EdgeNotFound(_)
                | GraphError::ConnectionNotFound(_)
        )
    }
}
