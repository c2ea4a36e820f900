//! Error types for document mutation

use crate::node::NodeId;
use crate::style::RuleId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0:?} does not exist in this document")]
    UnknownNode(NodeId),

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("cannot insert {child:?} into {parent:?}: it would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("text nodes cannot have children")]
    NotAnElement(NodeId),

    #[error("style sheet {0} does not exist")]
    UnknownSheet(usize),

    #[error("style rule {0:?} does not exist")]
    UnknownRule(RuleId),
}

pub type DomResult<T> = Result<T, DomError>;
