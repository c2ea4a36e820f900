//! Error types for frame hosting

use framedit_dom::{DomError, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("document error: {0}")]
    Dom(#[from] DomError),

    #[error("placement target {0:?} is not attached to a parent")]
    Detached(NodeId),

    #[error("timers need a Tokio runtime: {0}")]
    NoRuntime(String),
}

pub type HostResult<T> = Result<T, HostError>;
