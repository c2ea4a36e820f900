//! Error types for the editor facade and runtime

use framedit_dom::{DomError, NodeId};
use framedit_host::HostError;
use framedit_text::LineError;
use thiserror::Error;

use crate::runtime::EditorId;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Line(#[from] LineError),

    #[error("document error: {0}")]
    Dom(#[from] DomError),

    #[error("frame host error: {0}")]
    Host(#[from] HostError),

    #[error("no editor with id {0}")]
    UnknownEditor(EditorId),

    #[error("node {0:?} is not a text field")]
    NotATextField(NodeId),
}

pub type EditorResult<T> = Result<T, EditorError>;
