//! Minimal document object model for framedit.
//!
//! Documents are node arenas addressed by [`NodeId`]. Geometry is produced by
//! a simple block/inline flow layout ([`Document::reflow`]) so that offset
//! measurements behave like a browser's without needing one.

mod document;
mod error;
mod html;
mod layout;
mod node;
mod shell;
mod style;

pub use document::{Document, FontMetrics};
pub use error::{DomError, DomResult};
pub use node::{BoxMetrics, NodeId};
pub use shell::{ShellSpec, DOCTYPE};
pub use style::{RuleId, Style, StyleRule, StyleSheet};
