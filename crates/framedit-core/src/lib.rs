//! Editor facade, reference engine and runtime.
//!
//! A [`Runtime`] owns the page and every editor placed on it. Each editor is
//! a [`FrameEditor`]: a hosted frame plus an [`EditingEngine`] that owns the
//! document's lines.

pub mod engine;
pub mod error;
pub mod facade;
mod legacy;
pub mod probe;
pub mod runtime;
pub mod search;
pub mod text_engine;

pub use engine::{EditingEngine, HistorySize};
pub use error::{EditorError, EditorResult};
pub use facade::FrameEditor;
pub use probe::{PlatformInfo, is_probably_supported};
pub use runtime::{EditorId, InitCallback, Runtime};
pub use search::SearchCursor;
pub use text_engine::{EngineOptions, LINES_CLASS, TextEngine};

pub use framedit_text::{LineHandle, LineNavigator, Position};
