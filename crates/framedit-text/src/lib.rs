//! Line-addressed document model.
//!
//! Lines are identified by opaque [`LineHandle`]s rather than indices, so a
//! handle held across edits keeps pointing at the same line for as long as
//! that line exists.

mod handle;
mod navigate;
pub mod search;
mod sequence;

pub use handle::{LineError, LineHandle, Position};
pub use navigate::LineNavigator;
pub use search::Searcher;
pub use sequence::{Lines, LineSequence};
