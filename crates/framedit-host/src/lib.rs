//! Hosting of the isolated editing frame.
//!
//! [`FrameHost`] builds the frame and its document, [`Gutter`] keeps an
//! external column of line numbers in step with it, and [`Scheduler`]
//! runs the timers both of them rely on as Tokio tasks.

pub mod error;
pub mod frame;
pub mod geometry;
pub mod gutter;
pub mod placement;
pub mod timer;

pub use error::{HostError, HostResult};
pub use frame::{BODY_CLASS, FrameHost};
pub use geometry::{CELL_SELECTOR, GeometrySampler, Metrics, PendingProbe, node_top};
pub use gutter::{Gutter, GutterEvent, GutterPhase, cells_for};
pub use placement::{GutterNodes, Placement};
pub use timer::{Millis, Scheduler, Scoped, TimerId, Timers};

/// Class of the column holding line numbers, outside the frame.
pub const LINE_NUMBERS_CLASS: &str = "framedit-line-numbers";
/// Class of a single line-number cell.
pub const LINE_CELL_CLASS: &str = "framedit-line-div";
