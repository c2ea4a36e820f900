use std::fmt;
use thiserror::Error;

/// Opaque reference to one line of a [`crate::LineSequence`].
///
/// A handle stays valid until its line is deleted or the document is replaced.
/// Each line gets a fresh generation, so a handle to a deleted line never
/// compares equal to a live one, even when its slot has been reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineHandle {
    slot: u32,
    generation: u32,
}

impl LineHandle {
    /// Returned when navigation runs off either end of the document.
    pub const INVALID: LineHandle = LineHandle {
        slot: u32::MAX,
        generation: 0,
    };

    pub(crate) fn new(slot: usize, generation: u32) -> Self {
        debug_assert!(generation != 0, "generation 0 is reserved for INVALID");
        Self {
            slot: slot as u32,
            generation,
        }
    }

    pub(crate) fn slot(self) -> usize {
        self.slot as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }

    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }

    pub fn is_valid(self) -> bool {
        !self.is_invalid()
    }

    /// `None` for the sentinel, `Some(self)` otherwise.
    pub fn valid(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }
}

impl Default for LineHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for LineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            f.write_str("framedit::InvalidLineHandle")
        } else {
            write!(f, "line@{}:{}", self.slot, self.generation)
        }
    }
}

impl fmt::Debug for LineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A character offset within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: LineHandle,
    pub offset: usize,
}

impl Position {
    pub fn new(line: LineHandle, offset: usize) -> Self {
        Self { line, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("attempted to use the invalid line handle")]
    InvalidHandle,
    #[error("line handle {0} refers to a line that no longer exists")]
    StaleHandle(LineHandle),
    #[error("offset {offset} is past the end of a line of {len} characters")]
    OffsetOutOfRange { offset: usize, len: usize },
}
