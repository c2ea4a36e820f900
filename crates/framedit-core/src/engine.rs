use crate::error::EditorResult;
use framedit_dom::Document;
use framedit_host::Millis;
use framedit_text::{LineHandle, LineNavigator, Position};

/// Number of steps available in each direction of the undo history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistorySize {
    pub undo: usize,
    pub redo: usize,
}

/// The text engine living inside an editor frame.
///
/// The facade only talks to the document through this trait: content,
/// selection, history and line addressing. Engines own their line sequence;
/// nothing else mutates it.
pub trait EditingEngine: LineNavigator {
    fn code(&self) -> String;

    /// Replaces the whole document. Every existing line handle goes stale.
    fn import_code(&mut self, code: &str) -> EditorResult<()>;

    fn selected_text(&self) -> String;

    /// Replaces the selection and leaves the caret after the new text.
    fn replace_selection(&mut self, text: &str) -> EditorResult<()>;

    /// Replaces `start..end` (or inserts at `start` when `end` is `None`).
    fn replace_chars(
        &mut self,
        text: &str,
        start: Position,
        end: Option<Position>,
    ) -> EditorResult<()>;

    /// Start (`true`) or end of the selection.
    fn cursor_position(&self, start: bool) -> Position;

    fn line_content(&self, line: LineHandle) -> EditorResult<String>;

    fn set_line_content(&mut self, line: LineHandle, content: &str) -> EditorResult<()>;

    fn insert_into_line(&mut self, line: LineHandle, offset: usize, text: &str)
    -> EditorResult<()>;

    /// Selects from `start` to `end`; collapses to a caret when `end` is `None`.
    fn select_lines(&mut self, start: Position, end: Option<Position>) -> EditorResult<()>;

    fn reindent(&mut self) -> EditorResult<()>;

    fn undo(&mut self) -> bool;

    fn redo(&mut self) -> bool;

    fn history_size(&self) -> HistorySize;

    /// Character offset of a position in [`EditingEngine::code`].
    fn offset_of(&self, position: Position) -> EditorResult<usize>;

    /// Position of a character offset in [`EditingEngine::code`], clamped to
    /// the end of the document. `None` for an empty document.
    fn position_at(&self, offset: usize) -> Option<Position>;

    /// Current time, used to group edits in the history.
    fn set_clock(&mut self, _now: Millis) {}

    /// Brings the hosted document in line with the engine's content.
    fn render(&mut self, doc: &mut Document) -> EditorResult<()>;
}
