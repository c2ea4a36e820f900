use crate::engine::{EditingEngine, HistorySize};
use crate::error::EditorResult;
use crate::search::SearchCursor;
use framedit_host::FrameHost;
use framedit_text::{LineHandle, Position};
use uuid::Uuid;

/// The public object for one editor: a hosted frame plus the engine editing
/// its content.
///
/// Every mutating call re-renders the engine into the frame document.
/// Calls that move the selection focus the frame first.
pub struct FrameEditor {
    id: Uuid,
    host: FrameHost,
    engine: Box<dyn EditingEngine>,
}

impl FrameEditor {
    pub(crate) fn new(host: FrameHost, engine: Box<dyn EditingEngine>) -> EditorResult<Self> {
        let mut editor = Self {
            id: Uuid::new_v4(),
            host,
            engine,
        };
        editor.sync()?;
        Ok(editor)
    }

    /// Unique identity of this editor instance.
    pub fn uuid(&self) -> Uuid {
        self.id
    }

    pub fn host(&self) -> &FrameHost {
        &self.host
    }

    pub(crate) fn host_mut(&mut self) -> &mut FrameHost {
        &mut self.host
    }

    pub fn engine(&self) -> &dyn EditingEngine {
        self.engine.as_ref()
    }

    pub(crate) fn engine_mut(&mut self) -> &mut dyn EditingEngine {
        self.engine.as_mut()
    }

    pub fn is_ready(&self) -> bool {
        self.host.is_ready()
    }

    fn sync(&mut self) -> EditorResult<()> {
        self.engine.render(self.host.document_mut())
    }

    pub fn get_code(&self) -> String {
        self.engine.code()
    }

    pub fn set_code(&mut self, code: &str) -> EditorResult<()> {
        self.engine.import_code(code)?;
        self.sync()
    }

    /// The selected text.
    pub fn selection(&self) -> String {
        self.engine.selected_text()
    }

    pub fn replace_selection(&mut self, text: &str) -> EditorResult<()> {
        self.focus();
        self.engine.replace_selection(text)?;
        self.sync()
    }

    pub fn replace_chars(
        &mut self,
        text: &str,
        start: Position,
        end: Option<Position>,
    ) -> EditorResult<()> {
        self.engine.replace_chars(text, start, end)?;
        self.sync()
    }

    pub fn reindent(&mut self) -> EditorResult<()> {
        self.engine.reindent()?;
        self.sync()
    }

    pub fn focus(&mut self) {
        self.host.focus();
    }

    /// A cursor over occurrences of `pattern`, starting at the top of the
    /// document or, with `from_cursor`, at the start of the selection.
    pub fn get_search_cursor(&self, pattern: &str, from_cursor: bool) -> SearchCursor {
        let origin = if from_cursor {
            self.engine
                .offset_of(self.engine.cursor_position(true))
                .unwrap_or(0)
        } else {
            0
        };
        SearchCursor::new(pattern, origin)
    }

    pub fn find_next(&self, cursor: &mut SearchCursor) -> bool {
        cursor.find_next(self.engine.as_ref())
    }

    pub fn find_previous(&self, cursor: &mut SearchCursor) -> bool {
        cursor.find_previous(self.engine.as_ref())
    }

    pub fn select_match(&mut self, cursor: &SearchCursor) -> EditorResult<bool> {
        self.focus();
        cursor.select(self.engine.as_mut())
    }

    pub fn replace_match(&mut self, cursor: &mut SearchCursor, text: &str) -> EditorResult<bool> {
        let replaced = cursor.replace(self.engine.as_mut(), text)?;
        if replaced {
            self.sync()?;
        }
        Ok(replaced)
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        let undone = self.engine.undo();
        self.sync()?;
        Ok(undone)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        let redone = self.engine.redo();
        self.sync()?;
        Ok(redone)
    }

    pub fn history_size(&self) -> HistorySize {
        self.engine.history_size()
    }

    /// Start (`true`) or end of the selection.
    pub fn cursor_position(&self, start: bool) -> Position {
        self.engine.cursor_position(start)
    }

    pub fn first_line(&self) -> LineHandle {
        self.engine.first_line()
    }

    pub fn last_line(&self) -> LineHandle {
        self.engine.last_line()
    }

    pub fn next_line(&self, line: LineHandle) -> LineHandle {
        self.engine.next_line(line)
    }

    pub fn prev_line(&self, line: LineHandle) -> LineHandle {
        self.engine.prev_line(line)
    }

    pub fn line_content(&self, line: LineHandle) -> EditorResult<String> {
        self.engine.line_content(line)
    }

    pub fn set_line_content(&mut self, line: LineHandle, content: &str) -> EditorResult<()> {
        self.engine.set_line_content(line, content)?;
        self.sync()
    }

    pub fn insert_into_line(
        &mut self,
        line: LineHandle,
        offset: usize,
        text: &str,
    ) -> EditorResult<()> {
        self.engine.insert_into_line(line, offset, text)?;
        self.sync()
    }

    pub fn select_lines(
        &mut self,
        start_line: LineHandle,
        start_offset: usize,
        end: Option<(LineHandle, usize)>,
    ) -> EditorResult<()> {
        self.focus();
        let end = end.map(|(line, offset)| Position::new(line, offset));
        self.engine
            .select_lines(Position::new(start_line, start_offset), end)
    }

    /// Handle of line `n` (1-based), or the invalid handle past the end.
    pub fn nth_line(&self, n: usize) -> LineHandle {
        self.engine.nth_line(n)
    }

    /// 1-based number of `line`; 0 for the invalid handle.
    pub fn line_number(&self, line: LineHandle) -> usize {
        self.engine.line_number(line)
    }

    /// Puts the caret at the start of line `n`. Past the last line (or for
    /// `n == 0`) this does nothing and the selection is left as it was.
    pub fn jump_to_line(&mut self, n: usize) -> EditorResult<()> {
        let line = self.nth_line(n);
        if !line.is_valid() {
            return Ok(());
        }
        self.select_lines(line, 0, None)?;
        self.focus();
        Ok(())
    }

    /// Number of the line holding the caret, 0 for an empty document.
    pub fn current_line(&self) -> usize {
        self.line_number(self.cursor_position(true).line)
    }
}

impl std::fmt::Debug for FrameEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameEditor")
            .field("id", &self.id)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
