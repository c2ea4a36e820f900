//! Reference implementation of [`EditingEngine`].
//!
//! Plain text held in a [`LineSequence`], a selection kept as character
//! offsets, and a snapshot history. Each line is rendered as one block
//! element inside a container that the engine owns in the frame body.

use crate::engine::{EditingEngine, HistorySize};
use crate::error::EditorResult;
use framedit_config::EditorConfig;
use framedit_dom::{Document, NodeId};
use framedit_host::Millis;
use framedit_text::{LineHandle, LineNavigator, LineSequence, Position};
use std::collections::VecDeque;

/// Class of the element holding the rendered lines.
pub const LINES_CLASS: &str = "framedit-lines";
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub undo_depth: usize,
    pub undo_delay: Millis,
    pub read_only: bool,
}

impl EngineOptions {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            undo_depth: config.undo_depth,
            undo_delay: config.undo_delay,
            read_only: config.read_only,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    text: String,
    anchor: usize,
    head: usize,
}

#[derive(Debug, Default)]
struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    last_edit: Option<Millis>,
}

impl History {
    /// Records the state before an edit, unless the edit continues the
    /// previous group.
    fn record(&mut self, before: Snapshot, now: Millis, options: &EngineOptions) {
        self.redo.clear();
        let grouped = !self.undo.is_empty()
            && self
                .last_edit
                .is_some_and(|last| now.saturating_sub(last) < options.undo_delay);
        self.last_edit = Some(now);
        if grouped {
            return;
        }
        self.push_undo(before, options);
    }

    fn push_undo(&mut self, snapshot: Snapshot, options: &EngineOptions) {
        if options.undo_depth == 0 {
            return;
        }
        self.undo.push_back(snapshot);
        while self.undo.len() > options.undo_depth {
            self.undo.pop_front();
        }
    }

    fn break_group(&mut self) {
        self.last_edit = None;
    }
}

#[derive(Debug)]
pub struct TextEngine {
    lines: LineSequence,
    anchor: usize,
    head: usize,
    history: History,
    options: EngineOptions,
    clock: Millis,
    container: Option<NodeId>,
    dirty: bool,
}

impl TextEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            lines: LineSequence::new(),
            anchor: 0,
            head: 0,
            history: History::default(),
            options,
            clock: 0,
            container: None,
            dirty: true,
        }
    }

    pub fn with_content(options: EngineOptions, content: &str) -> Self {
        let mut engine = Self::new(options);
        engine.lines.import(content);
        engine
    }

    /// Engine set up from an editor configuration, seeded with its `content`.
    pub fn from_config(config: &EditorConfig) -> Self {
        let options = EngineOptions::from_config(config);
        match config.content.as_deref() {
            Some(content) => Self::with_content(options, content),
            None => Self::new(options),
        }
    }

    pub fn lines(&self) -> &LineSequence {
        &self.lines
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.lines.text(),
            anchor: self.anchor,
            head: self.head,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.lines.import(&snapshot.text);
        self.anchor = snapshot.anchor;
        self.head = snapshot.head;
        self.dirty = true;
    }

    fn record(&mut self) {
        let before = self.snapshot();
        self.history.record(before, self.clock, &self.options);
        self.dirty = true;
    }

    fn position_or_start(&self, offset: usize) -> Position {
        self.lines
            .position_at(offset)
            .unwrap_or(Position::new(LineHandle::INVALID, 0))
    }

    fn selection_range(&self) -> (usize, usize) {
        (self.anchor.min(self.head), self.anchor.max(self.head))
    }

    /// Replaces the text between two positions and returns the position just
    /// past the inserted text. The start line keeps its handle; lines fully
    /// covered by the range are deleted.
    fn splice(&mut self, start: Position, end: Position, text: &str) -> EditorResult<Position> {
        let from = self.lines.offset_of(start)?;
        let to = self.lines.offset_of(end)?;
        let (start, end, from, to) = if from <= to {
            (start, end, from, to)
        } else {
            (end, start, to, from)
        };
        self.record();

        let mut rest = String::new();
        if start.line == end.line {
            self.lines.remove_range(start.line, start.offset, end.offset)?;
        } else {
            let len = self.lines.line_len(start.line)?;
            self.lines.remove_range(start.line, start.offset, len)?;
            let mut line = self.lines.next_line(start.line);
            while line != end.line && line.is_valid() {
                let next = self.lines.next_line(line);
                self.lines.remove(line)?;
                line = next;
            }
            let end_len = self.lines.line_len(end.line)?;
            rest = self.lines.remove_range(end.line, end.offset, end_len)?;
            self.lines.remove(end.line)?;
        }

        let after = self.lines.insert_into(start.line, start.offset, text)?;
        if !rest.is_empty() {
            self.lines.insert_into(after.line, after.offset, &rest)?;
        }

        let inserted = text.chars().filter(|&ch| ch != '\r').count();
        let shift = |offset: usize| {
            if offset <= from {
                offset
            } else if offset >= to {
                offset - (to - from) + inserted
            } else {
                from + inserted
            }
        };
        self.anchor = shift(self.anchor);
        self.head = shift(self.head);
        Ok(after)
    }

    fn ensure_line(&mut self) {
        if self.lines.is_empty() {
            self.lines.push_back("");
        }
    }
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl LineNavigator for TextEngine {
    fn first_line(&self) -> LineHandle {
        self.lines.first_line()
    }

    fn last_line(&self) -> LineHandle {
        self.lines.last_line()
    }

    fn next_line(&self, line: LineHandle) -> LineHandle {
        self.lines.next_line(line)
    }

    fn prev_line(&self, line: LineHandle) -> LineHandle {
        self.lines.prev_line(line)
    }
}

impl EditingEngine for TextEngine {
    fn code(&self) -> String {
        self.lines.text()
    }

    fn import_code(&mut self, code: &str) -> EditorResult<()> {
        // A replaced document is always its own undo step.
        self.history.break_group();
        self.record();
        self.history.break_group();
        self.lines.import(code);
        self.anchor = 0;
        self.head = 0;
        Ok(())
    }

    fn selected_text(&self) -> String {
        let (from, to) = self.selection_range();
        self.lines
            .text()
            .chars()
            .skip(from)
            .take(to - from)
            .collect()
    }

    fn replace_selection(&mut self, text: &str) -> EditorResult<()> {
        self.ensure_line();
        let start = self.cursor_position(true);
        let end = self.cursor_position(false);
        let after = self.splice(start, end, text)?;
        let caret = self.lines.offset_of(after)?;
        self.anchor = caret;
        self.head = caret;
        Ok(())
    }

    fn replace_chars(
        &mut self,
        text: &str,
        start: Position,
        end: Option<Position>,
    ) -> EditorResult<()> {
        self.splice(start, end.unwrap_or(start), text)?;
        Ok(())
    }

    fn cursor_position(&self, start: bool) -> Position {
        let (from, to) = self.selection_range();
        self.position_or_start(if start { from } else { to })
    }

    fn line_content(&self, line: LineHandle) -> EditorResult<String> {
        Ok(self.lines.content(line)?.to_string())
    }

    fn set_line_content(&mut self, line: LineHandle, content: &str) -> EditorResult<()> {
        self.lines.content(line)?;
        self.record();
        self.lines.set_content(line, content)?;
        Ok(())
    }

    fn insert_into_line(
        &mut self,
        line: LineHandle,
        offset: usize,
        text: &str,
    ) -> EditorResult<()> {
        let position = Position::new(line, offset);
        self.splice(position, position, text)?;
        Ok(())
    }

    fn select_lines(&mut self, start: Position, end: Option<Position>) -> EditorResult<()> {
        let anchor = self.lines.offset_of(start)?;
        let head = match end {
            Some(end) => self.lines.offset_of(end)?,
            None => anchor,
        };
        self.anchor = anchor;
        self.head = head;
        Ok(())
    }

    fn reindent(&mut self) -> EditorResult<()> {
        let changes: Vec<(LineHandle, String)> = self
            .lines
            .iter()
            .filter_map(|line| {
                let current = self.lines.content(line).ok()?;
                let fixed = reindent_line(current);
                (fixed != current).then_some((line, fixed))
            })
            .collect();
        if changes.is_empty() {
            return Ok(());
        }

        self.record();
        for (line, text) in changes {
            self.lines.set_content(line, &text)?;
        }
        Ok(())
    }

    fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo.pop_back() else {
            return false;
        };
        self.history.redo.push(self.snapshot());
        self.history.break_group();
        self.restore(snapshot);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.history.push_undo(current, &self.options);
        self.history.break_group();
        self.restore(snapshot);
        true
    }

    fn history_size(&self) -> HistorySize {
        HistorySize {
            undo: self.history.undo.len(),
            redo: self.history.redo.len(),
        }
    }

    fn offset_of(&self, position: Position) -> EditorResult<usize> {
        Ok(self.lines.offset_of(position)?)
    }

    fn position_at(&self, offset: usize) -> Option<Position> {
        self.lines.position_at(offset)
    }

    fn set_clock(&mut self, now: Millis) {
        self.clock = now;
    }

    fn render(&mut self, doc: &mut Document) -> EditorResult<()> {
        let body = doc.body();
        let editable = if self.options.read_only { "false" } else { "true" };
        doc.set_attribute(body, "contenteditable", editable)?;

        let container = match self.container {
            Some(node) if doc.contains(node) && doc.parent(node) == Some(body) => node,
            _ => {
                let node = doc.create_element("div");
                doc.add_class(node, LINES_CLASS)?;
                doc.append_child(body, node)?;
                self.container = Some(node);
                self.dirty = true;
                node
            }
        };
        if !self.dirty {
            return Ok(());
        }

        while let Some(child) = doc.last_child(container) {
            doc.remove_child(container, child)?;
        }
        for line in self.lines.iter() {
            let block = doc.create_element("div");
            let content = self.lines.content(line)?;
            let inner = if content.is_empty() {
                doc.create_element("br")
            } else {
                doc.create_text(content)
            };
            doc.append_child(block, inner)?;
            doc.append_child(container, block)?;
        }
        self.dirty = false;
        Ok(())
    }
}

/// Expands leading tabs and strips trailing whitespace.
fn reindent_line(line: &str) -> String {
    let body = line.trim_start_matches([' ', '\t']);
    let indent = &line[..line.len() - body.len()];
    let width: usize = indent
        .chars()
        .map(|ch| if ch == '\t' { TAB_WIDTH } else { 1 })
        .sum();
    let body = body.trim_end();
    if body.is_empty() {
        return String::new();
    }
    format!("{}{}", " ".repeat(width), body)
}
