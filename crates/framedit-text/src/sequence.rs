use crate::{LineError, LineHandle, LineNavigator, Position};
use slab::Slab;
use std::fmt;

#[derive(Debug, Clone)]
struct LineNode {
    text: String,
    generation: u32,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly-linked sequence of lines stored in a slot table.
///
/// Inserting or deleting a line touches only its neighbours; handles to
/// other lines are unaffected.
#[derive(Clone, Default)]
pub struct LineSequence {
    nodes: Slab<LineNode>,
    head: Option<usize>,
    tail: Option<usize>,
    next_generation: u32,
}

impl LineSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequence from text. The empty string yields no lines.
    pub fn from_text(text: &str) -> Self {
        let mut lines = Self::new();
        lines.import(text);
        lines
    }

    /// Replaces the whole document. Every previously issued handle becomes stale.
    pub fn import(&mut self, text: &str) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
        for line in split_lines(text) {
            self.push_back(line);
        }
    }

    /// The document as text, lines joined with `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (index, handle) in self.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            if let Ok(content) = self.content(handle) {
                out.push_str(content);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, line: LineHandle) -> bool {
        self.resolve(line).is_ok()
    }

    pub fn iter(&self) -> Lines<'_> {
        Lines {
            sequence: self,
            cursor: self.head,
        }
    }

    pub fn content(&self, line: LineHandle) -> Result<&str, LineError> {
        let slot = self.resolve(line)?;
        Ok(&self.nodes[slot].text)
    }

    /// Length of a line in characters.
    pub fn line_len(&self, line: LineHandle) -> Result<usize, LineError> {
        Ok(self.content(line)?.chars().count())
    }

    /// Replaces a line's text. Embedded newlines split it into several lines;
    /// the handle keeps referring to the first of them.
    pub fn set_content(&mut self, line: LineHandle, text: &str) -> Result<(), LineError> {
        let slot = self.resolve(line)?;
        let mut parts = split_lines(text);
        let first = parts.next().unwrap_or_default();
        self.nodes[slot].text = first.to_string();

        let mut anchor = slot;
        for part in parts {
            anchor = self.link_after(anchor, part.to_string());
        }
        Ok(())
    }

    /// Inserts `text` at a character offset. Returns the position just past the
    /// inserted text, which is on a new line when `text` contains newlines.
    pub fn insert_into(
        &mut self,
        line: LineHandle,
        offset: usize,
        text: &str,
    ) -> Result<Position, LineError> {
        let slot = self.resolve(line)?;
        let current = &self.nodes[slot].text;
        let split = byte_index(current, offset).ok_or(LineError::OffsetOutOfRange {
            offset,
            len: current.chars().count(),
        })?;

        let tail = current[split..].to_string();
        let mut head = current[..split].to_string();
        let mut parts = split_lines(text).peekable();
        head.push_str(parts.next().unwrap_or_default());

        if parts.peek().is_none() {
            let end = head.chars().count();
            head.push_str(&tail);
            self.nodes[slot].text = head;
            return Ok(Position::new(line, end));
        }

        self.nodes[slot].text = head;
        let mut anchor = slot;
        let mut last = String::new();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                last = part.to_string();
            } else {
                anchor = self.link_after(anchor, part.to_string());
            }
        }
        let end = last.chars().count();
        last.push_str(&tail);
        let slot = self.link_after(anchor, last);
        Ok(Position::new(self.handle(slot), end))
    }

    /// Removes the characters in `start..end` of one line.
    pub fn remove_range(
        &mut self,
        line: LineHandle,
        start: usize,
        end: usize,
    ) -> Result<String, LineError> {
        let slot = self.resolve(line)?;
        let text = &mut self.nodes[slot].text;
        let len = text.chars().count();
        let from = byte_index(text, start).ok_or(LineError::OffsetOutOfRange { offset: start, len })?;
        let to = byte_index(text, end.max(start))
            .ok_or(LineError::OffsetOutOfRange { offset: end, len })?;
        Ok(text.drain(from..to).collect())
    }

    /// Appends the following line to this one, removing the following line.
    pub fn join_with_next(&mut self, line: LineHandle) -> Result<bool, LineError> {
        let slot = self.resolve(line)?;
        let Some(next) = self.nodes[slot].next else {
            return Ok(false);
        };
        let removed = self.unlink(next);
        self.nodes[slot].text.push_str(&removed);
        Ok(true)
    }

    pub fn insert_after(&mut self, line: LineHandle, text: &str) -> Result<LineHandle, LineError> {
        let slot = self.resolve(line)?;
        let slot = self.link_after(slot, text.to_string());
        Ok(self.handle(slot))
    }

    pub fn insert_before(&mut self, line: LineHandle, text: &str) -> Result<LineHandle, LineError> {
        let slot = self.resolve(line)?;
        let slot = match self.nodes[slot].prev {
            Some(prev) => self.link_after(prev, text.to_string()),
            None => self.link_front(text.to_string()),
        };
        Ok(self.handle(slot))
    }

    pub fn push_back(&mut self, text: &str) -> LineHandle {
        let slot = match self.tail {
            Some(tail) => self.link_after(tail, text.to_string()),
            None => self.link_front(text.to_string()),
        };
        self.handle(slot)
    }

    pub fn push_front(&mut self, text: &str) -> LineHandle {
        let slot = self.link_front(text.to_string());
        self.handle(slot)
    }

    /// Deletes a line and returns its text. The handle becomes stale.
    pub fn remove(&mut self, line: LineHandle) -> Result<String, LineError> {
        let slot = self.resolve(line)?;
        Ok(self.unlink(slot))
    }

    /// Converts a position to a character offset into [`LineSequence::text`].
    pub fn offset_of(&self, position: Position) -> Result<usize, LineError> {
        self.resolve(position.line)?;
        let mut offset = 0;
        for handle in self.iter() {
            let len = self.line_len(handle)?;
            if handle == position.line {
                if position.offset > len {
                    return Err(LineError::OffsetOutOfRange {
                        offset: position.offset,
                        len,
                    });
                }
                return Ok(offset + position.offset);
            }
            offset += len + 1;
        }
        Err(LineError::StaleHandle(position.line))
    }

    /// Converts a character offset into the document text to a position.
    /// Offsets past the end clamp to the end of the last line.
    pub fn position_at(&self, offset: usize) -> Option<Position> {
        let mut remaining = offset;
        let mut last = None;
        for handle in self.iter() {
            let len = self.line_len(handle).ok()?;
            if remaining <= len {
                return Some(Position::new(handle, remaining));
            }
            remaining -= len + 1;
            last = Some(Position::new(handle, len));
        }
        last
    }

    fn resolve(&self, line: LineHandle) -> Result<usize, LineError> {
        if line.is_invalid() {
            return Err(LineError::InvalidHandle);
        }
        match self.nodes.get(line.slot()) {
            Some(node) if node.generation == line.generation() => Ok(line.slot()),
            _ => Err(LineError::StaleHandle(line)),
        }
    }

    fn handle(&self, slot: usize) -> LineHandle {
        LineHandle::new(slot, self.nodes[slot].generation)
    }

    fn handle_of(&self, slot: Option<usize>) -> LineHandle {
        slot.map(|slot| self.handle(slot))
            .unwrap_or(LineHandle::INVALID)
    }

    fn allocate(&mut self, text: String) -> usize {
        self.next_generation = self.next_generation.wrapping_add(1).max(1);
        self.nodes.insert(LineNode {
            text,
            generation: self.next_generation,
            prev: None,
            next: None,
        })
    }

    fn link_front(&mut self, text: String) -> usize {
        let slot = self.allocate(text);
        self.nodes[slot].next = self.head;
        match self.head {
            Some(head) => self.nodes[head].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        slot
    }

    fn link_after(&mut self, anchor: usize, text: String) -> usize {
        let slot = self.allocate(text);
        let next = self.nodes[anchor].next;
        self.nodes[slot].prev = Some(anchor);
        self.nodes[slot].next = next;
        self.nodes[anchor].next = Some(slot);
        match next {
            Some(next) => self.nodes[next].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        slot
    }

    fn unlink(&mut self, slot: usize) -> String {
        let node = self.nodes.remove(slot);
        match node.prev {
            Some(prev) => self.nodes[prev].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next].prev = node.prev,
            None => self.tail = node.prev,
        }
        node.text
    }
}

impl LineNavigator for LineSequence {
    fn first_line(&self) -> LineHandle {
        self.handle_of(self.head)
    }

    fn last_line(&self) -> LineHandle {
        self.handle_of(self.tail)
    }

    fn next_line(&self, line: LineHandle) -> LineHandle {
        match self.resolve(line) {
            Ok(slot) => self.handle_of(self.nodes[slot].next),
            Err(_) => LineHandle::INVALID,
        }
    }

    fn prev_line(&self, line: LineHandle) -> LineHandle {
        match self.resolve(line) {
            Ok(slot) => self.handle_of(self.nodes[slot].prev),
            Err(_) => LineHandle::INVALID,
        }
    }
}

impl fmt::Debug for LineSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSequence")
            .field("len", &self.len())
            .field("first", &self.first_line())
            .field("last", &self.last_line())
            .finish()
    }
}

/// Iterator over the handles of a [`LineSequence`], first to last.
pub struct Lines<'a> {
    sequence: &'a LineSequence,
    cursor: Option<usize>,
}

impl Iterator for Lines<'_> {
    type Item = LineHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        self.cursor = self.sequence.nodes[slot].next;
        Some(self.sequence.handle(slot))
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut start = 0;
    let mut breaks = memchr::memchr_iter(b'\n', text.as_bytes());
    let mut done = text.is_empty();
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let line = match breaks.next() {
            Some(end) => {
                let line = &text[start..end];
                start = end + 1;
                line
            }
            None => {
                done = true;
                &text[start..]
            }
        };
        Some(line.strip_suffix('\r').unwrap_or(line))
    })
}

fn byte_index(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}
