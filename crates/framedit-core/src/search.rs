use crate::engine::EditingEngine;
use crate::error::EditorResult;
use framedit_text::{Position, Searcher};

/// Walks the occurrences of a string through an engine's document.
///
/// The cursor holds character offsets, not handles, so it survives edits;
/// a match it reports refers to the document as it was when found.
#[derive(Debug, Clone)]
pub struct SearchCursor {
    searcher: Searcher,
    pattern_chars: usize,
    origin: usize,
    current: Option<(usize, usize)>,
}

impl SearchCursor {
    /// A cursor that starts searching at character `origin`.
    pub fn new(pattern: &str, origin: usize) -> Self {
        Self {
            searcher: Searcher::new(pattern),
            pattern_chars: pattern.chars().count(),
            origin,
            current: None,
        }
    }

    /// Moves to the next occurrence. Returns `false`, and stays at the end of
    /// the document, when there is none.
    pub fn find_next<E: EditingEngine + ?Sized>(&mut self, engine: &E) -> bool {
        let text = engine.code();
        let from = self.current.map(|(_, end)| end).unwrap_or(self.origin);
        match self.searcher.find_from(&text, byte_offset(&text, from)) {
            Some(found) => {
                let start = char_offset(&text, found);
                self.current = Some((start, start + self.pattern_chars));
                true
            }
            None => {
                self.current = None;
                self.origin = text.chars().count();
                false
            }
        }
    }

    /// Moves to the previous occurrence. Returns `false`, and stays at the
    /// start of the document, when there is none.
    pub fn find_previous<E: EditingEngine + ?Sized>(&mut self, engine: &E) -> bool {
        let text = engine.code();
        let until = self.current.map(|(start, _)| start).unwrap_or(self.origin);
        match self.searcher.find_before(&text, byte_offset(&text, until)) {
            Some(found) => {
                let start = char_offset(&text, found);
                self.current = Some((start, start + self.pattern_chars));
                true
            }
            None => {
                self.current = None;
                self.origin = 0;
                false
            }
        }
    }

    pub fn at_occurrence(&self) -> bool {
        self.current.is_some()
    }

    /// Start and end of the current match.
    pub fn position<E>(&self, engine: &E) -> Option<(Position, Position)>
    where
        E: EditingEngine + ?Sized,
    {
        let (start, end) = self.current?;
        Some((engine.position_at(start)?, engine.position_at(end)?))
    }

    /// Selects the current match. Returns `false` if there is none.
    pub fn select<E: EditingEngine + ?Sized>(&self, engine: &mut E) -> EditorResult<bool> {
        let Some((start, end)) = self.position(&*engine) else {
            return Ok(false);
        };
        engine.select_lines(start, Some(end))?;
        Ok(true)
    }

    /// Replaces the current match; the cursor then covers the new text.
    pub fn replace<E: EditingEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        text: &str,
    ) -> EditorResult<bool> {
        let Some((start, end)) = self.position(&*engine) else {
            return Ok(false);
        };
        engine.replace_chars(text, start, Some(end))?;
        if let Some((from, _)) = self.current {
            self.current = Some((from, from + text.chars().count()));
        }
        Ok(true)
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

fn char_offset(text: &str, bytes: usize) -> usize {
    text.get(..bytes).map(|head| head.chars().count()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_engine::{EngineOptions, TextEngine};
    use framedit_text::LineNavigator;

    fn engine(text: &str) -> TextEngine {
        TextEngine::with_content(EngineOptions::default(), text)
    }

    #[test]
    fn walks_matches_forward_and_back() {
        let engine = engine("let a = 1;\nlet b = a;\nlet é = a;");
        let mut cursor = SearchCursor::new("a", 0);

        let mut found = Vec::new();
        while cursor.find_next(&engine) {
            let (start, _) = cursor.position(&engine).unwrap();
            found.push((engine.line_number(start.line), start.offset));
        }
        assert_eq!(found, vec![(1, 4), (2, 8), (3, 8)]);
        assert!(!cursor.find_next(&engine));

        assert!(cursor.find_previous(&engine));
        let (start, end) = cursor.position(&engine).unwrap();
        assert_eq!((engine.line_number(start.line), start.offset), (3, 8));
        assert_eq!(end.offset, 9);
    }

    #[test]
    fn matches_can_span_lines() {
        let engine = engine("foo\nbar");
        let mut cursor = SearchCursor::new("o\nb", 0);
        assert!(cursor.find_next(&engine));
        let (start, end) = cursor.position(&engine).unwrap();
        assert_eq!(start, Position::new(engine.first_line(), 2));
        assert_eq!(end, Position::new(engine.last_line(), 1));
    }

    #[test]
    fn replace_and_continue() {
        let mut engine = engine("cat hat cat");
        let mut cursor = SearchCursor::new("cat", 0);
        while cursor.find_next(&engine) {
            assert!(cursor.replace(&mut engine, "dog").unwrap());
        }
        assert_eq!(engine.code(), "dog hat dog");
        assert!(!cursor.at_occurrence());
        assert!(!cursor.replace(&mut engine, "x").unwrap());
    }

    #[test]
    fn select_marks_the_match() {
        let mut engine = engine("alpha beta");
        let mut cursor = SearchCursor::new("beta", 3);
        assert!(cursor.find_next(&engine));
        assert!(cursor.select(&mut engine).unwrap());
        assert_eq!(engine.selected_text(), "beta");
    }
}
