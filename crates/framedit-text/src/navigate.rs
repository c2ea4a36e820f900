use crate::LineHandle;

/// Bidirectional traversal over an ordered sequence of line handles.
///
/// Implementors provide the four primitive moves. The 1-based helpers are
/// derived from them and walk the sequence, so their cost is linear in the
/// line number and the results only hold while the document is unchanged.
pub trait LineNavigator {
    fn first_line(&self) -> LineHandle;

    fn last_line(&self) -> LineHandle;

    fn next_line(&self, line: LineHandle) -> LineHandle;

    fn prev_line(&self, line: LineHandle) -> LineHandle;

    /// Handle of the `n`th line (1-based), or [`LineHandle::INVALID`] past the end.
    fn nth_line(&self, n: usize) -> LineHandle {
        let mut line = self.first_line();
        let mut remaining = n;
        while remaining > 1 && line.is_valid() {
            line = self.next_line(line);
            remaining -= 1;
        }
        line
    }

    /// 1-based number of `line`; 0 for the sentinel.
    fn line_number(&self, line: LineHandle) -> usize {
        let mut number = 0;
        let mut current = line;
        while current.is_valid() {
            number += 1;
            current = self.prev_line(current);
        }
        number
    }
}
