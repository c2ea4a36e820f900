//! Substring search over document text.

/// Boyer-Moore-Horspool searcher for a fixed pattern.
///
/// Only the bad-character table is kept; for the short needles typed into a
/// search box it performs about as well as the full algorithm.
#[derive(Debug, Clone)]
pub struct Searcher {
    pattern: Vec<u8>,
    skips: [usize; 256],
}

impl Searcher {
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.as_bytes().to_vec();
        let len = pattern.len();
        let mut skips = [len.max(1); 256];
        if len > 1 {
            for (index, &byte) in pattern[..len - 1].iter().enumerate() {
                skips[byte as usize] = len - 1 - index;
            }
        }
        Self { pattern, skips }
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    /// Byte offset of the first match starting at or after `from`.
    pub fn find_from(&self, haystack: &str, from: usize) -> Option<usize> {
        let text = haystack.as_bytes();
        let len = self.pattern.len();
        if len == 0 || from > text.len() || text.len() - from < len {
            return None;
        }

        let mut start = from;
        while start + len <= text.len() {
            let window = &text[start..start + len];
            if window == self.pattern.as_slice() && haystack.is_char_boundary(start) {
                return Some(start);
            }
            start += self.skips[text[start + len - 1] as usize];
        }
        None
    }

    /// Byte offset of the last match that ends at or before `until`.
    pub fn find_before(&self, haystack: &str, until: usize) -> Option<usize> {
        let until = until.min(haystack.len());
        let mut found = None;
        let mut from = 0;
        while let Some(start) = self.find_from(haystack, from) {
            if start + self.pattern.len() > until {
                break;
            }
            found = Some(start);
            from = start + 1;
        }
        found
    }

    /// Byte offsets of every match, overlapping ones included.
    pub fn find_all(&self, haystack: &str) -> Vec<usize> {
        let mut matches = Vec::new();
        let mut from = 0;
        while let Some(start) = self.find_from(haystack, from) {
            matches.push(start);
            from = start + 1;
        }
        matches
    }
}
