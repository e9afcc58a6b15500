//! Bounded input history with an editing transcript.
//!
//! `entries` holds committed lines. `transcript` shadows it with one extra
//! slot: while the user walks back through history, their unsent edits of
//! each entry (and of the fresh line) are parked in the matching transcript
//! slot, so returning to a slot restores exactly what they had typed there.

use prompt_metrics::Width;

use crate::Buffer;

pub const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    transcript: Vec<String>,
    /// Index into `transcript`; `entries.len()` is the fresh-line slot.
    selected: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::new(),
            transcript: vec![String::new()],
            selected: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Record a committed line, dropping the oldest entry at capacity, and
    /// reset the transcript.
    pub fn add(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        self.reset_navigation();
    }

    /// Discard transcript edits and point navigation back at the fresh-line
    /// slot. Runs on commit and on Ctrl-C.
    pub fn reset_navigation(&mut self) {
        self.transcript = self.entries.clone();
        self.transcript.push(String::new());
        self.selected = self.transcript.len() - 1;
    }

    /// Forget everything, stored entries included.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.reset_navigation();
    }

    /// Step one entry back. The current buffer text is parked in the present
    /// transcript slot; the returned buffer carries the older slot's text
    /// with the cursor at its end.
    pub fn older(&mut self, buffer: &Buffer, columns: Width, rows: usize) -> Option<Buffer> {
        if self.selected == 0 {
            return None;
        }
        self.transcript[self.selected] = buffer.text().to_string();
        self.selected -= 1;
        Some(self.buffer_for_selected(columns, rows))
    }

    /// Step one entry forward, mirroring [`Self::older`].
    pub fn newer(&mut self, buffer: &Buffer, columns: Width, rows: usize) -> Option<Buffer> {
        if self.selected + 1 >= self.transcript.len() {
            return None;
        }
        self.transcript[self.selected] = buffer.text().to_string();
        self.selected += 1;
        Some(self.buffer_for_selected(columns, rows))
    }

    fn buffer_for_selected(&self, columns: Width, rows: usize) -> Buffer {
        let mut buffer = Buffer::new();
        buffer.insert_text_move_cursor(&self.transcript[self.selected], columns, rows, false);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: Width = Width(80);
    const ROWS: usize = 24;

    fn buffer_with(text: &str) -> Buffer {
        let mut b = Buffer::new();
        b.insert_text_move_cursor(text, COLS, ROWS, false);
        b
    }

    #[test]
    fn add_and_navigate() {
        let mut h = History::default();
        h.add("first");
        h.add("second");

        let fresh = buffer_with("");
        let b = h.older(&fresh, COLS, ROWS).expect("second entry");
        assert_eq!(b.text(), "second");
        let b = h.older(&b, COLS, ROWS).expect("first entry");
        assert_eq!(b.text(), "first");
        assert!(h.older(&b, COLS, ROWS).is_none(), "stop at oldest");
    }

    #[test]
    fn transcript_preserves_unsent_edits() {
        let mut h = History::default();
        h.add("foo");

        // The user typed "bar" without committing, then walked up.
        let typed = buffer_with("bar");
        let b = h.older(&typed, COLS, ROWS).expect("history entry");
        assert_eq!(b.text(), "foo");

        // Walking back down restores the in-progress line.
        let b = h.newer(&b, COLS, ROWS).expect("fresh slot");
        assert_eq!(b.text(), "bar");
    }

    #[test]
    fn older_then_newer_round_trips() {
        let mut h = History::default();
        h.add("alpha");
        h.add("beta");
        let start = buffer_with("work in progress");
        let up = h.older(&start, COLS, ROWS).unwrap();
        let back = h.newer(&up, COLS, ROWS).unwrap();
        assert_eq!(back.text(), start.text());
        assert_eq!(back.cursor(), start.cursor());
    }

    #[test]
    fn edits_of_history_entries_survive_navigation() {
        let mut h = History::default();
        h.add("one");
        h.add("two");

        let fresh = buffer_with("");
        let b = h.older(&fresh, COLS, ROWS).unwrap(); // "two"
        let edited = buffer_with("two edited");
        let b = h.older(&edited, COLS, ROWS).unwrap(); // "one"
        let b = h.newer(&b, COLS, ROWS).unwrap();
        assert_eq!(b.text(), "two edited");
        drop(b);

        // Commit resets the transcript.
        h.add("three");
        let b = h.older(&buffer_with(""), COLS, ROWS).unwrap();
        assert_eq!(b.text(), "three");
        let b = h.older(&b, COLS, ROWS).unwrap();
        assert_eq!(b.text(), "two");
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut h = History::new(2);
        h.add("a");
        h.add("b");
        h.add("c");
        assert_eq!(h.entries(), ["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn newer_at_fresh_slot_is_none() {
        let mut h = History::default();
        h.add("x");
        assert!(h.newer(&buffer_with(""), COLS, ROWS).is_none());
    }

    #[test]
    fn clear_forgets_entries() {
        let mut h = History::default();
        h.add("x");
        h.clear();
        assert!(h.is_empty());
        assert!(h.older(&buffer_with(""), COLS, ROWS).is_none());
    }
}
