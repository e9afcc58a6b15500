//! Mutable console buffer.
//!
//! `working_lines[working_index]` holds the text being edited; the other
//! entries belong to the history transcript (see [`crate::History`]).
//! `start_line` is the first visible display row of the buffer relative to
//! the top of the prompt, driving vertical scrolling when the buffer grows
//! taller than the window.

use prompt_keys::Key;
use prompt_metrics::{Position, RuneIdx, Width, position_at_end_of_string, rune_count, rune_slice};

use crate::Document;

#[derive(Debug)]
pub struct Buffer {
    working_lines: Vec<String>,
    working_index: usize,
    start_line: usize,
    cursor: RuneIdx,
    cached_document: Option<Document>,
    last_key: Key,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            working_lines: vec![String::new()],
            working_index: 0,
            start_line: 0,
            cursor: RuneIdx(0),
            cached_document: None,
            last_key: Key::NotDefined,
        }
    }

    /// Text of the current working line.
    pub fn text(&self) -> &str {
        &self.working_lines[self.working_index]
    }

    pub fn cursor(&self) -> RuneIdx {
        self.cursor
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn last_key(&self) -> Key {
        self.last_key
    }

    pub fn set_last_key(&mut self, key: Key) {
        self.last_key = key;
    }

    /// Document snapshot for the current text and cursor. Memoized until
    /// either changes; the last key stroke is stamped on every return.
    pub fn document(&mut self) -> &Document {
        let stale = match &self.cached_document {
            Some(d) => d.text() != self.text() || d.cursor() != self.cursor,
            None => true,
        };
        if stale {
            self.cached_document = Some(Document::new(self.text().to_string(), self.cursor));
        }
        let doc = self.cached_document.as_mut().unwrap();
        doc.last_key = self.last_key;
        doc
    }

    /// Cursor position on the rendered terminal region.
    pub fn display_cursor_position(&self, columns: Width) -> Position {
        position_at_end_of_string(
            rune_slice(self.text(), RuneIdx(0), self.cursor),
            columns,
        )
    }

    fn set_text(&mut self, text: String, columns: Width, rows: usize) {
        debug_assert!(
            self.cursor <= rune_count(&text),
            "cursor must stay within the new text"
        );
        self.working_lines[self.working_index] = text;
        self.recalculate_start_line(columns, rows);
    }

    fn set_cursor(&mut self, cursor: RuneIdx) {
        self.cursor = cursor;
    }

    /// Replace text and cursor wholesale from a document.
    pub fn set_document(&mut self, document: Document, columns: Width, rows: usize) {
        self.set_cursor(document.cursor().min(rune_count(document.text())));
        self.set_text(document.text().to_string(), columns, rows);
        self.cached_document = Some(document);
        self.recalculate_start_line(columns, rows);
    }

    /// Splice `text` at the cursor without moving it.
    pub fn insert_text(&mut self, text: &str, columns: Width, rows: usize, overwrite: bool) {
        self.insert_text_impl(text, columns, rows, overwrite, false);
    }

    /// Splice `text` at the cursor and advance the cursor past it.
    pub fn insert_text_move_cursor(
        &mut self,
        text: &str,
        columns: Width,
        rows: usize,
        overwrite: bool,
    ) {
        self.insert_text_impl(text, columns, rows, overwrite, true);
    }

    fn insert_text_impl(
        &mut self,
        text: &str,
        columns: Width,
        rows: usize,
        overwrite: bool,
        move_cursor: bool,
    ) {
        let current = self.text();
        let inserted = rune_count(text);
        let before = rune_slice(current, RuneIdx(0), self.cursor);

        let new_text = if overwrite {
            // Replace up to `inserted` runes after the cursor, but never past
            // a line break.
            let covered = rune_slice(current, self.cursor, self.cursor + inserted);
            let covered = match covered.find('\n') {
                Some(i) => &covered[..i],
                None => covered,
            };
            let rest_from = self.cursor + rune_count(covered);
            format!(
                "{before}{text}{}",
                rune_slice(current, rest_from, rune_count(current))
            )
        } else {
            format!(
                "{before}{text}{}",
                rune_slice(current, self.cursor, rune_count(current))
            )
        };

        self.set_text(new_text, columns, rows);
        if move_cursor {
            self.cursor += inserted;
            self.recalculate_start_line(columns, rows);
        }
    }

    /// Remove up to `count` runes at the cursor; returns the removed text.
    pub fn delete(&mut self, count: RuneIdx, columns: Width, rows: usize) -> String {
        let current = self.text();
        let total = rune_count(current);
        if self.cursor >= total {
            return String::new();
        }
        let deleted = rune_slice(current, self.cursor, (self.cursor + count).min(total)).to_string();
        let new_text = format!(
            "{}{}",
            rune_slice(current, RuneIdx(0), self.cursor),
            rune_slice(current, self.cursor + rune_count(&deleted), total)
        );
        self.set_text(new_text, columns, rows);
        deleted
    }

    /// Remove up to `count` runes before the cursor; returns the removed text.
    pub fn delete_before_cursor(&mut self, count: RuneIdx, columns: Width, rows: usize) -> String {
        if self.cursor == RuneIdx(0) {
            return String::new();
        }
        let current = self.text();
        let start = self.cursor - count;
        let deleted = rune_slice(current, start, self.cursor).to_string();
        let new_text = format!(
            "{}{}",
            rune_slice(current, RuneIdx(0), start),
            rune_slice(current, self.cursor, rune_count(current))
        );
        let cursor = self.cursor - rune_count(&deleted);
        self.set_document(Document::new(new_text, cursor), columns, rows);
        deleted
    }

    /// Insert a line break at the cursor, optionally copying the previous
    /// line's leading whitespace.
    pub fn new_line(&mut self, columns: Width, rows: usize, copy_margin: bool) {
        if copy_margin {
            let margin = self.document().leading_whitespace_in_current_line();
            self.insert_text_move_cursor(&format!("\n{margin}"), columns, rows, false);
        } else {
            self.insert_text_move_cursor("\n", columns, rows, false);
        }
    }

    /// Join the next line onto the current one, collapsing its leading
    /// spaces and placing `separator` at the junction.
    pub fn join_next_line(&mut self, separator: &str, columns: Width, rows: usize) {
        if self.document().on_last_line() {
            return;
        }
        let eol = self.document().get_end_of_line_position();
        self.cursor += eol;
        self.delete(RuneIdx(1), columns, rows);
        let (before, after) = {
            let doc = self.document();
            (
                doc.text_before_cursor().to_string(),
                doc.text_after_cursor().trim_start_matches(' ').to_string(),
            )
        };
        self.set_text(format!("{before}{separator}{after}"), columns, rows);
    }

    /// Swap the two runes immediately before the cursor.
    pub fn swap_characters_before_cursor(&mut self, columns: Width, rows: usize) {
        if self.cursor < RuneIdx(2) {
            return;
        }
        let current = self.text();
        let total = rune_count(current);
        let x = rune_slice(current, self.cursor - RuneIdx(2), self.cursor - RuneIdx(1));
        let y = rune_slice(current, self.cursor - RuneIdx(1), self.cursor);
        let new_text = format!(
            "{}{y}{x}{}",
            rune_slice(current, RuneIdx(0), self.cursor - RuneIdx(2)),
            rune_slice(current, self.cursor, total)
        );
        self.set_text(new_text, columns, rows);
    }

    /// Move left within the current line. Returns true when the visible
    /// window shifted and a full redraw is required.
    pub fn cursor_left(&mut self, count: RuneIdx, columns: Width, rows: usize) -> bool {
        let step = self.document().get_cursor_left_position(count);
        self.cursor -= step;
        self.recalculate_start_line(columns, rows)
    }

    /// Move right within the current line. Returns true when a full redraw
    /// is required.
    pub fn cursor_right(&mut self, count: RuneIdx, columns: Width, rows: usize) -> bool {
        let step = self.document().get_cursor_right_position(count);
        self.cursor += step;
        self.recalculate_start_line(columns, rows)
    }

    /// Move up `count` lines, keeping the column clamped to the target line.
    /// Returns true when a full redraw is required.
    pub fn cursor_up(&mut self, count: usize, columns: Width, rows: usize) -> bool {
        let target = self.document().cursor_up_target(count);
        self.set_cursor(target);
        self.recalculate_start_line(columns, rows)
    }

    /// Mirror of [`Self::cursor_up`].
    pub fn cursor_down(&mut self, count: usize, columns: Width, rows: usize) -> bool {
        let target = self.document().cursor_down_target(count);
        self.set_cursor(target);
        self.recalculate_start_line(columns, rows)
    }

    pub fn reset_start_line(&mut self) {
        self.start_line = 0;
    }

    /// Keep the display cursor row inside `[start_line, start_line + rows)`.
    /// Returns whether `start_line` moved.
    pub fn recalculate_start_line(&mut self, columns: Width, rows: usize) -> bool {
        if rows == 0 {
            return false;
        }
        let orig = self.start_line;
        let pos = self.display_cursor_position(columns);
        if pos.y > self.start_line + rows - 1 {
            self.start_line = pos.y + 1 - rows;
        } else if pos.y < self.start_line {
            self.start_line = pos.y;
        }
        orig != self.start_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const COLS: Width = Width(80);
    const ROWS: usize = 24;

    fn buf(text: &str) -> Buffer {
        let mut b = Buffer::new();
        b.insert_text_move_cursor(text, COLS, ROWS, false);
        b
    }

    #[test]
    fn insert_moves_cursor() {
        let mut b = Buffer::new();
        b.insert_text_move_cursor("hello", COLS, ROWS, false);
        assert_eq!(b.text(), "hello");
        assert_eq!(b.cursor(), RuneIdx(5));
    }

    #[test]
    fn insert_without_moving_cursor() {
        let mut b = buf("world");
        b.cursor_left(RuneIdx(5), COLS, ROWS);
        b.insert_text("hello ", COLS, ROWS, false);
        assert_eq!(b.text(), "hello world");
        assert_eq!(b.cursor(), RuneIdx(0));
    }

    #[test]
    fn overwrite_stops_at_line_break() {
        let mut b = buf("ab\ncd");
        b.cursor_left(RuneIdx(5), COLS, ROWS);
        b.cursor_up(1, COLS, ROWS);
        b.cursor_left(RuneIdx(2), COLS, ROWS);
        b.insert_text_move_cursor("XYZ", COLS, ROWS, true);
        // "ab" is consumed, the newline survives.
        assert_eq!(b.text(), "XYZ\ncd");
        assert_eq!(b.cursor(), RuneIdx(3));
    }

    #[test]
    fn delete_clamps_at_text_end() {
        let mut b = buf("abc");
        b.cursor_left(RuneIdx(1), COLS, ROWS);
        let deleted = b.delete(RuneIdx(10), COLS, ROWS);
        assert_eq!(deleted, "c");
        assert_eq!(b.text(), "ab");
    }

    #[test]
    fn delete_before_cursor_returns_removed_text() {
        let mut b = buf("hello");
        let deleted = b.delete_before_cursor(RuneIdx(2), COLS, ROWS);
        assert_eq!(deleted, "lo");
        assert_eq!(b.text(), "hel");
        assert_eq!(b.cursor(), RuneIdx(3));
    }

    #[test]
    fn delete_before_cursor_clamps_at_start() {
        let mut b = buf("hi");
        let deleted = b.delete_before_cursor(RuneIdx(10), COLS, ROWS);
        assert_eq!(deleted, "hi");
        assert_eq!(b.cursor(), RuneIdx(0));
    }

    #[test]
    fn multibyte_runes_delete_cleanly() {
        let mut b = buf("日本語");
        let deleted = b.delete_before_cursor(RuneIdx(1), COLS, ROWS);
        assert_eq!(deleted, "語");
        assert_eq!(b.text(), "日本");
        assert_eq!(b.cursor(), RuneIdx(2));
    }

    #[test]
    fn new_line_copies_margin() {
        let mut b = buf("  for x:");
        b.new_line(COLS, ROWS, true);
        assert_eq!(b.text(), "  for x:\n  ");
        assert_eq!(b.cursor(), RuneIdx(11));
    }

    #[test]
    fn join_next_line_collapses_spaces() {
        let mut b = buf("line 1\n   line 2");
        b.cursor_up(1, COLS, ROWS);
        b.cursor_left(RuneIdx(10), COLS, ROWS);
        b.join_next_line(" ", COLS, ROWS);
        assert_eq!(b.text(), "line 1 line 2");
    }

    #[test]
    fn join_on_last_line_is_noop() {
        let mut b = buf("only");
        b.join_next_line(" ", COLS, ROWS);
        assert_eq!(b.text(), "only");
    }

    #[test]
    fn swap_characters() {
        let mut b = buf("bca");
        b.swap_characters_before_cursor(COLS, ROWS);
        assert_eq!(b.text(), "bac");
        let mut b = buf("a");
        b.swap_characters_before_cursor(COLS, ROWS);
        assert_eq!(b.text(), "a");
    }

    #[test]
    fn horizontal_motion_stays_on_line() {
        let mut b = buf("ab\ncd");
        // Cursor at end of "cd"; left motion must stop at the line start.
        b.cursor_left(RuneIdx(10), COLS, ROWS);
        assert_eq!(b.cursor(), RuneIdx(3));
        b.cursor_right(RuneIdx(10), COLS, ROWS);
        assert_eq!(b.cursor(), RuneIdx(5));
    }

    #[test]
    fn vertical_motion_clamps_column() {
        let mut b = buf("long line\nab");
        b.cursor_up(1, COLS, ROWS);
        assert_eq!(b.cursor(), RuneIdx(2));
        b.cursor_down(1, COLS, ROWS);
        assert_eq!(b.cursor(), RuneIdx(12));
    }

    #[test]
    fn start_line_follows_tall_buffers() {
        let mut b = Buffer::new();
        b.insert_text_move_cursor("1\n2\n3\n4\n5", COLS, 3, false);
        assert_eq!(b.start_line(), 2);
        let changed = b.cursor_up(4, COLS, 3);
        assert!(changed);
        assert_eq!(b.start_line(), 0);
    }

    #[test]
    fn document_cache_tracks_changes() {
        let mut b = buf("abc");
        let first = b.document().clone();
        assert_eq!(b.document(), &first);
        b.insert_text_move_cursor("d", COLS, ROWS, false);
        assert_eq!(b.document().text(), "abcd");
    }

    proptest! {
        #[test]
        fn cursor_never_exceeds_rune_count(text in "\\PC{0,40}", extra in "\\PC{0,8}") {
            let mut b = buf(&text);
            b.insert_text_move_cursor(&extra, COLS, ROWS, false);
            prop_assert!(b.cursor() <= rune_count(b.text()));
            b.delete_before_cursor(RuneIdx(3), COLS, ROWS);
            prop_assert!(b.cursor() <= rune_count(b.text()));
        }

        #[test]
        fn insert_then_delete_restores(text in "[a-z ]{0,20}", ins in "[a-z]{1,10}") {
            let mut b = buf(&text);
            let cursor = b.cursor();
            b.insert_text_move_cursor(&ins, COLS, ROWS, false);
            b.delete_before_cursor(rune_count(&ins), COLS, ROWS);
            prop_assert_eq!(b.text(), text.as_str());
            prop_assert_eq!(b.cursor(), cursor);
        }

        #[test]
        fn before_after_partition(text in "\\PC{0,40}") {
            let mut b = buf(&text);
            let doc = b.document().clone();
            let joined = format!("{}{}", doc.text_before_cursor(), doc.text_after_cursor());
            prop_assert_eq!(joined, doc.text());
        }
    }
}
