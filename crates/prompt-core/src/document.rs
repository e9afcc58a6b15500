//! Read-only view over `(text, cursor)`.
//!
//! A `Document` is an ephemeral snapshot: it is rebuilt whenever the buffer's
//! text or cursor changes and answers every positional query without mutating
//! anything. The cursor is a rune ordinal, never a byte offset.
//!
//! Word queries accept a separator set; the empty set means "any Unicode
//! whitespace", matching the default completion behavior.

use prompt_keys::Key;
use prompt_metrics::{
    Position, RuneIdx, Width, index_not_any, last_index_any, last_index_not_any,
    position_at_end_of_string, rune_count, rune_slice,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    cursor: RuneIdx,
    pub(crate) last_key: Key,
}

fn last_sep_index(s: &str, seps: &[char]) -> Option<RuneIdx> {
    if seps.is_empty() {
        let count = s.chars().count();
        s.chars()
            .rev()
            .position(|c| c.is_whitespace())
            .map(|rev| RuneIdx(count - 1 - rev))
    } else {
        last_index_any(s, seps)
    }
}

fn last_non_sep_index(s: &str, seps: &[char]) -> Option<RuneIdx> {
    if seps.is_empty() {
        let count = s.chars().count();
        s.chars()
            .rev()
            .position(|c| !c.is_whitespace())
            .map(|rev| RuneIdx(count - 1 - rev))
    } else {
        last_index_not_any(s, seps)
    }
}

fn first_sep_index(s: &str, seps: &[char]) -> Option<RuneIdx> {
    if seps.is_empty() {
        s.chars().position(|c| c.is_whitespace()).map(RuneIdx)
    } else {
        s.chars().position(|c| seps.contains(&c)).map(RuneIdx)
    }
}

fn first_non_sep_index(s: &str, seps: &[char]) -> Option<RuneIdx> {
    if seps.is_empty() {
        s.chars().position(|c| !c.is_whitespace()).map(RuneIdx)
    } else {
        index_not_any(s, seps)
    }
}

impl Document {
    pub fn new(text: impl Into<String>, cursor: RuneIdx) -> Self {
        Self {
            text: text.into(),
            cursor,
            last_key: Key::NotDefined,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> RuneIdx {
        self.cursor
    }

    /// The key stroke that produced the current buffer state.
    pub fn last_key(&self) -> Key {
        self.last_key
    }

    pub fn text_before_cursor(&self) -> &str {
        rune_slice(&self.text, RuneIdx(0), self.cursor)
    }

    pub fn text_after_cursor(&self) -> &str {
        rune_slice(&self.text, self.cursor, rune_count(&self.text))
    }

    /// Portion of the cursor's line left of the cursor.
    pub fn current_line_before_cursor(&self) -> &str {
        let before = self.text_before_cursor();
        match before.rfind('\n') {
            Some(i) => &before[i + 1..],
            None => before,
        }
    }

    /// Portion of the cursor's line right of the cursor.
    pub fn current_line_after_cursor(&self) -> &str {
        let after = self.text_after_cursor();
        match after.find('\n') {
            Some(i) => &after[..i],
            None => after,
        }
    }

    pub fn current_line(&self) -> String {
        let mut line = String::from(self.current_line_before_cursor());
        line.push_str(self.current_line_after_cursor());
        line
    }

    /// Zero-indexed logical row of the cursor.
    pub fn cursor_position_row(&self) -> usize {
        self.text_before_cursor().matches('\n').count()
    }

    /// Rune column of the cursor within its line.
    pub fn cursor_position_col(&self) -> RuneIdx {
        rune_count(self.current_line_before_cursor())
    }

    /// Logical row of the final line of the text.
    pub fn text_end_position_row(&self) -> usize {
        self.text.matches('\n').count()
    }

    pub fn line_count(&self) -> usize {
        self.text_end_position_row() + 1
    }

    /// Where the cursor lands on screen once the text wraps at `columns`.
    pub fn display_cursor_position(&self, columns: Width) -> Position {
        position_at_end_of_string(self.text_before_cursor(), columns)
    }

    /// How many runes the cursor may move left without leaving its line.
    pub fn get_cursor_left_position(&self, count: RuneIdx) -> RuneIdx {
        count.min(self.cursor_position_col())
    }

    /// How many runes the cursor may move right without leaving its line.
    pub fn get_cursor_right_position(&self, count: RuneIdx) -> RuneIdx {
        count.min(rune_count(self.current_line_after_cursor()))
    }

    /// Absolute cursor ordinal after moving `count` rows up, keeping the
    /// column clamped to the target line's length.
    pub fn cursor_up_target(&self, count: usize) -> RuneIdx {
        let row = self.cursor_position_row().saturating_sub(count);
        self.translate_row_col_to_rune_index(row, self.cursor_position_col())
    }

    /// Mirror of [`Self::cursor_up_target`].
    pub fn cursor_down_target(&self, count: usize) -> RuneIdx {
        let row = (self.cursor_position_row() + count).min(self.text_end_position_row());
        self.translate_row_col_to_rune_index(row, self.cursor_position_col())
    }

    /// Rune ordinal of `(row, col)`, with both coordinates clamped into the
    /// text.
    pub fn translate_row_col_to_rune_index(&self, row: usize, col: RuneIdx) -> RuneIdx {
        let mut index = RuneIdx(0);
        for (i, line) in self.text.split('\n').enumerate() {
            if i == row {
                return index + col.min(rune_count(line));
            }
            index += rune_count(line) + RuneIdx(1);
        }
        // Row past the end: clamp to the last line.
        rune_count(&self.text).min(index)
    }

    /// True when no further line exists below the cursor.
    pub fn on_last_line(&self) -> bool {
        self.cursor_position_row() == self.text_end_position_row()
    }

    /// Rune distance from the cursor to the end of its line.
    pub fn get_end_of_line_position(&self) -> RuneIdx {
        rune_count(self.current_line_after_cursor())
    }

    /// The whitespace run opening the cursor's line, used as the copy margin
    /// for auto-indented newlines.
    pub fn leading_whitespace_in_current_line(&self) -> String {
        self.current_line()
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect()
    }

    /// Rune ordinal (within `text_before_cursor`) where the word immediately
    /// before the cursor starts.
    pub fn find_start_of_previous_word_until_separator(&self, seps: &[char]) -> RuneIdx {
        match last_sep_index(self.text_before_cursor(), seps) {
            Some(i) => i + RuneIdx(1),
            None => RuneIdx(0),
        }
    }

    /// Like [`Self::find_start_of_previous_word_until_separator`] but skips
    /// separators sitting between the word and the cursor, so the returned
    /// word keeps its trailing separators.
    pub fn find_start_of_previous_word_with_space_until_separator(&self, seps: &[char]) -> RuneIdx {
        let before = self.text_before_cursor();
        let Some(end) = last_non_sep_index(before, seps) else {
            return RuneIdx(0);
        };
        match last_sep_index(rune_slice(before, RuneIdx(0), end + RuneIdx(1)), seps) {
            Some(i) => i + RuneIdx(1),
            None => RuneIdx(0),
        }
    }

    pub fn get_word_before_cursor_until_separator(&self, seps: &[char]) -> &str {
        let before = self.text_before_cursor();
        let start = self.find_start_of_previous_word_until_separator(seps);
        rune_slice(before, start, rune_count(before))
    }

    pub fn get_word_before_cursor_with_space(&self) -> &str {
        let before = self.text_before_cursor();
        let start = self.find_start_of_previous_word_with_space_until_separator(&[]);
        rune_slice(before, start, rune_count(before))
    }

    /// Rune distance the cursor travels to reach the start of the previous
    /// word, separators included (Alt-Left, Ctrl-W).
    pub fn rune_count_until_start_of_previous_word(&self) -> RuneIdx {
        rune_count(self.get_word_before_cursor_with_space())
    }

    /// Rune distance the cursor travels to step past the current (or next)
    /// word, leading separators included (Alt-Right).
    pub fn rune_count_until_end_of_current_word(&self) -> RuneIdx {
        let after = self.text_after_cursor();
        let Some(start) = first_non_sep_index(after, &[]) else {
            return rune_count(after);
        };
        let rest = rune_slice(after, start, rune_count(after));
        match first_sep_index(rest, &[]) {
            Some(end) => start + end,
            None => rune_count(after),
        }
    }

    /// Rune distance the cursor moves left to reach the first non-blank of
    /// its line; when the cursor already sits inside the indent the distance
    /// reaches column zero instead.
    pub fn rune_count_until_line_indent_start(&self) -> RuneIdx {
        let col = self.cursor_position_col();
        let indent = rune_count(&self.leading_whitespace_in_current_line());
        if col <= indent {
            col
        } else {
            col - indent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str, cursor: usize) -> Document {
        Document::new(text, RuneIdx(cursor))
    }

    #[test]
    fn before_after_round_trip() {
        let d = doc("line a\nline b", 9);
        assert_eq!(
            format!("{}{}", d.text_before_cursor(), d.text_after_cursor()),
            d.text()
        );
        assert_eq!(d.text_before_cursor(), "line a\nli");
        assert_eq!(d.text_after_cursor(), "ne b");
    }

    #[test]
    fn current_line_parts() {
        let d = doc("one\ntwo\nthree", 6);
        assert_eq!(d.current_line_before_cursor(), "tw");
        assert_eq!(d.current_line_after_cursor(), "o");
        assert_eq!(d.current_line(), "two");
        assert_eq!(d.cursor_position_row(), 1);
        assert_eq!(d.cursor_position_col(), RuneIdx(2));
    }

    #[test]
    fn cursor_clamped_past_text_end() {
        let d = doc("ab", 50);
        assert_eq!(d.text_before_cursor(), "ab");
        assert_eq!(d.text_after_cursor(), "");
    }

    #[test]
    fn display_position_wraps_wide_runes() {
        let d = doc("日本a", 3);
        assert_eq!(
            d.display_cursor_position(Width(4)),
            Position::new(Width(1), 1)
        );
    }

    #[test]
    fn left_right_clamp_to_line() {
        let d = doc("ab\ncd", 4);
        assert_eq!(d.get_cursor_left_position(RuneIdx(10)), RuneIdx(1));
        assert_eq!(d.get_cursor_right_position(RuneIdx(10)), RuneIdx(1));
    }

    #[test]
    fn vertical_targets_clamp_column() {
        // Cursor at col 4 of "longline"; the line above only has 2 runes.
        let d = doc("ab\nlongline", 7);
        assert_eq!(d.cursor_up_target(1), RuneIdx(2));
        let d = doc("longline\nab", 4);
        assert_eq!(d.cursor_down_target(1), RuneIdx(11));
    }

    #[test]
    fn translate_row_col_clamps_row() {
        let d = doc("ab\ncd", 0);
        assert_eq!(
            d.translate_row_col_to_rune_index(9, RuneIdx(1)),
            RuneIdx(5)
        );
    }

    #[test]
    fn word_before_cursor_variants() {
        let d = doc("apple bana", 10);
        assert_eq!(d.get_word_before_cursor_until_separator(&[]), "bana");
        assert_eq!(d.get_word_before_cursor_with_space(), "bana");

        let d = doc("apple bana ", 11);
        assert_eq!(d.get_word_before_cursor_until_separator(&[]), "");
        assert_eq!(d.get_word_before_cursor_with_space(), "bana ");
    }

    #[test]
    fn word_before_cursor_custom_separators() {
        let d = doc("add(arg1,arg2", 13);
        assert_eq!(
            d.get_word_before_cursor_until_separator(&['(', ',']),
            "arg2"
        );
    }

    #[test]
    fn word_motion_distances() {
        let d = doc("hello world foo", 15);
        assert_eq!(d.rune_count_until_start_of_previous_word(), RuneIdx(3));

        let d = doc("hello world foo", 5);
        // Skips the space and the following word.
        assert_eq!(d.rune_count_until_end_of_current_word(), RuneIdx(6));
    }

    #[test]
    fn line_indent_start_distance() {
        let d = doc("  indented", 10);
        assert_eq!(d.rune_count_until_line_indent_start(), RuneIdx(8));
        // Inside the indent: fall back to column zero.
        let d = doc("  indented", 1);
        assert_eq!(d.rune_count_until_line_indent_start(), RuneIdx(1));
    }

    #[test]
    fn leading_whitespace_margin() {
        let d = doc("  if x:\n", 5);
        assert_eq!(d.leading_whitespace_in_current_line(), "  ");
    }

    #[test]
    fn last_line_and_eol() {
        let d = doc("ab\ncd", 1);
        assert!(!d.on_last_line());
        assert_eq!(d.get_end_of_line_position(), RuneIdx(1));
        let d = doc("ab\ncd", 4);
        assert!(d.on_last_line());
    }
}
