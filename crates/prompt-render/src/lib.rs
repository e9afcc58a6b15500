//! Frame reconciliation for the prompt region.
//!
//! The renderer owns the terminal writer and the notion of "what the screen
//! currently shows" (`previous_cursor`). Each `render` walks back to the top
//! of the prompt, rewrites prefix and visible text with lexer coloring,
//! erases the remainder, draws the completion popup, and parks the terminal
//! cursor on the buffer's display position.
//!
//! The input area is a virtual band of `cols - prefix_width` columns; every
//! visual line starts at terminal column `prefix_width` and line breaks are
//! emitted explicitly wherever the shared wrap simulator wraps. Rendering
//! therefore agrees with the cursor arithmetic cell for cell, instead of
//! hoping the terminal's auto-wrap does.

use std::panic::{AssertUnwindSafe, catch_unwind};

use prompt_core::{Buffer, CompletionManager};
use prompt_metrics::{
    Position, Width, WrapCursor, WrapStep, index_of_first_token_on_line, str_width,
};
use prompt_term::{Color, VtWriter, WinSize};

mod lexer;
mod theme;

pub use lexer::{EagerLexer, Lexer, Token};
pub use theme::Theme;

pub const DEFAULT_PREFIX: &str = ">>> ";
pub const DEFAULT_INDENT_SIZE: usize = 2;

/// Live prefix callback: returns the prefix and whether to use it over the
/// static one.
pub type PrefixCallback = Box<dyn FnMut() -> (String, bool) + Send>;

pub struct Renderer {
    out: VtWriter,
    cols: Width,
    rows: usize,
    previous_cursor: Position,
    prefix: String,
    live_prefix: Option<PrefixCallback>,
    last_prefix_width: Width,
    indent_size: usize,
    theme: Theme,
}

impl Renderer {
    pub fn new(out: VtWriter) -> Self {
        Self {
            out,
            cols: Width(0),
            rows: 0,
            previous_cursor: Position::ORIGIN,
            prefix: DEFAULT_PREFIX.to_string(),
            live_prefix: None,
            last_prefix_width: str_width(DEFAULT_PREFIX),
            indent_size: DEFAULT_INDENT_SIZE,
            theme: Theme::default(),
        }
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
        self.last_prefix_width = str_width(&self.prefix);
    }

    pub fn set_live_prefix(&mut self, callback: PrefixCallback) {
        self.live_prefix = Some(callback);
    }

    pub fn set_indent_size(&mut self, indent_size: usize) {
        self.indent_size = indent_size.max(1);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn indent_size(&self) -> usize {
        self.indent_size
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn update_win_size(&mut self, size: WinSize) {
        self.cols = Width(size.cols as usize);
        self.rows = size.rows as usize;
        tracing::debug!(target: "prompt.render", cols = size.cols, rows = size.rows, "win size");
    }

    /// Columns available to user input once the prefix is accounted for.
    pub fn user_input_columns(&mut self) -> Width {
        let prefix = self.current_prefix();
        self.cols - str_width(&prefix)
    }

    fn current_prefix(&mut self) -> String {
        if let Some(cb) = &mut self.live_prefix {
            let (prefix, use_live) = cb();
            if use_live {
                return prefix;
            }
        }
        self.prefix.clone()
    }

    /// Redraw the whole prompt region: origin, prefix, visible text, erase,
    /// popup, cursor, flush.
    pub fn render(
        &mut self,
        buffer: &mut Buffer,
        completion: &CompletionManager,
        lexer: Option<&mut dyn Lexer>,
    ) {
        if self.cols == Width(0) || self.rows == 0 {
            return;
        }
        let prefix = self.current_prefix();
        let prefix_width = str_width(&prefix);
        let input_cols = self.cols - prefix_width;
        if input_cols == Width(0) {
            return;
        }
        self.last_prefix_width = prefix_width;

        self.out.hide_cursor();
        self.out.move_up(self.previous_cursor.y);
        self.out.carriage_return();

        self.out.set_color(self.theme.prefix_text, self.theme.prefix_bg);
        self.out.write_str(&prefix);
        self.out.reset_color();

        let start_line = buffer.start_line();
        let end_screen = self.render_text(buffer.text(), start_line, input_cols, lexer);
        self.out.erase_down();

        let cursor_abs = buffer.display_cursor_position(input_cols);
        let cursor_screen = Position::new(cursor_abs.x, cursor_abs.y.saturating_sub(start_line));
        self.move_cursor(end_screen, cursor_screen);

        if completion.completing() {
            self.render_popup(buffer, completion, cursor_screen);
        }

        self.previous_cursor = cursor_screen;
        self.out.show_cursor();
        self.out.flush();
    }

    /// Walk the buffer text, emitting the rows within the visible band and
    /// interleaving lexer color spans. Returns the screen position after the
    /// last emitted cell.
    fn render_text(
        &mut self,
        text: &str,
        start_line: usize,
        input_cols: Width,
        lexer: Option<&mut dyn Lexer>,
    ) -> Position {
        // Lexing restarts at the true start of the first visible token so a
        // token wrapped across the window edge keeps one color.
        let from = if start_line > 0 {
            index_of_first_token_on_line(text, input_cols, start_line).0
        } else {
            0
        };
        let visible = &text[from..];
        let spans = collect_tokens(lexer, visible);

        let mut tracker = WrapCursor::new(input_cols);
        for c in text[..from].chars() {
            tracker.step(c);
        }
        let mut emitting = tracker.position().y >= start_line;
        let row_limit = start_line + self.rows;

        let mut span_idx = 0usize;
        let mut applied: Option<(Color, Color)> = None;
        let mut offset = 0usize;

        for c in visible.chars() {
            while span_idx < spans.len() && spans[span_idx].last_byte_index().0 < offset {
                span_idx += 1;
            }
            let colors = spans
                .get(span_idx)
                .map(|t| (t.color(), t.background()))
                .unwrap_or((self.theme.input_text, self.theme.input_bg));

            let step = tracker.step(c);
            let row = tracker.position().y;
            match step {
                WrapStep::Newline => {
                    if emitting && row < row_limit {
                        self.line_break();
                    }
                }
                WrapStep::WrappedBefore(_) => {
                    if emitting && row < row_limit {
                        self.line_break();
                    }
                    if row >= start_line && row < row_limit {
                        emitting = true;
                        self.emit(c, colors, &mut applied);
                    }
                }
                WrapStep::Placed(_) => {
                    if emitting {
                        self.emit(c, colors, &mut applied);
                    }
                }
                WrapStep::WrappedAfter(_) => {
                    if emitting {
                        self.emit(c, colors, &mut applied);
                        if row < row_limit {
                            self.line_break();
                        }
                    }
                }
                WrapStep::Ignored => {}
            }
            if !emitting && row >= start_line {
                emitting = true;
            }
            if row >= row_limit {
                break;
            }
            offset += c.len_utf8();
        }
        if applied.is_some() {
            self.out.reset_color();
        }

        let end = tracker.position();
        Position::new(end.x, end.y.saturating_sub(start_line).min(self.rows - 1))
    }

    fn emit(&mut self, c: char, colors: (Color, Color), applied: &mut Option<(Color, Color)>) {
        if *applied != Some(colors) {
            self.out.set_color(colors.0, colors.1);
            *applied = Some(colors);
        }
        let mut tmp = [0u8; 4];
        self.out.write_str(c.encode_utf8(&mut tmp));
    }

    fn line_break(&mut self) {
        self.out.newline();
        self.out.move_to_column(self.last_prefix_width.0);
    }

    /// Draw the suggestion rows beneath the cursor, aligned under the word
    /// being completed and clipped to the window bottom.
    fn render_popup(
        &mut self,
        buffer: &mut Buffer,
        completion: &CompletionManager,
        cursor_screen: Position,
    ) {
        let candidates = completion.candidates();
        let available = self.rows.saturating_sub(cursor_screen.y + 1);
        let window = completion
            .max_visible()
            .min(candidates.len())
            .min(available);
        if window == 0 {
            return;
        }
        let scroll = completion.vertical_scroll().min(candidates.len() - window);
        let visible = &candidates[scroll..scroll + window];

        let text_width = visible
            .iter()
            .map(|s| str_width(&s.text))
            .max()
            .unwrap_or(Width(0));
        let desc_width = visible
            .iter()
            .map(|s| str_width(&s.description))
            .max()
            .unwrap_or(Width(0));
        let popup_width = text_width + Width(2) + if desc_width > Width(0) {
            desc_width + Width(2)
        } else {
            Width(0)
        };

        let word = {
            let doc = buffer.document();
            str_width(doc.get_word_before_cursor_until_separator(&completion.word_separator))
        };
        let mut popup_col = (self.last_prefix_width + cursor_screen.x - word).0;
        if popup_col + popup_width.0 > self.cols.0 {
            popup_col = self.cols.0.saturating_sub(popup_width.0);
        }

        for (row, suggest) in visible.iter().enumerate() {
            let selected = completion.selected_index() == Some(scroll + row);
            self.out.move_down(1);
            self.out.move_to_column(popup_col);

            let (text_fg, text_bg) = if selected {
                (
                    self.theme.selected_suggestion_text,
                    self.theme.selected_suggestion_bg,
                )
            } else {
                (self.theme.suggestion_text, self.theme.suggestion_bg)
            };
            self.out.set_color(text_fg, text_bg);
            self.out.write_str(&pad_cell(&suggest.text, text_width));

            if desc_width > Width(0) {
                let (desc_fg, desc_bg) = if selected {
                    (
                        self.theme.selected_description_text,
                        self.theme.selected_description_bg,
                    )
                } else {
                    (self.theme.description_text, self.theme.description_bg)
                };
                self.out.set_color(desc_fg, desc_bg);
                self.out.write_str(&pad_cell(&suggest.description, desc_width));
            }
            self.out.reset_color();
        }

        // Return the terminal cursor to the input position.
        self.out.move_up(window);
        self.out
            .move_to_column((self.last_prefix_width + cursor_screen.x).0);
    }

    /// Relative cursor motion between two screen positions within the input
    /// band.
    fn move_cursor(&mut self, from: Position, to: Position) {
        if to.y < from.y {
            self.out.move_up(from.y - to.y);
        } else if to.y > from.y {
            self.out.move_down(to.y - from.y);
        }
        self.out
            .move_to_column((self.last_prefix_width + to.x).0);
    }

    /// Fast path for pure cursor motion: emit the minimal relative moves and
    /// record the new position without repainting anything.
    pub fn apply_cursor_diff(&mut self, previous: Position, new: Position) {
        self.move_cursor(previous, new);
        self.previous_cursor = new;
        self.out.flush();
    }

    pub fn previous_cursor(&self) -> Position {
        self.previous_cursor
    }

    /// Finish the current line: repaint it one last time (popup gone), move
    /// past the end of the text and start a fresh terminal row.
    pub fn break_line(&mut self, buffer: &mut Buffer, lexer: Option<&mut dyn Lexer>) {
        if self.cols == Width(0) || self.rows == 0 {
            return;
        }
        let prefix = self.current_prefix();
        let prefix_width = str_width(&prefix);
        let input_cols = self.cols - prefix_width;
        if input_cols == Width(0) {
            return;
        }
        self.last_prefix_width = prefix_width;

        self.out.hide_cursor();
        self.out.move_up(self.previous_cursor.y);
        self.out.carriage_return();
        self.out.set_color(self.theme.prefix_text, self.theme.prefix_bg);
        self.out.write_str(&prefix);
        self.out.reset_color();
        let start_line = buffer.start_line();
        self.render_text(buffer.text(), start_line, input_cols, lexer);
        self.out.erase_down();
        self.out.newline();
        self.out.show_cursor();
        self.out.flush();
        self.previous_cursor = Position::ORIGIN;
    }

    /// Wipe the terminal and home the cursor (Ctrl-L).
    pub fn clear_screen(&mut self) {
        self.out.erase_screen();
        self.out.cursor_goto(0, 0);
        self.out.flush();
        self.previous_cursor = Position::ORIGIN;
    }
}

fn collect_tokens(lexer: Option<&mut dyn Lexer>, visible: &str) -> Vec<Token> {
    let Some(lexer) = lexer else {
        return Vec::new();
    };
    // A panicking lexer costs this tick's coloring, nothing more.
    let result = catch_unwind(AssertUnwindSafe(|| {
        lexer.init(visible);
        let mut tokens = Vec::new();
        while let Some(t) = lexer.next_token() {
            tokens.push(t);
        }
        tokens
    }));
    match result {
        Ok(tokens) => tokens,
        Err(_) => {
            tracing::warn!(target: "prompt.render", "lexer panicked; rendering uncolored");
            Vec::new()
        }
    }
}

fn pad_cell(content: &str, width: Width) -> String {
    let mut cell = String::with_capacity(content.len() + 4);
    cell.push(' ');
    cell.push_str(content);
    for _ in 0..(width - str_width(content)).0 {
        cell.push(' ');
    }
    cell.push(' ');
    cell
}
