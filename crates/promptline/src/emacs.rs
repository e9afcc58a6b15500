//! Default Emacs-flavored binding set.
//!
//! Cursor motion: Ctrl-A line beginning (after leading whitespace), Ctrl-E
//! line end, Ctrl-F/Ctrl-B character motion, Alt-Left/Alt-Right word motion.
//! Editing: Ctrl-D delete under cursor, Ctrl-H backspace, Ctrl-K cut to line
//! end, Ctrl-U cut to line start, Ctrl-W and Alt-Backspace cut the previous
//! word, Ctrl-L clear screen.

use prompt_keys::Key;
use prompt_metrics::{RuneIdx, rune_count};

use crate::bind::KeyBind;

pub fn emacs_key_bindings() -> Vec<KeyBind> {
    vec![
        KeyBind::new(Key::ControlE, |ctx| {
            let n = rune_count(ctx.buffer.document().current_line_after_cursor());
            ctx.buffer.cursor_right(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::ControlA, |ctx| {
            let n = ctx.buffer.document().rune_count_until_line_indent_start();
            ctx.buffer.cursor_left(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::ControlK, |ctx| {
            let n = rune_count(ctx.buffer.document().current_line_after_cursor());
            ctx.buffer.delete(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::ControlU, |ctx| {
            let n = rune_count(ctx.buffer.document().current_line_before_cursor());
            ctx.buffer.delete_before_cursor(n, ctx.cols, ctx.rows);
            true
        }),
        // Delete under the cursor; the empty-buffer case never reaches here
        // because the dispatcher turns it into an exit signal first.
        KeyBind::new(Key::ControlD, |ctx| {
            if !ctx.buffer.text().is_empty() {
                ctx.buffer.delete(RuneIdx(1), ctx.cols, ctx.rows);
            }
            true
        }),
        KeyBind::new(Key::ControlH, |ctx| {
            ctx.buffer.delete_before_cursor(RuneIdx(1), ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::ControlF, |ctx| {
            ctx.buffer.cursor_right(RuneIdx(1), ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::ControlB, |ctx| {
            ctx.buffer.cursor_left(RuneIdx(1), ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::AltRight, |ctx| {
            let n = ctx.buffer.document().rune_count_until_end_of_current_word();
            ctx.buffer.cursor_right(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::AltLeft, |ctx| {
            let n = ctx
                .buffer
                .document()
                .rune_count_until_start_of_previous_word();
            ctx.buffer.cursor_left(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::ControlW, |ctx| {
            let n = rune_count(ctx.buffer.document().get_word_before_cursor_with_space());
            ctx.buffer.delete_before_cursor(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::AltBackspace, |ctx| {
            let n = rune_count(ctx.buffer.document().get_word_before_cursor_with_space());
            ctx.buffer.delete_before_cursor(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::ControlL, |ctx| {
            ctx.renderer.clear_screen();
            true
        }),
    ]
}
