//! Key-binding tables.
//!
//! A binding's action runs against a [`BindCtx`] and reports whether the
//! view needs a repaint. Every matching binding runs; the repaint flags are
//! OR-ed by the dispatcher.

use prompt_core::Buffer;
use prompt_keys::Key;
use prompt_metrics::Width;
use prompt_render::Renderer;

/// Mutable editing context handed to key-binding actions.
pub struct BindCtx<'a> {
    pub buffer: &'a mut Buffer,
    pub renderer: &'a mut Renderer,
    pub cols: Width,
    pub rows: usize,
}

pub type BindFn = Box<dyn FnMut(&mut BindCtx<'_>) -> bool + Send>;

/// Binding matched by decoded [`Key`].
pub struct KeyBind {
    pub key: Key,
    pub action: BindFn,
}

impl KeyBind {
    pub fn new(key: Key, action: impl FnMut(&mut BindCtx<'_>) -> bool + Send + 'static) -> Self {
        Self {
            key,
            action: Box::new(action),
        }
    }
}

/// Binding matched against the raw byte sequence of one read; a hit
/// suppresses the text-insertion fallback for undecoded input.
pub struct AsciiCodeBind {
    pub code: Vec<u8>,
    pub action: BindFn,
}

impl AsciiCodeBind {
    pub fn new(
        code: impl Into<Vec<u8>>,
        action: impl FnMut(&mut BindCtx<'_>) -> bool + Send + 'static,
    ) -> Self {
        Self {
            code: code.into(),
            action: Box::new(action),
        }
    }
}

/// Which mode table sits between the common and user tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyBindMode {
    /// No mode table; only common and user bindings apply.
    Common,
    #[default]
    Emacs,
}

/// Bindings active regardless of mode: plain arrow motion and the
/// navigation cluster every terminal user expects.
pub fn common_key_bindings() -> Vec<KeyBind> {
    vec![
        KeyBind::new(Key::End, |ctx| {
            let n = ctx.buffer.document().get_end_of_line_position();
            ctx.buffer.cursor_right(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::Home, |ctx| {
            let n = ctx.buffer.document().cursor_position_col();
            ctx.buffer.cursor_left(n, ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::Delete, |ctx| {
            ctx.buffer.delete(prompt_metrics::RuneIdx(1), ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::Backspace, |ctx| {
            ctx.buffer
                .delete_before_cursor(prompt_metrics::RuneIdx(1), ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::Right, |ctx| {
            ctx.buffer
                .cursor_right(prompt_metrics::RuneIdx(1), ctx.cols, ctx.rows);
            true
        }),
        KeyBind::new(Key::Left, |ctx| {
            ctx.buffer
                .cursor_left(prompt_metrics::RuneIdx(1), ctx.cols, ctx.rows);
            true
        }),
    ]
}
