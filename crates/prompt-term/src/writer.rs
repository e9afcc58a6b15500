//! Queued terminal output over an injected sink.
//!
//! Commands accumulate in an internal buffer and reach the terminal in one
//! write on `flush`, so a frame is never torn by interleaved output. The
//! sink is an owned field: production uses stdout, tests use [`SharedSink`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crossterm::{
    cursor::{Hide, MoveDown, MoveRight, MoveTo, MoveToColumn, MoveUp, Show},
    queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use crate::Color;

pub struct VtWriter {
    buf: Vec<u8>,
    sink: Box<dyn Write + Send>,
}

impl VtWriter {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            buf: Vec::with_capacity(4096),
            sink,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn write_str(&mut self, s: &str) {
        if !s.is_empty() {
            let _ = queue!(self.buf, Print(s));
        }
    }

    /// Emit a hard line break (new row, column zero).
    pub fn newline(&mut self) {
        let _ = queue!(self.buf, Print("\r\n"));
    }

    pub fn carriage_return(&mut self) {
        let _ = queue!(self.buf, Print("\r"));
    }

    pub fn move_up(&mut self, n: usize) {
        if n > 0 {
            let _ = queue!(self.buf, MoveUp(n as u16));
        }
    }

    pub fn move_down(&mut self, n: usize) {
        if n > 0 {
            let _ = queue!(self.buf, MoveDown(n as u16));
        }
    }

    pub fn move_right(&mut self, n: usize) {
        if n > 0 {
            let _ = queue!(self.buf, MoveRight(n as u16));
        }
    }

    pub fn move_to_column(&mut self, col: usize) {
        let _ = queue!(self.buf, MoveToColumn(col as u16));
    }

    pub fn cursor_goto(&mut self, col: u16, row: u16) {
        let _ = queue!(self.buf, MoveTo(col, row));
    }

    pub fn erase_down(&mut self) {
        let _ = queue!(self.buf, Clear(ClearType::FromCursorDown));
    }

    pub fn erase_screen(&mut self) {
        let _ = queue!(self.buf, Clear(ClearType::All));
    }

    pub fn set_color(&mut self, fg: Color, bg: Color) {
        let _ = queue!(
            self.buf,
            SetForegroundColor(fg.into()),
            SetBackgroundColor(bg.into())
        );
    }

    pub fn reset_color(&mut self) {
        let _ = queue!(self.buf, ResetColor);
    }

    pub fn hide_cursor(&mut self) {
        let _ = queue!(self.buf, Hide);
    }

    pub fn show_cursor(&mut self) {
        let _ = queue!(self.buf, Show);
    }

    /// Push the queued frame to the sink. A failed write is retried once and
    /// then dropped — the next frame reconciles the screen anyway.
    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let frame = std::mem::take(&mut self.buf);
        if let Err(first) = Self::write_frame(&mut self.sink, &frame) {
            if let Err(second) = Self::write_frame(&mut self.sink, &frame) {
                tracing::warn!(target: "prompt.term", ?first, ?second, "dropping frame after retry");
            }
        }
    }

    fn write_frame(sink: &mut Box<dyn Write + Send>, frame: &[u8]) -> io::Result<()> {
        sink.write_all(frame)?;
        sink.flush()
    }
}

/// Cloneable in-memory sink for renderer tests.
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_string(&self) -> String {
        let mut guard = self.0.lock().unwrap();
        String::from_utf8_lossy(&std::mem::take(&mut *guard)).into_owned()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
