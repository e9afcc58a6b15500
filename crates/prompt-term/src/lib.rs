//! Terminal capabilities behind narrow traits.
//!
//! The prompt core never touches the platform directly: it reads bytes
//! through a [`TermReader`] and emits frames through a [`VtWriter`] over an
//! injected sink. Tests substitute both with in-memory stand-ins.

use std::io;

use anyhow::Result;

mod color;
#[cfg(unix)]
mod reader;
mod writer;

pub use color::Color;
#[cfg(unix)]
pub use reader::StdinReader;
pub use writer::{SharedSink, VtWriter};

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for WinSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Raw-mode keyboard input capability.
///
/// `read` must be non-blocking: it returns `WouldBlock` when no bytes are
/// pending so the polling task can sleep instead of stalling the runtime.
pub trait TermReader: Send {
    /// Enter raw mode and switch the input descriptor to non-blocking reads.
    fn open(&mut self) -> Result<()>;

    /// Restore cooked mode and blocking reads.
    fn close(&mut self) -> Result<()>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn window_size(&self) -> WinSize;
}
