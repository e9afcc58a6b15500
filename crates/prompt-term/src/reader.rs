//! Raw-mode stdin with non-blocking reads.

use std::io;
use std::os::unix::io::RawFd;

use anyhow::{Context, Result};
use crossterm::terminal;

use crate::{TermReader, WinSize};

const STDIN_FD: RawFd = 0;

/// [`TermReader`] over file descriptor 0.
///
/// Raw mode is toggled through crossterm; the descriptor itself is switched
/// to `O_NONBLOCK` so the keyboard poller can spin with an idle sleep and
/// still observe its stop signal promptly. `close` restores both, which also
/// hands a blocking, cooked stdin to executors that want to read from it.
pub struct StdinReader {
    opened: bool,
    saved_flags: i32,
}

impl Default for StdinReader {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinReader {
    pub fn new() -> Self {
        Self {
            opened: false,
            saved_flags: 0,
        }
    }

    fn set_nonblocking(&mut self, enable: bool) -> Result<()> {
        // Safety: fcntl on a valid, process-owned descriptor.
        unsafe {
            let flags = libc::fcntl(STDIN_FD, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error()).context("fcntl(F_GETFL) on stdin");
            }
            if enable {
                self.saved_flags = flags;
            }
            let new_flags = if enable {
                flags | libc::O_NONBLOCK
            } else {
                self.saved_flags & !libc::O_NONBLOCK
            };
            if libc::fcntl(STDIN_FD, libc::F_SETFL, new_flags) < 0 {
                return Err(io::Error::last_os_error()).context("fcntl(F_SETFL) on stdin");
            }
        }
        Ok(())
    }
}

impl TermReader for StdinReader {
    fn open(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        terminal::enable_raw_mode().context("enable raw mode")?;
        self.set_nonblocking(true)?;
        self.opened = true;
        tracing::debug!(target: "prompt.term", "raw mode opened");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.opened {
            return Ok(());
        }
        self.set_nonblocking(false)?;
        terminal::disable_raw_mode().context("disable raw mode")?;
        self.opened = false;
        tracing::debug!(target: "prompt.term", "raw mode closed");
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Safety: buffer pointer and length come from a live slice.
        let n = unsafe { libc::read(STDIN_FD, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn window_size(&self) -> WinSize {
        match terminal::size() {
            Ok((cols, rows)) => WinSize { rows, cols },
            Err(_) => WinSize::default(),
        }
    }
}

impl Drop for StdinReader {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
