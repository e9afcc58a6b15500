//! The prompt event loop and key dispatch.
//!
//! One tick: receive a byte batch from the keyboard task, decode it, route
//! it through the completion gate, the built-in handlers, and the binding
//! tables, then re-render once if anything changed. Window-resize and exit
//! signals arrive on their own channels and are multiplexed by `select!`.
//!
//! Around a committed line the loop stops both background tasks, restores
//! cooked mode, runs the executor synchronously (it may block and may read
//! stdin itself), and then re-enters raw mode and respawns the tasks.
//! Keystrokes typed while the executor runs bypass the reader and are
//! discarded with the cooked-mode line discipline.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use prompt_core::{Buffer, CompletionManager, History};
use prompt_keys::{DecodedInput, Key, decode};
use prompt_metrics::{Position, RuneIdx, Width, rune_count};
use prompt_render::{Lexer, Renderer};
use prompt_term::{TermReader, WinSize};

use crate::bind::{AsciiCodeBind, BindCtx, KeyBind, KeyBindMode};

pub type Executor = Box<dyn FnMut(&str) + Send>;
pub type ExecuteOnEnterCallback = Box<dyn FnMut(&str, usize) -> (usize, bool) + Send>;
pub type ExitChecker = Box<dyn FnMut(&str, bool) -> bool + Send>;

const READ_CHANNEL_CAP: usize = 128;
const IDLE_POLL: Duration = Duration::from_millis(10);

type SharedReader = Arc<Mutex<Box<dyn TermReader>>>;

/// Result of dispatching one byte batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    pub should_exit: bool,
    pub rerender: bool,
    /// A committed line ready for the executor.
    pub input: Option<String>,
}

pub struct Prompt {
    pub(crate) reader: SharedReader,
    pub(crate) renderer: Renderer,
    pub(crate) buffer: Buffer,
    pub(crate) history: History,
    pub(crate) completion: CompletionManager,
    pub(crate) lexer: Option<Box<dyn Lexer>>,
    pub(crate) executor: Executor,
    pub(crate) execute_on_enter: ExecuteOnEnterCallback,
    pub(crate) exit_checker: Option<ExitChecker>,
    pub(crate) common_bindings: Vec<KeyBind>,
    pub(crate) emacs_bindings: Vec<KeyBind>,
    pub(crate) user_bindings: Vec<KeyBind>,
    pub(crate) ascii_code_bindings: Vec<AsciiCodeBind>,
    pub(crate) key_bind_mode: KeyBindMode,
    pub(crate) completion_on_down: bool,
    pub(crate) completion_reset: bool,
    pub(crate) input_buffer_size: usize,
}

impl Prompt {
    pub fn builder(executor: impl FnMut(&str) + Send + 'static) -> crate::PromptBuilder {
        crate::PromptBuilder::new(executor)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn completion(&self) -> &CompletionManager {
        &self.completion
    }

    pub fn completion_mut(&mut self) -> &mut CompletionManager {
        &mut self.completion
    }

    /// Set the window geometry directly. `run` keeps this in sync from the
    /// resize signal; embedders driving [`Self::feed`] call it themselves.
    pub fn update_win_size(&mut self, size: WinSize) {
        self.renderer.update_win_size(size);
    }

    fn lock_reader(&self) -> MutexGuard<'_, Box<dyn TermReader>> {
        match self.reader.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn setup(&mut self) -> Result<()> {
        let size = {
            let mut reader = self.lock_reader();
            reader.open()?;
            reader.window_size()
        };
        self.renderer.update_win_size(size);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.lock_reader().close()
    }

    fn render_now(&mut self) {
        let lexer: Option<&mut dyn Lexer> = match &mut self.lexer {
            Some(boxed) => Some(boxed.as_mut()),
            None => None,
        };
        self.renderer.render(&mut self.buffer, &self.completion, lexer);
    }

    fn break_line_now(&mut self) {
        let lexer: Option<&mut dyn Lexer> = match &mut self.lexer {
            Some(boxed) => Some(boxed.as_mut()),
            None => None,
        };
        self.renderer.break_line(&mut self.buffer, lexer);
    }

    fn update_completion(&mut self) {
        let document = self.buffer.document().clone();
        self.completion.update(&document);
    }

    /// Run the interactive loop until the user exits.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(target: "prompt.run", "starting prompt");
        self.setup()?;
        self.render_now();

        let (buf_tx, mut buf_rx) = mpsc::channel::<Vec<u8>>(READ_CHANNEL_CAP);
        let (winsize_tx, mut winsize_rx) = mpsc::channel::<WinSize>(8);
        let (exit_tx, mut exit_rx) = mpsc::channel::<i32>(1);

        let mut tasks = self.spawn_io_tasks(&buf_tx, &winsize_tx, &exit_tx);

        loop {
            tokio::select! {
                Some(bytes) = buf_rx.recv() => {
                    let outcome = self.feed(&bytes);
                    if outcome.should_exit {
                        self.break_line_now();
                        tasks.stop().await;
                        break;
                    } else if let Some(input) = outcome.input {
                        tasks.stop().await;
                        self.close()?;
                        tracing::info!(target: "prompt.run", len = input.len(), "executing line");
                        (self.executor)(&input);
                        self.update_completion();
                        self.render_now();
                        if let Some(checker) = &mut self.exit_checker {
                            if checker(&input, true) {
                                return Ok(());
                            }
                        }
                        self.lock_reader().open()?;
                        tasks = self.spawn_io_tasks(&buf_tx, &winsize_tx, &exit_tx);
                    } else if outcome.rerender {
                        if self.completion.should_update {
                            self.update_completion();
                        }
                        self.render_now();
                    }
                }
                Some(size) = winsize_rx.recv() => {
                    self.renderer.update_win_size(size);
                    self.buffer.reset_start_line();
                    let cols = self.renderer.user_input_columns();
                    let rows = self.renderer.rows();
                    self.buffer.recalculate_start_line(cols, rows);
                    self.render_now();
                }
                Some(code) = exit_rx.recv() => {
                    tracing::info!(target: "prompt.run", code, "exit signal");
                    self.break_line_now();
                    tasks.stop().await;
                    self.close()?;
                    std::process::exit(code);
                }
            }
        }

        self.close()?;
        tracing::info!(target: "prompt.run", "prompt finished");
        Ok(())
    }

    /// Read a single line: same dispatch loop, but the committed line is
    /// returned instead of being executed, and OS signals are left alone.
    pub async fn input(&mut self) -> Result<String> {
        self.setup()?;
        self.render_now();

        let (buf_tx, mut buf_rx) = mpsc::channel::<Vec<u8>>(READ_CHANNEL_CAP);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = spawn_reader_task(
            self.reader.clone(),
            buf_tx.clone(),
            stop_rx,
            self.input_buffer_size,
        );

        let mut line = String::new();
        while let Some(bytes) = buf_rx.recv().await {
            let outcome = self.feed(&bytes);
            if outcome.should_exit {
                self.break_line_now();
                break;
            } else if let Some(input) = outcome.input {
                line = input;
                break;
            } else if outcome.rerender {
                if self.completion.should_update {
                    self.update_completion();
                }
                self.render_now();
            }
        }

        let _ = stop_tx.send(true);
        let _ = handle.await;
        self.close()?;
        Ok(line)
    }

    fn spawn_io_tasks(
        &self,
        buf_tx: &mpsc::Sender<Vec<u8>>,
        winsize_tx: &mpsc::Sender<WinSize>,
        exit_tx: &mpsc::Sender<i32>,
    ) -> IoTasks {
        let (stop_tx, stop_rx) = watch::channel(false);
        let reader_handle = spawn_reader_task(
            self.reader.clone(),
            buf_tx.clone(),
            stop_rx.clone(),
            self.input_buffer_size,
        );
        let signal_handle = spawn_signal_task(
            self.reader.clone(),
            winsize_tx.clone(),
            exit_tx.clone(),
            stop_rx,
        );
        IoTasks {
            stop_tx,
            handles: vec![reader_handle, signal_handle],
        }
    }

    /// Dispatch one decoded byte batch. Public so embedders and tests can
    /// drive the prompt without a live terminal.
    pub fn feed(&mut self, bytes: &[u8]) -> FeedOutcome {
        let decoded = decode(bytes, self.renderer.indent_size());
        let key = decoded.key;
        self.buffer.set_last_key(key);

        let completing = self.completion.completing();
        if self.handle_completion_key_binding(&decoded, completing) {
            return FeedOutcome {
                rerender: true,
                ..FeedOutcome::default()
            };
        }

        let cols = self.renderer.user_input_columns();
        let rows = self.renderer.rows();
        let mut outcome = FeedOutcome::default();

        match key {
            Key::Enter | Key::ControlJ | Key::ControlM => {
                let text = self.buffer.text().to_string();
                let indent_size = self.renderer.indent_size();
                let (indent, execute) = (self.execute_on_enter)(&text, indent_size);
                if !execute {
                    self.buffer.new_line(cols, rows, false);
                    let indent_str = " ".repeat(indent.saturating_mul(indent_size));
                    self.buffer
                        .insert_text_move_cursor(&indent_str, cols, rows, false);
                } else {
                    self.break_line_now();
                    outcome.input = Some(text.clone());
                    self.buffer = Buffer::new();
                    if !text.is_empty() {
                        self.history.add(text);
                    }
                }
            }
            Key::ControlC => {
                self.break_line_now();
                self.buffer = Buffer::new();
                self.history.reset_navigation();
            }
            Key::Up | Key::ControlP => {
                if self.buffer.document().cursor_position_row() > 0 {
                    outcome.rerender = self.cursor_up(1);
                    return outcome;
                }
                if !completing {
                    if let Some(restored) = self.history.older(&self.buffer, cols, rows) {
                        self.buffer = restored;
                    }
                }
            }
            Key::Down | Key::ControlN => {
                {
                    let document = self.buffer.document();
                    if document.text_end_position_row() > document.cursor_position_row() {
                        outcome.rerender = self.cursor_down(1);
                        return outcome;
                    }
                }
                if !completing {
                    if let Some(restored) = self.history.newer(&self.buffer, cols, rows) {
                        self.buffer = restored;
                    }
                }
                outcome.rerender = true;
                return outcome;
            }
            Key::ControlD => {
                if self.buffer.text().is_empty() {
                    outcome.should_exit = true;
                    outcome.rerender = true;
                    return outcome;
                }
            }
            Key::NotDefined => {
                let (checked, rerender) = self.handle_ascii_code_binding(&decoded, cols, rows);
                if checked {
                    outcome.rerender = rerender;
                    return outcome;
                }
                let text = String::from_utf8_lossy(&decoded.text).into_owned();
                if text.chars().next().is_some_and(char::is_control) {
                    return outcome;
                }
                self.buffer.insert_text_move_cursor(&text, cols, rows, false);
            }
            _ => {}
        }

        let (should_exit, rerender) = self.handle_key_binding(key, cols, rows);
        outcome.should_exit = should_exit;
        if !outcome.rerender {
            outcome.rerender = rerender;
        }
        outcome
    }

    /// The completion gate: Tab/BackTab, arrow selection, and committing a
    /// selected suggestion before any other key takes effect. Returns true
    /// when the key was consumed.
    fn handle_completion_key_binding(&mut self, decoded: &DecodedInput, completing: bool) -> bool {
        self.completion.should_update = true;
        self.completion_reset = false;
        let cols = self.renderer.user_input_columns();
        let rows = self.renderer.rows();
        let candidates_len = self.completion.candidates().len();

        match decoded.key {
            Key::Down if completing || self.completion_on_down => {
                self.update_suggestions(CompletionManager::next);
                true
            }
            Key::ControlI => {
                self.update_suggestions(CompletionManager::next);
                true
            }
            Key::Up if completing => {
                self.update_suggestions(CompletionManager::previous);
                true
            }
            Key::Tab => {
                if candidates_len > 0 {
                    self.update_suggestions(CompletionManager::next);
                } else {
                    // No suggestions: a Tab press is indentation (the decoder
                    // already expanded it to spaces).
                    let text = String::from_utf8_lossy(&decoded.text).into_owned();
                    self.buffer.insert_text_move_cursor(&text, cols, rows, false);
                }
                true
            }
            Key::BackTab => {
                if candidates_len > 0 {
                    self.update_suggestions(CompletionManager::previous);
                    return true;
                }
                let line = self.buffer.document().current_line_before_cursor().to_string();
                if line.chars().any(|c| c != ' ') {
                    return false;
                }
                let indent = RuneIdx(self.renderer.indent_size());
                self.buffer.delete_before_cursor(indent, cols, rows);
                true
            }
            _ => {
                if let Some(selected) = self.completion.get_selected_suggestion().cloned() {
                    let word = self
                        .buffer
                        .document()
                        .get_word_before_cursor_until_separator(&self.completion.word_separator)
                        .to_string();
                    if !word.is_empty() {
                        self.buffer
                            .delete_before_cursor(rune_count(&word), cols, rows);
                    }
                    self.buffer
                        .insert_text_move_cursor(&selected.text, cols, rows, false);
                }
                if candidates_len > 0 {
                    self.completion_reset = true;
                }
                self.completion.reset();
                false
            }
        }
    }

    /// Move the selection and mirror the change into the buffer preview:
    /// entering a selection inserts its text over the replace range, leaving
    /// removes it, switching swaps it.
    fn update_suggestions(&mut self, mover: fn(&mut CompletionManager)) {
        let cols = self.renderer.user_input_columns();
        let rows = self.renderer.rows();
        let (start, end) = self.completion.replace_range();
        let previous = self.completion.get_selected_suggestion().cloned();

        mover(&mut self.completion);
        self.completion.should_update = false;
        let current = self.completion.get_selected_suggestion().cloned();

        match (previous, current) {
            (None, None) => {}
            (None, Some(new)) => {
                self.buffer.delete_before_cursor(end - start, cols, rows);
                self.buffer.insert_text_move_cursor(&new.text, cols, rows, false);
            }
            (Some(old), None) => {
                self.buffer.delete_before_cursor(
                    rune_count(&old.text) - (end - start),
                    cols,
                    rows,
                );
            }
            (Some(old), Some(new)) => {
                self.buffer
                    .delete_before_cursor(rune_count(&old.text), cols, rows);
                self.buffer.insert_text_move_cursor(&new.text, cols, rows, false);
            }
        }
    }

    fn handle_ascii_code_binding(
        &mut self,
        decoded: &DecodedInput,
        cols: Width,
        rows: usize,
    ) -> (bool, bool) {
        let mut checked = false;
        let mut rerender = false;
        for bind in self
            .ascii_code_bindings
            .iter_mut()
            .filter(|b| b.code == decoded.text)
        {
            let mut ctx = BindCtx {
                buffer: &mut self.buffer,
                renderer: &mut self.renderer,
                cols,
                rows,
            };
            let result = (bind.action)(&mut ctx);
            if !rerender {
                rerender = result;
            }
            checked = true;
        }
        (checked, rerender)
    }

    fn handle_key_binding(&mut self, key: Key, cols: Width, rows: usize) -> (bool, bool) {
        let mut executed = false;
        let mut rerender = false;

        run_table(
            &mut self.common_bindings,
            key,
            &mut self.buffer,
            &mut self.renderer,
            cols,
            rows,
            &mut executed,
            &mut rerender,
        );
        if self.key_bind_mode == KeyBindMode::Emacs {
            run_table(
                &mut self.emacs_bindings,
                key,
                &mut self.buffer,
                &mut self.renderer,
                cols,
                rows,
                &mut executed,
                &mut rerender,
            );
        }
        run_table(
            &mut self.user_bindings,
            key,
            &mut self.buffer,
            &mut self.renderer,
            cols,
            rows,
            &mut executed,
            &mut rerender,
        );

        let mut should_exit = false;
        if let Some(checker) = &mut self.exit_checker {
            if checker(self.buffer.text(), false) {
                should_exit = true;
            }
        }
        if !executed && !rerender {
            rerender = true;
        }
        (should_exit, rerender)
    }

    /// Pure-motion fast path: when nothing else changed, emit relative
    /// cursor escapes instead of repainting. Returns true when a full
    /// redraw is still required.
    pub fn cursor_left(&mut self, count: RuneIdx) -> bool {
        self.cursor_fast_path(|buffer, cols, rows| buffer.cursor_left(count, cols, rows))
    }

    /// Mirror of [`Self::cursor_left`].
    pub fn cursor_right(&mut self, count: RuneIdx) -> bool {
        self.cursor_fast_path(|buffer, cols, rows| buffer.cursor_right(count, cols, rows))
    }

    pub fn cursor_up(&mut self, count: usize) -> bool {
        self.cursor_fast_path(|buffer, cols, rows| buffer.cursor_up(count, cols, rows))
    }

    pub fn cursor_down(&mut self, count: usize) -> bool {
        self.cursor_fast_path(|buffer, cols, rows| buffer.cursor_down(count, cols, rows))
    }

    fn cursor_fast_path(&mut self, motion: impl FnOnce(&mut Buffer, Width, usize) -> bool) -> bool {
        let cols = self.renderer.user_input_columns();
        let rows = self.renderer.rows();
        let previous = self.buffer.display_cursor_position(cols);
        let scrolled = motion(&mut self.buffer, cols, rows);
        let rerender =
            scrolled || self.completion_reset || !self.completion.candidates().is_empty();
        if rerender {
            return true;
        }
        let start_line = self.buffer.start_line();
        let new = self.buffer.display_cursor_position(cols);
        self.renderer.apply_cursor_diff(
            Position::new(previous.x, previous.y.saturating_sub(start_line)),
            Position::new(new.x, new.y.saturating_sub(start_line)),
        );
        false
    }
}

#[allow(clippy::too_many_arguments)]
fn run_table(
    table: &mut [KeyBind],
    key: Key,
    buffer: &mut Buffer,
    renderer: &mut Renderer,
    cols: Width,
    rows: usize,
    executed: &mut bool,
    rerender: &mut bool,
) {
    for bind in table.iter_mut().filter(|b| b.key == key) {
        let mut ctx = BindCtx {
            buffer: &mut *buffer,
            renderer: &mut *renderer,
            cols,
            rows,
        };
        let result = (bind.action)(&mut ctx);
        *executed = true;
        if !*rerender {
            *rerender = result;
        }
    }
}

struct IoTasks {
    stop_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl IoTasks {
    /// Signal both tasks and wait for them to drain; nothing may still hold
    /// the terminal when the executor runs.
    async fn stop(self) {
        let _ = self.stop_tx.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Keyboard poller: non-blocking reads of up to `buf_size` bytes with a
/// short idle sleep, batches forwarded over a bounded channel.
fn spawn_reader_task(
    reader: SharedReader,
    tx: mpsc::Sender<Vec<u8>>,
    mut stop: watch::Receiver<bool>,
    buf_size: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(target: "prompt.input", "reader task started");
        let mut buf = vec![0u8; buf_size];
        loop {
            if *stop.borrow() {
                break;
            }
            let read = {
                let mut guard = match reader.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                guard.read(&mut buf)
            };
            match read {
                Ok(0) => {}
                Ok(n) => {
                    // A lone NUL is terminal noise, not input.
                    if !(n == 1 && buf[0] == 0)
                        && tx.send(buf[..n].to_vec()).await.is_err()
                    {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    tracing::warn!(target: "prompt.input", ?e, "read failed; reader stopping");
                    break;
                }
            }
            tokio::select! {
                _ = stop.changed() => {
                    if *stop.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(IDLE_POLL) => {}
            }
        }
        tracing::debug!(target: "prompt.input", "reader task stopped");
    })
}

/// Signal watcher: window-size changes feed the resize channel, interrupt
/// and terminate feed the exit channel.
#[cfg(unix)]
fn spawn_signal_task(
    reader: SharedReader,
    winsize_tx: mpsc::Sender<WinSize>,
    exit_tx: mpsc::Sender<i32>,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    use tokio::signal::unix::{SignalKind, signal};
    tokio::spawn(async move {
        let (mut winch, mut int, mut term) = match (
            signal(SignalKind::window_change()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(w), Ok(i), Ok(t)) => (w, i, t),
            _ => {
                tracing::warn!(target: "prompt.signal", "signal registration failed");
                return;
            }
        };
        tracing::debug!(target: "prompt.signal", "signal task started");
        loop {
            tokio::select! {
                _ = stop.changed() => {
                    if *stop.borrow() {
                        break;
                    }
                }
                _ = winch.recv() => {
                    let size = {
                        let guard = match reader.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        guard.window_size()
                    };
                    if winsize_tx.send(size).await.is_err() {
                        break;
                    }
                }
                _ = int.recv() => {
                    let _ = exit_tx.send(130).await;
                }
                _ = term.recv() => {
                    let _ = exit_tx.send(143).await;
                }
            }
        }
        tracing::debug!(target: "prompt.signal", "signal task stopped");
    })
}

#[cfg(not(unix))]
fn spawn_signal_task(
    _reader: SharedReader,
    _winsize_tx: mpsc::Sender<WinSize>,
    _exit_tx: mpsc::Sender<i32>,
    _stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async {})
}
