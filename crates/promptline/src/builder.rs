//! Prompt assembly.
//!
//! Mirrors the configuration surface of the event loop: callbacks, binding
//! tables, completion tuning, theme, and injectable terminal capabilities.

use std::sync::{Arc, Mutex};

use prompt_core::{Buffer, CompletionManager, History, Suggest};
use prompt_metrics::RuneIdx;
use prompt_render::{EagerLexer, Lexer, PrefixCallback, Renderer, Theme, Token};
use prompt_term::{TermReader, VtWriter};

use crate::bind::{AsciiCodeBind, KeyBind, KeyBindMode, common_key_bindings};
use crate::emacs::emacs_key_bindings;
use crate::prompt::{ExecuteOnEnterCallback, ExitChecker, Executor, Prompt};

pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 1024;

pub struct PromptBuilder {
    executor: Executor,
    prefix: Option<String>,
    live_prefix: Option<PrefixCallback>,
    completer: Option<prompt_core::Completer>,
    completion_word_separator: Vec<char>,
    completion_max: usize,
    completion_on_down: bool,
    lexer: Option<Box<dyn Lexer>>,
    execute_on_enter: Option<ExecuteOnEnterCallback>,
    exit_checker: Option<ExitChecker>,
    key_bindings: Vec<KeyBind>,
    ascii_code_bindings: Vec<AsciiCodeBind>,
    key_bind_mode: KeyBindMode,
    indent_size: Option<usize>,
    history_capacity: usize,
    theme: Theme,
    reader: Option<Box<dyn TermReader>>,
    writer: Option<VtWriter>,
    input_buffer_size: usize,
}

impl PromptBuilder {
    pub(crate) fn new(executor: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            executor: Box::new(executor),
            prefix: None,
            live_prefix: None,
            completer: None,
            completion_word_separator: Vec::new(),
            completion_max: prompt_core::DEFAULT_MAX_VISIBLE,
            completion_on_down: false,
            lexer: None,
            execute_on_enter: None,
            exit_checker: None,
            key_bindings: Vec::new(),
            ascii_code_bindings: Vec::new(),
            key_bind_mode: KeyBindMode::default(),
            indent_size: None,
            history_capacity: prompt_core::DEFAULT_CAPACITY,
            theme: Theme::default(),
            reader: None,
            writer: None,
            input_buffer_size: DEFAULT_INPUT_BUFFER_SIZE,
        }
    }

    /// Static prompt prefix (default `">>> "`).
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Callback queried on every render; returning `(_, false)` falls back
    /// to the static prefix.
    pub fn live_prefix(
        mut self,
        callback: impl FnMut() -> (String, bool) + Send + 'static,
    ) -> Self {
        self.live_prefix = Some(Box::new(callback));
        self
    }

    pub fn completer(
        mut self,
        completer: impl FnMut(&prompt_core::Document) -> (Vec<Suggest>, RuneIdx, RuneIdx)
        + Send
        + 'static,
    ) -> Self {
        self.completer = Some(Box::new(completer));
        self
    }

    /// Separator runes delimiting the word a suggestion replaces; empty
    /// means any whitespace.
    pub fn completion_word_separator(mut self, seps: impl Into<Vec<char>>) -> Self {
        self.completion_word_separator = seps.into();
        self
    }

    /// Maximum visible suggestion rows in the popup.
    pub fn max_suggestion(mut self, max: usize) -> Self {
        self.completion_max = max;
        self
    }

    /// Let the Down arrow open the completion selection even before any
    /// suggestion is selected.
    pub fn completion_on_down(mut self) -> Self {
        self.completion_on_down = true;
        self
    }

    pub fn lexer(mut self, lexer: impl Lexer + 'static) -> Self {
        self.lexer = Some(Box::new(lexer));
        self
    }

    /// Convenience wrapper installing an [`EagerLexer`] over a function.
    pub fn eager_lexer(mut self, lex_fn: impl Fn(&str) -> Vec<Token> + Send + 'static) -> Self {
        self.lexer = Some(Box::new(EagerLexer::new(lex_fn)));
        self
    }

    /// Decide, after Enter, whether to execute or to insert a newline plus
    /// `indent * indent_size` spaces. Default: always execute.
    pub fn execute_on_enter(
        mut self,
        callback: impl FnMut(&str, usize) -> (usize, bool) + Send + 'static,
    ) -> Self {
        self.execute_on_enter = Some(Box::new(callback));
        self
    }

    /// Consulted after each dispatched key (`breakline = false`) and after
    /// each executed line (`breakline = true`); returning true ends the run
    /// loop.
    pub fn exit_checker(
        mut self,
        checker: impl FnMut(&str, bool) -> bool + Send + 'static,
    ) -> Self {
        self.exit_checker = Some(Box::new(checker));
        self
    }

    pub fn key_bind(mut self, bind: KeyBind) -> Self {
        self.key_bindings.push(bind);
        self
    }

    pub fn ascii_code_bind(mut self, bind: AsciiCodeBind) -> Self {
        self.ascii_code_bindings.push(bind);
        self
    }

    pub fn key_bind_mode(mut self, mode: KeyBindMode) -> Self {
        self.key_bind_mode = mode;
        self
    }

    pub fn indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = Some(indent_size);
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Substitute the raw-mode input capability (tests, embedded terminals).
    pub fn reader(mut self, reader: impl TermReader + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    /// Substitute the output writer (tests render into a [`crate::SharedSink`]).
    pub fn writer(mut self, writer: VtWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Largest byte batch a single terminal read may deliver; raise it when
    /// multi-kilobyte pastes must arrive as one decode.
    pub fn input_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size.max(1);
        self
    }

    pub fn build(self) -> Prompt {
        let writer = self.writer.unwrap_or_else(VtWriter::stdout);
        let mut renderer = Renderer::new(writer);
        if let Some(prefix) = self.prefix {
            renderer.set_prefix(prefix);
        }
        if let Some(live) = self.live_prefix {
            renderer.set_live_prefix(live);
        }
        if let Some(indent) = self.indent_size {
            renderer.set_indent_size(indent);
        }
        renderer.set_theme(self.theme);

        let completer = self
            .completer
            .unwrap_or_else(|| Box::new(|_d: &prompt_core::Document| (Vec::new(), RuneIdx(0), RuneIdx(0))));
        let mut completion = CompletionManager::new(completer, self.completion_max);
        completion.word_separator = self.completion_word_separator;

        let reader: Box<dyn TermReader> = match self.reader {
            Some(r) => r,
            None => Box::new(default_reader()),
        };

        Prompt {
            reader: Arc::new(Mutex::new(reader)),
            renderer,
            buffer: Buffer::new(),
            history: History::new(self.history_capacity),
            completion,
            lexer: self.lexer,
            executor: self.executor,
            execute_on_enter: self
                .execute_on_enter
                .unwrap_or_else(|| Box::new(|_input, _indent| (0, true))),
            exit_checker: self.exit_checker,
            common_bindings: common_key_bindings(),
            emacs_bindings: emacs_key_bindings(),
            user_bindings: self.key_bindings,
            ascii_code_bindings: self.ascii_code_bindings,
            key_bind_mode: self.key_bind_mode,
            completion_on_down: self.completion_on_down,
            completion_reset: false,
            input_buffer_size: self.input_buffer_size,
        }
    }
}

#[cfg(unix)]
fn default_reader() -> impl TermReader + 'static {
    prompt_term::StdinReader::new()
}

#[cfg(not(unix))]
fn default_reader() -> impl TermReader + 'static {
    struct Unsupported;
    impl TermReader for Unsupported {
        fn open(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("no built-in terminal reader on this platform; inject one")
        }
        fn close(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::Unsupported.into())
        }
        fn window_size(&self) -> prompt_term::WinSize {
            prompt_term::WinSize::default()
        }
    }
    Unsupported
}
