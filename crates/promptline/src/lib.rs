//! promptline — an interactive terminal line editor.
//!
//! Callers supply an executor (and optionally a completer, a lexer, and key
//! bindings); the library owns raw-mode input, multi-line editing with
//! Unicode-aware cursor math, incremental rendering, history with an editing
//! transcript, and a completion popup.
//!
//! ```no_run
//! use promptline::Prompt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let mut prompt = Prompt::builder(|line| println!("you typed: {line}"))
//!     .prefix("db> ")
//!     .build();
//! prompt.run().await
//! # }
//! ```

mod bind;
mod builder;
mod emacs;
mod prompt;

pub use bind::{AsciiCodeBind, BindCtx, BindFn, KeyBind, KeyBindMode};
pub use builder::{DEFAULT_INPUT_BUFFER_SIZE, PromptBuilder};
pub use prompt::{ExecuteOnEnterCallback, ExitChecker, Executor, FeedOutcome, Prompt};

pub use prompt_core::{Buffer, CompletionManager, Document, History, Suggest};
pub use prompt_keys::Key;
pub use prompt_metrics::{ByteIdx, Position, RuneIdx, Width};
pub use prompt_render::{EagerLexer, Lexer, Theme, Token};
pub use prompt_term::{Color, SharedSink, TermReader, VtWriter, WinSize};
#[cfg(unix)]
pub use prompt_term::StdinReader;
