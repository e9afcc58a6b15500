//! Editing state for an interactive prompt: the mutable [`Buffer`], its
//! read-only [`Document`] view, the bounded [`History`] with its editing
//! transcript, and the [`CompletionManager`].
//!
//! Everything here is pure, single-threaded state; terminal I/O lives in
//! other crates. All operations are total — out-of-range arguments clamp
//! instead of failing.

mod buffer;
mod completion;
mod document;
mod history;

pub use buffer::Buffer;
pub use completion::{CompletionManager, Completer, DEFAULT_MAX_VISIBLE, Suggest};
pub use document::Document;
pub use history::{DEFAULT_CAPACITY, History};
