//! Completion candidates, selection cursor and replace range.

use std::panic::{AssertUnwindSafe, catch_unwind};

use prompt_metrics::RuneIdx;

use crate::Document;

/// One completion candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggest {
    pub text: String,
    pub description: String,
}

impl Suggest {
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }
}

/// Produces candidates for a document, together with the rune range of the
/// text they were generated for (the range a committed suggestion replaces).
pub type Completer = Box<dyn FnMut(&Document) -> (Vec<Suggest>, RuneIdx, RuneIdx) + Send>;

pub const DEFAULT_MAX_VISIBLE: usize = 6;

pub struct CompletionManager {
    completer: Completer,
    candidates: Vec<Suggest>,
    selected: Option<usize>,
    vertical_scroll: usize,
    max_visible: usize,
    /// Set by the dispatch gate when the next rerender should refresh the
    /// candidate list.
    pub should_update: bool,
    pub word_separator: Vec<char>,
    replace_start: RuneIdx,
    replace_end: RuneIdx,
}

impl CompletionManager {
    pub fn new(completer: Completer, max_visible: usize) -> Self {
        Self {
            completer,
            candidates: Vec::new(),
            selected: None,
            vertical_scroll: 0,
            max_visible: max_visible.max(1),
            should_update: false,
            word_separator: Vec::new(),
            replace_start: RuneIdx(0),
            replace_end: RuneIdx(0),
        }
    }

    /// Re-run the completer for `document`. A panicking completer is treated
    /// as "no suggestions" for this tick.
    pub fn update(&mut self, document: &Document) {
        let result = catch_unwind(AssertUnwindSafe(|| (self.completer)(document)));
        let (candidates, start, end) = match result {
            Ok(r) => r,
            Err(_) => {
                tracing::warn!(target: "prompt.completion", "completer panicked; dropping suggestions");
                (Vec::new(), RuneIdx(0), RuneIdx(0))
            }
        };
        self.candidates = candidates;
        self.replace_start = start;
        self.replace_end = end;
        self.selected = None;
        self.vertical_scroll = 0;
    }

    /// Cycle forward: none → 0 → … → last → none → 0 …
    pub fn next(&mut self) {
        self.selected = match self.selected {
            None if !self.candidates.is_empty() => Some(0),
            Some(i) if i + 1 < self.candidates.len() => Some(i + 1),
            _ => None,
        };
        self.adjust_scroll();
    }

    /// Cycle backward through the same sequence.
    pub fn previous(&mut self) {
        self.selected = match self.selected {
            None if !self.candidates.is_empty() => Some(self.candidates.len() - 1),
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
        self.adjust_scroll();
    }

    fn adjust_scroll(&mut self) {
        match self.selected {
            Some(i) => {
                let window = self.max_visible.min(self.candidates.len().max(1));
                if i < self.vertical_scroll {
                    self.vertical_scroll = i;
                } else if i >= self.vertical_scroll + window {
                    self.vertical_scroll = i + 1 - window;
                }
            }
            None => self.vertical_scroll = 0,
        }
    }

    pub fn get_selected_suggestion(&self) -> Option<&Suggest> {
        self.selected.and_then(|i| self.candidates.get(i))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn vertical_scroll(&self) -> usize {
        self.vertical_scroll
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub fn candidates(&self) -> &[Suggest] {
        &self.candidates
    }

    pub fn replace_range(&self) -> (RuneIdx, RuneIdx) {
        (self.replace_start, self.replace_end)
    }

    /// Drop all candidates and the selection.
    pub fn reset(&mut self) {
        self.candidates.clear();
        self.selected = None;
        self.vertical_scroll = 0;
    }

    /// True while a suggestion is actively selected from a non-empty list.
    pub fn completing(&self) -> bool {
        !self.candidates.is_empty() && self.selected.is_some()
    }
}
