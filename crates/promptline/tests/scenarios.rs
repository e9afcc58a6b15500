//! End-to-end dispatch scenarios driven through `Prompt::feed` with
//! in-memory terminal capabilities.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use promptline::{
    Prompt, PromptBuilder, RuneIdx, SharedSink, Suggest, TermReader, VtWriter, WinSize,
};

/// Scripted reader: hands out the queued chunks one per read, then reports
/// an empty terminal.
struct ScriptReader {
    chunks: VecDeque<Vec<u8>>,
}

impl ScriptReader {
    fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
        }
    }

    fn empty() -> Self {
        Self {
            chunks: VecDeque::new(),
        }
    }
}

impl TermReader for ScriptReader {
    fn open(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn window_size(&self) -> WinSize {
        WinSize { rows: 24, cols: 80 }
    }
}

fn test_prompt(builder: PromptBuilder) -> Prompt {
    let sink = SharedSink::new();
    let mut prompt = builder
        .reader(ScriptReader::empty())
        .writer(VtWriter::new(Box::new(sink)))
        .build();
    prompt.update_win_size(WinSize { rows: 24, cols: 80 });
    prompt
}

/// Mirror of the run-loop's post-dispatch completion refresh.
fn pump(prompt: &mut Prompt, bytes: &[u8]) -> promptline::FeedOutcome {
    let outcome = prompt.feed(bytes);
    if outcome.rerender && prompt.completion().should_update {
        let document = prompt.buffer_mut().document().clone();
        prompt.completion_mut().update(&document);
    }
    outcome
}

#[test]
fn indent_on_enter_holds_the_line() {
    // Scenario: Enter continues the line with one indent level while a brace
    // is open, and the executor must not fire.
    let executed = Arc::new(AtomicBool::new(false));
    let flag = executed.clone();
    let mut prompt = test_prompt(
        Prompt::builder(move |_line| flag.store(true, Ordering::SeqCst)).execute_on_enter(
            |input, _indent_size| {
                if input.ends_with('{') {
                    (1, false)
                } else {
                    (0, true)
                }
            },
        ),
    );

    pump(&mut prompt, b"if {");
    let outcome = pump(&mut prompt, b"\r");

    assert_eq!(prompt.buffer().text(), "if {\n  ");
    assert_eq!(prompt.buffer().cursor(), RuneIdx(7));
    assert!(outcome.input.is_none());
    assert!(!executed.load(Ordering::SeqCst));
}

#[test]
fn ctrl_w_cuts_word_before_cursor() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, b"hello world foo");
    pump(&mut prompt, b"\x17");
    assert_eq!(prompt.buffer().text(), "hello world ");
    assert_eq!(prompt.buffer().cursor(), RuneIdx(12));
}

#[test]
fn tab_previews_and_space_commits_suggestion() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}).completer(|document| {
        let word = document.get_word_before_cursor_until_separator(&[]);
        let candidates = if "println".starts_with(word) && !word.is_empty() {
            vec![Suggest::new("println", "print a line")]
        } else {
            Vec::new()
        };
        let end = document.cursor();
        let start = end - promptline::RuneIdx(word.chars().count());
        (candidates, start, end)
    }));

    pump(&mut prompt, b"pri");
    assert_eq!(prompt.completion().candidates().len(), 1);

    // Tab selects the first suggestion and previews it in the buffer.
    pump(&mut prompt, b"\t");
    assert_eq!(prompt.buffer().text(), "println");
    assert!(prompt.completion().completing());

    // Any other key commits the preview, then applies itself.
    pump(&mut prompt, b" ");
    assert_eq!(prompt.buffer().text(), "println ");
    assert!(!prompt.completion().completing());
}

#[test]
fn tab_cycles_back_to_the_original_word() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}).completer(|document| {
        let word = document.get_word_before_cursor_until_separator(&[]);
        let end = document.cursor();
        let start = end - promptline::RuneIdx(word.chars().count());
        (
            vec![Suggest::new("print", ""), Suggest::new("println", "")],
            start,
            end,
        )
    }));

    pump(&mut prompt, b"pri");
    pump(&mut prompt, b"\t");
    assert_eq!(prompt.buffer().text(), "print");
    pump(&mut prompt, b"\t");
    assert_eq!(prompt.buffer().text(), "println");
    // Cycling past the last entry deselects and restores the typed prefix.
    pump(&mut prompt, b"\t");
    assert_eq!(prompt.buffer().text(), "pri");
}

#[test]
fn tab_without_candidates_inserts_indent() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, b"\t");
    assert_eq!(prompt.buffer().text(), "  ");
}

#[test]
fn backtab_removes_one_indent_unit() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, b"\t");
    pump(&mut prompt, b"\t");
    assert_eq!(prompt.buffer().text(), "    ");
    pump(&mut prompt, b"\x1b[Z");
    assert_eq!(prompt.buffer().text(), "  ");
    // On a non-indent line BackTab leaves the text alone.
    pump(&mut prompt, b"x");
    pump(&mut prompt, b"\x1b[Z");
    assert_eq!(prompt.buffer().text(), "  x");
}

#[test]
fn history_navigation_preserves_the_unsent_line() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));

    pump(&mut prompt, b"foo");
    let outcome = pump(&mut prompt, b"\r");
    assert_eq!(outcome.input.as_deref(), Some("foo"));

    pump(&mut prompt, b"bar");
    pump(&mut prompt, b"\x1b[A"); // Up: back into history
    assert_eq!(prompt.buffer().text(), "foo");
    pump(&mut prompt, b"\x1b[B"); // Down: forward to the unsent line
    assert_eq!(prompt.buffer().text(), "bar");
}

#[test]
fn ctrl_d_exits_only_on_empty_buffer() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    let outcome = pump(&mut prompt, b"\x04");
    assert!(outcome.should_exit);

    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, b"ab");
    pump(&mut prompt, b"\x1b[D"); // Left: put a character under the cursor
    let outcome = pump(&mut prompt, b"\x04");
    assert!(!outcome.should_exit);
    assert_eq!(prompt.buffer().text(), "a");
}

#[test]
fn ctrl_c_discards_line_and_resets_history_walk() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, b"one");
    pump(&mut prompt, b"\r");
    pump(&mut prompt, b"half-typed");
    pump(&mut prompt, b"\x03");
    assert_eq!(prompt.buffer().text(), "");
    // The transcript was reset: walking up shows the committed entry, and
    // walking back down shows an empty fresh slot, not the discarded text.
    pump(&mut prompt, b"\x1b[A");
    assert_eq!(prompt.buffer().text(), "one");
    pump(&mut prompt, b"\x1b[B");
    assert_eq!(prompt.buffer().text(), "");
}

#[test]
fn up_moves_within_multiline_buffer_before_history() {
    let mut prompt = test_prompt(
        Prompt::builder(|_| {}).execute_on_enter(|input, _| (0, input != "stay")),
    );
    pump(&mut prompt, b"stay");
    pump(&mut prompt, b"\r"); // held: newline inserted instead of executing
    pump(&mut prompt, b"second");
    assert_eq!(prompt.buffer().text(), "stay\nsecond");

    pump(&mut prompt, b"\x1b[A");
    // Cursor moved into the first line; the buffer is untouched.
    assert_eq!(prompt.buffer().text(), "stay\nsecond");
    assert_eq!(prompt.buffer_mut().document().cursor_position_row(), 0);
}

#[test]
fn control_characters_without_binding_are_dropped() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, b"ok");
    // An unknown escape-prefixed sequence decodes as NotDefined and starts
    // with a control rune, so nothing is inserted.
    let outcome = pump(&mut prompt, b"\x1bq");
    assert_eq!(prompt.buffer().text(), "ok");
    assert!(!outcome.rerender);
}

#[test]
fn ascii_code_binding_suppresses_insertion() {
    use promptline::AsciiCodeBind;
    let mut prompt = test_prompt(Prompt::builder(|_| {}).ascii_code_bind(AsciiCodeBind::new(
        &b"\x1bq"[..],
        |ctx| {
            ctx.buffer
                .insert_text_move_cursor("<bound>", ctx.cols, ctx.rows, false);
            true
        },
    )));
    pump(&mut prompt, b"\x1bq");
    assert_eq!(prompt.buffer().text(), "<bound>");
}

#[test]
fn exit_checker_ends_the_loop_without_breakline() {
    let mut prompt = test_prompt(
        Prompt::builder(|_| {}).exit_checker(|input, breakline| !breakline && input == "quit"),
    );
    pump(&mut prompt, b"qui");
    let outcome = pump(&mut prompt, b"t");
    assert!(outcome.should_exit);
}

#[test]
fn multibyte_input_keeps_rune_cursor() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, "日本語".as_bytes());
    assert_eq!(prompt.buffer().text(), "日本語");
    assert_eq!(prompt.buffer().cursor(), RuneIdx(3));
    pump(&mut prompt, b"\x08"); // Ctrl-H backspace
    assert_eq!(prompt.buffer().text(), "日本");
}

#[test]
fn pasted_crlf_text_is_normalized() {
    let mut prompt = test_prompt(
        Prompt::builder(|_| {}).execute_on_enter(|_input, _| (0, false)),
    );
    pump(&mut prompt, b"line1\r");
    assert_eq!(prompt.buffer().text(), "line1\n");
}

#[test]
fn cursor_fast_path_skips_redraw_on_plain_motion() {
    let mut prompt = test_prompt(Prompt::builder(|_| {}));
    pump(&mut prompt, b"abc");
    // No scroll, no completion: motion takes the escape-only fast path.
    assert!(!prompt.cursor_left(RuneIdx(1)));
    assert_eq!(prompt.buffer().cursor(), RuneIdx(2));
    assert!(!prompt.cursor_right(RuneIdx(1)));
    assert_eq!(prompt.buffer().cursor(), RuneIdx(3));
}

#[tokio::test]
async fn input_returns_single_committed_line() {
    let sink = SharedSink::new();
    let mut prompt = Prompt::builder(|_| {})
        .reader(ScriptReader::new(&[b"echo hi", b"\r"]))
        .writer(VtWriter::new(Box::new(sink)))
        .build();
    let line = prompt.input().await.expect("input loop");
    assert_eq!(line, "echo hi");
}

#[tokio::test]
async fn run_loop_executes_and_exits() {
    let executed: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let log = executed.clone();
    let sink = SharedSink::new();
    let mut prompt = Prompt::builder(move |line| log.lock().unwrap().push(line.to_string()))
        .reader(ScriptReader::new(&[b"hi", b"\r", b"\x04"]))
        .writer(VtWriter::new(Box::new(sink.clone())))
        .build();

    prompt.run().await.expect("run loop");

    assert_eq!(executed.lock().unwrap().as_slice(), ["hi".to_string()]);
    assert_eq!(prompt.history().entries(), ["hi".to_string()]);
    let frames = sink.contents();
    assert!(frames.contains("hi"), "rendered input missing: {frames:?}");
}
