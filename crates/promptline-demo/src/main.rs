//! Demonstration REPL: brace-aware auto-indent, alternating word coloring,
//! and a static keyword completer.

use anyhow::Result;
use clap::Parser;
use promptline::{ByteIdx, Color, Prompt, RuneIdx, Suggest, Theme, Token};
use tracing::info;

mod config;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "promptline-demo", version, about = "promptline demo REPL")]
struct Args {
    /// Configuration file path (overrides discovery of `promptline.toml`).
    #[arg(long = "config")]
    config: Option<std::path::PathBuf>,
}

const KEYWORDS: &[(&str, &str)] = &[
    ("select", "retrieve rows"),
    ("insert", "add rows"),
    ("update", "modify rows"),
    ("delete", "remove rows"),
    ("from", "table source"),
    ("where", "row filter"),
    ("limit", "row cap"),
    ("order", "sort rows"),
];

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = std::path::Path::new("promptline-demo.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(log_path);
    }
    let file_appender = tracing_appender::rolling::never(".", "promptline-demo.log");
    let (nb_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .init();

    info!(target: "demo", "startup");

    // Log panics before the prompt's Drop restores the terminal.
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(target: "demo.panic", ?info, "panic");
        default_panic(info);
    }));

    let args = Args::parse();
    let config = config::load_from(args.config)?;

    let mut theme = Theme::default();
    if let Some(color) = config.prefix_color() {
        theme.prefix_text = color;
    }

    let mut prompt = Prompt::builder(|line| println!("Your input: {line}"))
        .prefix(config.prompt.prefix.clone())
        .indent_size(config.prompt.indent_size)
        .history_capacity(config.history.capacity)
        .theme(theme)
        .completer(keyword_completer)
        .eager_lexer(word_lexer)
        .execute_on_enter(execute_on_enter)
        .build();

    prompt.run().await
}

/// Hold the line open while braces are unbalanced; the continuation indent
/// follows the last line's indent, dropping a level on a closing brace.
fn execute_on_enter(input: &str, indent_size: usize) -> (usize, bool) {
    let mut spaces: i64 = 0;
    if let Some(last_line) = input.split('\n').next_back() {
        for c in last_line.chars() {
            if c == '}' {
                spaces -= (2 * indent_size) as i64;
                break;
            }
            if c != ' ' {
                break;
            }
            spaces += 1;
        }
    }

    let balanced = input.matches('}').count() == input.matches('{').count();
    let execute = input.ends_with('}') && balanced || !input.contains('{');
    let indent = 1 + spaces / indent_size.max(1) as i64;
    (indent.max(0) as usize, execute)
}

fn keyword_completer(
    document: &promptline::Document,
) -> (Vec<Suggest>, RuneIdx, RuneIdx) {
    let word = document.get_word_before_cursor_until_separator(&[]);
    let end = document.cursor();
    let start = end - RuneIdx(word.chars().count());
    if word.is_empty() {
        return (Vec::new(), start, end);
    }
    let candidates = KEYWORDS
        .iter()
        .filter(|(kw, _)| kw.starts_with(&word.to_ascii_lowercase()))
        .map(|(kw, desc)| Suggest::new(*kw, *desc))
        .collect();
    (candidates, start, end)
}

/// Color every other word green, whitespace included in the leading word's
/// span, matching the token-partition contract.
fn word_lexer(line: &str) -> Vec<Token> {
    if line.is_empty() {
        return Vec::new();
    }
    let mut tokens = Vec::new();
    let mut word_index = 0usize;
    let mut last_start = 0usize;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            let color = if word_index % 2 == 0 {
                Color::Green
            } else {
                Color::White
            };
            tokens.push(Token::new(color, ByteIdx(i)));
            word_index += 1;
            last_start = i + c.len_utf8();
        }
    }
    if last_start < line.len() {
        let color = if word_index % 2 == 0 {
            Color::Green
        } else {
            Color::White
        };
        tokens.push(Token::new(color, ByteIdx(line.len() - 1)));
    }
    tokens
}
