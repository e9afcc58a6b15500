//! `promptline.toml` discovery and parsing.
//!
//! Unknown fields are ignored and a malformed file falls back to defaults,
//! so a stale config never blocks the REPL from starting.

use anyhow::Result;
use promptline::Color;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
pub struct PromptSection {
    #[serde(default = "PromptSection::default_prefix")]
    pub prefix: String,
    #[serde(default = "PromptSection::default_indent_size")]
    pub indent_size: usize,
}

impl Default for PromptSection {
    fn default() -> Self {
        Self {
            prefix: Self::default_prefix(),
            indent_size: Self::default_indent_size(),
        }
    }
}

impl PromptSection {
    fn default_prefix() -> String {
        ">>> ".to_string()
    }
    const fn default_indent_size() -> usize {
        2
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistorySection {
    #[serde(default = "HistorySection::default_capacity")]
    pub capacity: usize,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

impl HistorySection {
    const fn default_capacity() -> usize {
        512
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ColorSection {
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub prompt: PromptSection,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub colors: ColorSection,
}

impl Config {
    pub fn prefix_color(&self) -> Option<Color> {
        self.colors.prefix.as_deref().and_then(parse_color)
    }
}

/// Working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("promptline.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("promptline").join("promptline.toml");
    }
    PathBuf::from("promptline.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => {
            info!(target: "demo.config", file = %path.display(), "config loaded");
            Ok(config)
        }
        Err(e) => {
            info!(target: "demo.config", file = %path.display(), %e, "config parse failed; using defaults");
            Ok(Config::default())
        }
    }
}

fn parse_color(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "dark-red" => Color::DarkRed,
        "dark-green" => Color::DarkGreen,
        "brown" => Color::Brown,
        "dark-blue" => Color::DarkBlue,
        "purple" => Color::Purple,
        "cyan" => Color::Cyan,
        "light-gray" => Color::LightGray,
        "dark-gray" => Color::DarkGray,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "fuchsia" => Color::Fuchsia,
        "turquoise" => Color::Turquoise,
        "white" => Color::White,
        _ => return None,
    };
    Some(color)
}
