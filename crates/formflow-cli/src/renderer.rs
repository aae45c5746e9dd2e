//! Terminal output: markdown through termimad, plain text, or JSON.

use std::fmt::Display;

use anyhow::Result;
use serde::Serialize;
use termimad::{crossterm::style::Color, MadSkin};

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Styled markdown
    Rich,
    /// Markdown source as-is
    Plain,
    /// Pretty-printed JSON of the underlying model
    Json,
}

/// Writes command results in the selected [`OutputMode`].
pub struct TerminalRenderer {
    mode: OutputMode,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(mode: OutputMode) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { mode, skin }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Prints `markdown`, or `value` as JSON in JSON mode.
    pub fn show<T: Serialize + ?Sized>(&self, value: &T, markdown: impl Display) -> Result<()> {
        match self.mode {
            OutputMode::Json => self.json(value),
            _ => self.render(&markdown.to_string()),
        }
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Render markdown text to the terminal
    pub fn render(&self, markdown: &str) -> Result<()> {
        match self.mode {
            OutputMode::Rich => {
                // headers keep their hashes so nesting stays visible
                for line in markdown.lines() {
                    if line.starts_with('#') {
                        println!("\x1b[34m{line}\x1b[0m");
                    } else {
                        self.skin.print_inline(line);
                        println!();
                    }
                }
            }
            OutputMode::Plain | OutputMode::Json => print!("{markdown}"),
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(OutputMode::Rich)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_rich() {
        assert_eq!(TerminalRenderer::default().mode(), OutputMode::Rich);
    }

    #[test]
    fn test_plain_renderer_keeps_mode() {
        let renderer = TerminalRenderer::new(OutputMode::Plain);
        assert_eq!(renderer.mode(), OutputMode::Plain);
        assert!(renderer.render("# Title\n").is_ok());
    }
}
