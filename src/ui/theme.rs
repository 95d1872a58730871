//! Terminal styling for CLI output
//!
//! Output is colored on a terminal unless `NO_COLOR` is set. Callers name
//! the role of a piece of text with a [`Tone`] and the theme decides how it
//! looks, so plain output never carries escape codes.

use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// The role a piece of CLI output plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Success,
    Failure,
    Caution,
    Note,
    Label,
    Aside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    colored: bool,
}

impl Theme {
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            colored: !no_color && console::Term::stdout().is_term(),
        }
    }

    pub fn colored() -> Self {
        Self { colored: true }
    }

    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    pub fn style(&self, tone: Tone) -> Style {
        if !self.colored {
            return Style::new();
        }
        match tone {
            Tone::Heading => Style::new().magenta().bold(),
            Tone::Success => Style::new().green().bold(),
            Tone::Failure => Style::new().red().bold(),
            Tone::Caution => Style::new().yellow().bold(),
            Tone::Note => Style::new().cyan(),
            Tone::Label => Style::new().white().dimmed(),
            Tone::Aside => Style::new().bright_black(),
        }
    }

    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if !self.colored {
            return text.to_string();
        }
        text.style(self.style(tone)).to_string()
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
