//! Status output for the terminal: colored and animated on a TTY, plain
//! text when piped or when `NO_COLOR` is set.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

/// Width of the key column in `key: value` lines.
const KEY_WIDTH: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    styled: bool,
}

impl Formatter {
    /// Styled output when stdout or stderr is a terminal and `NO_COLOR` is unset.
    pub fn detect() -> Self {
        let terminal = std::io::stdout().is_terminal() || std::io::stderr().is_terminal();
        Self::new(terminal && std::env::var_os("NO_COLOR").is_none())
    }

    pub fn new(styled: bool) -> Self {
        Self { styled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_styled(&self) -> bool {
        self.styled
    }

    pub fn success(&self, message: &str) {
        if self.styled {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("✓ {}", message);
        }
    }

    /// Goes to stderr.
    pub fn error(&self, message: &str) {
        if self.styled {
            eprintln!("{} {}", "✗".red().bold(), message);
        } else {
            eprintln!("✗ {}", message);
        }
    }

    pub fn heading(&self, title: &str) {
        if self.styled {
            println!("{}", title.bold());
        } else {
            println!("{}", title);
        }
    }

    /// One indented `key: value` line.
    pub fn field(&self, key: &str, value: &str) {
        if self.styled {
            println!("  {} {}", field_key(key).cyan(), value);
        } else {
            println!("  {} {}", field_key(key), value);
        }
    }

    /// A ticking spinner when styled; otherwise prints `message` once and
    /// returns a hidden bar.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if !self.styled {
            println!("{}", message);
            return ProgressBar::hidden();
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    pub fn finish_spinner(&self, spinner: ProgressBar, message: &str) {
        if self.styled {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        } else {
            spinner.finish();
            println!("✓ {}", message);
        }
    }
}

/// `key:` padded to the key column width.
pub fn field_key(key: &str) -> String {
    format!("{:<width$}", format!("{}:", key), width = KEY_WIDTH)
}
