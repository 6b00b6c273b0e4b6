//! Transient status and error notices shown to the operator

use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Sink for short user-facing messages
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

/// Prints notices on stderr and mirrors them into the log
///
/// Safe to use while the naming form holds the terminal in raw mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notice(&self, message: &str) {
        tracing::info!(notice = message);

        let mut err = io::stderr();
        let _ = execute!(err, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = write!(err, "{} {}\r\n", "›".cyan(), message);
        let _ = err.flush();
    }
}
