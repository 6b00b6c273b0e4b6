//! Naming form and the worker that serves it
//!
//! Prompts are shown one at a time on a dedicated thread. The worker takes
//! `PendingRename`s off a queue, runs the form to completion and posts the
//! outcome back into the orchestrator loop.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use namestamp_core::NamingSession;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::notice::Notifier;
use crate::orchestrator::{Input, PendingRename, PromptOutcome};

/// Something the operator did in the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Input text changed to this value
    Edit(String),
    /// Confirm button or Enter
    Confirm,
    /// Cancel button, Escape or Ctrl-C
    Cancel,
}

/// Single-line text form with live preview
pub trait NameForm: Send {
    /// Show the form for `pending` with its initial preview
    fn open(&mut self, pending: &PendingRename, preview: &str) -> io::Result<()>;

    /// Redraw after the input or preview changed
    fn render(&mut self, input: &str, preview: &str) -> io::Result<()>;

    /// Block until the operator acts
    fn next_action(&mut self) -> io::Result<FormAction>;

    /// Tear the form down
    fn close(&mut self) -> io::Result<()>;
}

/// Run one prompt to completion
///
/// A blank confirm shows a notice and keeps the form open. Form I/O errors
/// count as a cancel.
pub fn drive_form(
    form: &mut dyn NameForm,
    pending: &PendingRename,
    notifier: &dyn Notifier,
) -> PromptOutcome {
    let mut session = pending.session();

    let outcome = run_form(form, pending, &mut session, notifier).unwrap_or_else(|e| {
        warn!("Naming form failed for {}: {}", pending.entry.path.display(), e);
        PromptOutcome::Cancelled
    });

    if let Err(e) = form.close() {
        warn!("Failed to close naming form: {}", e);
    }

    outcome
}

fn run_form(
    form: &mut dyn NameForm,
    pending: &PendingRename,
    session: &mut NamingSession,
    notifier: &dyn Notifier,
) -> io::Result<PromptOutcome> {
    form.open(pending, &session.preview())?;

    loop {
        match form.next_action()? {
            FormAction::Edit(text) => {
                session.set_input(text);
                form.render(session.input(), &session.preview())?;
            }
            FormAction::Confirm => match session.confirm() {
                Ok(stem) => return Ok(PromptOutcome::Confirmed(stem)),
                Err(e) => {
                    notifier.notice(&e.to_string());
                    form.render(session.input(), &session.preview())?;
                }
            },
            FormAction::Cancel => return Ok(PromptOutcome::Cancelled),
        }
    }
}

/// Thread serving prompts in arrival order
pub struct PromptWorker;

impl PromptWorker {
    /// Spawn the worker thread
    ///
    /// The thread ends when every sender of `requests` is dropped or the
    /// orchestrator stops listening.
    pub fn spawn(
        mut form: Box<dyn NameForm>,
        notifier: Arc<dyn Notifier>,
        requests: Receiver<PendingRename>,
        answers: mpsc::UnboundedSender<Input>,
    ) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("namestamp-prompt".to_string())
            .spawn(move || {
                for pending in requests.iter() {
                    let outcome = drive_form(form.as_mut(), &pending, notifier.as_ref());
                    if answers.send(Input::Answered { pending, outcome }).is_err() {
                        break;
                    }
                }
                debug!("Prompt worker stopped");
            })
    }
}

/// Naming form drawn on the controlling terminal
///
/// Holds the terminal in raw mode while open so every keystroke updates
/// the preview.
pub struct TerminalForm {
    buffer: String,
    raw: bool,
}

impl TerminalForm {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            raw: false,
        }
    }
}

impl Default for TerminalForm {
    fn default() -> Self {
        Self::new()
    }
}

impl NameForm for TerminalForm {
    fn open(&mut self, pending: &PendingRename, preview: &str) -> io::Result<()> {
        self.buffer.clear();

        let mut err = io::stderr();
        write!(
            err,
            "\n{} {}\n{}\n",
            "Rename".bold(),
            pending.entry.name.yellow(),
            "Enter to confirm, Esc to cancel".dimmed()
        )?;

        terminal::enable_raw_mode()?;
        self.raw = true;
        self.render("", preview)
    }

    fn render(&mut self, input: &str, preview: &str) -> io::Result<()> {
        let mut err = io::stderr();
        queue!(
            err,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!(
                "{} {}  {} {}",
                "Name:".bold(),
                input,
                "Preview:".dimmed(),
                preview.cyan()
            ))
        )?;
        err.flush()
    }

    fn next_action(&mut self) -> io::Result<FormAction> {
        loop {
            let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            else {
                continue;
            };

            if kind != KeyEventKind::Press {
                continue;
            }

            match code {
                KeyCode::Enter => return Ok(FormAction::Confirm),
                KeyCode::Esc => return Ok(FormAction::Cancel),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(FormAction::Cancel)
                }
                KeyCode::Char(c) => {
                    self.buffer.push(c);
                    return Ok(FormAction::Edit(self.buffer.clone()));
                }
                KeyCode::Backspace => {
                    self.buffer.pop();
                    return Ok(FormAction::Edit(self.buffer.clone()));
                }
                _ => {}
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.raw {
            terminal::disable_raw_mode()?;
            self.raw = false;
        }
        execute!(io::stderr(), Print("\n"))
    }
}

impl Drop for TerminalForm {
    fn drop(&mut self) {
        if self.raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}
