//! namestamp application library
//!
//! Hosts the rename orchestrator and everything around it that a running
//! process needs: the naming form, notices, configuration, logging and the
//! watch session lifecycle.

pub mod config;
pub mod daemon;
pub mod logging;
pub mod notice;
pub mod orchestrator;
pub mod prompt;

pub use daemon::{Session, SessionSummary};
pub use notice::{Notifier, TerminalNotifier};
pub use orchestrator::{
    EngineEvent, EngineStats, Input, Orchestrator, PendingRename, PromptOutcome,
    DEFAULT_DEBOUNCE,
};
pub use prompt::{drive_form, FormAction, NameForm, PromptWorker, TerminalForm};
