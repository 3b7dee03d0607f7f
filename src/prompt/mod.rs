//! User prompts: the source choice menu and the save destination prompt
//!
//! - `ConsolePresenter` / `ConsoleSavePrompt` read answers from the shared console input
//! - `DialogSavePrompt` uses the native save dialog

mod console;
mod dialog;

use std::path::PathBuf;

use crate::error::RecorderResult;

pub use console::{ConsoleInput, ConsolePresenter, ConsoleSavePrompt};
pub use dialog::DialogSavePrompt;

/// Presents a transient choice menu
///
/// Exactly one choice is returned per presentation, or `None` if dismissed.
#[async_trait::async_trait]
pub trait ChoicePresenter: Send + Sync {
    async fn present(&self, title: &str, labels: &[String]) -> RecorderResult<Option<usize>>;
}

/// Asks the user where to save a recording
#[async_trait::async_trait]
pub trait SavePrompt: Send + Sync {
    /// Returns the chosen path, or `None` if the user cancelled
    async fn show(&self, default_filename: &str) -> RecorderResult<Option<PathBuf>>;
}
