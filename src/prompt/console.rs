use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::debug;

use super::{ChoicePresenter, SavePrompt};
use crate::error::RecorderResult;

type LineSource = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

/// Line-oriented console input shared by the command loop and the prompts
#[derive(Clone)]
pub struct ConsoleInput {
    lines: Arc<Mutex<LineSource>>,
}

impl ConsoleInput {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    pub fn from_reader(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
        }
    }

    /// Next trimmed line, `None` at end of input
    pub async fn read_line(&self) -> RecorderResult<Option<String>> {
        let mut lines = self.lines.lock().await;
        Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    std::io::stdout().flush().ok();
}

/// Numbered menu on stdout, answered with the item number
pub struct ConsolePresenter {
    input: ConsoleInput,
}

impl ConsolePresenter {
    pub fn new(input: ConsoleInput) -> Self {
        Self { input }
    }
}

#[async_trait::async_trait]
impl ChoicePresenter for ConsolePresenter {
    async fn present(&self, title: &str, labels: &[String]) -> RecorderResult<Option<usize>> {
        if labels.is_empty() {
            return Ok(None);
        }

        println!("{}:", title);
        for (i, label) in labels.iter().enumerate() {
            println!("  {}) {}", i + 1, label);
        }
        prompt(&format!("Choose [1-{}, empty to dismiss]: ", labels.len()));

        let Some(answer) = self.input.read_line().await? else {
            return Ok(None);
        };

        Ok(parse_choice(&answer, labels.len()))
    }
}

/// 1-based menu answer to an index; anything else dismisses
pub fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => {
            debug!("Menu dismissed with answer {:?}", answer);
            None
        }
    }
}

/// Save prompt answered on the console
///
/// Empty answer accepts the default, `cancel` discards, a directory gets the default filename.
pub struct ConsoleSavePrompt {
    input: ConsoleInput,
    default_dir: Option<PathBuf>,
}

impl ConsoleSavePrompt {
    pub fn new(input: ConsoleInput, default_dir: Option<PathBuf>) -> Self {
        Self { input, default_dir }
    }
}

#[async_trait::async_trait]
impl SavePrompt for ConsoleSavePrompt {
    async fn show(&self, default_filename: &str) -> RecorderResult<Option<PathBuf>> {
        let default_path = match &self.default_dir {
            Some(dir) => dir.join(default_filename),
            None => PathBuf::from(default_filename),
        };

        prompt(&format!(
            "Save Video as [{}] (type 'cancel' to discard): ",
            default_path.display()
        ));

        let Some(answer) = self.input.read_line().await? else {
            return Ok(None);
        };

        Ok(resolve_save_answer(&answer, &default_path, default_filename))
    }
}

pub fn resolve_save_answer(answer: &str, default_path: &Path, default_filename: &str) -> Option<PathBuf> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(default_path.to_path_buf());
    }
    if answer.eq_ignore_ascii_case("cancel") {
        return None;
    }

    let path = PathBuf::from(shellexpand::tilde(answer).as_ref());
    if path.is_dir() {
        Some(path.join(default_filename))
    } else {
        Some(path)
    }
}
