//! Interactive console: typed commands stand in for the select / start / stop buttons

use anyhow::Result;
use std::io::Write;
use tracing::{error, info};

use crate::prompt::ConsoleInput;
use crate::session::{RecordingController, SaveOutcome, SelectOutcome, StartOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select,
    Start,
    Stop,
    Save,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "select" | "source" => Some(Self::Select),
            "start" | "record" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "save" => Some(Self::Save),
            "status" => Some(Self::Status),
            "help" | "?" => Some(Self::Help),
            "quit" | "exit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub struct Console {
    controller: RecordingController,
    input: ConsoleInput,
}

impl Console {
    pub fn new(controller: RecordingController, input: ConsoleInput) -> Self {
        Self { controller, input }
    }

    pub async fn run(mut self) -> Result<()> {
        print_help();
        let mut show_prompt = true;

        loop {
            if show_prompt {
                self.print_prompt();
                show_prompt = false;
            }

            tokio::select! {
                line = self.input.read_line() => {
                    let Some(line) = line? else {
                        info!("Console input closed");
                        break;
                    };
                    match Command::parse(&line) {
                        Some(Command::Quit) => break,
                        Some(command) => self.dispatch(command).await?,
                        None if line.is_empty() => {}
                        None => println!("Unknown command: {} (type 'help')", line),
                    }
                    show_prompt = true;
                }
                event = self.controller.next_event() => {
                    if let Some(outcome) = self.controller.handle_event(event).await {
                        report_save(&outcome);
                        show_prompt = true;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        if self.controller.shutdown().await > 0 {
            println!("Unsaved recording discarded");
        }
        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Select => match self.controller.select_source().await {
                Ok(SelectOutcome::Armed(source)) => println!("Source: {}", source.name),
                Ok(SelectOutcome::Dismissed) => {}
                Ok(SelectOutcome::NoSources) => println!("No capture sources available"),
                Err(e) => error!("Error getting stream: {}", e),
            },
            Command::Start => match self.controller.start().await {
                Ok(StartOutcome::Started) => println!("Recording... type 'stop' to finish"),
                Ok(_) => {}
                Err(e) => error!("{}", e),
            },
            Command::Stop => match self.controller.stop().await {
                Ok(true) => println!("Finalizing recording..."),
                Ok(false) => {}
                Err(e) => error!("Failed to stop recording: {}", e),
            },
            Command::Save => match self.controller.save().await {
                Ok(outcome) => report_save(&outcome),
                Err(e) => error!("{}", e),
            },
            Command::Status => {
                let stats = self.controller.stats();
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            Command::Help => print_help(),
            Command::Quit => {}
        }
        Ok(())
    }

    fn print_prompt(&self) {
        let source = self
            .controller
            .selected_source()
            .map(|s| s.name.as_str())
            .unwrap_or("no source");
        let actions = self.controller.controls().enabled_actions();

        print!(
            "[{} | {}] {} > ",
            self.controller.state(),
            source,
            actions.join("/")
        );
        std::io::stdout().flush().ok();
    }
}

fn report_save(outcome: &SaveOutcome) {
    match outcome {
        SaveOutcome::Saved(path) => println!("Saved {}", path.display()),
        SaveOutcome::Cancelled => println!("Save cancelled; type 'save' to try again"),
        SaveOutcome::Failed(_) => println!("Save failed; type 'save' to retry"),
        SaveOutcome::NothingToSave => println!("Nothing to save"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  select  choose a screen or window to capture");
    println!("  start   start recording the selected source");
    println!("  stop    stop recording and save the video");
    println!("  save    retry saving the last recording");
    println!("  status  show session status");
    println!("  quit    exit");
}
