use anyhow::{Context, Result};
use clap::Parser;
use desk_recorder::capture::{find_ffmpeg, FfmpegSourceEnumerator, FfmpegStreamAcquirer};
use desk_recorder::config::SavePromptKind;
use desk_recorder::console::Console;
use desk_recorder::encoder::FfmpegEncoderFactory;
use desk_recorder::prompt::{ConsoleInput, ConsolePresenter, ConsoleSavePrompt, DialogSavePrompt};
use desk_recorder::{Capabilities, Config, FsFileWriter, RecordingController, SavePrompt, SessionConfig};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "desk-recorder")]
#[command(about = "Record a screen or window to a video file")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/desk-recorder")]
    config: String,

    /// Use the native save dialog instead of the console prompt
    #[arg(long)]
    save_dialog: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they don't interleave with the console prompt
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    info!("Desk Recorder v{}", env!("CARGO_PKG_VERSION"));

    let ffmpeg = find_ffmpeg(cfg.encoder.ffmpeg_path.as_deref())
        .context("ffmpeg not found; install it or set encoder.ffmpeg_path")?;
    info!("Using ffmpeg at {}", ffmpeg.display());

    let input = ConsoleInput::stdin();
    let save_dir = cfg.recorder.save_dir();
    if let Some(dir) = &save_dir {
        info!("Default save directory: {}", dir.display());
    }

    let save_prompt: Box<dyn SavePrompt> =
        if args.save_dialog || cfg.ui.save_prompt == SavePromptKind::Dialog {
            Box::new(DialogSavePrompt::new(save_dir, cfg.encoder.extension.clone()))
        } else {
            Box::new(ConsoleSavePrompt::new(input.clone(), save_dir))
        };

    let display = cfg.capture.display.clone();
    let caps = Capabilities {
        enumerator: Box::new(FfmpegSourceEnumerator::new(ffmpeg.clone(), display.clone())),
        presenter: Box::new(ConsolePresenter::new(input.clone())),
        acquirer: Box::new(FfmpegStreamAcquirer::new(
            ffmpeg.clone(),
            display,
            cfg.encoder.framerate,
        )),
        encoders: Box::new(FfmpegEncoderFactory::new(ffmpeg)),
        save_prompt,
        writer: Box::new(FsFileWriter),
    };

    let controller = RecordingController::new(SessionConfig::from(&cfg), caps);

    Console::new(controller, input).run().await
}
