use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::capture::{ResolutionBounds, SourceKind};
use crate::encoder::EncoderConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub encoder: EncoderSettings,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Encoder flush interval in milliseconds
    pub flush_interval_ms: u64,
    /// Default filename prefix (`<prefix>-<unixMillis>.<ext>`)
    pub filename_prefix: String,
    /// Directory offered by the save prompt (supports `~`)
    pub save_dir: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 1000,
            filename_prefix: "vid".to_string(),
            save_dir: None,
        }
    }
}

impl RecorderConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    pub fn save_dir(&self) -> Option<PathBuf> {
        self.save_dir
            .as_deref()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub kinds: Vec<SourceKind>,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// X11 display used for x11grab (defaults to $DISPLAY)
    pub display: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let bounds = ResolutionBounds::default();
        Self {
            kinds: vec![SourceKind::Window, SourceKind::Screen],
            min_width: bounds.min_width,
            min_height: bounds.min_height,
            max_width: bounds.max_width,
            max_height: bounds.max_height,
            display: None,
        }
    }
}

impl CaptureConfig {
    pub fn bounds(&self) -> ResolutionBounds {
        ResolutionBounds {
            min_width: self.min_width,
            min_height: self.min_height,
            max_width: self.max_width,
            max_height: self.max_height,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Explicit ffmpeg binary; looked up on PATH when unset
    pub ffmpeg_path: Option<String>,
    pub codec: String,
    pub container: String,
    pub extension: String,
    pub mime_type: String,
    pub framerate: u32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        let defaults = EncoderConfig::default();
        Self {
            ffmpeg_path: None,
            codec: defaults.codec,
            container: defaults.container,
            extension: defaults.extension,
            mime_type: defaults.mime_type,
            framerate: defaults.framerate,
        }
    }
}

impl EncoderSettings {
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            codec: self.codec.clone(),
            container: self.container.clone(),
            extension: self.extension.clone(),
            mime_type: self.mime_type.clone(),
            framerate: self.framerate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavePromptKind {
    #[default]
    Console,
    Dialog,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub save_prompt: SavePromptKind,
}

impl Config {
    /// Load from an optional config file, then `DESK_RECORDER__SECTION__KEY` env overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("DESK_RECORDER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
