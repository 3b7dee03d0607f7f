use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::capture::{ResolutionBounds, SourceKind};
use crate::config::Config;
use crate::encoder::EncoderConfig;

/// Configuration for the recording controller
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Source kinds offered in the choice menu
    pub kinds: Vec<SourceKind>,

    /// Resolution constraints for acquired streams
    /// Default: 1280x720 .. 1920x1080
    pub bounds: ResolutionBounds,

    /// How often the encoder hands over a segment
    /// Default: 1000ms
    pub flush_interval: Duration,

    /// Default filename prefix, e.g. "vid" for `vid-1700000000000.webm`
    pub filename_prefix: String,

    /// Output codec and container
    pub encoder: EncoderConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            kinds: vec![SourceKind::Window, SourceKind::Screen],
            bounds: ResolutionBounds::default(),
            flush_interval: Duration::from_millis(1000),
            filename_prefix: "vid".to_string(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl SessionConfig {
    /// `<prefix>-<unixMillis>.<ext>`
    pub fn default_filename(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}-{}.{}",
            self.filename_prefix,
            at.timestamp_millis(),
            self.encoder.extension
        )
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            kinds: config.capture.kinds.clone(),
            bounds: config.capture.bounds(),
            flush_interval: config.recorder.flush_interval(),
            filename_prefix: config.recorder.filename_prefix.clone(),
            encoder: config.encoder.encoder_config(),
        }
    }
}
