use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::backend::{CaptureSource, ResolutionBounds};

/// Device description handed to the encoder (ffmpeg-style `-f <format> [options] -i <target>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureInput {
    pub format: String,
    pub target: String,
    pub options: Vec<(String, String)>,
}

impl CaptureInput {
    pub fn new(format: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            target: target.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Render as input arguments for ffmpeg
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format.clone()];
        for (key, value) in &self.options {
            args.push(format!("-{}", key));
            args.push(value.clone());
        }
        args.push("-i".to_string());
        args.push(self.target.clone());
        args
    }
}

/// Shared view of whether a stream is still held
#[derive(Debug, Clone)]
pub struct StreamActivity(Arc<AtomicBool>);

impl StreamActivity {
    pub fn is_active(&self) -> bool {
        !self.0.load(Ordering::SeqCst)
    }
}

/// An acquired capture stream
///
/// Owned exclusively by the recording session. Released explicitly on
/// re-selection or shutdown, and on drop otherwise.
#[derive(Debug)]
pub struct CaptureStream {
    id: Uuid,
    source: CaptureSource,
    input: CaptureInput,
    bounds: ResolutionBounds,
    released: Arc<AtomicBool>,
}

impl CaptureStream {
    pub fn new(source: CaptureSource, input: CaptureInput, bounds: ResolutionBounds) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            input,
            bounds,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &CaptureSource {
        &self.source
    }

    pub fn input(&self) -> &CaptureInput {
        &self.input
    }

    pub fn bounds(&self) -> ResolutionBounds {
        self.bounds
    }

    pub fn is_active(&self) -> bool {
        !self.released.load(Ordering::SeqCst)
    }

    pub fn activity(&self) -> StreamActivity {
        StreamActivity(Arc::clone(&self.released))
    }

    /// Release the stream; idempotent
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            info!("Released capture stream {} ({})", self.id, self.source.name);
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.release();
    }
}
