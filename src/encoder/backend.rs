use std::time::Duration;
use tokio::sync::mpsc;

use crate::capture::CaptureStream;
use crate::error::RecorderResult;

/// One flushed piece of encoded media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Production order, starting at 0 for each recording
    pub sequence: u64,
    /// Encoded container bytes
    pub data: Vec<u8>,
    /// Milliseconds since the recording started
    pub timestamp_ms: u64,
}

/// Events emitted by a running encoder, in production order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A flush interval elapsed and encoded bytes are available
    Data(Segment),
    /// Non-fatal encoder diagnostic
    Error(String),
    /// Finalization complete; emitted exactly once, after the last `Data`
    Stopped,
}

/// Output codec/container configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// ffmpeg video codec name
    pub codec: String,
    /// ffmpeg muxer name
    pub container: String,
    /// Extension used for the default output filename
    pub extension: String,
    pub mime_type: String,
    pub framerate: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: "libvpx-vp9".to_string(),
            container: "webm".to_string(),
            extension: "webm".to_string(),
            mime_type: "video/webm; codecs=vp9".to_string(),
            framerate: 30,
        }
    }
}

/// Encoder wrapping an acquired capture stream
///
/// Implementations:
/// - ffmpeg: libvpx-vp9 into WebM, streamed from ffmpeg's stdout
#[async_trait::async_trait]
pub trait Encoder: Send {
    /// Start encoding
    ///
    /// Returns the ordered event queue: a `Data` segment per flush interval,
    /// then a single `Stopped` once `stop` has been finalized.
    async fn start(&mut self, flush_interval: Duration) -> RecorderResult<mpsc::Receiver<EncoderEvent>>;

    /// Ask the encoder to finalize; completion is signalled through `Stopped`
    async fn stop(&mut self) -> RecorderResult<()>;

    /// Check if the encoder is currently recording
    fn is_recording(&self) -> bool;

    /// Encoder name for logging
    fn name(&self) -> &str;
}

/// Builds an encoder for an acquired stream
pub trait EncoderFactory: Send + Sync {
    fn create(&self, stream: &CaptureStream, config: &EncoderConfig) -> RecorderResult<Box<dyn Encoder>>;
}
