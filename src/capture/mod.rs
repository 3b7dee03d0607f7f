pub mod backend;
pub mod ffmpeg;
pub mod stream;

pub use backend::{CaptureSource, ResolutionBounds, SourceEnumerator, SourceKind, StreamAcquirer};
pub use ffmpeg::{find_ffmpeg, FfmpegSourceEnumerator, FfmpegStreamAcquirer};
pub use stream::{CaptureInput, CaptureStream, StreamActivity};
