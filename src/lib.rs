pub mod capture;
pub mod config;
pub mod console;
pub mod encoder;
pub mod error;
pub mod prompt;
pub mod session;
pub mod storage;

pub use capture::{
    CaptureInput, CaptureSource, CaptureStream, ResolutionBounds, SourceEnumerator, SourceKind,
    StreamAcquirer,
};
pub use config::Config;
pub use encoder::{Encoder, EncoderConfig, EncoderEvent, EncoderFactory, Segment};
pub use error::{RecorderError, RecorderResult};
pub use prompt::{ChoicePresenter, SavePrompt};
pub use session::{
    Capabilities, Clock, Controls, RecorderState, RecordingController, RecordingSession,
    SaveOutcome, SelectOutcome, SessionConfig, SessionStats, StartOutcome,
};
pub use storage::{FileWriter, FsFileWriter};
