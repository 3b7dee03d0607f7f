//! Recording session management
//!
//! This module provides the recording-session state machine:
//! - `RecordingSession`: selected source, capture stream, encoder and buffered segments
//! - `RecordingController`: select / start / stop / save transitions over the capabilities
//! - `Controls`: which user actions are valid in the current state
//! - `SessionStats`: serializable status snapshot

mod config;
mod controller;
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use controller::{
    Capabilities, Clock, RecordingController, SaveOutcome, SelectOutcome, StartOutcome, SystemClock,
};
pub use session::RecordingSession;
pub use state::{Controls, RecorderState};
pub use stats::SessionStats;
