use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::RecorderState;

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub state: RecorderState,

    /// Whether a stop was requested and completion is still pending
    pub finalizing: bool,

    /// Name of the selected capture source
    pub source: Option<String>,

    /// When the current (or last) recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Recording duration in seconds (running while recording)
    pub duration_secs: f64,

    /// Number of segments buffered
    pub chunks_count: usize,

    /// Total bytes buffered
    pub buffered_bytes: usize,
}
