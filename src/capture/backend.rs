use serde::{Deserialize, Serialize};

use super::stream::CaptureStream;
use crate::error::RecorderResult;

/// Kind of capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A single application window
    Window,
    /// An entire screen / monitor
    Screen,
}

/// A selectable screen or window, as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSource {
    /// Backend-specific identifier (passed back to the acquirer)
    pub id: String,
    /// Human readable name shown in the choice menu
    pub name: String,
    pub kind: SourceKind,
}

impl CaptureSource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}

/// Resolution constraints applied to an acquired stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionBounds {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ResolutionBounds {
    fn default() -> Self {
        Self {
            min_width: 1280,
            min_height: 720,
            max_width: 1920,
            max_height: 1080,
        }
    }
}

/// Capture source enumeration
///
/// Implementations:
/// - ffmpeg: xrandr/wmctrl on X11, avfoundation device listing on macOS, gdigrab desktop on Windows
#[async_trait::async_trait]
pub trait SourceEnumerator: Send + Sync {
    /// List sources of the requested kinds
    ///
    /// Fails with `CapabilityDenied` when the platform refuses enumeration.
    async fn sources(&self, kinds: &[SourceKind]) -> RecorderResult<Vec<CaptureSource>>;
}

/// Capture stream acquisition
#[async_trait::async_trait]
pub trait StreamAcquirer: Send + Sync {
    /// Acquire a video-only stream for `source`, constrained to `bounds`
    async fn acquire(
        &self,
        source: &CaptureSource,
        bounds: ResolutionBounds,
    ) -> RecorderResult<CaptureStream>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
