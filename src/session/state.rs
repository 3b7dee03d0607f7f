use serde::{Deserialize, Serialize};
use std::fmt;

/// Recorder lifecycle: Idle -> Armed -> Recording -> Stopped -> (start again)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    /// No capture stream
    #[default]
    Idle,
    /// Stream acquired, ready to record
    Armed,
    Recording,
    /// Recording finished; the stream is kept for re-arming
    Stopped,
}

impl RecorderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Recording => "recording",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User actions valid in the current state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub select_enabled: bool,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub save_enabled: bool,
}

impl Controls {
    pub fn for_state(state: RecorderState, finalizing: bool, has_unsaved: bool) -> Self {
        if finalizing {
            return Self::default();
        }

        match state {
            RecorderState::Idle => Self {
                select_enabled: true,
                save_enabled: has_unsaved,
                ..Self::default()
            },
            RecorderState::Armed | RecorderState::Stopped => Self {
                select_enabled: true,
                start_enabled: true,
                stop_enabled: false,
                save_enabled: has_unsaved,
            },
            RecorderState::Recording => Self {
                stop_enabled: true,
                ..Self::default()
            },
        }
    }

    /// Names of the enabled actions, in menu order
    pub fn enabled_actions(&self) -> Vec<&'static str> {
        [
            (self.select_enabled, "select"),
            (self.start_enabled, "start"),
            (self.stop_enabled, "stop"),
            (self.save_enabled, "save"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }
}
