use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::state::{Controls, RecorderState};
use super::stats::SessionStats;
use crate::capture::{CaptureSource, CaptureStream};
use crate::encoder::{Encoder, Segment};

/// Mutable state of the single recording session
///
/// Owns the capture stream and the encoder built from it. Segments are
/// appended in arrival order and cleared when a new recording starts or
/// after a successful save.
pub struct RecordingSession {
    /// Source picked from the choice menu
    selected_source: Option<CaptureSource>,

    /// Active capture stream (at most one)
    stream: Option<CaptureStream>,

    /// Encoder wrapping `stream`
    encoder: Option<Box<dyn Encoder>>,

    state: RecorderState,

    /// Stop signalled, completion not yet delivered
    finalizing: bool,

    /// Encoded segments of the current (or last unsaved) recording
    chunks: Vec<Segment>,

    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            selected_source: None,
            stream: None,
            encoder: None,
            state: RecorderState::Idle,
            finalizing: false,
            chunks: Vec::new(),
            started_at: None,
            stopped_at: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_finalizing(&self) -> bool {
        self.finalizing
    }

    pub fn selected_source(&self) -> Option<&CaptureSource> {
        self.selected_source.as_ref()
    }

    pub fn stream(&self) -> Option<&CaptureStream> {
        self.stream.as_ref()
    }

    pub(crate) fn encoder_mut(&mut self) -> Option<&mut Box<dyn Encoder>> {
        self.encoder.as_mut()
    }

    /// Take ownership of a freshly acquired stream and its encoder
    pub(crate) fn arm(&mut self, source: CaptureSource, stream: CaptureStream, encoder: Box<dyn Encoder>) {
        debug_assert!(self.stream.is_none(), "previous stream must be released first");
        self.selected_source = Some(source);
        self.stream = Some(stream);
        self.encoder = Some(encoder);
        self.state = RecorderState::Armed;
        self.finalizing = false;
    }

    /// Drop the encoder and release the stream; buffered chunks are kept
    pub(crate) fn release(&mut self) {
        self.encoder = None;
        if let Some(stream) = self.stream.take() {
            stream.release();
        }
        self.selected_source = None;
        self.state = RecorderState::Idle;
        self.finalizing = false;
    }

    pub(crate) fn begin_recording(&mut self, at: DateTime<Utc>) {
        self.chunks.clear();
        self.state = RecorderState::Recording;
        self.started_at = Some(at);
        self.stopped_at = None;
    }

    pub(crate) fn begin_finalizing(&mut self, at: DateTime<Utc>) {
        self.state = RecorderState::Stopped;
        self.finalizing = true;
        self.stopped_at = Some(at);
    }

    /// Stop completion delivered (also covers an encoder that ended on its own)
    pub(crate) fn finish_finalizing(&mut self, at: DateTime<Utc>) {
        if self.state == RecorderState::Recording {
            self.state = RecorderState::Stopped;
            self.stopped_at = Some(at);
        }
        self.finalizing = false;
    }

    /// Append a segment; arrival order is kept even if sequence numbers disagree
    pub(crate) fn push_chunk(&mut self, segment: Segment) {
        if let Some(last) = self.chunks.last() {
            if segment.sequence <= last.sequence {
                warn!(
                    "Segment {} arrived after segment {}; keeping arrival order",
                    segment.sequence, last.sequence
                );
            }
        }
        debug!("Segment {} ({} bytes)", segment.sequence, segment.data.len());
        self.chunks.push(segment);
    }

    pub(crate) fn clear_chunks(&mut self) {
        self.chunks.clear();
    }

    pub fn chunks(&self) -> &[Segment] {
        &self.chunks
    }

    pub fn has_chunks(&self) -> bool {
        !self.chunks.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.data.len()).sum()
    }

    /// Concatenate all segments in arrival order
    pub fn assemble(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.buffered_bytes());
        for chunk in &self.chunks {
            bytes.extend_from_slice(&chunk.data);
        }
        bytes
    }

    pub fn controls(&self) -> Controls {
        Controls::for_state(self.state, self.finalizing, self.has_chunks())
    }

    pub fn stats(&self, now: DateTime<Utc>) -> SessionStats {
        let duration = match (self.started_at, self.state) {
            (Some(start), RecorderState::Recording) => now.signed_duration_since(start),
            (Some(start), _) => self
                .stopped_at
                .map(|stop| stop.signed_duration_since(start))
                .unwrap_or_else(chrono::Duration::zero),
            (None, _) => chrono::Duration::zero(),
        };

        SessionStats {
            state: self.state,
            finalizing: self.finalizing,
            source: self.selected_source.as_ref().map(|s| s.name.clone()),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_count: self.chunk_count(),
            buffered_bytes: self.buffered_bytes(),
        }
    }
}
