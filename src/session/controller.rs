use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::session::RecordingSession;
use super::state::{Controls, RecorderState};
use super::stats::SessionStats;
use crate::capture::{CaptureSource, CaptureStream, SourceEnumerator, StreamAcquirer};
use crate::encoder::{EncoderEvent, EncoderFactory, Segment};
use crate::error::{RecorderError, RecorderResult};
use crate::prompt::{ChoicePresenter, SavePrompt};
use crate::storage::FileWriter;

/// Platform capabilities the controller drives
pub struct Capabilities {
    pub enumerator: Box<dyn SourceEnumerator>,
    pub presenter: Box<dyn ChoicePresenter>,
    pub acquirer: Box<dyn StreamAcquirer>,
    pub encoders: Box<dyn EncoderFactory>,
    pub save_prompt: Box<dyn SavePrompt>,
    pub writer: Box<dyn FileWriter>,
}

/// Source of "now" for timestamps and default filenames
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Stream acquired; ready to record
    Armed(CaptureSource),
    /// Menu closed without a choice; nothing changed
    Dismissed,
    /// Enumeration returned nothing to choose from
    NoSources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Redundant start while recording; ignored
    AlreadyRecording,
    /// Previous recording is still being finalized; ignored
    Finalizing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// User dismissed the save prompt; the buffer is kept for another attempt
    Cancelled,
    /// Prompt or write failed; the buffer is kept for another attempt
    Failed(String),
    NothingToSave,
}

/// Drives one recording session through select / start / stop / save
///
/// Encoder output arrives on an ordered queue owned by the controller; the
/// owner pumps it with `next_event` + `handle_event` (or `finish`).
pub struct RecordingController {
    config: SessionConfig,
    caps: Capabilities,
    clock: Box<dyn Clock>,
    session: RecordingSession,
    events: Option<mpsc::Receiver<EncoderEvent>>,
}

impl RecordingController {
    pub fn new(config: SessionConfig, caps: Capabilities) -> Self {
        Self {
            config,
            caps,
            clock: Box::new(SystemClock),
            session: RecordingSession::new(),
            events: None,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn state(&self) -> RecorderState {
        self.session.state()
    }

    pub fn is_finalizing(&self) -> bool {
        self.session.is_finalizing()
    }

    pub fn controls(&self) -> Controls {
        self.session.controls()
    }

    pub fn selected_source(&self) -> Option<&CaptureSource> {
        self.session.selected_source()
    }

    pub fn active_stream(&self) -> Option<&CaptureStream> {
        self.session.stream()
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats(self.clock.now())
    }

    /// Enumerate sources, let the user pick one and arm the recorder with it
    pub async fn select_source(&mut self) -> RecorderResult<SelectOutcome> {
        self.ensure_not_recording("select a source")?;

        let sources = self.caps.enumerator.sources(&self.config.kinds).await?;
        if sources.is_empty() {
            warn!("No capture sources available");
            return Ok(SelectOutcome::NoSources);
        }

        let labels: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();
        let choice = self
            .caps
            .presenter
            .present("Select a capture source", &labels)
            .await?;

        match choice.and_then(|index| sources.into_iter().nth(index)) {
            Some(source) => self.arm(source).await,
            None => {
                info!("Source menu dismissed");
                Ok(SelectOutcome::Dismissed)
            }
        }
    }

    /// Release any held stream, then acquire one for `source`
    async fn arm(&mut self, source: CaptureSource) -> RecorderResult<SelectOutcome> {
        if self.session.stream().is_some() {
            debug!("Releasing previous capture stream before acquiring {}", source.name);
        }
        self.events = None;
        self.session.release();

        info!("Selected source: {}", source.name);

        let stream = self
            .caps
            .acquirer
            .acquire(&source, self.config.bounds)
            .await?;

        let encoder = match self.caps.encoders.create(&stream, &self.config.encoder) {
            Ok(encoder) => encoder,
            Err(e) => {
                stream.release();
                return Err(e);
            }
        };

        info!(
            "Capture stream {} ready ({} via {})",
            stream.id(),
            source.name,
            self.caps.acquirer.name()
        );
        self.session.arm(source.clone(), stream, encoder);

        Ok(SelectOutcome::Armed(source))
    }

    /// Begin recording on the armed stream
    pub async fn start(&mut self) -> RecorderResult<StartOutcome> {
        match self.session.state() {
            RecorderState::Recording => {
                warn!("Recording already started");
                return Ok(StartOutcome::AlreadyRecording);
            }
            _ if self.session.is_finalizing() => {
                warn!("Previous recording is still finalizing");
                return Ok(StartOutcome::Finalizing);
            }
            RecorderState::Idle => return Err(RecorderError::NoActiveRecorder),
            RecorderState::Armed | RecorderState::Stopped => {}
        }

        let flush_interval = self.config.flush_interval;
        let encoder = self
            .session
            .encoder_mut()
            .ok_or(RecorderError::NoActiveRecorder)?;

        let events = encoder.start(flush_interval).await?;

        self.events = Some(events);
        self.session.begin_recording(self.clock.now());

        info!("Recording started");
        Ok(StartOutcome::Started)
    }

    /// Append a flushed segment (arrival order)
    pub fn on_data_available(&mut self, segment: Segment) {
        if self.session.state() != RecorderState::Recording && !self.session.is_finalizing() {
            warn!(
                "Dropping segment {} received while {}",
                segment.sequence,
                self.session.state()
            );
            return;
        }
        self.session.push_chunk(segment);
    }

    /// Ask the encoder to finalize; a no-op unless recording
    ///
    /// Returns whether a stop was actually signalled.
    pub async fn stop(&mut self) -> RecorderResult<bool> {
        if self.session.state() != RecorderState::Recording {
            debug!("stop() ignored while {}", self.session.state());
            return Ok(false);
        }

        let Some(encoder) = self.session.encoder_mut() else {
            debug!("stop() ignored: no active recorder");
            return Ok(false);
        };

        encoder.stop().await?;
        self.session.begin_finalizing(self.clock.now());

        info!("Recording stopped");
        Ok(true)
    }

    /// Stop completion: assemble the buffer and offer to save it
    ///
    /// Ignored (`None`) unless a stop is finalizing or the encoder has ended on
    /// its own while recording.
    pub async fn on_stopped(&mut self) -> Option<SaveOutcome> {
        if !self.stop_completed() {
            debug!("Ignoring stop completion while {}", self.session.state());
            return None;
        }
        self.session.finish_finalizing(self.clock.now());
        self.events = None;

        Some(self.save_buffered().await)
    }

    fn stop_completed(&mut self) -> bool {
        if self.session.is_finalizing() {
            return true;
        }
        self.session.state() == RecorderState::Recording
            && !self
                .session
                .encoder_mut()
                .map_or(false, |encoder| encoder.is_recording())
    }

    /// Retry saving the retained buffer (after a cancelled or failed save)
    pub async fn save(&mut self) -> RecorderResult<SaveOutcome> {
        self.ensure_not_recording("save")?;
        Ok(self.save_buffered().await)
    }

    async fn save_buffered(&mut self) -> SaveOutcome {
        if !self.session.has_chunks() {
            info!("Nothing recorded, skipping save");
            return SaveOutcome::NothingToSave;
        }

        let bytes = self.session.assemble();
        let filename = self.config.default_filename(self.clock.now());

        let path = match self.caps.save_prompt.show(&filename).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                info!("User cancelled save dialog");
                return SaveOutcome::Cancelled;
            }
            Err(e) => {
                error!("Save prompt failed: {}", e);
                return SaveOutcome::Failed(e.to_string());
            }
        };

        match self.caps.writer.write(&path, &bytes).await {
            Ok(()) => {
                info!(
                    "Video saved successfully to: {} ({} bytes)",
                    path.display(),
                    bytes.len()
                );
                self.session.clear_chunks();
                SaveOutcome::Saved(path)
            }
            Err(e) => {
                error!("Failed to save video: {}", e);
                SaveOutcome::Failed(e.to_string())
            }
        }
    }

    /// Receive the next encoder event
    ///
    /// Pending forever when no encoder is running, so it can sit in a `select!`.
    pub async fn next_event(&mut self) -> EncoderEvent {
        match self.recv_event().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn recv_event(&mut self) -> Option<EncoderEvent> {
        let received = self.events.as_mut()?.recv().await;
        match received {
            Some(event) => Some(event),
            None => {
                self.events = None;
                if self.session.state() == RecorderState::Recording || self.session.is_finalizing() {
                    warn!("Encoder event queue closed without completion");
                    if !self.session.is_finalizing() {
                        self.session.begin_finalizing(self.clock.now());
                    }
                    Some(EncoderEvent::Stopped)
                } else {
                    None
                }
            }
        }
    }

    /// Apply an encoder event; returns the save outcome on stop completion
    pub async fn handle_event(&mut self, event: EncoderEvent) -> Option<SaveOutcome> {
        match event {
            EncoderEvent::Data(segment) => {
                self.on_data_available(segment);
                None
            }
            EncoderEvent::Error(message) => {
                error!("Encoder error: {}", message);
                None
            }
            EncoderEvent::Stopped => self.on_stopped().await,
        }
    }

    /// Pump encoder events until the stop completion has been handled
    pub async fn finish(&mut self) -> Option<SaveOutcome> {
        while let Some(event) = self.recv_event().await {
            if let Some(outcome) = self.handle_event(event).await {
                return Some(outcome);
            }
        }
        None
    }

    /// App-exit teardown: stop a running encoder and release the stream
    ///
    /// Returns the number of segments that were never saved.
    pub async fn shutdown(&mut self) -> usize {
        let unsaved = self.session.chunk_count();
        if unsaved > 0 {
            warn!(
                "Discarding {} unsaved segments ({} bytes)",
                unsaved,
                self.session.buffered_bytes()
            );
        }

        if self.session.state() == RecorderState::Recording {
            if let Some(encoder) = self.session.encoder_mut() {
                if let Err(e) = encoder.stop().await {
                    error!("Failed to stop encoder: {}", e);
                }
            }
        }
        self.events = None;
        self.session.release();
        info!("Recording controller shut down");
        unsaved
    }

    fn ensure_not_recording(&self, action: &'static str) -> RecorderResult<()> {
        if self.session.is_finalizing() {
            return Err(RecorderError::InvalidTransition {
                action,
                state: "finalizing",
            });
        }
        if self.session.state() == RecorderState::Recording {
            return Err(RecorderError::InvalidTransition {
                action,
                state: RecorderState::Recording.as_str(),
            });
        }
        Ok(())
    }
}
