// Integration tests for the recording session controller
//
// Every platform capability is replaced by an in-memory double so the
// select / start / stop / save transitions can be driven deterministically.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use desk_recorder::capture::StreamActivity;
use desk_recorder::{
    Capabilities, CaptureInput, CaptureSource, CaptureStream, ChoicePresenter, Clock, Encoder,
    EncoderConfig, EncoderEvent, EncoderFactory, FileWriter, RecorderError, RecorderResult,
    RecorderState, RecordingController, ResolutionBounds, SaveOutcome, SavePrompt, Segment,
    SelectOutcome, SessionConfig, SourceEnumerator, SourceKind, StartOutcome, StreamAcquirer,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Test doubles
// ============================================================================

struct StaticEnumerator {
    sources: Vec<CaptureSource>,
    deny: bool,
}

#[async_trait::async_trait]
impl SourceEnumerator for StaticEnumerator {
    async fn sources(&self, kinds: &[SourceKind]) -> RecorderResult<Vec<CaptureSource>> {
        if self.deny {
            return Err(RecorderError::CapabilityDenied("screen recording not permitted".to_string()));
        }
        Ok(self
            .sources
            .iter()
            .filter(|s| kinds.contains(&s.kind))
            .cloned()
            .collect())
    }
}

/// Picks menu entries by label; `None` dismisses the menu
#[derive(Clone, Default)]
struct ScriptedPresenter {
    picks: Arc<Mutex<VecDeque<Option<String>>>>,
    shown: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedPresenter {
    fn pick(&self, label: &str) {
        self.picks.lock().unwrap().push_back(Some(label.to_string()));
    }

    fn dismiss(&self) {
        self.picks.lock().unwrap().push_back(None);
    }
}

#[async_trait::async_trait]
impl ChoicePresenter for ScriptedPresenter {
    async fn present(&self, _title: &str, labels: &[String]) -> RecorderResult<Option<usize>> {
        self.shown.lock().unwrap().push(labels.to_vec());
        let pick = self.picks.lock().unwrap().pop_front().flatten();
        Ok(pick.and_then(|label| labels.iter().position(|l| *l == label)))
    }
}

/// Hands out streams and records how many were live at each acquisition
#[derive(Clone, Default)]
struct TrackingAcquirer {
    activities: Arc<Mutex<Vec<StreamActivity>>>,
    live_at_acquire: Arc<Mutex<Vec<usize>>>,
    busy: Arc<Mutex<Vec<String>>>,
}

impl TrackingAcquirer {
    fn live_streams(&self) -> usize {
        self.activities.lock().unwrap().iter().filter(|a| a.is_active()).count()
    }

    fn mark_busy(&self, name: &str) {
        self.busy.lock().unwrap().push(name.to_string());
    }
}

#[async_trait::async_trait]
impl StreamAcquirer for TrackingAcquirer {
    async fn acquire(&self, source: &CaptureSource, bounds: ResolutionBounds) -> RecorderResult<CaptureStream> {
        if self.busy.lock().unwrap().contains(&source.name) {
            return Err(RecorderError::CapabilityDenied(format!("{} is busy", source.name)));
        }

        let live = self.live_streams();
        self.live_at_acquire.lock().unwrap().push(live);

        let stream = CaptureStream::new(source.clone(), CaptureInput::new("test", &source.id), bounds);
        self.activities.lock().unwrap().push(stream.activity());
        Ok(stream)
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// Lets the test push encoder events by hand
#[derive(Clone, Default)]
struct EncoderHandle {
    tx: Arc<Mutex<Option<mpsc::Sender<EncoderEvent>>>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    next_sequence: Arc<AtomicUsize>,
    recording: Arc<AtomicBool>,
}

impl EncoderHandle {
    fn sender(&self) -> mpsc::Sender<EncoderEvent> {
        self.tx.lock().unwrap().clone().expect("encoder not started")
    }

    async fn emit(&self, data: &[u8]) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) as u64;
        let segment = Segment {
            sequence,
            data: data.to_vec(),
            timestamp_ms: (sequence + 1) * 1000,
        };
        self.sender().send(EncoderEvent::Data(segment)).await.unwrap();
    }

    /// Simulate the encoder dying without a stop completion
    fn close(&self) {
        self.tx.lock().unwrap().take();
    }

    /// Simulate the encoder ending by itself (e.g. the capture device vanished)
    async fn exit(&self) {
        self.recording.store(false, Ordering::SeqCst);
        let tx = self.tx.lock().unwrap().take();
        if let Some(tx) = tx {
            tx.send(EncoderEvent::Stopped).await.unwrap();
        }
    }
}

struct ManualEncoder {
    handle: EncoderHandle,
}

#[async_trait::async_trait]
impl Encoder for ManualEncoder {
    async fn start(&mut self, flush_interval: Duration) -> RecorderResult<mpsc::Receiver<EncoderEvent>> {
        assert_eq!(flush_interval, Duration::from_millis(1000));
        let (tx, rx) = mpsc::channel(64);
        *self.handle.tx.lock().unwrap() = Some(tx);
        self.handle.starts.fetch_add(1, Ordering::SeqCst);
        self.handle.next_sequence.store(0, Ordering::SeqCst);
        self.handle.recording.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        self.handle.stops.fetch_add(1, Ordering::SeqCst);
        self.handle.recording.store(false, Ordering::SeqCst);
        let tx = self.handle.tx.lock().unwrap().take();
        if let Some(tx) = tx {
            tx.send(EncoderEvent::Stopped).await.unwrap();
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.handle.recording.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "manual"
    }
}

struct ManualEncoderFactory {
    handle: EncoderHandle,
}

impl EncoderFactory for ManualEncoderFactory {
    fn create(&self, _stream: &CaptureStream, config: &EncoderConfig) -> RecorderResult<Box<dyn Encoder>> {
        assert_eq!(config.extension, "webm");
        Ok(Box::new(ManualEncoder {
            handle: self.handle.clone(),
        }))
    }
}

/// Answers save prompts from a script; records the default filenames offered
#[derive(Clone, Default)]
struct ScriptedSavePrompt {
    answers: Arc<Mutex<VecDeque<Option<PathBuf>>>>,
    offered: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSavePrompt {
    fn answer(&self, path: Option<&str>) {
        self.answers.lock().unwrap().push_back(path.map(PathBuf::from));
    }
}

#[async_trait::async_trait]
impl SavePrompt for ScriptedSavePrompt {
    async fn show(&self, default_filename: &str) -> RecorderResult<Option<PathBuf>> {
        self.offered.lock().unwrap().push(default_filename.to_string());
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Some(PathBuf::from(default_filename))))
    }
}

#[derive(Clone, Default)]
struct MemoryWriter {
    writes: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
    fail: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl FileWriter for MemoryWriter {
    async fn write(&self, path: &Path, bytes: &[u8]) -> RecorderResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RecorderError::WriteFailure {
                path: path.display().to_string(),
                message: "disk full".to_string(),
            });
        }
        self.writes.lock().unwrap().push((path.to_path_buf(), bytes.to_vec()));
        Ok(())
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct Harness {
    controller: RecordingController,
    presenter: ScriptedPresenter,
    acquirer: TrackingAcquirer,
    encoder: EncoderHandle,
    save_prompt: ScriptedSavePrompt,
    writer: MemoryWriter,
}

fn sources() -> Vec<CaptureSource> {
    vec![
        CaptureSource::new("window:1", "Terminal", SourceKind::Window),
        CaptureSource::new("screen:0", "Screen 1", SourceKind::Screen),
        CaptureSource::new("screen:1", "Screen 2", SourceKind::Screen),
    ]
}

fn harness_with(deny_enumeration: bool) -> Harness {
    let presenter = ScriptedPresenter::default();
    let acquirer = TrackingAcquirer::default();
    let encoder = EncoderHandle::default();
    let save_prompt = ScriptedSavePrompt::default();
    let writer = MemoryWriter::default();

    let caps = Capabilities {
        enumerator: Box::new(StaticEnumerator {
            sources: sources(),
            deny: deny_enumeration,
        }),
        presenter: Box::new(presenter.clone()),
        acquirer: Box::new(acquirer.clone()),
        encoders: Box::new(ManualEncoderFactory {
            handle: encoder.clone(),
        }),
        save_prompt: Box::new(save_prompt.clone()),
        writer: Box::new(writer.clone()),
    };

    let clock = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let controller = RecordingController::new(SessionConfig::default(), caps)
        .with_clock(Box::new(FixedClock(clock)));

    Harness {
        controller,
        presenter,
        acquirer,
        encoder,
        save_prompt,
        writer,
    }
}

fn harness() -> Harness {
    harness_with(false)
}

impl Harness {
    async fn select(&mut self, label: &str) -> RecorderResult<SelectOutcome> {
        self.presenter.pick(label);
        self.controller.select_source().await
    }

    /// Apply `count` pending encoder events
    async fn pump(&mut self, count: usize) {
        for _ in 0..count {
            let event = self.controller.next_event().await;
            assert!(self.controller.handle_event(event).await.is_none());
        }
    }

    async fn record(&mut self, segments: &[&[u8]]) -> Result<()> {
        assert_eq!(self.controller.start().await?, StartOutcome::Started);
        for segment in segments {
            self.encoder.emit(segment).await;
        }
        self.pump(segments.len()).await;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_record_and_save_scenario() -> Result<()> {
    let mut h = harness();

    let outcome = h.select("Screen 1").await?;
    assert_eq!(
        outcome,
        SelectOutcome::Armed(CaptureSource::new("screen:0", "Screen 1", SourceKind::Screen))
    );
    assert_eq!(h.controller.state(), RecorderState::Armed);
    assert!(h.controller.controls().start_enabled);

    // Both kinds were offered, in enumeration order
    assert_eq!(
        h.presenter.shown.lock().unwrap()[0],
        vec!["Terminal".to_string(), "Screen 1".to_string(), "Screen 2".to_string()]
    );

    h.record(&[b"C1-cluster", b"C2", b"C3-tail"]).await?;
    assert_eq!(h.controller.state(), RecorderState::Recording);
    assert_eq!(h.controller.session().chunk_count(), 3);

    let controls = h.controller.controls();
    assert!(!controls.select_enabled && !controls.start_enabled && controls.stop_enabled);

    assert!(h.controller.stop().await?);
    let outcome = h.controller.finish().await;

    assert_eq!(outcome, Some(SaveOutcome::Saved(PathBuf::from("vid-1700000000000.webm"))));
    assert_eq!(*h.save_prompt.offered.lock().unwrap(), vec!["vid-1700000000000.webm"]);

    let writes = h.writer.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, PathBuf::from("vid-1700000000000.webm"));
    assert_eq!(writes[0].1, b"C1-clusterC2C3-tail".to_vec());

    assert_eq!(h.controller.state(), RecorderState::Stopped);
    assert!(!h.controller.session().has_chunks(), "buffer is cleared after a successful save");

    Ok(())
}

#[tokio::test]
async fn test_stop_before_start_is_silent_noop() -> Result<()> {
    let mut h = harness();

    assert!(!h.controller.stop().await?);
    assert_eq!(h.controller.state(), RecorderState::Idle);

    h.select("Screen 1").await?;
    assert!(!h.controller.stop().await?);
    assert_eq!(h.controller.state(), RecorderState::Armed);
    assert_eq!(h.encoder.stops.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn test_reselecting_source_releases_previous_stream() -> Result<()> {
    let mut h = harness();

    h.select("Screen 1").await?;
    let first = h.controller.active_stream().unwrap().id();

    h.select("Screen 2").await?;
    let second = h.controller.active_stream().unwrap();

    assert_ne!(first, second.id());
    assert_eq!(second.source().name, "Screen 2");
    assert_eq!(h.acquirer.live_streams(), 1, "only the second stream is held");
    assert_eq!(
        *h.acquirer.live_at_acquire.lock().unwrap(),
        vec![0, 0],
        "the first stream is released before the second is acquired"
    );

    Ok(())
}

#[tokio::test]
async fn test_redundant_start_is_ignored() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;

    assert_eq!(h.controller.start().await?, StartOutcome::Started);
    h.encoder.emit(b"one").await;
    h.pump(1).await;

    assert_eq!(h.controller.start().await?, StartOutcome::AlreadyRecording);
    assert_eq!(h.controller.start().await?, StartOutcome::AlreadyRecording);

    h.encoder.emit(b"two").await;
    h.pump(1).await;

    assert_eq!(h.encoder.starts.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.session().assemble(), b"onetwo".to_vec());

    Ok(())
}

#[tokio::test]
async fn test_output_is_concatenation_in_production_order() -> Result<()> {
    let mut h = harness();
    h.select("Terminal").await?;

    let sizes = [3usize, 1024, 1, 0, 4096, 17];
    let segments: Vec<Vec<u8>> = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| vec![i as u8; size])
        .collect();
    let refs: Vec<&[u8]> = segments.iter().map(|s| s.as_slice()).collect();

    h.record(&refs).await?;
    h.controller.stop().await?;
    h.controller.finish().await;

    let writes = h.writer.writes.lock().unwrap();
    let written = &writes[0].1;
    assert_eq!(written.len(), sizes.iter().sum::<usize>());
    assert_eq!(*written, segments.concat());

    Ok(())
}

#[tokio::test]
async fn test_cancelled_save_keeps_buffer_for_retry() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"abc", b"def"]).await?;

    h.save_prompt.answer(None);
    h.controller.stop().await?;
    assert_eq!(h.controller.finish().await, Some(SaveOutcome::Cancelled));

    assert_eq!(h.controller.state(), RecorderState::Stopped);
    assert_eq!(h.controller.session().chunk_count(), 2);
    assert!(h.writer.writes.lock().unwrap().is_empty());
    assert!(h.controller.controls().save_enabled);

    h.save_prompt.answer(Some("/videos/retry.webm"));
    let outcome = h.controller.save().await?;

    assert_eq!(outcome, SaveOutcome::Saved(PathBuf::from("/videos/retry.webm")));
    assert_eq!(h.writer.writes.lock().unwrap()[0].1, b"abcdef".to_vec());
    assert_eq!(h.controller.save().await?, SaveOutcome::NothingToSave);

    Ok(())
}

#[tokio::test]
async fn test_write_failure_keeps_buffer_for_retry() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"frame"]).await?;

    h.writer.fail.store(true, Ordering::SeqCst);
    h.controller.stop().await?;

    match h.controller.finish().await {
        Some(SaveOutcome::Failed(message)) => assert!(message.contains("disk full")),
        other => panic!("expected a failed save, got {:?}", other),
    }
    assert_eq!(h.controller.session().chunk_count(), 1);

    h.writer.fail.store(false, Ordering::SeqCst);
    assert!(matches!(h.controller.save().await?, SaveOutcome::Saved(_)));

    Ok(())
}

#[tokio::test]
async fn test_acquisition_failure_leaves_recorder_idle() -> Result<()> {
    let mut h = harness();
    h.acquirer.mark_busy("Screen 2");

    let result = h.select("Screen 2").await;

    assert!(matches!(result, Err(RecorderError::CapabilityDenied(_))));
    assert_eq!(h.controller.state(), RecorderState::Idle);
    assert!(h.controller.active_stream().is_none());
    assert!(!h.controller.controls().start_enabled);
    assert!(matches!(h.controller.start().await, Err(RecorderError::NoActiveRecorder)));

    Ok(())
}

#[tokio::test]
async fn test_failed_reselection_releases_previous_stream() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.acquirer.mark_busy("Screen 2");

    assert!(h.select("Screen 2").await.is_err());

    assert_eq!(h.controller.state(), RecorderState::Idle);
    assert_eq!(h.acquirer.live_streams(), 0);

    Ok(())
}

#[tokio::test]
async fn test_enumeration_denied_is_reported() -> Result<()> {
    let mut h = harness_with(true);

    let result = h.controller.select_source().await;

    assert!(matches!(result, Err(RecorderError::CapabilityDenied(_))));
    assert_eq!(h.controller.state(), RecorderState::Idle);

    Ok(())
}

#[tokio::test]
async fn test_start_without_source_reports_no_recorder() {
    let mut h = harness();

    let result = h.controller.start().await;

    assert!(matches!(result, Err(RecorderError::NoActiveRecorder)));
    assert_eq!(h.controller.state(), RecorderState::Idle);
    assert_eq!(h.encoder.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dismissed_menu_keeps_current_stream() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    let stream_id = h.controller.active_stream().unwrap().id();

    h.presenter.dismiss();
    let outcome = h.controller.select_source().await?;

    assert_eq!(outcome, SelectOutcome::Dismissed);
    assert_eq!(h.controller.state(), RecorderState::Armed);
    assert_eq!(h.controller.active_stream().unwrap().id(), stream_id);
    assert_eq!(h.controller.selected_source().unwrap().name, "Screen 1");

    Ok(())
}

#[tokio::test]
async fn test_select_rejected_while_recording() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"x"]).await?;

    let result = h.select("Screen 2").await;

    assert!(matches!(result, Err(RecorderError::InvalidTransition { .. })));
    assert_eq!(h.controller.state(), RecorderState::Recording);
    assert_eq!(h.controller.selected_source().unwrap().name, "Screen 1");
    assert!(matches!(h.controller.save().await, Err(RecorderError::InvalidTransition { .. })));

    Ok(())
}

#[tokio::test]
async fn test_rearm_reuses_stream_and_clears_previous_chunks() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    let stream_id = h.controller.active_stream().unwrap().id();

    h.record(&[b"first-take"]).await?;
    h.save_prompt.answer(None);
    h.controller.stop().await?;
    h.controller.finish().await;

    h.record(&[b"second"]).await?;
    assert_eq!(h.controller.active_stream().unwrap().id(), stream_id);
    assert_eq!(h.controller.session().assemble(), b"second".to_vec());

    h.controller.stop().await?;
    h.controller.finish().await;

    let writes = h.writer.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].1, b"second".to_vec());
    assert_eq!(h.encoder.starts.load(Ordering::SeqCst), 2);

    Ok(())
}

#[tokio::test]
async fn test_encoder_exit_without_completion_still_offers_save() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"partial"]).await?;

    h.encoder.close();
    let outcome = h.controller.finish().await;

    assert!(matches!(outcome, Some(SaveOutcome::Saved(_))));
    assert_eq!(h.controller.state(), RecorderState::Stopped);
    assert_eq!(h.writer.writes.lock().unwrap()[0].1, b"partial".to_vec());

    Ok(())
}

#[tokio::test]
async fn test_stop_completion_ignored_while_encoder_running() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"keep", b"going"]).await?;

    assert_eq!(h.controller.on_stopped().await, None);

    assert_eq!(h.controller.state(), RecorderState::Recording);
    assert!(h.controller.controls().stop_enabled);
    assert!(!h.controller.controls().start_enabled);
    assert!(h.save_prompt.offered.lock().unwrap().is_empty());

    // The event queue is still live: more data and a real stop go through
    h.encoder.emit(b"-tail").await;
    h.pump(1).await;
    assert!(h.controller.stop().await?);
    assert!(matches!(h.controller.finish().await, Some(SaveOutcome::Saved(_))));
    assert_eq!(h.writer.writes.lock().unwrap()[0].1, b"keepgoing-tail".to_vec());

    Ok(())
}

#[tokio::test]
async fn test_stop_completion_ignored_when_idle_or_armed() -> Result<()> {
    let mut h = harness();
    assert_eq!(h.controller.on_stopped().await, None);

    h.select("Screen 1").await?;
    assert_eq!(h.controller.on_stopped().await, None);
    assert_eq!(h.controller.state(), RecorderState::Armed);

    Ok(())
}

#[tokio::test]
async fn test_encoder_ending_on_its_own_offers_save() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"until-unplugged"]).await?;

    h.encoder.exit().await;
    let outcome = h.controller.finish().await;

    assert!(matches!(outcome, Some(SaveOutcome::Saved(_))));
    assert_eq!(h.controller.state(), RecorderState::Stopped);
    assert!(!h.controller.is_finalizing());
    assert_eq!(h.encoder.stops.load(Ordering::SeqCst), 0);

    // Re-arm works after the encoder exited
    assert_eq!(h.controller.start().await?, StartOutcome::Started);

    Ok(())
}

#[tokio::test]
async fn test_segments_outside_recording_are_dropped() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;

    h.controller.on_data_available(Segment {
        sequence: 0,
        data: b"stray".to_vec(),
        timestamp_ms: 0,
    });

    assert!(!h.controller.session().has_chunks());
    Ok(())
}

#[tokio::test]
async fn test_stats_snapshot() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"1234", b"56"]).await?;

    let stats = h.controller.stats();
    assert_eq!(stats.state, RecorderState::Recording);
    assert_eq!(stats.source.as_deref(), Some("Screen 1"));
    assert_eq!(stats.chunks_count, 2);
    assert_eq!(stats.buffered_bytes, 6);

    let json = serde_json::to_value(&stats)?;
    assert_eq!(json["state"], "recording");

    Ok(())
}

#[tokio::test]
async fn test_shutdown_stops_encoder_and_releases_stream() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"x"]).await?;

    let unsaved = h.controller.shutdown().await;

    assert_eq!(unsaved, 1, "segments recorded but never saved are reported");
    assert_eq!(h.encoder.stops.load(Ordering::SeqCst), 1);
    assert_eq!(h.acquirer.live_streams(), 0);
    assert_eq!(h.controller.state(), RecorderState::Idle);
    assert!(h.controller.active_stream().is_none());

    Ok(())
}

#[tokio::test]
async fn test_shutdown_after_save_reports_nothing_unsaved() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"saved"]).await?;
    h.controller.stop().await?;
    h.controller.finish().await;

    assert_eq!(h.controller.shutdown().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_shutdown_reports_buffer_kept_after_cancelled_save() -> Result<()> {
    let mut h = harness();
    h.select("Screen 1").await?;
    h.record(&[b"a", b"b", b"c"]).await?;
    h.save_prompt.answer(None);
    h.controller.stop().await?;
    h.controller.finish().await;

    assert_eq!(h.controller.shutdown().await, 3);
    assert_eq!(h.controller.state(), RecorderState::Idle);

    Ok(())
}
