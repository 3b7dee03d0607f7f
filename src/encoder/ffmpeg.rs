// ffmpeg VP9/WebM encoder streaming its container output over stdout

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::backend::{Encoder, EncoderConfig, EncoderEvent, EncoderFactory, Segment};
use crate::capture::{CaptureInput, CaptureStream, ResolutionBounds};
use crate::error::{RecorderError, RecorderResult};

/// Time ffmpeg gets to finalize after `q` before it is killed
const STOP_GRACE: Duration = Duration::from_secs(10);
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Scale filter keeping the output within `bounds`, aspect preserved, even dimensions
pub fn scale_filter(bounds: ResolutionBounds) -> String {
    format!(
        "scale=w='min(max(iw,{}),{})':h='min(max(ih,{}),{})':force_original_aspect_ratio=decrease,\
         scale=trunc(iw/2)*2:trunc(ih/2)*2",
        bounds.min_width, bounds.max_width, bounds.min_height, bounds.max_height
    )
}

pub struct FfmpegEncoderFactory {
    ffmpeg: PathBuf,
}

impl FfmpegEncoderFactory {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }
}

impl EncoderFactory for FfmpegEncoderFactory {
    fn create(&self, stream: &CaptureStream, config: &EncoderConfig) -> RecorderResult<Box<dyn Encoder>> {
        Ok(Box::new(FfmpegEncoder::new(
            self.ffmpeg.clone(),
            stream.input().clone(),
            stream.bounds(),
            config.clone(),
        )))
    }
}

pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
    input: CaptureInput,
    bounds: ResolutionBounds,
    config: EncoderConfig,
    stop_tx: Option<oneshot::Sender<()>>,
    recording: Arc<AtomicBool>,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg: PathBuf, input: CaptureInput, bounds: ResolutionBounds, config: EncoderConfig) -> Self {
        Self {
            ffmpeg,
            input,
            bounds,
            config,
            stop_tx: None,
            recording: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn command_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostats"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.extend(self.input.to_args());

        args.extend([
            "-an".to_string(),
            "-vf".to_string(),
            scale_filter(self.bounds),
            "-c:v".to_string(),
            self.config.codec.clone(),
            "-r".to_string(),
            self.config.framerate.to_string(),
        ]);

        if self.config.codec.starts_with("libvpx") {
            // Constant quality, tuned for live capture
            args.extend(
                ["-deadline", "realtime", "-cpu-used", "8", "-row-mt", "1", "-b:v", "0", "-crf", "32"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }

        args.extend([
            "-f".to_string(),
            self.config.container.clone(),
            "pipe:1".to_string(),
        ]);

        args
    }
}

#[async_trait::async_trait]
impl Encoder for FfmpegEncoder {
    async fn start(&mut self, flush_interval: Duration) -> RecorderResult<mpsc::Receiver<EncoderEvent>> {
        if self.recording.load(Ordering::SeqCst) {
            return Err(RecorderError::Encoder("already recording".to_string()));
        }
        if flush_interval.is_zero() {
            return Err(RecorderError::Encoder("flush interval must be non-zero".to_string()));
        }

        let args = self.command_args();
        debug!("Spawning {} {}", self.ffmpeg.display(), args.join(" "));

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecorderError::Encoder(format!("failed to spawn ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RecorderError::Encoder("ffmpeg stdout not captured".to_string()))?;
        let stdin = child.stdin.take();

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr));
        }

        let (events_tx, events_rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = oneshot::channel();

        self.stop_tx = Some(stop_tx);
        self.recording.store(true, Ordering::SeqCst);

        tokio::spawn(drive(
            child,
            stdin,
            stdout,
            stop_rx,
            events_tx,
            flush_interval,
            Arc::clone(&self.recording),
        ));

        info!(
            "ffmpeg encoder started ({} in {}, flush every {}ms)",
            self.config.codec,
            self.config.container,
            flush_interval.as_millis()
        );

        Ok(events_rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            info!("Stopping ffmpeg encoder");
            // Driver already gone means ffmpeg exited on its own
            let _ = stop_tx.send(());
        }
        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!("ffmpeg: {}", line);
    }
}

async fn request_quit(stdin: &mut Option<ChildStdin>) {
    if let Some(mut pipe) = stdin.take() {
        if let Err(e) = pipe.write_all(b"q").await {
            debug!("Failed to send quit to ffmpeg: {}", e);
        }
        // dropping the pipe closes ffmpeg's stdin
    }
}

async fn flush(
    pending: &mut Vec<u8>,
    sequence: &mut u64,
    started: Instant,
    events: &mpsc::Sender<EncoderEvent>,
) {
    if pending.is_empty() {
        return;
    }

    let segment = Segment {
        sequence: *sequence,
        data: std::mem::take(pending),
        timestamp_ms: started.elapsed().as_millis() as u64,
    };
    *sequence += 1;

    if events.send(EncoderEvent::Data(segment)).await.is_err() {
        debug!("Encoder event receiver dropped, discarding segment");
    }
}

/// Owns the ffmpeg child: reads output, flushes segments on each tick, finalizes on stop
async fn drive(
    mut child: Child,
    mut stdin: Option<ChildStdin>,
    mut stdout: ChildStdout,
    mut stop_rx: oneshot::Receiver<()>,
    events: mpsc::Sender<EncoderEvent>,
    flush_interval: Duration,
    recording: Arc<AtomicBool>,
) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval_at(started + flush_interval, flush_interval);
    let deadline = tokio::time::sleep(STOP_GRACE);
    tokio::pin!(deadline);

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut pending = Vec::new();
    let mut sequence = 0u64;
    let mut stopping = false;
    let mut killed = false;

    loop {
        tokio::select! {
            read = stdout.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(e) => {
                    error!("Failed to read ffmpeg output: {}", e);
                    let _ = events
                        .send(EncoderEvent::Error(format!("failed to read encoder output: {}", e)))
                        .await;
                    break;
                }
            },
            _ = ticker.tick() => {
                flush(&mut pending, &mut sequence, started, &events).await;
            }
            // Fires on stop() and when the encoder handle is dropped
            _ = &mut stop_rx, if !stopping => {
                stopping = true;
                request_quit(&mut stdin).await;
                deadline.as_mut().reset(Instant::now() + STOP_GRACE);
            }
            _ = &mut deadline, if stopping && !killed => {
                warn!("ffmpeg didn't exit within {}s, killing process", STOP_GRACE.as_secs());
                killed = true;
                if let Err(e) = child.start_kill() {
                    error!("Failed to kill ffmpeg: {}", e);
                }
            }
        }
    }

    flush(&mut pending, &mut sequence, started, &events).await;

    match child.wait().await {
        Ok(status) if status.success() || stopping => {
            info!("ffmpeg exited with {} after {} segments", status, sequence);
        }
        Ok(status) => {
            error!("ffmpeg exited unexpectedly with {}", status);
            let _ = events
                .send(EncoderEvent::Error(format!("encoder exited with {}", status)))
                .await;
        }
        Err(e) => error!("Error waiting for ffmpeg: {}", e),
    }

    recording.store(false, Ordering::SeqCst);
    let _ = events.send(EncoderEvent::Stopped).await;
}
