// ffmpeg-backed capture sources and stream acquisition
//
// Source ids are self-describing so the acquirer needs no enumeration state:
//   x11:screen:full | x11:screen:<w>x<h>+<x>+<y> | x11:window:<0xid>
//   avfoundation:screen:<device index>
//   gdigrab:desktop | gdigrab:title=<window title>

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::backend::{CaptureSource, ResolutionBounds, SourceEnumerator, SourceKind, StreamAcquirer};
use super::stream::{CaptureInput, CaptureStream};
use crate::error::{RecorderError, RecorderResult};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Find ffmpeg: explicit path first, then PATH, then common install locations
pub fn find_ffmpeg(configured: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = configured {
        let path = PathBuf::from(shellexpand::tilde(path).as_ref());
        if path.exists() {
            return Some(path);
        }
        warn!("Configured ffmpeg not found at {}", path.display());
    }
    if let Ok(p) = which::which("ffmpeg") {
        return Some(p);
    }
    let candidates = [
        "/opt/homebrew/bin/ffmpeg",
        "/usr/local/bin/ffmpeg",
        "/opt/local/bin/ffmpeg",
        "/usr/bin/ffmpeg",
        "C:\\ffmpeg\\bin\\ffmpeg.exe",
    ];
    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}

fn default_display(display: Option<String>) -> String {
    display
        .or_else(|| std::env::var("DISPLAY").ok())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| ":0".to_string())
}

/// Run a helper tool, returning stdout on success
#[cfg_attr(target_os = "macos", allow(dead_code))]
async fn run_tool(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).stdin(Stdio::null()).output().await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!("{} exited with {}", program, output.status);
            None
        }
        Err(e) => {
            debug!("{} unavailable: {}", program, e);
            None
        }
    }
}

/// Enumerates screens and windows the local ffmpeg can grab
pub struct FfmpegSourceEnumerator {
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    ffmpeg: PathBuf,
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    display: String,
}

impl FfmpegSourceEnumerator {
    pub fn new(ffmpeg: PathBuf, display: Option<String>) -> Self {
        Self {
            ffmpeg,
            display: default_display(display),
        }
    }

    #[cfg(target_os = "linux")]
    async fn platform_sources(&self, kinds: &[SourceKind]) -> RecorderResult<Vec<CaptureSource>> {
        debug!("Enumerating X11 sources on display {}", self.display);
        let mut sources = Vec::new();

        if kinds.contains(&SourceKind::Window) {
            if let Some(listing) = run_tool("wmctrl", &["-lG"]).await {
                sources.extend(parse_wmctrl_windows(&listing).into_iter().map(|w| {
                    CaptureSource::new(format!("x11:window:{}", w.id), w.title, SourceKind::Window)
                }));
            } else {
                debug!("wmctrl not available, skipping window enumeration");
            }
        }

        if kinds.contains(&SourceKind::Screen) {
            let monitors = match run_tool("xrandr", &["--listmonitors"]).await {
                Some(listing) => parse_xrandr_monitors(&listing),
                None => Vec::new(),
            };

            if monitors.is_empty() {
                sources.push(CaptureSource::new("x11:screen:full", "Screen 1", SourceKind::Screen));
            } else {
                sources.extend(monitors.into_iter().enumerate().map(|(i, m)| {
                    CaptureSource::new(
                        format!("x11:screen:{}x{}+{}+{}", m.width, m.height, m.x, m.y),
                        format!("Screen {}", i + 1),
                        SourceKind::Screen,
                    )
                }));
            }
        }

        Ok(sources)
    }

    #[cfg(target_os = "macos")]
    async fn platform_sources(&self, kinds: &[SourceKind]) -> RecorderResult<Vec<CaptureSource>> {
        if kinds.contains(&SourceKind::Window) {
            debug!("avfoundation cannot grab individual windows, listing screens only");
        }
        if !kinds.contains(&SourceKind::Screen) {
            return Ok(Vec::new());
        }

        // ffmpeg exits non-zero after listing devices; the listing is on stderr
        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-f", "avfoundation", "-list_devices", "true", "-i", ""])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RecorderError::CapabilityDenied(format!("failed to run ffmpeg: {}", e)))?;

        let listing = String::from_utf8_lossy(&output.stderr);
        Ok(parse_avfoundation_screens(&listing)
            .into_iter()
            .map(|(device, screen)| {
                CaptureSource::new(
                    format!("avfoundation:screen:{}", device),
                    format!("Screen {}", screen + 1),
                    SourceKind::Screen,
                )
            })
            .collect())
    }

    #[cfg(target_os = "windows")]
    async fn platform_sources(&self, kinds: &[SourceKind]) -> RecorderResult<Vec<CaptureSource>> {
        let mut sources = Vec::new();

        if kinds.contains(&SourceKind::Window) {
            if let Some(listing) = run_tool("tasklist", &["/v", "/fo", "csv", "/nh"]).await {
                sources.extend(parse_tasklist_titles(&listing).into_iter().map(|title| {
                    CaptureSource::new(format!("gdigrab:title={}", title), title, SourceKind::Window)
                }));
            }
        }

        if kinds.contains(&SourceKind::Screen) {
            sources.push(CaptureSource::new("gdigrab:desktop", "Screen 1", SourceKind::Screen));
        }

        Ok(sources)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    async fn platform_sources(&self, _kinds: &[SourceKind]) -> RecorderResult<Vec<CaptureSource>> {
        Err(RecorderError::CapabilityDenied(
            "screen capture is not supported on this platform".to_string(),
        ))
    }
}

#[async_trait::async_trait]
impl SourceEnumerator for FfmpegSourceEnumerator {
    async fn sources(&self, kinds: &[SourceKind]) -> RecorderResult<Vec<CaptureSource>> {
        let sources = self.platform_sources(kinds).await?;
        info!("Found {} capture sources", sources.len());
        Ok(sources)
    }
}

/// Acquires capture streams by probing the grab device with a single frame
pub struct FfmpegStreamAcquirer {
    ffmpeg: PathBuf,
    display: String,
    framerate: u32,
}

impl FfmpegStreamAcquirer {
    pub fn new(ffmpeg: PathBuf, display: Option<String>, framerate: u32) -> Self {
        Self {
            ffmpeg,
            display: default_display(display),
            framerate,
        }
    }

    async fn probe(&self, input: &CaptureInput) -> RecorderResult<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error"])
            .args(input.to_args())
            .args(["-frames:v", "1", "-an", "-f", "null", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Probing capture input: {:?}", cmd);

        let output = tokio::time::timeout(PROBE_TIMEOUT, cmd.output())
            .await
            .map_err(|_| {
                RecorderError::CapabilityDenied(format!(
                    "timed out after {}s waiting for {}",
                    PROBE_TIMEOUT.as_secs(),
                    input.target
                ))
            })?
            .map_err(|e| RecorderError::CapabilityDenied(format!("failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecorderError::CapabilityDenied(stderr.trim().to_string()));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl StreamAcquirer for FfmpegStreamAcquirer {
    async fn acquire(
        &self,
        source: &CaptureSource,
        bounds: ResolutionBounds,
    ) -> RecorderResult<CaptureStream> {
        let input = capture_input_for(&source.id, &self.display, self.framerate)?;
        self.probe(&input).await?;

        info!("Acquired capture stream for {} ({})", source.name, source.id);
        Ok(CaptureStream::new(source.clone(), input, bounds))
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Map a source id to ffmpeg input arguments
pub fn capture_input_for(id: &str, display: &str, framerate: u32) -> RecorderResult<CaptureInput> {
    let framerate = framerate.to_string();
    let unknown = || RecorderError::CapabilityDenied(format!("unknown capture source: {}", id));

    let (backend, rest) = id.split_once(':').ok_or_else(unknown)?;

    match backend {
        "x11" => {
            if rest == "screen:full" {
                Ok(CaptureInput::new("x11grab", display).with_option("framerate", framerate))
            } else if let Some(geometry) = rest.strip_prefix("screen:") {
                let m = parse_geometry(geometry).ok_or_else(unknown)?;
                Ok(CaptureInput::new("x11grab", format!("{}+{},{}", display, m.x, m.y))
                    .with_option("video_size", format!("{}x{}", m.width, m.height))
                    .with_option("framerate", framerate))
            } else if let Some(window_id) = rest.strip_prefix("window:") {
                Ok(CaptureInput::new("x11grab", display)
                    .with_option("window_id", window_id)
                    .with_option("framerate", framerate))
            } else {
                Err(unknown())
            }
        }
        "avfoundation" => {
            let device = rest.strip_prefix("screen:").ok_or_else(unknown)?;
            // audio excluded
            Ok(CaptureInput::new("avfoundation", format!("{}:none", device))
                .with_option("framerate", framerate)
                .with_option("capture_cursor", "1"))
        }
        "gdigrab" if rest == "desktop" || rest.starts_with("title=") => {
            Ok(CaptureInput::new("gdigrab", rest).with_option("framerate", framerate))
        }
        _ => Err(unknown()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorGeometry {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEntry {
    pub id: String,
    pub title: String,
}

/// Parse `WxH+X+Y`, tolerating xrandr's `W/mmxH/mm+X+Y` physical-size suffixes
fn parse_geometry(geometry: &str) -> Option<MonitorGeometry> {
    let (width, rest) = geometry.split_once('x')?;
    let mut parts = rest.split('+');
    let height = parts.next()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;

    let strip_mm = |value: &str| value.split('/').next().and_then(|v| v.parse::<u32>().ok());

    Some(MonitorGeometry {
        name: String::new(),
        width: strip_mm(width)?,
        height: strip_mm(height)?,
        x,
        y,
    })
}

/// Parse `xrandr --listmonitors`
///
/// ```text
/// Monitors: 2
///  0: +*eDP-1 1920/344x1080/194+0+0  eDP-1
///  1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1
/// ```
pub fn parse_xrandr_monitors(listing: &str) -> Vec<MonitorGeometry> {
    listing
        .lines()
        .filter(|line| !line.trim_start().starts_with("Monitors:"))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 || !fields[0].ends_with(':') {
                return None;
            }
            let mut monitor = parse_geometry(fields[2])?;
            monitor.name = fields[fields.len() - 1].to_string();
            Some(monitor)
        })
        .collect()
}

/// Take `count` whitespace-separated fields, returning them and the trimmed remainder
fn take_fields(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();
    for _ in 0..count {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest.trim_end()))
}

/// Parse `wmctrl -lG`: `<id> <desktop> <x> <y> <w> <h> <host> <title...>`
///
/// Sticky windows (desktop -1: panels, docks) and untitled windows are skipped.
pub fn parse_wmctrl_windows(listing: &str) -> Vec<WindowEntry> {
    listing
        .lines()
        .filter_map(|line| {
            let (fields, title) = take_fields(line, 7)?;
            if fields[1] == "-1" || title.is_empty() || !fields[0].starts_with("0x") {
                return None;
            }
            Some(WindowEntry {
                id: fields[0].to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}

/// Parse the avfoundation device listing into (device index, screen number) pairs
///
/// ```text
/// [AVFoundation indev @ 0x7f8] AVFoundation video devices:
/// [AVFoundation indev @ 0x7f8] [0] FaceTime HD Camera
/// [AVFoundation indev @ 0x7f8] [1] Capture screen 0
/// [AVFoundation indev @ 0x7f8] AVFoundation audio devices:
/// ```
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub fn parse_avfoundation_screens(listing: &str) -> Vec<(u32, u32)> {
    let mut in_video = false;
    let mut screens = Vec::new();

    for line in listing.lines() {
        if line.contains("AVFoundation video devices") {
            in_video = true;
            continue;
        }
        if line.contains("AVFoundation audio devices") {
            in_video = false;
            continue;
        }
        if !in_video {
            continue;
        }

        let Some(idx) = line.find("] [") else { continue };
        let Some((device, name)) = line[idx + 3..].split_once("] ") else { continue };
        let Some(screen) = name.trim().strip_prefix("Capture screen ") else { continue };

        if let (Ok(device), Ok(screen)) = (device.parse(), screen.parse()) {
            screens.push((device, screen));
        }
    }

    screens
}

/// Window titles from `tasklist /v /fo csv /nh` (last column), deduplicated
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub fn parse_tasklist_titles(listing: &str) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();

    for line in listing.lines() {
        let line = line.trim().trim_start_matches('"').trim_end_matches('"');
        let Some(title) = line.split("\",\"").last() else { continue };
        if title.is_empty() || title == "N/A" || titles.iter().any(|t| t == title) {
            continue;
        }
        titles.push(title.to_string());
    }

    titles
}
