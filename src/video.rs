// src/video.rs - Timestamp-addressed frame sources backed by ffmpeg
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use image::RgbImage;
use serde::Deserialize;

use crate::config::{DashboardConfig, FrameStrategy, FrameTiming};
use crate::error::{DashboardError, Result};

/// A decoded RGB image, height x width x 3.
pub type Frame = RgbImage;

/// A video that can be asked for the frame nearest a playback timestamp.
///
/// `None` means the frame is unavailable this cycle (past the end of the
/// content, decoder failure); callers skip the image and carry on.
pub trait FrameSource: Send + Sync {
    fn frame_at(&self, timestamp: f64) -> Option<Frame>;

    /// Number of frames addressable through `frame_at`.
    fn frame_count(&self) -> usize;

    /// Frames per second of playback time.
    fn timeline_rate(&self) -> f64;

    /// Restricts the source to `frame_count` frames spread evenly over `duration`.
    fn fit(&mut self, frame_count: usize, duration: f64);

    fn path(&self) -> &Path;

    fn content_duration(&self) -> f64 {
        self.frame_count() as f64 / self.timeline_rate()
    }
}

/// Index of the frame shown at `timestamp`, or `None` past the content end.
///
/// A timestamp exactly on the end of the content maps to the last frame.
pub fn frame_index(timestamp: f64, rate: f64, frame_count: usize) -> Option<usize> {
    if frame_count == 0 || !timestamp.is_finite() || timestamp < 0.0 || rate <= 0.0 {
        return None;
    }
    let index = (timestamp * rate).floor() as usize;
    if index < frame_count {
        Some(index)
    } else if timestamp <= frame_count as f64 / rate {
        Some(frame_count - 1)
    } else {
        None
    }
}

/// Fails with a startup error unless `path` exists and can be opened.
pub fn check_media(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DashboardError::MissingMedia(path.to_path_buf()));
    }
    fs::File::open(path).map_err(|source| DashboardError::UnreadableMedia {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn require_tool(tool: &'static str) -> Result<()> {
    if Command::new(tool).arg("-version").output().is_err() {
        return Err(DashboardError::ToolUnavailable(tool));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: Option<usize>,
    pub duration: Option<f64>,
}

impl VideoInfo {
    /// Frame count from the container, or estimated from duration and rate.
    pub fn estimated_frames(&self) -> Option<usize> {
        self.frame_count.filter(|&n| n > 0).or_else(|| {
            self.duration
                .map(|d| (d * self.fps).round())
                .filter(|n| *n >= 1.0)
                .map(|n| n as usize)
        })
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: u32,
    height: u32,
    r_frame_rate: String,
    nb_frames: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parses "30/1", "30000/1001" or "25".
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

fn parse_probe_output(path: &Path, json: &str) -> Result<VideoInfo> {
    let probe_err = |reason: String| DashboardError::Probe {
        path: path.to_path_buf(),
        reason,
    };

    let output: ProbeOutput =
        serde_json::from_str(json).map_err(|e| probe_err(format!("unreadable ffprobe output: {e}")))?;
    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| probe_err("no video stream".to_string()))?;
    let fps = parse_frame_rate(&stream.r_frame_rate)
        .ok_or_else(|| probe_err(format!("invalid frame rate {:?}", stream.r_frame_rate)))?;

    Ok(VideoInfo {
        path: path.to_path_buf(),
        width: stream.width,
        height: stream.height,
        fps,
        frame_count: stream.nb_frames.and_then(|n| n.parse().ok()),
        duration: output
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse().ok()),
    })
}

/// Reads stream metadata with ffprobe.
pub fn probe(path: &Path) -> Result<VideoInfo> {
    check_media(path)?;
    require_tool("ffprobe")?;

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-select_streams", "v:0"])
        .args([
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames:format=duration",
        ])
        .args(["-of", "json"])
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(DashboardError::Probe {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))
}

/// Decodes every frame up front and serves clones from memory.
pub struct EagerFrameSource {
    path: PathBuf,
    frames: Vec<Frame>,
    rate: f64,
}

impl EagerFrameSource {
    pub fn from_frames(path: impl Into<PathBuf>, frames: Vec<Frame>, rate: f64) -> Self {
        Self {
            path: path.into(),
            frames,
            rate,
        }
    }

    /// Extracts all frames of `path`, scaled to `width` x `height`, at the
    /// container's native frame rate.
    pub fn load(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        let path = path.as_ref();
        let info = probe(path)?;
        require_tool("ffmpeg")?;

        let temp_dir = std::env::temp_dir().join(format!("gait_frames_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&temp_dir)?;

        tracing::info!(path = %path.display(), "extracting video frames");
        let status = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-vf", format!("scale={width}:{height}").as_str()])
            .arg(temp_dir.join("frame_%05d.png"))
            .status();

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                let _ = fs::remove_dir_all(&temp_dir);
                return Err(e.into());
            }
        };
        if !status.success() {
            let _ = fs::remove_dir_all(&temp_dir);
            return Err(DashboardError::Decode {
                path: path.to_path_buf(),
                reason: "ffmpeg frame extraction failed; the format may be unsupported".to_string(),
            });
        }

        let mut frames = Vec::with_capacity(info.estimated_frames().unwrap_or_default());
        for i in 1.. {
            let frame_path = temp_dir.join(format!("frame_{i:05}.png"));
            if !frame_path.exists() {
                break;
            }
            match image::open(&frame_path) {
                Ok(img) => frames.push(img.to_rgb8()),
                Err(e) => {
                    let _ = fs::remove_dir_all(&temp_dir);
                    return Err(e.into());
                }
            }
        }
        let _ = fs::remove_dir_all(&temp_dir);

        if frames.is_empty() {
            return Err(DashboardError::Decode {
                path: path.to_path_buf(),
                reason: "no frames could be decoded".to_string(),
            });
        }

        tracing::info!(
            path = %path.display(),
            frames = frames.len(),
            fps = info.fps,
            source_size = %format!("{}x{}", info.width, info.height),
            "loaded video"
        );
        Ok(Self::from_frames(path, frames, info.fps))
    }
}

impl FrameSource for EagerFrameSource {
    fn frame_at(&self, timestamp: f64) -> Option<Frame> {
        let index = frame_index(timestamp, self.rate, self.frames.len())?;
        self.frames.get(index).cloned()
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn timeline_rate(&self) -> f64 {
        self.rate
    }

    fn fit(&mut self, frame_count: usize, duration: f64) {
        self.frames.truncate(frame_count);
        self.rate = self.frames.len() as f64 / duration;
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Seeks the decoder for every request and decodes one frame.
///
/// The most recent frame is kept so repeated requests for the same
/// instant (a paused dashboard repainting) do not spawn ffmpeg again.
pub struct LazyFrameSource {
    info: VideoInfo,
    frame_count: usize,
    rate: f64,
    width: u32,
    height: u32,
    last: Mutex<Option<(usize, Frame)>>,
}

impl LazyFrameSource {
    pub fn open(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        let path = path.as_ref();
        let info = probe(path)?;
        require_tool("ffmpeg")?;
        Self::from_info(info, width, height)
    }

    pub fn from_info(info: VideoInfo, width: u32, height: u32) -> Result<Self> {
        let frame_count = info.estimated_frames().ok_or_else(|| DashboardError::Probe {
            path: info.path.clone(),
            reason: "unknown frame count and duration".to_string(),
        })?;
        Ok(Self {
            rate: info.fps,
            info,
            frame_count,
            width,
            height,
            last: Mutex::new(None),
        })
    }

    fn decode(&self, index: usize) -> Result<Frame> {
        let seek = index as f64 / self.info.fps;
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", format!("{seek:.6}").as_str(), "-i"])
            .arg(&self.info.path)
            .args(["-frames:v", "1"])
            .args(["-vf", format!("scale={}:{}", self.width, self.height).as_str()])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .output()?;

        let decode_err = |reason: String| DashboardError::Decode {
            path: self.info.path.clone(),
            reason,
        };
        if !output.status.success() {
            return Err(decode_err(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        RgbImage::from_raw(self.width, self.height, output.stdout)
            .ok_or_else(|| decode_err(format!("short frame at {seek:.3}s")))
    }
}

impl FrameSource for LazyFrameSource {
    fn frame_at(&self, timestamp: f64) -> Option<Frame> {
        let index = frame_index(timestamp, self.rate, self.frame_count)?;

        if let Ok(last) = self.last.lock() {
            if let Some((cached, frame)) = last.as_ref() {
                if *cached == index {
                    return Some(frame.clone());
                }
            }
        }

        match self.decode(index) {
            Ok(frame) => {
                if let Ok(mut last) = self.last.lock() {
                    *last = Some((index, frame.clone()));
                }
                Some(frame)
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "frame unavailable");
                None
            }
        }
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn timeline_rate(&self) -> f64 {
        self.rate
    }

    fn fit(&mut self, frame_count: usize, duration: f64) {
        self.frame_count = self.frame_count.min(frame_count);
        self.rate = self.frame_count as f64 / duration;
    }

    fn path(&self) -> &Path {
        &self.info.path
    }
}

pub fn open_source(path: &Path, config: &DashboardConfig) -> Result<Box<dyn FrameSource>> {
    let source: Box<dyn FrameSource> = match config.frame_strategy {
        FrameStrategy::Eager => Box::new(EagerFrameSource::load(
            path,
            config.frame_width,
            config.frame_height,
        )?),
        FrameStrategy::Lazy => Box::new(LazyFrameSource::open(
            path,
            config.frame_width,
            config.frame_height,
        )?),
    };
    Ok(source)
}

/// Opens the primary and overlay videos. Both media paths are checked
/// before any decoding starts so a missing file is reported immediately.
pub fn open_pair(config: &DashboardConfig) -> Result<(Box<dyn FrameSource>, Box<dyn FrameSource>)> {
    check_media(&config.primary_video)?;
    check_media(&config.overlay_video)?;

    let mut primary = open_source(&config.primary_video, config)?;
    let mut overlay = open_source(&config.overlay_video, config)?;

    if config.frame_timing == FrameTiming::FitDuration {
        let common = primary.frame_count().min(overlay.frame_count());
        primary.fit(common, config.duration);
        overlay.fit(common, config.duration);
        tracing::debug!(frames = common, rate = primary.timeline_rate(), "fitted videos to duration");
    }

    Ok((primary, overlay))
}
