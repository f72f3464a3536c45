// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::playback::EndBehavior;

/// How a video is turned into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStrategy {
    /// Decode every frame once at startup and index into memory.
    Eager,
    /// Seek the decoder on every request and decode a single frame.
    Lazy,
}

/// Which frame rate maps a timestamp to a frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTiming {
    /// Stretch the decoded frames over the configured duration.
    FitDuration,
    /// Use the container's reported frame rate.
    Native,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub primary_video: PathBuf,
    pub overlay_video: PathBuf,
    /// Length of the analysed action in seconds.
    pub duration: f64,
    /// Joint angle samples per second.
    pub sample_rate: f64,
    /// Logical playback rate; one tick advances the cursor by `1 / playback_fps`.
    pub playback_fps: f64,
    pub repaint_interval_ms: u64,
    pub end_behavior: EndBehavior,
    pub frame_strategy: FrameStrategy,
    pub frame_timing: FrameTiming,
    pub frame_width: u32,
    pub frame_height: u32,
    pub output_directory: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            primary_video: PathBuf::from("video_1.mp4"),
            overlay_video: PathBuf::from("video_2.mp4"),
            duration: 6.0,
            sample_rate: 30.0,
            playback_fps: 30.0,
            repaint_interval_ms: 20,
            end_behavior: EndBehavior::Stop,
            frame_strategy: FrameStrategy::Eager,
            frame_timing: FrameTiming::FitDuration,
            frame_width: 640,
            frame_height: 480,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("GaitDashboard")))
                .unwrap_or_else(|| PathBuf::from("./output")),
        }
    }
}

impl DashboardConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|source| DashboardError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("duration", self.duration),
            ("sample_rate", self.sample_rate),
            ("playback_fps", self.playback_fps),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DashboardError::invalid(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(DashboardError::invalid("frame size must be non-zero"));
        }
        Ok(())
    }

    pub fn tick_step(&self) -> f64 {
        1.0 / self.playback_fps
    }

    pub fn repaint_interval(&self) -> Duration {
        Duration::from_millis(self.repaint_interval_ms)
    }
}
