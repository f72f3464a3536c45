// src/error.rs
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors raised while loading media, building the signal table or exporting data.
///
/// Media errors are fatal at startup; the dashboard never enters its render
/// loop with a half-initialised session. Export errors are reported in the UI.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("media resource not found: {}", .0.display())]
    MissingMedia(PathBuf),

    #[error("cannot read media resource {}: {source}", .path.display())]
    UnreadableMedia {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not installed or not in PATH; install FFmpeg to decode videos")]
    ToolUnavailable(&'static str),

    #[error("failed to probe {}: {reason}", .path.display())]
    Probe { path: PathBuf, reason: String },

    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl DashboardError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// True for errors that mean a media input could not be resolved at all.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::MissingMedia(_)
                | Self::UnreadableMedia { .. }
                | Self::ToolUnavailable(_)
                | Self::Probe { .. }
                | Self::Decode { .. }
        )
    }
}
