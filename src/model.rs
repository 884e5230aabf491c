use std::path::PathBuf;

use serde::Deserialize;

/// What the user asked for: a link and the folder to save it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
}

/// Byte counts reported while a download is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes written so far, never larger than `total_bytes`
    pub bytes_downloaded: u64,
    /// Exact size, or yt-dlp's estimate when `estimated` is set
    pub total_bytes: u64,
    pub estimated: bool,
}

impl ProgressEvent {
    /// Builds an event, clamping the downloaded count into `0..=total`.
    pub fn new(bytes_downloaded: u64, total_bytes: u64, estimated: bool) -> Self {
        Self {
            bytes_downloaded: bytes_downloaded.min(total_bytes),
            total_bytes,
            estimated,
        }
    }

    /// Progress as a fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_downloaded as f64 / self.total_bytes as f64) as f32
    }
}

/// Terminates one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub message: String,
    pub success: bool,
}

impl CompletionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

/// Subset of `yt-dlp --dump-json` we care about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default = "unknown")]
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub ext: Option<String>,
}

fn unknown() -> String {
    "Unknown".to_string()
}

impl VideoInfo {
    /// Duration as `mm:ss`, if yt-dlp knows it.
    pub fn duration_label(&self) -> Option<String> {
        let secs = self.duration.filter(|d| *d > 0.0)? as u64;
        Some(format!("{:02}:{:02}", secs / 60, secs % 60))
    }
}

/// Colour class of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Info,
    Notice,
    Warning,
    Success,
    Error,
}

/// Everything the window draws, owned by the UI thread.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub status: String,
    pub tone: Tone,
    /// Progress fraction (0.0 to 1.0)
    pub progress: f32,
    /// A download is running
    pub busy: bool,
}
