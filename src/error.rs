//! Error type shared by the engine and the downloader.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DownloadError>;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid YouTube URL format.")]
    InvalidUrl,

    /// yt-dlp ran but reported a failure.
    #[error("{message}")]
    Engine { message: String },

    #[error("could not find the '{program}' program; install it or set ytdlp_path in the config")]
    EngineNotFound { program: String },

    #[error("Could not create save directory {}: {source}", .path.display())]
    SaveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yt-dlp returned invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Unexpected { message: String },
}

impl DownloadError {
    pub fn engine<S: Into<String>>(message: S) -> Self {
        DownloadError::Engine {
            message: message.into(),
        }
    }

    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        DownloadError::Unexpected {
            message: message.into(),
        }
    }

    /// Text shown to the user when a download attempt ends with this error.
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::InvalidUrl => self.to_string(),
            DownloadError::Engine { message } => format!("Error: Download failed - {message}"),
            other => format!("An unexpected error occurred: {other}"),
        }
    }
}
