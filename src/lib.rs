//! Download YouTube videos through yt-dlp with visible progress.
//!
//! The [`downloader::Downloader`] does the work and reports through two hooks;
//! the desktop app routes those hooks through [`controller::AppController`],
//! the CLI consumes them directly.

// Settings file
pub mod config;
// Worker-to-UI handoff
pub mod controller;
// Validation, delegation and completion reporting
pub mod downloader;
// yt-dlp adapter
pub mod engine;
// Error kinds and their user-facing messages
pub mod error;
// tracing subscriber setup
pub mod logging;
// Data models for requests, progress and the view
pub mod model;
// Progress line parsing
pub mod progress;
// Thumbnail preview for the GUI
pub mod thumbnail;
// URL shape checks
pub mod validator;
// Background download thread
pub mod worker;

pub use controller::AppController;
pub use downloader::Downloader;
pub use engine::{DownloadEngine, YtDlpEngine};
pub use error::{DownloadError, Result};
pub use model::{CompletionResult, DownloadRequest, ProgressEvent};
