use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::mpsc::unbounded_channel;

use crate::{
    config::DEFAULT_MAX_HEIGHT,
    engine::{DownloadEngine, EngineJob},
    error::{DownloadError, Result},
    model::{CompletionResult, DownloadRequest, ProgressEvent, VideoInfo},
    progress::EngineReport,
    validator::is_valid_url,
};

pub type ProgressHook = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
pub type CompletionHook = Arc<dyn Fn(CompletionResult) + Send + Sync>;

/// Message used when a download task dies without reporting back.
pub const ABORTED_MESSAGE: &str =
    "An unexpected error occurred: the download task stopped before finishing";

/// Validates links, hands them to the engine and reports through two hooks.
///
/// Hooks are called on whatever thread runs [`Downloader::download_video`].
/// UI code must hop back to its own thread before touching widgets.
#[derive(Clone)]
pub struct Downloader {
    engine: Arc<dyn DownloadEngine>,
    save_path: PathBuf,
    max_height: u32,
    on_progress: Option<ProgressHook>,
    on_complete: Option<CompletionHook>,
}

impl Downloader {
    /// Creates the downloader, making sure `save_path` exists.
    pub fn new(engine: Arc<dyn DownloadEngine>, save_path: impl Into<PathBuf>) -> Result<Self> {
        let save_path = save_path.into();
        ensure_dir(&save_path)?;
        Ok(Self {
            engine,
            save_path,
            max_height: DEFAULT_MAX_HEIGHT,
            on_progress: None,
            on_complete: None,
        })
    }

    pub fn with_max_height(mut self, max_height: u32) -> Self {
        self.max_height = max_height;
        self
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    /// Switches folders. The new folder is created right away so a bad choice
    /// is reported now rather than at download time.
    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        ensure_dir(&path)?;
        self.save_path = path;
        Ok(())
    }

    pub fn set_callbacks<P, C>(&mut self, on_progress: P, on_complete: C)
    where
        P: Fn(ProgressEvent) + Send + Sync + 'static,
        C: Fn(CompletionResult) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self.on_complete = Some(Arc::new(on_complete));
    }

    /// Downloads `url` into the current save path.
    pub async fn download_video(&self, url: &str) -> CompletionResult {
        self.download(&self.request(url)).await
    }

    pub fn request(&self, url: &str) -> DownloadRequest {
        DownloadRequest {
            url: url.to_string(),
            destination: self.save_path.clone(),
        }
    }

    /// Runs one download attempt. Never fails: every outcome is turned into a
    /// [`CompletionResult`], handed to the completion hook exactly once and
    /// also returned.
    pub async fn download(&self, request: &DownloadRequest) -> CompletionResult {
        let guard = CompletionGuard::new(self.on_complete.clone());

        let result = match self.run(request).await {
            Ok(info) => {
                CompletionResult::success(format!("Successfully downloaded: \"{}\"", info.title))
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %request.url, "download failed");
                CompletionResult::failure(e.user_message())
            }
        };
        guard.finish(result)
    }

    /// Reports a failure that happened before `download_video` could run.
    pub fn report_failure(&self, error: &DownloadError) -> CompletionResult {
        CompletionGuard::new(self.on_complete.clone())
            .finish(CompletionResult::failure(error.user_message()))
    }

    async fn run(&self, request: &DownloadRequest) -> Result<VideoInfo> {
        if !is_valid_url(&request.url) {
            return Err(DownloadError::InvalidUrl);
        }
        ensure_dir(&request.destination)?;

        let info = self.engine.probe(&request.url).await?;
        let duration = info.duration_label().unwrap_or_else(|| "?".into());
        tracing::info!(
            id = %info.id,
            title = %info.title,
            ext = info.ext.as_deref().unwrap_or("?"),
            uploader = info.uploader.as_deref().unwrap_or("Unknown"),
            %duration,
            "starting download"
        );

        let job = EngineJob {
            url: request.url.clone(),
            output_dir: request.destination.clone(),
            max_height: self.max_height,
        };

        let (tx, mut rx) = unbounded_channel();
        let forward = async {
            while let Some(report) = rx.recv().await {
                match report {
                    EngineReport::Downloading(event) => {
                        if let Some(hook) = &self.on_progress {
                            hook(event);
                        }
                    }
                    EngineReport::Finished { filename } => {
                        tracing::info!(%filename, "download completed");
                    }
                }
            }
        };

        let (fetched, ()) = tokio::join!(self.engine.fetch(&job, tx), forward);
        fetched?;
        Ok(info)
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|source| DownloadError::SaveDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "created save directory");
    Ok(())
}

/// Fires the completion hook once: either through `finish`, or on drop if the
/// attempt was abandoned (panic, dropped future).
struct CompletionGuard {
    hook: Option<CompletionHook>,
    fired: bool,
}

impl CompletionGuard {
    fn new(hook: Option<CompletionHook>) -> Self {
        Self { hook, fired: false }
    }

    fn finish(mut self, result: CompletionResult) -> CompletionResult {
        self.fired = true;
        if let Some(hook) = self.hook.take() {
            hook(result.clone());
        }
        result
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.fired {
            return;
        }
        if let Some(hook) = self.hook.take() {
            hook(CompletionResult::failure(ABORTED_MESSAGE));
        }
    }
}
