use std::{
    panic::AssertUnwindSafe,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crate::{downloader::Downloader, error::DownloadError};

/// A download running on its own thread.
pub struct DownloadHandle {
    thread: JoinHandle<()>,
}

impl DownloadHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the worker thread exits. The completion hook has fired by
    /// then.
    pub fn join(self) {
        if self.thread.join().is_err() {
            tracing::error!("download worker thread panicked");
        }
    }
}

/// Starts `downloader.download_video(url)` on a background thread.
///
/// The thread drives its own current-thread runtime for yt-dlp's process
/// I/O. Hooks fire on that thread.
pub fn spawn_download(downloader: Arc<Downloader>, url: String) -> std::io::Result<DownloadHandle> {
    let thread = thread::Builder::new()
        .name("download-worker".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    downloader.report_failure(&DownloadError::Io(e));
                    return;
                }
            };

            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                runtime.block_on(downloader.download_video(&url))
            }));
            match outcome {
                Ok(result) => tracing::debug!(success = result.success, "worker finished"),
                // the completion guard has already reported the failure
                Err(_) => tracing::error!(url = %url, "download task panicked"),
            }
        })?;

    Ok(DownloadHandle { thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        downloader::ABORTED_MESSAGE,
        engine::{DownloadEngine, EngineJob},
        error::Result,
        model::{CompletionResult, VideoInfo},
        progress::EngineReport,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedSender;

    struct PanickingEngine;

    #[async_trait]
    impl DownloadEngine for PanickingEngine {
        async fn probe(&self, _url: &str) -> Result<VideoInfo> {
            Ok(VideoInfo::default())
        }

        async fn fetch(&self, _job: &EngineJob, _progress: UnboundedSender<EngineReport>) -> Result<()> {
            panic!("engine blew up");
        }
    }

    #[test]
    fn panicking_engine_still_reports_once() {
        let dir = TempDir::new().unwrap();
        let mut downloader = Downloader::new(Arc::new(PanickingEngine), dir.path()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        downloader.set_callbacks(|_| {}, move |res| sink.lock().unwrap().push(res));

        let handle = spawn_download(
            Arc::new(downloader),
            "https://youtu.be/dQw4w9WgXcQ".into(),
        )
        .unwrap();
        handle.join();

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[CompletionResult::failure(ABORTED_MESSAGE)]
        );
    }
}
