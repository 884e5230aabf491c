//! Glue between the window and the [`Downloader`].
//!
//! Hooks fire on the worker thread, so they only push a [`UiEvent`] into a
//! channel and poke the UI. The UI thread calls [`AppController::pump`] each
//! frame to apply those events to its [`ViewState`].

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::{
    config::Settings,
    downloader::Downloader,
    engine::DownloadEngine,
    error::Result,
    model::{CompletionResult, ProgressEvent, Tone, ViewState},
    worker::{spawn_download, DownloadHandle},
};

/// Asks the UI to redraw; must be callable from any thread.
pub type Repaint = Arc<dyn Fn() + Send + Sync>;

/// Worker-to-UI messages.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Progress(ProgressEvent),
    Completed(CompletionResult),
}

pub struct AppController {
    downloader: Arc<Downloader>,
    events: UnboundedReceiver<UiEvent>,
    active: Option<DownloadHandle>,
    view: ViewState,
}

impl AppController {
    pub fn new(engine: Arc<dyn DownloadEngine>, settings: &Settings, repaint: Repaint) -> Result<Self> {
        let mut downloader = Downloader::new(engine, &settings.save_path)?
            .with_max_height(settings.max_height);

        let (tx, events) = unbounded_channel();
        let (progress_tx, progress_repaint) = (tx.clone(), repaint.clone());
        downloader.set_callbacks(
            move |event| {
                let _ = progress_tx.send(UiEvent::Progress(event));
                progress_repaint();
            },
            move |result| {
                let _ = tx.send(UiEvent::Completed(result));
                repaint();
            },
        );

        Ok(Self {
            downloader: Arc::new(downloader),
            events,
            active: None,
            view: ViewState::default(),
        })
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn save_path(&self) -> &Path {
        self.downloader.save_path()
    }

    /// Called when the user picks another folder. Returns whether the folder
    /// is now in use.
    pub fn set_save_path(&mut self, path: PathBuf) -> bool {
        if self.view.busy {
            self.set_status("Wait for the current download to finish.", Tone::Warning);
            return false;
        }

        let mut next = Downloader::clone(&self.downloader);
        match next.set_save_path(&path) {
            Ok(()) => {
                self.downloader = Arc::new(next);
                self.set_status(format!("Download path set to: {}", path.display()), Tone::Notice);
                true
            }
            Err(e) => {
                self.set_status(format!("Error setting path: {e}"), Tone::Error);
                false
            }
        }
    }

    /// Download button handler. Returns immediately; the work happens on a
    /// background thread.
    pub fn handle_download(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            self.set_status("Please enter a YouTube video URL.", Tone::Warning);
            return;
        }
        if self.view.busy {
            self.set_status("A download is already running.", Tone::Warning);
            return;
        }

        self.set_status("Initiating download...", Tone::Info);
        self.view.progress = 0.0;

        match spawn_download(self.downloader.clone(), url.to_string()) {
            Ok(handle) => {
                tracing::info!(url, "download started");
                self.active = Some(handle);
                self.view.busy = true;
            }
            Err(e) => {
                self.set_status(format!("An unexpected error occurred: {e}"), Tone::Error);
            }
        }
    }

    /// Applies queued worker events. Must run on the UI thread.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }

        if self.active.as_ref().is_some_and(DownloadHandle::is_finished) {
            if let Some(handle) = self.active.take() {
                handle.join();
            }
        }
        applied
    }

    /// Blocks until the running download, if any, has finished, then pumps.
    pub fn wait_for_completion(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.join();
        }
        self.pump();
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Progress(progress) => {
                if progress.total_bytes > 0 {
                    self.view.progress = progress.fraction();
                }
            }
            UiEvent::Completed(result) => {
                let tone = if result.success { Tone::Success } else { Tone::Error };
                self.set_status(result.message, tone);
                self.view.progress = 0.0;
                self.view.busy = false;
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>, tone: Tone) {
        self.view.status = message.into();
        self.view.tone = tone;
    }
}
