//! Desktop front end: paste a link, pick a folder, watch it download.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
// eframe/egui for GUI application framework
use eframe::{egui, App, Frame};
use egui::{Color32, ColorImage, TextureHandle, TextureOptions, Visuals};
// Filled in once the window exists; the worker thread repaints through it
use once_cell::sync::OnceCell;
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use tubesave::{
    config::{self, Settings},
    logging,
    model::Tone,
    thumbnail, validator, AppController, YtDlpEngine,
};

/// Program entry point: builds the controller and launches the GUI
fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let settings = Settings::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Settings::default()
    });

    let ui_ctx: Arc<OnceCell<egui::Context>> = Arc::new(OnceCell::new());
    let repaint_ctx = ui_ctx.clone();
    let controller = AppController::new(
        Arc::new(YtDlpEngine::new(settings.ytdlp_path.clone())),
        &settings,
        Arc::new(move || {
            if let Some(ctx) = repaint_ctx.get() {
                ctx.request_repaint();
            }
        }),
    )?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([600.0, 340.0])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            let _ = ui_ctx.set(cc.egui_ctx.clone());
            Box::new(TubeSaveApp::new(controller, settings))
        }),
    )
    .map_err(|e| anyhow!("could not start the window: {e}"))
}

/// Application state for the GUI
struct TubeSaveApp {
    controller: AppController,
    /// Written back when the user picks another folder
    settings: Settings,
    /// Input field for the video URL
    url_input: String,
    thumbnail: Option<TextureHandle>,
    /// Decoded thumbnail handed over by the fetch thread
    thumbnail_result: Arc<Mutex<Option<ColorImage>>>,
}

impl TubeSaveApp {
    fn new(controller: AppController, settings: Settings) -> Self {
        Self {
            controller,
            settings,
            url_input: String::new(),
            thumbnail: None,
            thumbnail_result: Arc::new(Mutex::new(None)),
        }
    }

    fn start_download(&mut self, ctx: &egui::Context) {
        let url = self.url_input.trim().to_string();

        self.thumbnail = None;
        if let Some(video_id) = validator::extract_video_id(&url) {
            let slot = Arc::clone(&self.thumbnail_result);
            let ctx = ctx.clone();
            std::thread::spawn(move || match thumbnail::fetch_thumbnail(&video_id) {
                Ok(img) => {
                    if let Ok(mut slot) = slot.lock() {
                        *slot = Some(img);
                    }
                    ctx.request_repaint();
                }
                Err(e) => tracing::debug!(error = %e, "no thumbnail"),
            });
        }

        self.controller.handle_download(&url);
    }

    fn pick_folder(&mut self) {
        let current = self.controller.save_path().to_path_buf();
        if let Some(folder) = FileDialog::new().set_directory(&current).pick_folder() {
            if self.controller.set_save_path(folder.clone()) {
                self.settings.save_path = folder;
                self.remember_settings();
            }
        }
    }

    fn remember_settings(&self) {
        let Some(path) = config::config_path() else {
            return;
        };
        match self.settings.save_to(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "settings saved"),
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "could not save settings"),
        }
    }
}

fn tone_color(tone: Tone) -> Color32 {
    match tone {
        Tone::Info => Color32::LIGHT_BLUE,
        Tone::Notice => Color32::GRAY,
        Tone::Warning => Color32::from_rgb(255, 165, 0),
        Tone::Success => Color32::GREEN,
        Tone::Error => Color32::RED,
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for TubeSaveApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Worker events only touch the view here, on the UI thread
        self.controller.pump();

        if let Some(img) = self.thumbnail_result.lock().ok().and_then(|mut slot| slot.take()) {
            self.thumbnail = Some(ctx.load_texture("thumbnail", img, TextureOptions::default()));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("YouTube Downloader");
            ui.add_space(8.0);

            ui.group(|ui| {
                ui.label("Enter YouTube Video URL:");
                ui.add(egui::TextEdit::singleline(&mut self.url_input).desired_width(f32::INFINITY));
            });

            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.label("Save Location:");
                    ui.label(self.controller.save_path().display().to_string());
                    if ui.button("Browse…").clicked() {
                        self.pick_folder();
                    }
                });
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    let busy = self.controller.view().busy;
                    if ui.add_enabled(!busy, egui::Button::new("Download")).clicked() {
                        self.start_download(ctx);
                    }

                    let view = self.controller.view();
                    ui.add(
                        egui::ProgressBar::new(view.progress)
                            .desired_width(400.0)
                            .show_percentage(),
                    );
                    ui.colored_label(tone_color(view.tone), &view.status);
                });

                if let Some(tex) = &self.thumbnail {
                    ui.add(egui::Image::new(tex).max_width(160.0));
                }
            });
        });

        // Keep polling while a download runs in case a repaint is missed
        if self.controller.view().busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
