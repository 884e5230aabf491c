use std::{
    io::Write,
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc::unbounded_channel;

use tubesave::{
    config::Settings, logging, model::ProgressEvent, validator::is_valid_url, worker::spawn_download,
    Downloader, YtDlpEngine,
};

const RULE: &str = "==================================================";

#[derive(Parser)]
#[clap(name = "tubesave-cli")]
#[clap(about = "Download a YouTube video without the GUI")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(after_help = "Example: tubesave-cli 'https://www.youtube.com/watch?v=dQw4w9WgXcQ'")]
struct Cli {
    /// Video link (watch, embed, youtu.be or shorts)
    url: String,
    /// Folder to save into, overrides the config file
    #[clap(short, long)]
    output: Option<PathBuf>,
    /// Highest resolution to prefer, overrides the config file
    #[clap(long)]
    max_height: Option<u32>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    logging::init_tracing();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut settings = Settings::load().context("loading config")?;
    if let Some(output) = cli.output {
        settings.save_path = output;
    }
    if let Some(max_height) = cli.max_height {
        settings.max_height = max_height;
    }

    println!("YouTube Video Downloader (CLI)");
    println!("{RULE}");

    let engine = Arc::new(YtDlpEngine::new(settings.ytdlp_path.clone()));
    let mut downloader = Downloader::new(engine, &settings.save_path)?
        .with_max_height(settings.max_height);

    let shown_path = std::path::absolute(downloader.save_path())
        .unwrap_or_else(|_| downloader.save_path().to_path_buf());
    println!("🔗 URL: {}", cli.url);
    println!("📁 Download path: {}", shown_path.display());

    if !is_valid_url(&cli.url) {
        println!("❌ Invalid YouTube URL format.");
        finish(false);
        return Ok(false);
    }

    println!("🚀 Starting download...");

    let (done_tx, mut done_rx) = unbounded_channel();
    downloader.set_callbacks(
        |event| {
            print!("\r{}", format_progress(&event));
            let _ = std::io::stdout().flush();
        },
        move |result| {
            let _ = done_tx.send(result);
        },
    );

    let handle = spawn_download(Arc::new(downloader), cli.url)?;
    // Blocks until the worker reports back; the hook fires exactly once.
    let result = done_rx.blocking_recv();
    handle.join();

    println!();
    let success = match result {
        Some(result) if result.success => {
            println!("✅ {}", result.message);
            true
        }
        Some(result) => {
            println!("❌ {}", result.message);
            false
        }
        None => false,
    };

    finish(success);
    if success {
        println!("📂 Check '{}' for your video.", shown_path.display());
    }
    Ok(success)
}

fn finish(success: bool) {
    println!("{RULE}");
    if success {
        println!("🎉 Download completed successfully!");
    } else {
        println!("💔 Download failed. Please check the URL and try again.");
    }
}

/// `Progress: 42.0% (1.2/3.4 MB)`, with `MB~` when the total is an estimate.
fn format_progress(event: &ProgressEvent) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    format!(
        "Progress: {:.1}% ({:.1}/{:.1} MB{})",
        event.fraction() * 100.0,
        event.bytes_downloaded as f64 / MB,
        event.total_bytes as f64 / MB,
        if event.estimated { "~" } else { "" }
    )
}
