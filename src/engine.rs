//! Adapter around the external `yt-dlp` program.
//!
//! [`DownloadEngine`] is the seam the [`crate::downloader::Downloader`] talks
//! to; [`YtDlpEngine`] is the real implementation that spawns yt-dlp and turns
//! its progress output into [`EngineReport`]s.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use rust_embed::RustEmbed;
use sha2::{Digest, Sha256};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    sync::mpsc::UnboundedSender,
};

use crate::{
    error::{DownloadError, Result},
    model::VideoInfo,
    progress::{parse_progress_line, progress_template, EngineReport},
};

/// Optional yt-dlp binary shipped inside the executable.
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

const BIN_NAME: &str = if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" };

/// One invocation of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineJob {
    pub url: String,
    pub output_dir: PathBuf,
    pub max_height: u32,
}

impl EngineJob {
    /// `<dir>/%(title)s.%(ext)s`
    pub fn output_template(&self) -> String {
        self.output_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    /// Best quality up to the resolution cap, else best available.
    pub fn format_preference(&self) -> String {
        format!("best[height<={}]/best", self.max_height)
    }
}

#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Fetches metadata without downloading.
    async fn probe(&self, url: &str) -> Result<VideoInfo>;

    /// Downloads `job`, sending every progress record on `progress`.
    /// The sender is dropped when the download ends.
    async fn fetch(&self, job: &EngineJob, progress: UnboundedSender<EngineReport>) -> Result<()>;
}

pub struct YtDlpEngine {
    explicit: Option<PathBuf>,
    program: OnceCell<PathBuf>,
}

impl YtDlpEngine {
    /// `explicit` wins over the bundled binary, which wins over `PATH`.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            program: OnceCell::new(),
        }
    }

    fn program(&self) -> Result<&Path> {
        self.program
            .get_or_try_init(|| locate_program(self.explicit.as_deref()))
            .map(PathBuf::as_path)
    }
}

fn locate_program(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(DownloadError::EngineNotFound {
            program: path.display().to_string(),
        });
    }

    if let Some(path) = bundled_binary() {
        tracing::debug!(path = %path.display(), "using bundled yt-dlp");
        return Ok(path);
    }

    which::which(BIN_NAME).map_err(|_| DownloadError::EngineNotFound {
        program: BIN_NAME.to_string(),
    })
}

fn bundled_binary() -> Option<PathBuf> {
    let data = Asset::get(BIN_NAME)?;
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tubesave");
    match unpack_bundled(&dir, &data.data, data.metadata.sha256_hash()) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(error = %e, dir = %dir.display(), "could not unpack bundled yt-dlp");
            None
        }
    }
}

/// Puts `bytes` at `<dir>/<BIN_NAME>` unless a file with `expected` digest is
/// already there. The new copy is staged next to the target and renamed over it.
fn unpack_bundled(dir: &Path, bytes: &[u8], expected: [u8; 32]) -> std::io::Result<PathBuf> {
    let path = dir.join(BIN_NAME);
    match file_sha256(&path) {
        Ok(digest) if digest == expected => return Ok(path),
        Ok(_) => tracing::info!(path = %path.display(), "replacing stale yt-dlp"),
        Err(_) => {}
    }

    std::fs::create_dir_all(dir)?;
    let staging = dir.join(format!(".{BIN_NAME}.{}.part", std::process::id()));
    if let Err(e) = write_executable(&staging, bytes).and_then(|()| std::fs::rename(&staging, &path)) {
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    Ok(path)
}

fn file_sha256(path: &Path) -> std::io::Result<[u8; 32]> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().into())
}

fn write_executable(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Feeds `reader` to `on_line` one line at a time. Bytes that are not UTF-8
/// are replaced rather than ending the read.
async fn for_each_line<R, F>(reader: R, mut on_line: F) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment);
        on_line(line.trim_end_matches('\r'));
    }
    Ok(())
}

fn command(program: &Path) -> Command {
    let mut cmd = Command::new(program);
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000);
    cmd.env("PYTHONIOENCODING", "utf-8");
    cmd
}

/// Strips yt-dlp's `ERROR: ` prefix.
fn error_text(line: &str) -> Option<&str> {
    line.trim().strip_prefix("ERROR:").map(str::trim)
}

#[async_trait]
impl DownloadEngine for YtDlpEngine {
    async fn probe(&self, url: &str) -> Result<VideoInfo> {
        let output = command(self.program()?)
            .args(["--dump-json", "--no-warnings", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find_map(error_text)
                .map(str::to_string)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(DownloadError::engine(message));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn fetch(&self, job: &EngineJob, progress: UnboundedSender<EngineReport>) -> Result<()> {
        let args = [
            "-f".to_owned(),
            job.format_preference(),
            "--no-playlist".to_owned(),
            "--newline".to_owned(),
            "--progress-template".to_owned(),
            progress_template(),
            "-o".to_owned(),
            job.output_template(),
            job.url.clone(),
        ];
        tracing::debug!(?args, "spawning yt-dlp");

        let mut child = command(self.program()?)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::unexpected("yt-dlp stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::unexpected("yt-dlp stderr was not captured"))?;

        let read_stdout = for_each_line(stdout, |line| match parse_progress_line(line) {
            Some(report) => {
                let _ = progress.send(report);
            }
            None => tracing::debug!(target: "tubesave::yt_dlp", "{line}"),
        });

        let mut last_error = None;
        let read_stderr = for_each_line(stderr, |line| {
            tracing::debug!(target: "tubesave::yt_dlp", "{line}");
            if let Some(text) = error_text(line) {
                last_error = Some(text.to_string());
            }
        });

        let (out, err, status) = tokio::join!(read_stdout, read_stderr, child.wait());
        out?;
        err?;
        let status = status?;

        if !status.success() {
            return Err(DownloadError::engine(
                last_error.unwrap_or_else(|| format!("yt-dlp exited with {status}")),
            ));
        }
        Ok(())
    }
}
