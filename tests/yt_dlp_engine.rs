//! Drives the real yt-dlp adapter against a shell script that speaks the same
//! command line, so no network is involved.
#![cfg(unix)]

use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tubesave::{
    model::{CompletionResult, ProgressEvent},
    worker::spawn_download,
    Downloader, YtDlpEngine,
};

const URL: &str = "https://www.youtube.com/shorts/jrCMnbcRa9s";

const FAKE_YT_DLP: &str = r#"#!/bin/sh
for arg in "$@"; do
  if [ "$arg" = "--dump-json" ]; then
    echo '{"id":"jrCMnbcRa9s","title":"Fake Clip","ext":"mp4","duration":61}'
    exit 0
  fi
done

if [ -n "$FAKE_FAIL" ]; then
  printf '\377\376 mangled console output\n' >&2
  echo "ERROR: [youtube] jrCMnbcRa9s: Video unavailable" >&2
  exit 1
fi

out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
dir=$(dirname "$out")

echo "[youtube] jrCMnbcRa9s: Downloading webpage"
printf '[info] \351t\351 \377\n'
echo "tubesave-progress|downloading|0|NA|NA|NA"
echo "tubesave-progress|downloading|500|NA|2000.0|NA"
echo "tubesave-progress|downloading|1000|2000|NA|NA"
echo "tubesave-progress|downloading|2000|2000|NA|NA"
printf 'video' > "$dir/Fake Clip.mp4"
echo "tubesave-progress|finished|2000|2000|NA|$dir/Fake Clip.mp4"
"#;

fn install_fake(dir: &Path, fail: bool) -> PathBuf {
    let body = if fail {
        FAKE_YT_DLP.replacen("#!/bin/sh\n", "#!/bin/sh\nFAKE_FAIL=1\n", 1)
    } else {
        FAKE_YT_DLP.to_string()
    };
    let path = dir.join(if fail { "yt-dlp-failing" } else { "yt-dlp" });
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[derive(Default)]
struct Seen {
    progress: Mutex<Vec<ProgressEvent>>,
    completions: Mutex<Vec<CompletionResult>>,
}

fn run(program: PathBuf, save_path: &Path) -> Arc<Seen> {
    let seen = Arc::new(Seen::default());
    let (p, c) = (seen.clone(), seen.clone());

    let mut downloader =
        Downloader::new(Arc::new(YtDlpEngine::new(Some(program))), save_path).unwrap();
    downloader.set_callbacks(
        move |ev| p.progress.lock().unwrap().push(ev),
        move |res| c.completions.lock().unwrap().push(res),
    );

    spawn_download(Arc::new(downloader), URL.to_string())
        .unwrap()
        .join();
    seen
}

// One test so the scripts are never written while another test forks.
#[test]
fn fake_yt_dlp_end_to_end() {
    let bin = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let save_path = out.path().join("downloads");

    // success
    let seen = run(install_fake(bin.path(), false), &save_path);

    assert_eq!(
        seen.completions.lock().unwrap().as_slice(),
        &[CompletionResult::success("Successfully downloaded: \"Fake Clip\"")]
    );
    let progress = seen.progress.lock().unwrap();
    assert_eq!(
        progress.as_slice(),
        &[
            ProgressEvent::new(500, 2000, true),
            ProgressEvent::new(1000, 2000, false),
            ProgressEvent::new(2000, 2000, false),
        ]
    );
    assert!(save_path.join("Fake Clip.mp4").is_file());

    // engine failure
    let seen = run(install_fake(bin.path(), true), &save_path);
    assert_eq!(
        seen.completions.lock().unwrap().as_slice(),
        &[CompletionResult::failure(
            "Error: Download failed - [youtube] jrCMnbcRa9s: Video unavailable"
        )]
    );

    // missing program
    let seen = run(bin.path().join("nothing-here"), &save_path);
    let completions = seen.completions.lock().unwrap();
    assert_eq!(completions.len(), 1);
    assert!(!completions[0].success);
    assert!(completions[0]
        .message
        .starts_with("An unexpected error occurred:"));
}
