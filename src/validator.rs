//! Recognises YouTube video links before anything is handed to yt-dlp.
//!
//! The check is deliberately shallow: it only looks at the URL shape and the
//! 11-character video id. yt-dlp does the real resolution.

use once_cell::sync::Lazy;
use regex::Regex;

const HOSTS: &str = r"(youtube\.com|youtu\.be|m\.youtube\.com)";
const VIDEO_ID: &str = r"(?P<id>[a-zA-Z0-9_-]{11})";

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let prefix = r"^(https?://)?(www\.)?";
    [
        // watch?v=, embed/ and v/ links
        format!(r"{prefix}{HOSTS}/(watch\?v=|embed/|v/){VIDEO_ID}(.*)?$"),
        // shorts
        format!(r"{prefix}{HOSTS}/shorts/{VIDEO_ID}(.*)?$"),
        // youtu.be short links
        format!(r"{prefix}youtu\.be/{VIDEO_ID}(.*)?$"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static URL pattern"))
    .collect()
});

/// Returns true when `url` looks like a YouTube video, shorts or short link.
pub fn is_valid_url(url: &str) -> bool {
    PATTERNS.iter().any(|re| re.is_match(url))
}

/// Pulls the 11-character video id out of any URL accepted by [`is_valid_url`].
pub fn extract_video_id(url: &str) -> Option<String> {
    PATTERNS
        .iter()
        .find_map(|re| re.captures(url)?.name("id").map(|m| m.as_str().to_string()))
}
