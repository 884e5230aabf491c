use crate::model::ProgressEvent;

/// Marks our progress lines so they can't be confused with yt-dlp's own output.
pub const PROGRESS_PREFIX: &str = "tubesave-progress";

/// Value for `--progress-template`. Fields yt-dlp doesn't know print as `NA`;
/// the filename goes last because it may contain the separator.
pub fn progress_template() -> String {
    format!(
        "download:{PROGRESS_PREFIX}|%(progress.status)s|%(progress.downloaded_bytes)s|\
         %(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.filename)s"
    )
}

/// One record from yt-dlp's progress hook.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineReport {
    Downloading(ProgressEvent),
    Finished { filename: String },
}

/// Parses a line printed with [`progress_template`].
///
/// Downloading records without any total (exact or estimated) are dropped,
/// as are statuses other than `downloading` and `finished`.
pub fn parse_progress_line(line: &str) -> Option<EngineReport> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?.strip_prefix('|')?;
    let mut fields = rest.splitn(5, '|');
    let status = fields.next()?;
    let downloaded = parse_bytes(fields.next()?);
    let total = parse_bytes(fields.next()?);
    let estimate = parse_bytes(fields.next()?);
    let filename = fields.next().unwrap_or_default();

    match status {
        "downloading" => {
            let downloaded = downloaded.unwrap_or(0);
            match (total, estimate) {
                (Some(total), _) if total > 0 => {
                    Some(EngineReport::Downloading(ProgressEvent::new(downloaded, total, false)))
                }
                (_, Some(estimate)) if estimate > 0 => {
                    Some(EngineReport::Downloading(ProgressEvent::new(downloaded, estimate, true)))
                }
                _ => None,
            }
        }
        "finished" => Some(EngineReport::Finished {
            filename: filename.to_string(),
        }),
        _ => None,
    }
}

// yt-dlp prints estimates as floats ("1048576.0") and unknowns as "NA".
fn parse_bytes(field: &str) -> Option<u64> {
    let field = field.trim();
    if let Ok(v) = field.parse::<u64>() {
        return Some(v);
    }
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(status: &str, downloaded: &str, total: &str, estimate: &str, file: &str) -> String {
        format!("{PROGRESS_PREFIX}|{status}|{downloaded}|{total}|{estimate}|{file}")
    }

    #[test]
    fn exact_total_is_preferred() {
        let report = parse_progress_line(&line("downloading", "512", "1024", "2048.0", "NA"));
        assert_eq!(
            report,
            Some(EngineReport::Downloading(ProgressEvent::new(512, 1024, false)))
        );
    }

    #[test]
    fn falls_back_to_estimate() {
        let report = parse_progress_line(&line("downloading", "100", "NA", "4000.5", "NA"));
        assert_eq!(
            report,
            Some(EngineReport::Downloading(ProgressEvent::new(100, 4000, true)))
        );
    }

    #[test]
    fn drops_records_without_total() {
        assert_eq!(
            parse_progress_line(&line("downloading", "100", "NA", "NA", "NA")),
            None
        );
        assert_eq!(
            parse_progress_line(&line("downloading", "100", "0", "NA", "NA")),
            None
        );
    }

    #[test]
    fn overshoot_is_clamped() {
        let Some(EngineReport::Downloading(ev)) =
            parse_progress_line(&line("downloading", "5000", "NA", "4000", "NA"))
        else {
            panic!("expected a progress report");
        };
        assert!(ev.bytes_downloaded <= ev.total_bytes);
    }

    #[test]
    fn finished_keeps_filename_with_separators() {
        let report = parse_progress_line(&line("finished", "10", "10", "NA", "/tmp/a|b.mp4"));
        assert_eq!(
            report,
            Some(EngineReport::Finished {
                filename: "/tmp/a|b.mp4".into()
            })
        );
    }

    #[test]
    fn ignores_foreign_lines() {
        assert_eq!(parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage"), None);
        assert_eq!(parse_progress_line("downloaded_bytes: 42%"), None);
        assert_eq!(parse_progress_line(&line("error", "1", "2", "NA", "NA")), None);
    }

    #[test]
    fn template_carries_prefix() {
        assert!(progress_template().starts_with("download:tubesave-progress|"));
    }
}
