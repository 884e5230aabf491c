use anyhow::{Context, Result};
use eframe::egui::ColorImage;

/// Standard high-quality thumbnail for a video id.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}

/// Downloads and decodes a video's thumbnail. Blocking; call it off the UI thread.
pub fn fetch_thumbnail(video_id: &str) -> Result<ColorImage> {
    let url = thumbnail_url(video_id);
    let bytes = reqwest::blocking::get(&url)
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .with_context(|| format!("fetching {url}"))?;
    decode(&bytes)
}

fn decode(bytes: &[u8]) -> Result<ColorImage> {
    let img = image::load_from_memory(bytes)
        .context("decoding thumbnail")?
        .to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, &img))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_video_id() {
        assert_eq!(
            thumbnail_url("dQw4w9WgXcQ"),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
    }

    #[test]
    fn decodes_png() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        let img = decode(&png).unwrap();
        assert_eq!(img.size, [4, 3]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
