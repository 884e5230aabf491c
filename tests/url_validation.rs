use tubesave::validator::{extract_video_id, is_valid_url};

#[test]
fn documented_examples() {
    assert!(is_valid_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
    assert!(is_valid_url("https://www.youtube.com/shorts/jrCMnbcRa9s"));
    assert!(!is_valid_url("https://vimeo.com/123456"));
}

#[test]
fn every_shape_with_every_host_prefix() {
    let prefixes = ["", "http://", "https://", "www.", "https://www."];
    let paths = [
        "youtube.com/watch?v=dQw4w9WgXcQ",
        "youtube.com/embed/dQw4w9WgXcQ",
        "youtube.com/v/dQw4w9WgXcQ",
        "youtube.com/shorts/jrCMnbcRa9s",
        "m.youtube.com/watch?v=dQw4w9WgXcQ",
        "m.youtube.com/shorts/jrCMnbcRa9s",
        "youtu.be/dQw4w9WgXcQ",
    ];

    for prefix in prefixes {
        for path in paths {
            let url = format!("{prefix}{path}");
            assert!(is_valid_url(&url), "expected valid: {url}");
            assert!(extract_video_id(&url).is_some(), "expected an id: {url}");
        }
    }
}

#[test]
fn id_must_be_eleven_characters() {
    assert!(!is_valid_url("https://youtu.be/dQw4w9WgXc"));
    assert!(!is_valid_url("https://www.youtube.com/shorts/jrCMn!cRa9s"));
    // trailing text after the id is allowed
    assert!(is_valid_url("https://youtu.be/dQw4w9WgXcQQ"));
}
