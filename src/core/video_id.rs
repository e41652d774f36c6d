use derive_more::Display;
use regex::Regex;
use std::sync::LazyLock;

// Watch pages (`v` may follow other query parameters), embed, /v/ and shorts
// paths on the main host, plus the short-link host. Host match is
// case-sensitive and anchored at the start of the input.
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?:https?://)?
        (?:www\.)?
        (?:
            youtube\.com/
            (?:
                watch\?(?:[^\#\s]*?&)?v=
              | embed/
              | v/
              | shorts/
            )
          | youtu\.be/
        )
        ([A-Za-z0-9_-]{11})
        ",
    )
    .expect("video URL pattern is valid")
});

/// An 11-character hosted video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pull the video identifier out of a pasted URL. Returns `None` for anything
/// that is not one of the recognized URL shapes; trailing query or fragment
/// content after the identifier is ignored.
pub fn extract_video_id(raw_url: &str) -> Option<VideoId> {
    let caps = VIDEO_URL.captures(raw_url.trim())?;
    caps.get(1).map(|m| VideoId(m.as_str().to_string()))
}
