use crate::config::CaptionSettings;
use crate::core::video_id::VideoId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// One timed caption line as returned by a captions provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFragment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Source of timed caption fragments for a video.
#[async_trait]
pub trait CaptionsProvider: Send + Sync {
    async fn captions(&self, video_id: &VideoId) -> Result<Vec<CaptionFragment>>;
}

/// Captions pulled from YouTube's timed-text endpoints.
#[derive(Clone)]
pub struct YouTubeCaptions {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
    preserve_formatting: bool,
}

impl YouTubeCaptions {
    pub fn new(settings: &CaptionSettings) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| Error::custom(format!("Failed to initialize captions client: {e}")))?;

        Ok(Self {
            api,
            languages: settings
                .languages
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            preserve_formatting: settings.preserve_formatting,
        })
    }
}

#[async_trait]
impl CaptionsProvider for YouTubeCaptions {
    async fn captions(&self, video_id: &VideoId) -> Result<Vec<CaptionFragment>> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let transcript = self
            .api
            .fetch_transcript(video_id.as_str(), &languages, self.preserve_formatting)
            .await
            .map_err(|e| Error::Fetch(format!("Failed to fetch transcript: {e}")))?;

        Ok(transcript
            .snippets
            .into_iter()
            .map(|snippet| CaptionFragment {
                text: snippet.text,
                start: snippet.start,
                duration: snippet.duration,
            })
            .collect())
    }
}

/// Caption text for one video, flattened to plain lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub video_id: VideoId,
    pub text: String,
    pub fragment_count: usize,
}

#[derive(Clone)]
pub struct TranscriptService {
    provider: Arc<dyn CaptionsProvider>,
    timeout: Duration,
}

impl TranscriptService {
    pub fn new(provider: Arc<dyn CaptionsProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Fetch and flatten the captions for `video_id`. Every provider failure,
    /// including a timeout, comes back as [`Error::Fetch`]. No retries.
    pub async fn fetch(&self, video_id: &VideoId) -> Result<Transcript> {
        info!(%video_id, "Fetching transcript");

        let captions = tokio::time::timeout(self.timeout, self.provider.captions(video_id));
        let fragments = match captions.await {
            Ok(Ok(fragments)) => fragments,
            Ok(Err(e)) => {
                let err = fetch_error(video_id, e);
                warn!(%video_id, error = %err, "Transcript fetch failed");
                return Err(err);
            }
            Err(_) => {
                warn!(%video_id, "Transcript fetch timed out");
                return Err(Error::Fetch(format!(
                    "Timed out after {}s fetching transcript for {video_id}",
                    self.timeout.as_secs_f32()
                )));
            }
        };

        let fragment_count = fragments.len();
        let text = flatten(fragments);
        if text.trim().is_empty() {
            return Err(Error::Fetch(format!("Transcript for {video_id} is empty")));
        }

        info!(%video_id, fragment_count, chars = text.len(), "Transcript fetched");
        Ok(Transcript {
            video_id: video_id.clone(),
            text,
            fragment_count,
        })
    }
}

/// Join fragment text in chronological order, one fragment per line.
fn flatten(mut fragments: Vec<CaptionFragment>) -> String {
    fragments.sort_by(|a, b| a.start.total_cmp(&b.start));
    fragments
        .iter()
        .map(|f| html_escape::decode_html_entities(&f.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fetch_error(video_id: &VideoId, err: Error) -> Error {
    let message = match err {
        Error::Fetch(message) => message,
        other => format!("Failed to fetch transcript for {video_id}: {other}"),
    };

    if message.trim().is_empty() {
        Error::Fetch(format!(
            "Failed to fetch transcript for {video_id}: captions provider gave no details"
        ))
    } else {
        Error::Fetch(message)
    }
}
