use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
    /// Input did not match any recognized video URL shape.
    #[display("Invalid video URL: {_0}")]
    MalformedUrl(String),

    /// Captions could not be retrieved for a video.
    #[display("{_0}")]
    Fetch(String),

    #[display("No transcript loaded yet; fetch a video transcript first")]
    NoGroundingAvailable,

    #[display("Message is empty")]
    EmptyMessage,

    /// The completion provider failed. The text has already been recorded
    /// into the conversation history as a failed assistant reply.
    #[display("{_0}")]
    Completion(String),

    #[display("Configuration error: {_0}")]
    Config(String),

    #[display("{_0}")]
    Custom(String),

    #[from]
    Io(std::io::Error),

    #[from]
    TomlDe(toml::de::Error),

    #[from]
    Json(serde_json::Error),

    #[from]
    OpenAI(async_openai::error::OpenAIError),
}

impl Error {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn completion_error_displays_its_text_verbatim() {
        let err = Error::Completion("Completion provider error: boom".to_string());
        assert_eq!(err.to_string(), "Completion provider error: boom");
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn read() -> super::Result<()> {
            Err(std::io::Error::other("disk gone"))?;
            Ok(())
        }
        assert!(matches!(read(), Err(Error::Io(_))));
    }
}
