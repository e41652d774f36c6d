//! Runtime settings loaded from `config.toml`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "vidchat";
const CONFIG_FILE: &str = "config.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub captions: CaptionSettings,
    pub chat: ChatSettings,
    pub logging: LogSettings,
}

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// Model used for every conversation turn.
    pub model: String,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: f32,
    /// Upper bound on generated output tokens per reply.
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_output_tokens: 512,
            request_timeout_secs: 120,
        }
    }
}

/// Captions provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
    pub preserve_formatting: bool,
    pub request_timeout_secs: u64,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            preserve_formatting: false,
            request_timeout_secs: 30,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Most recent exchanges replayed into each prompt. 0 disables the limit.
    pub history_window: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { history_window: 40 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Overrides the directory the TUI writes its log file into.
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Settings {
    /// Load settings from a specific path, or the default location if None.
    /// A missing file yields the defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.openai.model.trim().is_empty() {
            return Err(Error::Config("openai.model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(Error::Config(format!(
                "openai.temperature must be between 0.0 and 2.0, got {}",
                self.openai.temperature
            )));
        }
        if self.openai.max_output_tokens == 0 {
            return Err(Error::Config(
                "openai.max_output_tokens must be greater than zero".to_string(),
            ));
        }
        if self.openai.request_timeout_secs == 0 {
            return Err(Error::Config(
                "openai.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.captions.request_timeout_secs == 0 {
            return Err(Error::Config(
                "captions.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.captions.languages.iter().all(|l| l.trim().is_empty()) {
            return Err(Error::Config(
                "captions.languages must name at least one language".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.logging.directory.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("logs")
        })
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.openai.request_timeout_secs)
    }

    pub fn captions_timeout(&self) -> Duration {
        Duration::from_secs(self.captions.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_deployment_values() {
        let settings = Settings::default();
        assert_eq!(settings.openai.model, "gpt-4o");
        assert_eq!(settings.openai.temperature, 0.7);
        assert_eq!(settings.openai.max_output_tokens, 512);
        assert_eq!(settings.chat.history_window, 40);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let settings = Settings::parse(
            r#"
            [openai]
            model = "gpt-4o-mini"

            [captions]
            languages = ["es", "en"]
            "#,
        )
        .expect("valid toml");

        assert_eq!(settings.openai.model, "gpt-4o-mini");
        assert_eq!(settings.openai.max_output_tokens, 512);
        assert_eq!(settings.captions.languages, vec!["es", "en"]);
        assert_eq!(settings.chat, ChatSettings::default());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut settings = Settings::default();
        settings.openai.temperature = 3.5;
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_request_timeouts() {
        let mut settings = Settings::default();
        settings.openai.request_timeout_secs = 0;
        assert!(matches!(settings.validate(), Err(Error::Config(m)) if m.contains("openai")));

        let mut settings = Settings::default();
        settings.captions.request_timeout_secs = 0;
        assert!(matches!(settings.validate(), Err(Error::Config(m)) if m.contains("captions")));

        assert!(matches!(
            Settings::parse("[captions]\nrequest_timeout_secs = 0").and_then(|s| s.validate()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_empty_language_list() {
        let mut settings = Settings::default();
        settings.captions.languages.clear();
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn loads_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[chat]\nhistory_window = 6").expect("write config");

        let settings = Settings::load_from(Some(file.path())).expect("load settings");
        assert_eq!(settings.chat.history_window, 6);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml")))
            .expect("defaults");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            Settings::parse("[openai\nmodel ="),
            Err(Error::TomlDe(_))
        ));
    }
}
