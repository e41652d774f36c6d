use crate::config::Settings;
use crate::error::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE: &str = "vidchat.log";

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Plain stderr; fine for one-shot commands.
    Stderr,
    /// A file in the log directory. The TUI owns the terminal, so nothing
    /// may be written to stdout or stderr while it runs.
    File,
}

/// Install the global subscriber. The returned guard flushes the file writer
/// on drop and must be held for the life of the process.
pub fn init(settings: &Settings, verbosity: u8, target: LogTarget) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vidchat={}", level(settings, verbosity))));

    match target {
        LogTarget::Stderr => {
            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init()
                .is_ok();
            if !installed {
                tracing::warn!("A tracing subscriber is already installed");
            }
            Ok(None)
        }
        LogTarget::File => {
            let dir = settings.log_dir();
            std::fs::create_dir_all(&dir)?;
            let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()
                .is_ok();
            if !installed {
                tracing::warn!("A tracing subscriber is already installed");
            }
            Ok(Some(guard))
        }
    }
}

fn level(settings: &Settings, verbosity: u8) -> &str {
    match verbosity {
        0 => settings.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::level;
    use crate::config::Settings;

    #[test]
    fn verbosity_overrides_configured_level() {
        let settings = Settings::default();
        assert_eq!(level(&settings, 0), "info");
        assert_eq!(level(&settings, 1), "debug");
        assert_eq!(level(&settings, 4), "trace");
    }
}
