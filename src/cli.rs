use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidchat")]
#[command(about = "Chat with an assistant about a video's transcript")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to a config file (defaults to the user config directory)
    #[arg(long, global = true, env = "VIDCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive TUI (default)
    Tui,

    /// Fetch a video's transcript and print it
    Transcript {
        /// YouTube video URL
        url: String,
    },

    /// Fetch a transcript and ask one or more questions about it, in order
    Ask {
        /// YouTube video URL
        url: String,

        /// Question to ask; repeat for a multi-turn conversation
        #[arg(short, long = "question", required = true)]
        questions: Vec<String>,

        /// Print the conversation history as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_collects_repeated_questions() {
        let cli = Cli::parse_from([
            "vidchat",
            "-v",
            "ask",
            "https://youtu.be/dQw4w9WgXcQ",
            "-q",
            "Who speaks?",
            "--question",
            "About what?",
            "--json",
        ]);

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Some(Commands::Ask {
                url,
                questions,
                json,
            }) => {
                assert_eq!(url, "https://youtu.be/dQw4w9WgXcQ");
                assert_eq!(questions, vec!["Who speaks?", "About what?"]);
                assert!(json);
            }
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::parse_from(["vidchat"]);
        assert!(cli.command.is_none());
    }
}
