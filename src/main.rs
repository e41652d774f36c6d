mod cli;
mod config;
mod core;
mod error;
mod logging;
mod tui;

use crate::cli::{Cli, Commands};
use crate::config::Settings;
use crate::core::{
    ChatOptions, ConversationManager, Exchange, OpenAiCompletions, Role, Session,
    TranscriptService, YouTubeCaptions, extract_video_id,
};
use crate::error::{Error, Result};
use crate::logging::LogTarget;
use crate::tui::{App, EventHandler, Tui, init as tui_init, restore as tui_restore, ui};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(cli.config.as_deref())?;

    let log_target = match cli.command {
        Some(Commands::Tui) | None => LogTarget::File,
        Some(_) => LogTarget::Stderr,
    };
    let _log_guard = logging::init(&settings, cli.verbose, log_target)?;

    if std::env::var_os("OPENAI_API_KEY").is_none() {
        warn!("OPENAI_API_KEY is not set; conversation turns will fail");
    }

    let (transcripts, conversation) = build_services(&settings)?;

    match cli.command {
        Some(Commands::Transcript { url }) => {
            run_cli_transcript(&transcripts, &url).await?;
        }
        Some(Commands::Ask {
            url,
            questions,
            json,
        }) => {
            run_cli_ask(&transcripts, &conversation, &url, &questions, json).await?;
        }
        Some(Commands::Tui) | None => {
            run_tui(transcripts, conversation)?;
        }
    }

    Ok(())
}

fn build_services(settings: &Settings) -> Result<(TranscriptService, ConversationManager)> {
    let captions = YouTubeCaptions::new(&settings.captions)?;
    let transcripts = TranscriptService::new(Arc::new(captions), settings.captions_timeout());

    let completions = OpenAiCompletions::new(settings.openai.model.as_str());
    let conversation =
        ConversationManager::new(Arc::new(completions), ChatOptions::from_settings(settings));

    info!(model = %settings.openai.model, "Services ready");
    Ok((transcripts, conversation))
}

async fn fetch_into_session(transcripts: &TranscriptService, url: &str) -> Result<Session> {
    let video_id = extract_video_id(url).ok_or_else(|| Error::MalformedUrl(url.to_string()))?;
    let transcript = transcripts.fetch(&video_id).await?;

    let mut session = Session::new();
    session.set_transcript(transcript);
    Ok(session)
}

async fn run_cli_transcript(transcripts: &TranscriptService, url: &str) -> Result<()> {
    let session = fetch_into_session(transcripts, url).await?;
    if let Some(transcript) = session.transcript() {
        println!("{}", transcript.text);
    }
    Ok(())
}

async fn run_cli_ask(
    transcripts: &TranscriptService,
    conversation: &ConversationManager,
    url: &str,
    questions: &[String],
    json: bool,
) -> Result<()> {
    let mut session = fetch_into_session(transcripts, url).await?;
    let mut stdout = std::io::stdout();
    ask_questions(
        conversation,
        &mut session,
        questions,
        json,
        terminal_width(),
        &mut stdout,
    )
    .await
}

/// Submit each question in turn, writing every exchange as it lands (or the
/// whole history as JSON at the end). A failed turn does not stop the run.
async fn ask_questions<W: Write>(
    conversation: &ConversationManager,
    session: &mut Session,
    questions: &[String],
    json: bool,
    width: usize,
    out: &mut W,
) -> Result<()> {
    for question in questions {
        match conversation.submit(session, question).await {
            // Failed replies are already in the history and get printed below.
            Ok(_) | Err(Error::Completion(_)) => {}
            Err(e) => return Err(e),
        }

        if !json {
            let turn = &session.history()[session.history().len().saturating_sub(2)..];
            for exchange in turn {
                write_exchange(out, exchange, width)?;
            }
        }
    }

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(session.history())?)?;
    }

    Ok(())
}

fn write_exchange<W: Write>(out: &mut W, exchange: &Exchange, width: usize) -> Result<()> {
    let speaker = if exchange.role == Role::User {
        "You"
    } else if exchange.is_failed() {
        "Error"
    } else {
        "Assistant"
    };
    writeln!(
        out,
        "{}\n",
        textwrap::fill(&format!("{speaker}: {}", exchange.content), width)
    )?;
    Ok(())
}

fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(width, _)| usize::from(width))
        .unwrap_or(80)
        .max(20)
}

fn run_tui(transcripts: TranscriptService, conversation: ConversationManager) -> Result<()> {
    // Initialize terminal
    let mut terminal = tui_init()?;

    let mut app = App::new(transcripts, conversation);
    let event_handler = EventHandler::new();

    let outcome = run_event_loop(&mut terminal, &mut app, &event_handler);

    // Restore terminal even when the loop failed
    tui_restore()?;
    outcome
}

fn run_event_loop(terminal: &mut Tui, app: &mut App, event_handler: &EventHandler) -> Result<()> {
    loop {
        let event = event_handler.next_event()?;
        app.handle_event(event)?;

        terminal.draw(|f| {
            ui::draw(f, app);
        })?;

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
