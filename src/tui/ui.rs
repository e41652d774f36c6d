use crate::tui::app::{Activity, App, Notice};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};

const HELP: &str =
    "[Enter] Submit  [Tab] Switch field  [↑↓] Scroll transcript  [PgUp/PgDn] Scroll chat  [Esc] Quit";

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // URL input
            Constraint::Min(5),    // Transcript + conversation
            Constraint::Length(3), // Message input
            Constraint::Length(3), // Status / help
        ])
        .split(f.area());

    // Title
    let title = Paragraph::new("Video Transcript Chat")
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    app.url_input.render(f, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);

    app.transcript_height = body[0].height;
    app.transcript_view.render(f, body[0]);
    app.conversation_view.render(f, body[1]);

    app.message_input.render(f, chunks[3]);

    draw_status(f, app, chunks[4]);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let (text, color) = match (&app.activity, &app.notice) {
        (Activity::Fetching { video_id }, _) => {
            (format!("Fetching transcript for {video_id}..."), Color::Yellow)
        }
        (Activity::Thinking, _) => ("Waiting for the assistant...".to_string(), Color::Yellow),
        (Activity::Idle, Some(Notice::Error(message))) => (message.clone(), Color::Red),
        (Activity::Idle, Some(Notice::Info(message))) => (message.clone(), Color::Green),
        (Activity::Idle, None) => (HELP.to_string(), Color::Gray),
    };

    let status = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}
