use crate::core::{Exchange, ExchangeStatus, Role};
use crate::tui::markdown;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Role-tagged running conversation, pinned to the newest turn unless the
/// user scrolls back.
#[derive(Default)]
pub struct ConversationView {
    exchanges: Vec<Exchange>,
    pending: Option<String>,
    scroll_back: usize,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the displayed history and jump back to the newest turn.
    pub fn sync(&mut self, history: &[Exchange]) {
        self.exchanges = history.to_vec();
        self.pending = None;
        self.scroll_back = 0;
    }

    /// Show a submitted question while its reply is outstanding.
    pub fn set_pending(&mut self, question: String) {
        self.pending = Some(question);
        self.scroll_back = 0;
    }

    #[cfg(test)]
    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_back = self.scroll_back.saturating_add(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(rows);
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for exchange in &self.exchanges {
            let time = exchange.at.format("%H:%M").to_string();
            lines.push(header(exchange.role, exchange.status, &time));
            match (exchange.role, exchange.status) {
                (Role::Assistant, ExchangeStatus::Ok) => {
                    lines.extend(markdown::render(&exchange.content));
                }
                (_, ExchangeStatus::Failed) => {
                    lines.extend(exchange.content.lines().map(|l| {
                        Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Red)))
                    }));
                }
                _ => {
                    lines.extend(exchange.content.lines().map(|l| Line::from(l.to_string())));
                }
            }
            lines.push(Line::default());
        }

        if let Some(question) = &self.pending {
            lines.push(header(Role::User, ExchangeStatus::Ok, "now"));
            lines.extend(question.lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Assistant is thinking...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        lines
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let lines = self.lines();
        let inner_width = usize::from(area.width.saturating_sub(2)).max(1);
        let visible = usize::from(area.height.saturating_sub(2));

        let total = wrapped_rows(&lines, inner_width);
        let max_back = total.saturating_sub(visible);
        self.scroll_back = self.scroll_back.min(max_back);
        let offset = max_back - self.scroll_back;

        let title = if self.scroll_back > 0 {
            format!("Conversation (scrolled back {} rows)", self.scroll_back)
        } else {
            "Conversation".to_string()
        };

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));

        f.render_widget(paragraph, area);
    }
}

fn header(role: Role, status: ExchangeStatus, time: &str) -> Line<'static> {
    let (label, color) = match (role, status) {
        (Role::User, _) => ("You", Color::Green),
        (_, ExchangeStatus::Failed) => ("Error", Color::Red),
        (Role::Assistant, _) => ("Assistant", Color::Cyan),
        (Role::System, _) => ("System", Color::Magenta),
    };

    Line::from(vec![
        Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {time}"), Style::default().fg(Color::DarkGray)),
    ])
}

/// Rows the lines occupy once word-wrapped to `width` columns.
fn wrapped_rows(lines: &[Line], width: usize) -> usize {
    lines
        .iter()
        .map(|line| {
            let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            if text.is_empty() {
                1
            } else {
                textwrap::wrap(&text, width).len().max(1)
            }
        })
        .sum()
}
