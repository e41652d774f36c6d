use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

const EMPTY_HINT: &str = "Paste a video URL above and press Enter to fetch its transcript.";

/// Scrollable pane showing the loaded transcript.
pub struct TranscriptView {
    pub content: String,
    pub scroll: usize,
    pub title: String,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            scroll: 0,
            title: "Transcript".to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, area_height: u16) -> bool {
        let lines = self.content.lines().count();
        let page_size = usize::from(area_height.saturating_sub(2));

        match key.code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            KeyCode::Down => {
                if self.scroll < lines.saturating_sub(page_size) {
                    self.scroll += 1;
                }
                true
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(page_size);
                true
            }
            KeyCode::PageDown => {
                self.scroll = (self.scroll + page_size).min(lines.saturating_sub(page_size));
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let visible_lines = usize::from(area.height.saturating_sub(2));

        let lines: Vec<Line> = if self.content.is_empty() {
            vec![Line::from(Span::styled(
                EMPTY_HINT,
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.content
                .lines()
                .skip(self.scroll)
                .take(visible_lines)
                .map(|line| Line::from(Span::raw(line)))
                .collect()
        };

        let total_lines = self.content.lines().count();
        let scroll_info = if total_lines > visible_lines {
            format!(
                " (lines {}-{} of {})",
                self.scroll + 1,
                (self.scroll + visible_lines).min(total_lines),
                total_lines
            )
        } else {
            String::new()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{}{scroll_info}", self.title));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    /// Show a newly fetched transcript from the top.
    pub fn set_content(&mut self, content: String, title: String) {
        self.content = content;
        self.title = title;
        self.scroll = 0;
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}
