use crate::core::{
    ConversationManager, Session, Transcript, TranscriptService, VideoId, extract_video_id,
};
use crate::error::{Error, Result};
use crate::tui::components::{ConversationView, InputField, TranscriptView};
use crate::tui::events::AppEvent;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

const SCROLL_STEP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Url,
    Message,
}

/// What the single in-flight request, if any, is doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    Idle,
    Fetching { video_id: VideoId },
    Thinking,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Results sent back from background requests.
pub enum WorkerEvent {
    TranscriptFetched {
        video_id: VideoId,
        outcome: Result<Transcript>,
    },
    TurnFinished {
        session: Session,
        outcome: Result<String>,
    },
}

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,
    pub activity: Activity,
    pub notice: Option<Notice>,

    pub url_input: InputField,
    pub message_input: InputField,
    pub transcript_view: TranscriptView,
    pub transcript_height: u16,
    pub conversation_view: ConversationView,

    // Moved into the worker task for the length of a conversation turn.
    session: Option<Session>,

    transcripts: TranscriptService,
    conversation: ConversationManager,

    worker_tx: mpsc::UnboundedSender<WorkerEvent>,
    worker_rx: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl App {
    pub fn new(transcripts: TranscriptService, conversation: ConversationManager) -> Self {
        let (worker_tx, worker_rx) = mpsc::unbounded_channel();

        let mut url_input = InputField::new("Video URL", "https://youtu.be/...");
        url_input.focused = true;

        Self {
            should_quit: false,
            focus: Focus::Url,
            activity: Activity::Idle,
            notice: None,

            url_input,
            message_input: InputField::new("Message", "Ask something about the video..."),
            transcript_view: TranscriptView::new(),
            transcript_height: 0,
            conversation_view: ConversationView::new(),

            session: Some(Session::new()),

            transcripts,
            conversation,

            worker_tx,
            worker_rx,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Quit => {
                self.should_quit = true;
            }
            AppEvent::Key(key) => {
                self.handle_key(key);
            }
            AppEvent::Mouse(mouse) => {
                self.handle_mouse(mouse);
            }
            AppEvent::Tick => {
                self.handle_tick();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.set_focus(match self.focus {
                    Focus::Url => Focus::Message,
                    Focus::Message => Focus::Url,
                });
            }
            KeyCode::PageUp if self.focus == Focus::Message => {
                self.conversation_view.scroll_up(SCROLL_STEP * 3);
            }
            KeyCode::PageDown if self.focus == Focus::Message => {
                self.conversation_view.scroll_down(SCROLL_STEP * 3);
            }
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown => {
                self.transcript_view.handle_key(key, self.transcript_height);
            }
            KeyCode::Enter => match self.focus {
                Focus::Url => self.submit_url(),
                Focus::Message => self.submit_message(),
            },
            _ => {
                if self.is_busy() {
                    return;
                }
                match self.focus {
                    Focus::Url => self.url_input.handle_key(key),
                    Focus::Message => self.message_input.handle_key(key),
                };
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.conversation_view.scroll_up(SCROLL_STEP),
            MouseEventKind::ScrollDown => self.conversation_view.scroll_down(SCROLL_STEP),
            _ => {}
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.url_input.focused = focus == Focus::Url;
        self.message_input.focused = focus == Focus::Message;
    }

    fn submit_url(&mut self) {
        if self.is_busy() || !self.url_input.is_valid() {
            return;
        }

        let raw = self.url_input.value.trim().to_string();
        let Some(video_id) = extract_video_id(&raw) else {
            self.notice = Some(Notice::Error(Error::MalformedUrl(raw).to_string()));
            return;
        };

        info!(%video_id, "Transcript requested");
        self.notice = None;
        self.activity = Activity::Fetching {
            video_id: video_id.clone(),
        };

        let transcripts = self.transcripts.clone();
        let tx = self.worker_tx.clone();
        tokio::spawn(async move {
            let outcome = transcripts.fetch(&video_id).await;
            let _ = tx.send(WorkerEvent::TranscriptFetched { video_id, outcome });
        });
    }

    fn submit_message(&mut self) {
        if self.is_busy() || !self.message_input.is_valid() {
            return;
        }

        let Some(mut session) = self.session.take() else {
            return;
        };

        if session.transcript().is_none() {
            self.session = Some(session);
            self.notice = Some(Notice::Error(Error::NoGroundingAvailable.to_string()));
            return;
        }

        let question = self.message_input.take();
        self.notice = None;
        self.activity = Activity::Thinking;
        self.conversation_view.set_pending(question.clone());

        // Handed back in place of the moved session if the turn task dies.
        let snapshot = session.clone();
        let conversation = self.conversation.clone();
        let tx = self.worker_tx.clone();
        tokio::spawn(async move {
            let turn = tokio::spawn(async move {
                let outcome = conversation.submit(&mut session, &question).await;
                (session, outcome)
            });

            let event = match turn.await {
                Ok((session, outcome)) => WorkerEvent::TurnFinished { session, outcome },
                Err(e) => {
                    warn!(error = %e, "Conversation turn aborted");
                    WorkerEvent::TurnFinished {
                        session: snapshot,
                        outcome: Err(Error::custom(format!(
                            "The assistant request was aborted: {e}"
                        ))),
                    }
                }
            };
            let _ = tx.send(event);
        });
    }

    fn handle_tick(&mut self) {
        while let Ok(event) = self.worker_rx.try_recv() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: WorkerEvent) {
        self.activity = Activity::Idle;

        match event {
            WorkerEvent::TranscriptFetched { video_id, outcome } => match outcome {
                Ok(transcript) => {
                    self.notice = Some(Notice::Info(format!(
                        "Loaded transcript for {video_id} ({} caption lines)",
                        transcript.fragment_count
                    )));
                    self.transcript_view.set_content(
                        transcript.text.clone(),
                        format!("Transcript: {video_id}"),
                    );
                    if let Some(session) = self.session.as_mut() {
                        session.set_transcript(transcript);
                    }
                    self.url_input.clear();
                    self.set_focus(Focus::Message);
                }
                Err(e) => {
                    self.notice = Some(Notice::Error(e.to_string()));
                }
            },
            WorkerEvent::TurnFinished { session, outcome } => {
                self.conversation_view.sync(session.history());
                self.session = Some(session);
                self.notice = match outcome {
                    Ok(_) => None,
                    Err(Error::Completion(_)) => Some(Notice::Error(
                        "The assistant request failed; the error is shown in the conversation"
                            .to_string(),
                    )),
                    Err(e) => {
                        warn!(error = %e, "Conversation turn refused");
                        Some(Notice::Error(e.to_string()))
                    }
                };
            }
        }
    }
}
