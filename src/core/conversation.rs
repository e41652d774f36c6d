use crate::config::Settings;
use crate::core::completion::{CompletionProvider, CompletionRequest, Message, Role};
use crate::core::session::{Exchange, Session};
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-deployment knobs for every conversation turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Most recent exchanges replayed into the prompt; 0 replays everything.
    pub history_window: usize,
    pub timeout: Duration,
}

impl ChatOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            temperature: settings.openai.temperature,
            max_output_tokens: settings.openai.max_output_tokens,
            history_window: settings.chat.history_window,
            timeout: settings.completion_timeout(),
        }
    }
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Runs conversation turns against a session, grounding every prompt on the
/// session's current transcript.
#[derive(Clone)]
pub struct ConversationManager {
    provider: Arc<dyn CompletionProvider>,
    options: ChatOptions,
}

impl ConversationManager {
    pub fn new(provider: Arc<dyn CompletionProvider>, options: ChatOptions) -> Self {
        Self { provider, options }
    }

    /// Run one turn: record `user_text`, ask the provider once, and record
    /// the reply. A provider failure is recorded as a failed assistant turn
    /// and returned as [`Error::Completion`] carrying the same text.
    ///
    /// Refused without touching history when no transcript is loaded or the
    /// message is blank.
    pub async fn submit(&self, session: &mut Session, user_text: &str) -> Result<String> {
        if session.transcript().is_none() {
            return Err(Error::NoGroundingAvailable);
        }
        if user_text.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }

        session.push(Exchange::user(user_text));

        let messages = self.assemble_prompt(session)?;
        debug!(
            messages = messages.len(),
            chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Prompt assembled"
        );

        let request = CompletionRequest {
            messages,
            temperature: self.options.temperature,
            max_output_tokens: self.options.max_output_tokens,
        };

        let reply = tokio::time::timeout(self.options.timeout, self.provider.complete(request));
        let outcome = match reply.await {
            Ok(Ok(reply)) => {
                let reply = reply.trim();
                if reply.is_empty() {
                    Err("Completion provider error: model returned an empty reply".to_string())
                } else {
                    Ok(reply.to_string())
                }
            }
            Ok(Err(e)) => Err(format!("Completion provider error: {e}")),
            Err(_) => Err(format!(
                "Completion provider error: no reply within {}s",
                self.options.timeout.as_secs_f32()
            )),
        };

        match outcome {
            Ok(reply) => {
                info!(
                    chars = reply.len(),
                    turns = session.history().len() + 1,
                    "Assistant replied"
                );
                session.push(Exchange::assistant(reply.clone()));
                Ok(reply)
            }
            Err(text) => {
                warn!(error = %text, "Completion failed");
                session.push(Exchange::failed(text.clone()));
                Err(Error::Completion(text))
            }
        }
    }

    /// The prompt for the next provider call: a system turn carrying the
    /// current transcript, then the windowed history in insertion order.
    pub fn assemble_prompt(&self, session: &Session) -> Result<Vec<Message>> {
        let transcript = session.transcript().ok_or(Error::NoGroundingAvailable)?;

        let history = windowed(session.history(), self.options.history_window);
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(grounding_message(&transcript.text));
        messages.extend(
            history
                .iter()
                .map(|exchange| Message::new(exchange.role, exchange.content.clone())),
        );
        Ok(messages)
    }
}

fn grounding_message(transcript: &str) -> Message {
    Message::new(
        Role::System,
        format!(
            "You are a helpful assistant. Answer questions using the following video transcript:\n\n\
             {transcript}\n\n\
             Use the transcript only when it is relevant to the question. If it is not relevant, say so."
        ),
    )
}

/// The tail of `history` holding at most `window` exchanges, moved forward
/// so it never opens on an assistant turn.
fn windowed(history: &[Exchange], window: usize) -> &[Exchange] {
    if window == 0 || history.len() <= window {
        return history;
    }

    let mut start = history.len() - window;
    while start + 1 < history.len() && history[start].role != Role::User {
        start += 1;
    }
    &history[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::ExchangeStatus;
    use crate::core::transcript::Transcript;
    use crate::core::video_id::extract_video_id;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a script and records every request it receives.
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn replying(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::default(),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default reply".to_string()))
        }
    }

    struct StalledProvider;

    #[async_trait]
    impl CompletionProvider for StalledProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }
    }

    fn transcript(text: &str) -> Transcript {
        Transcript {
            video_id: extract_video_id("https://youtu.be/dQw4w9WgXcQ").expect("valid url"),
            text: text.to_string(),
            fragment_count: 1,
        }
    }

    fn grounded_session(text: &str) -> Session {
        let mut session = Session::new();
        session.set_transcript(transcript(text));
        session
    }

    fn manager(provider: Arc<ScriptedProvider>) -> ConversationManager {
        ConversationManager::new(provider, ChatOptions::default())
    }

    fn turns(session: &Session) -> Vec<(Role, &str)> {
        session
            .history()
            .iter()
            .map(|e| (e.role, e.content.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn answers_from_the_transcript() {
        let provider = ScriptedProvider::replying(vec![Ok("A cat.".to_string())]);
        let mut session = grounded_session("Alice discusses cats.");

        let reply = manager(provider.clone())
            .submit(&mut session, "What pet is mentioned?")
            .await
            .expect("reply");

        assert_eq!(reply, "A cat.");
        assert_eq!(
            turns(&session),
            vec![
                (Role::User, "What pet is mentioned?"),
                (Role::Assistant, "A cat.")
            ]
        );
        assert!(session.history().iter().all(|e| e.status == ExchangeStatus::Ok));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn refuses_without_a_transcript() {
        let provider = ScriptedProvider::replying(vec![]);
        let mut session = Session::new();

        let err = manager(provider.clone())
            .submit(&mut session, "Anything?")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoGroundingAvailable));
        assert!(session.history().is_empty());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn refuses_blank_messages() {
        let provider = ScriptedProvider::replying(vec![]);
        let mut session = grounded_session("text");

        let err = manager(provider.clone())
            .submit(&mut session, "  \n ")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyMessage));
        assert!(session.history().is_empty());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_recorded_as_assistant_turn() {
        let provider = ScriptedProvider::replying(vec![Err(Error::custom("rate limited"))]);
        let mut session = grounded_session("text");

        let err = manager(provider)
            .submit(&mut session, "Question?")
            .await
            .unwrap_err();

        let Error::Completion(text) = err else {
            panic!("expected a completion error, got {err:?}");
        };
        assert!(text.contains("rate limited"));

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].status, ExchangeStatus::Failed);
        assert_eq!(history[1].content, text);
    }

    #[tokio::test]
    async fn history_grows_by_two_per_turn() {
        let provider = ScriptedProvider::replying(vec![
            Ok("one".to_string()),
            Err(Error::custom("boom")),
            Ok("three".to_string()),
        ]);
        let manager = manager(provider);
        let mut session = grounded_session("text");

        for (i, question) in ["q1", "q2", "q3"].into_iter().enumerate() {
            let _ = manager.submit(&mut session, question).await;
            assert_eq!(session.history().len(), 2 * (i + 1));
        }
    }

    #[tokio::test]
    async fn prompt_leads_with_grounding_then_history() {
        let provider = ScriptedProvider::replying(vec![
            Ok("first answer".to_string()),
            Ok("second answer".to_string()),
        ]);
        let manager = manager(provider.clone());
        let mut session = grounded_session("The speaker explains tides.");

        manager.submit(&mut session, "first?").await.expect("reply");
        manager.submit(&mut session, "second?").await.expect("reply");

        let requests = provider.requests();
        let last = &requests[1];
        assert_eq!(last.temperature, 0.7);
        assert_eq!(last.max_output_tokens, 512);

        let roles: Vec<Role> = last.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert!(last.messages[0].content.contains("The speaker explains tides."));
        assert!(last.messages[0].content.contains("only when it is relevant"));
        assert_eq!(last.messages[1].content, "first?");
        assert_eq!(last.messages[2].content, "first answer");
        assert_eq!(last.messages[3].content, "second?");
    }

    #[tokio::test]
    async fn grounding_is_reread_every_turn() {
        let provider = ScriptedProvider::replying(vec![]);
        let manager = manager(provider.clone());
        let mut session = grounded_session("Transcript about volcanoes.");

        manager.submit(&mut session, "first?").await.expect("reply");
        session.set_transcript(transcript("Transcript about glaciers."));
        manager.submit(&mut session, "second?").await.expect("reply");

        let requests = provider.requests();
        assert!(requests[0].messages[0].content.contains("volcanoes"));
        let system = &requests[1].messages[0].content;
        assert!(system.contains("Transcript about glaciers."));
        assert!(!system.contains("volcanoes"));
        // Grounding lives only in the system turn, never in history.
        let system_turns = requests[1]
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .count();
        assert_eq!(system_turns, 1);
    }

    #[tokio::test]
    async fn replies_are_trimmed() {
        let provider = ScriptedProvider::replying(vec![Ok("\n  A cat.  \n".to_string())]);
        let mut session = grounded_session("Alice discusses cats.");

        let reply = manager(provider)
            .submit(&mut session, "What pet?")
            .await
            .expect("reply");

        assert_eq!(reply, "A cat.");
        assert_eq!(session.history()[1].content, "A cat.");
    }

    #[tokio::test]
    async fn blank_reply_is_a_failure() {
        let provider = ScriptedProvider::replying(vec![Ok("   ".to_string())]);
        let mut session = grounded_session("text");

        let err = manager(provider).submit(&mut session, "q").await.unwrap_err();
        assert!(matches!(err, Error::Completion(_)));
        assert!(session.history()[1].is_failed());
    }

    #[tokio::test]
    async fn failed_replies_are_replayed_in_order() {
        let provider = ScriptedProvider::replying(vec![
            Err(Error::custom("boom")),
            Ok("fine".to_string()),
        ]);
        let manager = manager(provider.clone());
        let mut session = grounded_session("text");

        let _ = manager.submit(&mut session, "q0").await;
        manager.submit(&mut session, "q1").await.expect("reply");

        let second = &provider.requests()[1];
        let contents: Vec<&str> = second.messages[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["q0", "Completion provider error: boom", "q1"]
        );
        assert_eq!(second.messages[2].role, Role::Assistant);
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn prompt_history_is_windowed() {
        let provider = ScriptedProvider::replying(vec![]);
        let options = ChatOptions {
            history_window: 4,
            ..ChatOptions::default()
        };
        let manager = ConversationManager::new(provider.clone(), options);
        let mut session = grounded_session("text");

        for question in ["q0", "q1", "q2", "q3", "q4"] {
            manager.submit(&mut session, question).await.expect("reply");
        }

        // Nine exchanges precede the last call; the window of four would
        // open on an assistant turn, so it starts at the next question.
        let last = provider.requests().pop().expect("requests");
        let contents: Vec<&str> = last.messages[1..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["q3", "default reply", "q4"]);
        assert_eq!(session.history().len(), 10);
    }

    #[tokio::test]
    async fn zero_window_replays_everything() {
        let provider = ScriptedProvider::replying(vec![]);
        let options = ChatOptions {
            history_window: 0,
            ..ChatOptions::default()
        };
        let manager = ConversationManager::new(provider.clone(), options);
        let mut session = grounded_session("text");

        for question in ["q0", "q1", "q2"] {
            manager.submit(&mut session, question).await.expect("reply");
        }

        let last = provider.requests().pop().expect("requests");
        assert_eq!(last.messages.len(), 1 + 5);
    }

    #[tokio::test]
    async fn stalled_provider_times_out_into_history() {
        let options = ChatOptions {
            timeout: Duration::from_millis(20),
            ..ChatOptions::default()
        };
        let manager = ConversationManager::new(Arc::new(StalledProvider), options);
        let mut session = grounded_session("text");

        let err = manager.submit(&mut session, "hello?").await.unwrap_err();
        assert!(matches!(&err, Error::Completion(text) if text.contains("no reply within")));
        assert_eq!(session.history().len(), 2);
        assert!(session.history()[1].is_failed());
    }

    #[test]
    fn assemble_prompt_requires_grounding() {
        let manager = manager(ScriptedProvider::replying(vec![]));
        assert!(matches!(
            manager.assemble_prompt(&Session::new()),
            Err(Error::NoGroundingAvailable)
        ));
    }
}
