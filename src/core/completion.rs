use crate::error::{Error, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::responses::{
        CreateResponseArgs, EasyInputMessageArgs, InputItem, InputParam, OutputItem,
        OutputMessageContent, Role as ResponseRole,
    },
};
use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("system")]
    System,
    #[display("user")]
    User,
    #[display("assistant")]
    Assistant,
}

/// One role-tagged turn sent to the completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// A service that continues a dialogue with one text reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Completions through the OpenAI Responses API. The API key is read from
/// `OPENAI_API_KEY` by the client.
#[derive(Clone)]
pub struct OpenAiCompletions {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompletions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let mut items = Vec::with_capacity(request.messages.len());
        for message in request.messages {
            items.push(InputItem::EasyMessage(
                EasyInputMessageArgs::default()
                    .role(response_role(message.role))
                    .content(message.content)
                    .build()?,
            ));
        }

        let request = CreateResponseArgs::default()
            .model(self.model.as_str())
            .temperature(request.temperature)
            .max_output_tokens(request.max_output_tokens)
            .input(InputParam::Items(items))
            .build()?;

        let response = self.client.responses().create(request).await?;

        let mut content = String::new();
        for output in response.output {
            if let OutputItem::Message(out) = output {
                for c in out.content {
                    match c {
                        OutputMessageContent::OutputText(text) => content.push_str(&text.text),
                        other => debug!("Skipping non-text output content: {other:?}"),
                    }
                }
            }
        }

        if content.trim().is_empty() {
            return Err(Error::custom("model returned an empty reply"));
        }
        Ok(content)
    }
}

fn response_role(role: Role) -> ResponseRole {
    match role {
        Role::System => ResponseRole::System,
        Role::User => ResponseRole::User,
        Role::Assistant => ResponseRole::Assistant,
    }
}
