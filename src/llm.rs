use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use thiserror::Error;

use crate::turn::Turn;

/// Reply used when the model answered without any text.
pub const NO_TEXT_FALLBACK: &str = "(model returned no text output)";

/// A single `{role, content}` entry of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role().as_str().to_string(),
            content: turn.text().to_string(),
        }
    }
}

/// Request sent to a [`Completer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    #[serde(rename = "input")]
    pub messages: Vec<ChatMessage>,
}

/// One content fragment of an output item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputContent {
    #[serde(default, rename = "type", deserialize_with = "string_or_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub text: Option<String>,
}

/// One entry of the structured `output` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(default, deserialize_with = "list_or_empty")]
    pub content: Vec<OutputContent>,
}

/// Subset of a Responses API payload needed to recover the reply text.
///
/// Fields of unexpected shape read as absent rather than failing the
/// whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    /// Aggregated text, when the provider supplies it.
    #[serde(default, deserialize_with = "string_or_none")]
    pub output_text: Option<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub output: Vec<OutputItem>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Decode a list, dropping elements that do not fit `T`. Anything other
/// than an array reads as empty.
fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl CompletionResponse {
    /// Response carrying only an aggregated text field.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            output_text: Some(text.into()),
            output: Vec::new(),
        }
    }

    /// Plain reply text.
    ///
    /// A non-empty `output_text` wins. Otherwise every `output_text`/`text`
    /// fragment in `output` is joined with newlines. If neither yields text
    /// [`NO_TEXT_FALLBACK`] is returned.
    pub fn text(&self) -> String {
        if let Some(out) = self.output_text.as_deref().map(str::trim) {
            if !out.is_empty() {
                return out.to_string();
            }
        }
        let joined = self
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|c| matches!(c.kind.as_deref(), Some("output_text" | "text")))
            .filter_map(|c| c.text.as_deref().map(str::trim))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if joined.is_empty() {
            NO_TEXT_FALLBACK.to_string()
        } else {
            joined
        }
    }
}

/// Failure reported by a [`Completer`].
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The account has no remaining quota or billing is not set up.
    #[error("API quota exhausted or billing not enabled: {0}")]
    QuotaExceeded(String),
    #[error("{0}")]
    Remote(String),
}

impl CompletionError {
    /// Classify a raw provider error message.
    pub fn from_message(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.contains("insufficient_quota") || msg.contains("exceeded your current quota") {
            CompletionError::QuotaExceeded(msg)
        } else {
            CompletionError::Remote(msg)
        }
    }
}

/// Remote chat-completion collaborator.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;
}

/// Completer replying with a fixed text and remembering every request.
#[derive(Debug, Default)]
pub struct StaticCompleter {
    reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StaticCompleter {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Completer for StaticCompleter {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }
        Ok(CompletionResponse::from_text(self.reply.clone()))
    }
}
