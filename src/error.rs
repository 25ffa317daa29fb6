use thiserror::Error;

use crate::clipboard::ClipboardError;
use crate::llm::CompletionError;

/// Reasons a reply request did not produce a reply.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("clipboard is empty or not text")]
    EmptyClipboard,
    #[error("message is empty")]
    EmptyMessage,
    #[error("text too long, shorten first")]
    TextTooLong { len: usize, limit: usize },
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error("API quota exhausted or billing not enabled, check the OpenAI platform account")]
    QuotaExceeded(String),
    #[error("completion request failed: {0}")]
    Remote(String),
    #[error("failed to persist sessions: {0}")]
    Persist(#[from] std::io::Error),
}

impl ReplyError {
    /// Whether the request was refused before anything was sent or stored.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            ReplyError::EmptyClipboard | ReplyError::EmptyMessage | ReplyError::TextTooLong { .. }
        )
    }
}

impl From<CompletionError> for ReplyError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::QuotaExceeded(msg) => ReplyError::QuotaExceeded(msg),
            CompletionError::Remote(msg) => ReplyError::Remote(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_keep_their_own_message() {
        let err: ReplyError = CompletionError::from_message("insufficient_quota").into();
        assert!(matches!(err, ReplyError::QuotaExceeded(_)));
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn remote_errors_surface_raw_message() {
        let err: ReplyError = CompletionError::from_message("model not found").into();
        assert_eq!(err.to_string(), "completion request failed: model not found");
    }

    #[test]
    fn too_long_message() {
        let err = ReplyError::TextTooLong {
            len: 4001,
            limit: 4000,
        };
        assert_eq!(err.to_string(), "text too long, shorten first");
        assert!(err.is_input());
    }
}
