use async_trait::async_trait;
use tracing::{debug, trace};

use crate::llm::{Completer, CompletionError, CompletionRequest, CompletionResponse};

/// Default endpoint prefix for the OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Completer calling the OpenAI Responses API over HTTP.
#[derive(Clone, Debug)]
pub struct OpenAiResponses {
    /// Base URL such as `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub api_key: String,
    client: reqwest::Client,
}

impl OpenAiResponses {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Completer for OpenAiResponses {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let url = self.endpoint();
        trace!(target: "llm", %url, model = %request.model, messages = request.messages.len(), "sending request");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| CompletionError::Remote(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CompletionError::Remote(e.to_string()))?;
        if !status.is_success() {
            debug!(target: "llm", %status, body = %body, "request failed");
            return Err(CompletionError::from_message(format!(
                "Error code: {} - {}",
                status.as_u16(),
                body
            )));
        }
        debug!(target: "llm", bytes = body.len(), "response received");
        serde_json::from_str(&body)
            .map_err(|e| CompletionError::Remote(format!("malformed response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAiResponses::new("http://localhost:1234/v1/", "k");
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/responses");
    }
}
