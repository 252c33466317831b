//! OpenAI-compatible chat-completion client

use std::time::Duration;

use super::{CompletionClient, CompletionRequest, CompletionResponse};
use crate::config::LlmConfig;
use crate::error::IntegrationError;

pub struct OpenAiClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(llm: &LlmConfig, api_key: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(llm.timeout_secs.map(Duration::from_secs))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            endpoint: format!("{}/chat/completions", llm.base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, IntegrationError> {
        let request_failed = |message: String| IntegrationError::Request {
            endpoint: self.endpoint.clone(),
            message,
        };

        let body = serde_json::to_string(request).map_err(|e| request_failed(e.to_string()))?;

        log::info!("POST {} (model {})", self.endpoint, request.model);
        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(body.as_bytes())
            .map_err(|e| request_failed(e.to_string()))?;

        let status = response.status();
        let response_body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| request_failed(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            log::warn!("Model API returned {}", status);
            return Err(IntegrationError::Status {
                status: status.as_u16(),
                body: response_body,
            });
        }

        serde_json::from_str(&response_body).map_err(|e| IntegrationError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let llm = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        };
        let client = OpenAiClient::new(&llm, "sk-test");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_unreachable_endpoint_is_request_error() {
        let llm = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: Some(2),
            ..LlmConfig::default()
        };
        let client = OpenAiClient::new(&llm, "sk-test");
        let request = CompletionRequest {
            model: llm.model.clone(),
            messages: Vec::new(),
            temperature: llm.temperature,
        };

        let err = client.complete(&request).unwrap_err();
        assert!(matches!(err, IntegrationError::Request { .. }));
    }

    #[test]
    fn test_response_decoding() {
        let body = r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}}]}"#;
        let response: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hello"));

        let empty: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }
}
