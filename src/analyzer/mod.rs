//! Command analysis
//!
//! Sends the raw command to a hosted chat-completion model and turns the
//! reply into an [`AnalyzedCommand`]. By default the reply is passed through
//! as an `echo` intent; structured intent parsing is opt-in.

use serde::{Deserialize, Serialize};

pub mod openai;

use crate::config::LlmConfig;
use crate::error::IntegrationError;
use crate::module::{ModuleRegistry, Parameters};

pub use openai::OpenAiClient;

/// Fixed instruction sent ahead of every command
pub const SYSTEM_INSTRUCTION: &str = "You are an AI assistant that analyzes user commands and extracts structured information. Respond with JSON containing 'intent' and 'parameters'.";

/// Fallback intent that returns the model's text as-is
pub const ECHO_INTENT: &str = "echo";

/// Intent and parameters extracted from a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedCommand {
    pub intent: String,
    pub parameters: Parameters,
}

impl AnalyzedCommand {
    pub fn echo(message: impl Into<String>) -> Self {
        Self {
            intent: ECHO_INTENT.to_string(),
            parameters: Parameters::from([("message".to_string(), message.into())]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat-completion request body
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Anything that can answer a chat-completion request
pub trait CompletionClient: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, IntegrationError>;
}

pub struct CommandAnalyzer {
    client: Box<dyn CompletionClient>,
    model: String,
    temperature: f32,
    structured: bool,
    catalog: Option<String>,
}

impl CommandAnalyzer {
    pub fn new(client: Box<dyn CompletionClient>, llm: &LlmConfig) -> Self {
        Self {
            client,
            model: llm.model.clone(),
            temperature: llm.temperature,
            structured: llm.structured_intents,
            catalog: None,
        }
    }

    /// Describe the registered modules to the model.
    /// Only used when structured intents are enabled.
    pub fn with_catalog(mut self, registry: &ModuleRegistry) -> Self {
        if self.structured {
            self.catalog = Some(module_catalog(registry));
        }
        self
    }

    pub fn build_request(&self, command: &str) -> CompletionRequest {
        let system = match &self.catalog {
            Some(catalog) => format!("{}\n\n{}", SYSTEM_INSTRUCTION, catalog),
            None => SYSTEM_INSTRUCTION.to_string(),
        };

        CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(&system), ChatMessage::user(command)],
            temperature: self.temperature,
        }
    }

    pub fn analyze(&self, command: &str) -> Result<AnalyzedCommand, IntegrationError> {
        let request = self.build_request(command);
        log::debug!("Sending {} messages to model {}", request.messages.len(), request.model);

        let response = self.client.complete(&request)?;
        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or(IntegrationError::NoChoices)?
            .message
            .content
            .ok_or(IntegrationError::EmptyContent)?;

        log::debug!("Model reply: {}", content);

        if self.structured {
            match parse_structured(&content) {
                Some(analyzed) => return Ok(analyzed),
                None => log::info!("Model reply had no usable intent JSON; falling back to echo"),
            }
        }

        Ok(AnalyzedCommand::echo(content))
    }
}

/// Pull `{intent, parameters}` out of a model reply that may wrap the JSON
/// in prose or code fences
fn parse_structured(reply: &str) -> Option<AnalyzedCommand> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(&reply[start..=end]).ok()?;
    let intent = value.get("intent")?.as_str()?.trim();
    if intent.is_empty() {
        return None;
    }

    let parameters = match value.get("parameters") {
        Some(serde_json::Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                (k.clone(), v)
            })
            .collect(),
        _ => Parameters::new(),
    };

    Some(AnalyzedCommand {
        intent: intent.to_string(),
        parameters,
    })
}

fn module_catalog(registry: &ModuleRegistry) -> String {
    let mut lines = vec!["Available intents:".to_string()];
    for module in registry.list() {
        let params: Vec<String> = module
            .required_parameters()
            .iter()
            .map(|(name, desc)| format!("{} ({})", name, desc))
            .collect();
        lines.push(format!(
            "- {}: {}. Parameters: {}",
            module.intent(),
            module.description(),
            params.join(", ")
        ));
    }
    lines.push(format!(
        "- {}: anything else; answer directly. Parameters: message (your reply)",
        ECHO_INTENT
    ));
    lines.join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Canned completion client that records requests
    pub(crate) struct FakeClient {
        reply: Result<Option<String>, String>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeClient {
        pub(crate) fn replying(content: &str) -> Self {
            Self {
                reply: Ok(Some(content.to_string())),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn without_choices() -> Self {
            Self {
                reply: Ok(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl CompletionClient for FakeClient {
        fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, IntegrationError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(Some(content)) => Ok(CompletionResponse {
                    choices: vec![Choice {
                        message: ChoiceMessage {
                            content: Some(content.clone()),
                        },
                    }],
                }),
                Ok(None) => Ok(CompletionResponse { choices: Vec::new() }),
                Err(message) => Err(IntegrationError::Request {
                    endpoint: "fake".to_string(),
                    message: message.clone(),
                }),
            }
        }
    }

    fn analyzer(client: FakeClient, structured: bool) -> CommandAnalyzer {
        let llm = LlmConfig {
            structured_intents: structured,
            ..LlmConfig::default()
        };
        CommandAnalyzer::new(Box::new(client), &llm)
    }

    #[test]
    fn test_request_shape() {
        let analyzer = analyzer(FakeClient::replying("hi"), false);
        let request = analyzer.build_request("remind me to stretch");

        assert_eq!(request.model, "gpt-3.5-turbo");
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0], ChatMessage::system(SYSTEM_INSTRUCTION));
        assert_eq!(request.messages[1], ChatMessage::user("remind me to stretch"));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "remind me to stretch");
    }

    #[test]
    fn test_default_mode_always_echoes() {
        let reply = r#"{"intent": "reminder", "parameters": {"task": "stretch", "time": "in 5 minutes"}}"#;
        let analyzer = analyzer(FakeClient::replying(reply), false);

        let analyzed = analyzer.analyze("remind me to stretch in 5 minutes").unwrap();
        assert_eq!(analyzed, AnalyzedCommand::echo(reply));
    }

    #[test]
    fn test_structured_mode_parses_intent() {
        let reply = "Sure!\n```json\n{\"intent\": \"reminder\", \"parameters\": {\"task\": \"stretch\", \"time\": \"in 5 minutes\", \"priority\": 2, \"note\": null}}\n```";
        let analyzer = analyzer(FakeClient::replying(reply), true);

        let analyzed = analyzer.analyze("remind me to stretch").unwrap();
        assert_eq!(analyzed.intent, "reminder");
        assert_eq!(analyzed.parameters["task"], "stretch");
        assert_eq!(analyzed.parameters["time"], "in 5 minutes");
        assert_eq!(analyzed.parameters["priority"], "2");
        assert!(!analyzed.parameters.contains_key("note"));
    }

    #[test]
    fn test_structured_mode_falls_back_to_echo() {
        let analyzer = analyzer(FakeClient::replying("The capital of France is Paris."), true);
        let analyzed = analyzer.analyze("capital of france?").unwrap();
        assert_eq!(analyzed, AnalyzedCommand::echo("The capital of France is Paris."));
    }

    #[test]
    fn test_no_choices_is_integration_error() {
        let analyzer = analyzer(FakeClient::without_choices(), false);
        let err = analyzer.analyze("hello").unwrap_err();
        assert!(matches!(err, IntegrationError::NoChoices));
    }

    #[test]
    fn test_client_error_propagates() {
        let analyzer = analyzer(FakeClient::failing("connection refused"), false);
        let err = analyzer.analyze("hello").unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_parse_structured_rejects_missing_intent() {
        assert!(parse_structured(r#"{"parameters": {"a": "b"}}"#).is_none());
        assert!(parse_structured(r#"{"intent": "  "}"#).is_none());
        assert!(parse_structured("} backwards {").is_none());

        let bare = parse_structured(r#"{"intent": "echo"}"#).unwrap();
        assert!(bare.parameters.is_empty());
    }
}
