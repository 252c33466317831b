//! Uniform result envelope returned by every module and by the agent

use serde::{Deserialize, Serialize};

/// Outcome of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, message|data, module?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Envelope {
    /// Success carrying a plain message
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            data: None,
            module: None,
        }
    }

    /// Success carrying structured data
    pub fn success_data(data: serde_json::Value) -> Self {
        Self {
            status: Status::Success,
            message: None,
            data: Some(data),
            module: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
            module: None,
        }
    }

    /// Tag the envelope with the producing module
    pub fn with_module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Best human-readable text for this envelope.
    ///
    /// Prefers `message`, then `data.message`, then the data itself.
    pub fn display_text(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }

        match &self.data {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(data) => {
                let mut lines = Vec::new();
                if let Some(message) = data.get("message").and_then(|v| v.as_str()) {
                    lines.push(message.to_string());
                }
                if let Some(obj) = data.as_object() {
                    for (key, value) in obj {
                        if key == "message" {
                            continue;
                        }
                        let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                        lines.push(format!("{}: {}", key, value));
                    }
                }
                if lines.is_empty() {
                    data.to_string()
                } else {
                    lines.join("\n")
                }
            }
            None => "No message provided".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_serialization_shape() {
        let envelope = Envelope::error("No module found for intent: weather");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({"status": "error", "message": "No module found for intent: weather"})
        );
    }

    #[test]
    fn test_success_data_with_module() {
        let envelope = Envelope::success_data(json!({"task": "call mom"})).with_module("reminder");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["task"], "call mom");
        assert_eq!(value["module"], "reminder");
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_display_text_prefers_nested_message() {
        let envelope = Envelope::success_data(json!({
            "message": "Reminder set for 2026-10-18 15:00:00",
            "task": "stretch"
        }));
        let text = envelope.display_text();
        assert!(text.starts_with("Reminder set for 2026-10-18 15:00:00"));
        assert!(text.contains("task: stretch"));
    }

    #[test]
    fn test_display_text_without_payload() {
        let envelope = Envelope {
            status: Status::Success,
            message: None,
            data: None,
            module: None,
        };
        assert_eq!(envelope.display_text(), "No message provided");
    }
}
