//! Error taxonomy
//!
//! Validation errors stay inside a module and become error envelopes.
//! Integration errors are caught once at the agent boundary.
//! Startup errors are fatal and end the process before the loop starts.

use thiserror::Error;

/// Bad or missing input to a module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Could not parse time: {0}")]
    UnparseableTime(String),

    #[error("Reminder time must be in the future")]
    PastTime,
}

/// Failures talking to the hosted model
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("Model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode model response: {0}")]
    Decode(String),

    #[error("Invalid response from model API: no choices")]
    NoChoices,

    #[error("Invalid response from model API: empty message content")]
    EmptyContent,
}

/// Problems that prevent the assistant from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("API key is not set. Export {var} or add it to a .env file.")]
    MissingApiKey { var: String },

    #[error("Failed to start background runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
