//! Error types for the completion pipeline using thiserror.

use thiserror::Error;

/// Errors from generating a commit message through an LLM endpoint.
///
/// Every variant is terminal for the call. Malformed stream records are not
/// represented here: the decoder skips them.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM API URL is not configured. Set `url` in the config file or pass --url")]
    ConfigMissing,

    #[error("Invalid LLM API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("No matching LLM service found for URL {endpoint} and protocol {protocol}")]
    Resolution { endpoint: String, protocol: String },

    #[error("Unsupported protocol: {0} (expected \"ollama\" or \"openai\")")]
    UnsupportedProtocol(String),

    #[error("Invalid value for header '{name}'")]
    InvalidHeader { name: String },

    #[error("Failed to serialize request body: {0}")]
    Marshal(#[source] serde_json::Error),

    #[error("Failed to send HTTP request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API authentication failed (HTTP 401). Check your API key")]
    AuthFailure,

    #[error("API request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to read streaming response: {0}")]
    StreamRead(#[source] reqwest::Error),

    #[error("No commit message generated")]
    EmptyResult,

    #[error("Generation cancelled")]
    Cancelled,

    #[error(
        "Prompt size ({size} bytes) exceeds maximum allowed size ({max} bytes). \
         Consider reducing the size of staged changes or splitting into multiple commits."
    )]
    PromptTooLarge { size: usize, max: usize },
}
