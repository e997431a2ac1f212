//! Provider-specific request bodies.

use serde::Serialize;

use crate::error::LlmError;
use crate::llm::registry::ProtocolKind;

/// Sampling and prompt inputs for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParameters {
    pub model: String,
    pub system_text: String,
    pub prompt_text: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

/// Chat message in an OpenAI-style request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Ollama sampling options.
///
/// Reference: <https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OllamaOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: u32,
}

/// Serializable request body, one shape per protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProtocolRequest {
    Ollama {
        model: String,
        system: String,
        prompt: String,
        options: OllamaOptions,
        stream: bool,
    },
    Chat {
        model: String,
        messages: Vec<ChatMessage>,
        temperature: f64,
        top_p: f64,
        max_tokens: u32,
        stream: bool,
    },
}

impl ProtocolRequest {
    /// Build the streaming request body for `protocol`.
    pub fn build(protocol: ProtocolKind, params: &GenerationParameters) -> Self {
        match protocol {
            ProtocolKind::Ollama => ProtocolRequest::Ollama {
                model: params.model.clone(),
                system: params.system_text.clone(),
                prompt: params.prompt_text.clone(),
                options: OllamaOptions {
                    temperature: params.temperature,
                    top_p: params.top_p,
                    num_predict: params.max_tokens,
                },
                stream: true,
            },
            ProtocolKind::OpenAiCompatible => ProtocolRequest::Chat {
                model: params.model.clone(),
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: params.system_text.clone(),
                    },
                    ChatMessage {
                        role: "user",
                        content: params.prompt_text.clone(),
                    },
                ],
                temperature: params.temperature,
                top_p: params.top_p,
                max_tokens: params.max_tokens,
                stream: true,
            },
        }
    }

    /// Serialize to the JSON bytes sent on the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LlmError> {
        serde_json::to_vec(self).map_err(LlmError::Marshal)
    }
}
