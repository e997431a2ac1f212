//! Streaming LLM completion for commit message generation.
//!
//! One call runs the whole pipeline: render the prompt, resolve the service
//! for the configured endpoint, build the protocol-specific body, send it,
//! decode the streamed response, and aggregate the deltas.

pub mod aggregate;
pub mod decoder;
pub mod registry;
pub mod request;
pub mod transport;

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use aggregate::{AggregationResult, Aggregator, aggregate};
pub use decoder::{DeltaEvent, StreamDecoder};
pub use registry::{AuthHeader, AuthScheme, ProtocolKind, ServiceDescriptor, ServiceRegistry};
pub use request::{GenerationParameters, ProtocolRequest};
pub use transport::Transport;

use crate::config::Config;
use crate::error::LlmError;
use crate::prompt::render_prompt;

/// Generate a commit message for the staged `files` and `diff`.
///
/// `on_delta` sees every decoded event in arrival order, which lets the
/// caller echo the response while it streams in. Cancelling `cancel` aborts
/// the request or the read in flight and drops the response.
///
/// # Errors
///
/// See [`LlmError`]; every failure is terminal and nothing is retried.
///
/// # Example
///
/// ```no_run
/// use git_commitx::{config::Config, llm::generate_message};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let config = Config::default();
/// let files = vec!["src/lib.rs".to_string()];
/// let result = generate_message(&config, &files, "+fn x() {}", &CancellationToken::new(), |_| {})
///     .await?;
/// println!("{}", result.content);
/// # Ok(())
/// # }
/// ```
pub async fn generate_message(
    config: &Config,
    files: &[String],
    diff: &str,
    cancel: &CancellationToken,
    on_delta: impl FnMut(&DeltaEvent),
) -> Result<AggregationResult, LlmError> {
    generate_message_with(&ServiceRegistry::builtin(), config, files, diff, cancel, on_delta).await
}

/// [`generate_message`] against a caller-supplied service table.
pub async fn generate_message_with(
    registry: &ServiceRegistry,
    config: &Config,
    files: &[String],
    diff: &str,
    cancel: &CancellationToken,
    mut on_delta: impl FnMut(&DeltaEvent),
) -> Result<AggregationResult, LlmError> {
    let endpoint = config.url.trim();
    if endpoint.is_empty() {
        return Err(LlmError::ConfigMissing);
    }
    let prompt_text = render_prompt(&config.prompt, files, diff, config.max_prompt_size)?;

    let service = registry.resolve(endpoint, &config.protocol)?;
    let params = GenerationParameters {
        model: config.model.clone(),
        system_text: config.system.clone(),
        prompt_text,
        temperature: config.temperature,
        top_p: config.top_p,
        max_tokens: config.max_tokens,
    };
    let body = ProtocolRequest::build(service.protocol, &params).to_bytes()?;

    let transport = Transport::new(config.timeout_secs.map(Duration::from_secs))?;
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(LlmError::Cancelled),
        sent = transport.send(service, endpoint, config.api_key.as_deref(), body) => sent?,
    };

    let mut decoder = StreamDecoder::new(service.protocol);
    let mut aggregator = Aggregator::new();
    let mut chunks = std::pin::pin!(response.bytes_stream());

    while !decoder.is_done() {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            next = chunks.next() => next,
        };
        let events = match next {
            Some(Ok(chunk)) => decoder.feed(&chunk),
            Some(Err(e)) => return Err(LlmError::StreamRead(e)),
            None => decoder.finish(),
        };
        for event in events {
            on_delta(&event);
            aggregator.push(event);
        }
    }
    debug!(service = %service.name, "completion stream finished");

    aggregator.finish()
}
