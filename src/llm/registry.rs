//! Known LLM services and endpoint resolution.
//!
//! A configured endpoint is matched against the service table by hostname
//! first, so a provider's own domain always gets its specific headers. Hosts
//! that are not recognized fall back to the first service speaking the
//! declared protocol.

use std::fmt;
use std::str::FromStr;

use tracing::debug;
use url::Url;

use crate::error::LlmError;

/// Wire protocol family spoken by an LLM service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    /// Ollama `/api/generate` with NDJSON streaming.
    Ollama,
    /// OpenAI-style chat completions with SSE streaming.
    OpenAiCompatible,
}

impl ProtocolKind {
    /// Name used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::Ollama => "ollama",
            ProtocolKind::OpenAiCompatible => "openai",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProtocolKind::Ollama),
            "openai" => Ok(ProtocolKind::OpenAiCompatible),
            _ => Err(LlmError::UnsupportedProtocol(s.to_string())),
        }
    }
}

/// How the API key is written into the auth header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Bearer <key>`
    Bearer,
    /// The key itself, e.g. for vendor key headers like `x-api-key`.
    RawKey,
}

/// Header carrying the API key for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    pub name: String,
    pub scheme: AuthScheme,
}

impl AuthHeader {
    /// Header value for `api_key` under this scheme.
    pub fn value_for(&self, api_key: &str) -> String {
        match self.scheme {
            AuthScheme::Bearer => format!("Bearer {api_key}"),
            AuthScheme::RawKey => api_key.to_string(),
        }
    }
}

/// Endpoint conventions of one LLM service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub protocol: ProtocolKind,
    pub hostname: String,
    pub api_path: String,
    pub default_headers: Vec<(String, String)>,
    pub auth: Option<AuthHeader>,
}

impl ServiceDescriptor {
    fn builtin(
        name: &str,
        protocol: ProtocolKind,
        hostname: &str,
        api_path: &str,
        default_headers: &[(&str, &str)],
        auth: Option<(&str, AuthScheme)>,
    ) -> Self {
        Self {
            name: name.to_string(),
            protocol,
            hostname: hostname.to_string(),
            api_path: api_path.to_string(),
            default_headers: default_headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            auth: auth.map(|(name, scheme)| AuthHeader {
                name: name.to_string(),
                scheme,
            }),
        }
    }
}

/// Ordered table of service descriptors.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    services: Vec<ServiceDescriptor>,
}

impl ServiceRegistry {
    /// Create a registry from a custom table. Order is the match order.
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    /// The services this tool knows out of the box.
    pub fn builtin() -> Self {
        use AuthScheme::{Bearer, RawKey};
        use ProtocolKind::{Ollama, OpenAiCompatible};

        let bearer = Some(("Authorization", Bearer));
        Self::new(vec![
            ServiceDescriptor::builtin("ollama", Ollama, "localhost", "/api/generate", &[], None),
            ServiceDescriptor::builtin(
                "openai",
                OpenAiCompatible,
                "api.openai.com",
                "/chat/completions",
                &[],
                bearer,
            ),
            ServiceDescriptor::builtin(
                "aliyun",
                OpenAiCompatible,
                "dashscope.aliyuncs.com",
                "/chat/completions",
                &[],
                bearer,
            ),
            ServiceDescriptor::builtin(
                "anthropic",
                OpenAiCompatible,
                "api.anthropic.com",
                "/chat/completions",
                &[("anthropic-version", "2023-06-01")],
                Some(("x-api-key", RawKey)),
            ),
            ServiceDescriptor::builtin(
                "tencent",
                OpenAiCompatible,
                "api.hunyuan.cloud.tencent.com",
                "/chat/completions",
                &[],
                bearer,
            ),
            ServiceDescriptor::builtin(
                "deepseek",
                OpenAiCompatible,
                "api.deepseek.com",
                "/chat/completions",
                &[],
                bearer,
            ),
            ServiceDescriptor::builtin(
                "siliconflow",
                OpenAiCompatible,
                "api.siliconflow.cn",
                "/chat/completions",
                &[],
                bearer,
            ),
        ])
    }

    /// Descriptors in match order.
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Pick the service for `endpoint`.
    ///
    /// An exact hostname match wins over a protocol match; within each pass
    /// the first entry in table order is chosen. The declared `protocol` is
    /// only parsed when no hostname matches, since a matched service brings
    /// its own protocol.
    ///
    /// # Errors
    ///
    /// * `InvalidUrl` if the endpoint cannot be parsed or has no host
    /// * `UnsupportedProtocol` if the host is unknown and `protocol` is not
    ///   a known protocol name
    /// * `Resolution` if neither pass finds a service
    pub fn resolve(&self, endpoint: &str, protocol: &str) -> Result<&ServiceDescriptor, LlmError> {
        let url = parse_endpoint(endpoint)?;
        let host = url.host_str().unwrap_or_default();

        if let Some(service) = self.services.iter().find(|s| s.hostname == host) {
            debug!(service = %service.name, host, "resolved LLM service by hostname");
            return Ok(service);
        }

        let protocol: ProtocolKind = protocol.parse()?;
        if let Some(service) = self.services.iter().find(|s| s.protocol == protocol) {
            debug!(service = %service.name, %protocol, "resolved LLM service by protocol");
            return Ok(service);
        }

        Err(LlmError::Resolution {
            endpoint: endpoint.to_string(),
            protocol: protocol.to_string(),
        })
    }
}

/// Parse an endpoint URL, requiring a host.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url, LlmError> {
    let url = Url::parse(endpoint).map_err(|e| LlmError::InvalidUrl {
        url: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(LlmError::InvalidUrl {
            url: endpoint.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}
