//! Configuration management for git-commitx
//!
//! This module handles loading and parsing configuration files in TOML format.
//! Every field has a default, so a missing file or a partial file is fine;
//! command-line flags are layered on top with [`Config::apply_overrides`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::prompt::DEFAULT_MAX_PROMPT_SIZE;

/// File name looked up in the platform config directory
const CONFIG_FILE: &str = "git-commitx/config.toml";

/// LLM configuration file structure
///
/// # Example TOML
///
/// ```toml
/// url = "http://localhost:11434/api/generate"
/// model = "qwen2.5-coder"
/// protocol = "ollama"
/// prompt = """
/// Write a commit message for these files:
/// ${files}
///
/// Changes:
/// ${diff}
/// """
///
/// # Optional: abort requests that take longer than this many seconds
/// timeout_secs = 120
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM API endpoint
    pub url: String,
    pub model: String,
    /// Prompt template with `${files}` and `${diff}` placeholders
    pub prompt: String,
    /// System instruction sent alongside the prompt
    pub system: String,
    pub temperature: f64,
    pub top_p: f64,
    /// Protocol used when the endpoint host is not a known service
    pub protocol: String,
    pub max_tokens: u32,
    pub api_key: Option<String>,
    /// Maximum rendered prompt size in bytes
    pub max_prompt_size: usize,
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions".to_string(),
            model: "deepseek-v3".to_string(),
            prompt: "Generate a Git commit message for the following changes, formatted as \
                     <type>: <description>.\nFiles:\n${files}\nChanges:\n${diff}"
                .to_string(),
            system: "The title line is formatted as <type>: <description> and must not exceed \
                     50 characters. After a blank line, write the body as a Markdown bullet \
                     list, each point under 70 characters. Output only the commit message."
                .to_string(),
            temperature: 0.7,
            top_p: 0.9,
            protocol: "openai".to_string(),
            max_tokens: 2048,
            api_key: None,
            max_prompt_size: DEFAULT_MAX_PROMPT_SIZE,
            timeout_secs: None,
        }
    }
}

/// Values supplied on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub system: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub protocol: Option<String>,
    pub max_tokens: Option<u32>,
    pub api_key: Option<String>,
}

impl Config {
    /// Replace file values with any values given on the command line
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        let Overrides {
            url,
            model,
            prompt,
            system,
            temperature,
            top_p,
            protocol,
            max_tokens,
            api_key,
        } = overrides;

        if let Some(v) = url {
            self.url = v;
        }
        if let Some(v) = model {
            self.model = v;
        }
        if let Some(v) = prompt {
            self.prompt = v;
        }
        if let Some(v) = system {
            self.system = v;
        }
        if let Some(v) = temperature {
            self.temperature = v;
        }
        if let Some(v) = top_p {
            self.top_p = v;
        }
        if let Some(v) = protocol {
            self.protocol = v;
        }
        if let Some(v) = max_tokens {
            self.max_tokens = v;
        }
        if api_key.is_some() {
            self.api_key = api_key;
        }
    }
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// * File does not exist
/// * Invalid TOML format
/// * Prompt field is empty or whitespace-only
///
/// # Example
///
/// ```no_run
/// use git_commitx::config::load_config;
///
/// # fn main() -> anyhow::Result<()> {
/// let config = load_config("commitx.toml")?;
/// println!("Model: {}", config.model);
/// # Ok(())
/// # }
/// ```
pub fn load_config(config_path: impl AsRef<Path>) -> Result<Config> {
    let config_path = config_path.as_ref();
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: Config = toml::from_str(&content).context("Failed to parse config file as TOML")?;

    // Validate prompt is not empty or whitespace-only
    if config.prompt.trim().is_empty() {
        anyhow::bail!(
            "Configuration error: 'prompt' field cannot be empty or whitespace-only. \
             Please provide a valid prompt template in {}",
            config_path.display()
        );
    }

    Ok(config)
}

/// Default config file location, e.g. `~/.config/git-commitx/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Load `path` if given, else the default file if it exists, else defaults
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => load_config(path),
            None => Ok(Config::default()),
        },
    }
}
