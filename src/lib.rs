//! git-commitx - LLM-Generated Git Commit Messages
//!
//! This library turns staged git changes into a commit message by streaming
//! a completion from an Ollama or OpenAI-compatible LLM service.
//!
//! # Modules
//!
//! - [`config`] - Configuration file loading and command-line overrides
//! - [`error`] - Error type of the completion pipeline
//! - [`git`] - Git operations (staged files, diff, commit)
//! - [`llm`] - Service resolution, request building, streaming decode
//! - [`output`] - Output structures for JSON formatting
//! - [`prompt`] - Prompt template rendering and size limits
//!
//! # Example
//!
//! ```no_run
//! use git_commitx::{config::load_config, git, llm::generate_message};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = load_config("commitx.toml")?;
//! let root = git::repo_root(&std::env::current_dir()?)?;
//! let files = git::staged_files(&root)?;
//! let diff = git::staged_diff(&root, &files)?;
//! let result = generate_message(&config, &files, &diff, &CancellationToken::new(), |_| {}).await?;
//! println!("Generated message: {}", result.content);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod output;
pub mod prompt;
