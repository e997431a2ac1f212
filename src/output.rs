//! Output structures for JSON formatting
//!
//! This module provides structures for serializing generated commit messages
//! into JSON format for programmatic consumption.

use serde::Serialize;

use crate::llm::AggregationResult;

/// Generated commit for JSON output
///
/// # Example
///
/// ```
/// use git_commitx::output::GeneratedCommit;
///
/// let commit = GeneratedCommit {
///     message: "feat: add new feature".to_string(),
///     files: vec!["src/lib.rs".to_string()],
///     reasoning: None,
/// };
///
/// let json = serde_json::to_string(&commit).unwrap();
/// assert_eq!(json, r#"{"message":"feat: add new feature","files":["src/lib.rs"]}"#);
/// ```
#[derive(Debug, Serialize)]
pub struct GeneratedCommit {
    /// The generated commit message content
    pub message: String,
    /// Staged files the message describes
    pub files: Vec<String>,
    /// Reasoning trace, when the model produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl GeneratedCommit {
    pub fn new(result: AggregationResult, files: Vec<String>) -> Self {
        let reasoning = Some(result.reasoning).filter(|r| !r.is_empty());
        Self {
            message: result.content,
            files,
            reasoning,
        }
    }
}
