//! CLI tool to generate git commit messages with an LLM
//!
//! This tool analyzes staged git changes, streams a commit message from the
//! configured LLM service, and hands it to `git commit` for review.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use git_commitx::{
    config::{Overrides, resolve_config},
    git::{repo_root, run_git_commit, staged_diff, staged_files, write_commit_message},
    llm::{DeltaEvent, generate_message},
    output::GeneratedCommit,
};

/// Command-line arguments
#[derive(Parser)]
#[command(name = "git-commitx")]
#[command(about = "Generate git commit messages from staged changes using an LLM", long_about = None)]
struct Args {
    /// Output in JSON format (git commit will not be executed)
    #[arg(long)]
    json: bool,

    /// Path to the configuration file (TOML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// LLM API URL
    #[arg(long)]
    url: Option<String>,

    /// LLM model name
    #[arg(long)]
    model: Option<String>,

    /// Prompt template; ${files} and ${diff} are replaced with the staged changes
    #[arg(long)]
    prompt: Option<String>,

    /// System instruction for the LLM
    #[arg(long)]
    system: Option<String>,

    /// Temperature parameter for the LLM
    #[arg(long)]
    temperature: Option<f64>,

    /// Top-p parameter for the LLM
    #[arg(long)]
    top_p: Option<f64>,

    /// LLM API protocol (ollama or openai)
    #[arg(long)]
    protocol: Option<String>,

    /// Maximum tokens for the LLM response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// API key for the LLM service
    #[arg(long, env = "GIT_COMMITX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            model: self.model.clone(),
            prompt: self.prompt.clone(),
            system: self.system.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            protocol: self.protocol.clone(),
            max_tokens: self.max_tokens,
            api_key: self.api_key.clone(),
        }
    }
}

/// Main entry point
///
/// # Process flow
///
/// 1. Parse command-line arguments and load configuration
/// 2. Collect staged files and their diffs
/// 3. Stream the commit message from the LLM (echoed live unless `--json`)
/// 4. Output as JSON or write the message file and execute git commit
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = resolve_config(args.config.as_deref())?;
    config.apply_overrides(args.overrides());

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let root = repo_root(&cwd)?;

    let files = staged_files(&root)?;
    if files.is_empty() {
        println!("No staged files found. Add files to the staging area first (git add).");
        return Ok(());
    }
    let diff = staged_diff(&root, &files)?;

    if !args.json {
        println!("Found {} staged file(s).\n", files.len());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let echo = !args.json;
    let result = generate_message(&config, &files, &diff, &cancel, |event| {
        if echo {
            echo_delta(event);
        }
    })
    .await
    .context("Error generating commit message")?;

    if args.json {
        let output = GeneratedCommit::new(result, files);
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("\n\n------------------------");
    println!("Staged files:");
    for file in &files {
        println!("- {}", file);
    }
    println!("\nGenerated commit message:");
    println!("------------------------");
    println!("{}", result.content);
    println!("------------------------\n");

    let msg_file = write_commit_message(&root, &result.content)?;
    println!("Commit message has been written to {}", msg_file.display());
    println!("Launching git commit...\n");
    run_git_commit(&root, &msg_file)?;

    Ok(())
}

/// Print a streamed fragment as it arrives
fn echo_delta(event: &DeltaEvent) {
    let mut stdout = io::stdout().lock();
    let written = match event {
        DeltaEvent::Content(text) | DeltaEvent::Reasoning(text) => write!(stdout, "{}", text),
        DeltaEvent::Done => Ok(()),
    };
    if written.is_ok() {
        let _ = stdout.flush();
    }
}
