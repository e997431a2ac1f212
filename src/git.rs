//! Git operations for commit message generation
//!
//! This module provides functions to interact with git:
//! - Locate the repository root
//! - List staged files and collect their diffs
//! - Write commit messages
//! - Execute git commit with editor

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File inside the git directory holding the generated message
const COMMIT_MSG_FILE: &str = "COMMIT_MSG_GENERATED";

/// Run git in `dir` and return its stdout
fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .context("Failed to execute git command. Make sure git is installed and in PATH")?;

    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Find the root of the repository containing `dir`
///
/// # Errors
///
/// * `dir` is not inside a git repository
pub fn repo_root(dir: &Path) -> Result<PathBuf> {
    let root = git_output(dir, &["rev-parse", "--show-toplevel"]).context(
        "No git repository found. Run this command inside a repository or use 'git init' first",
    )?;
    Ok(PathBuf::from(root.trim()))
}

/// List the paths in the staging area, in git's order
///
/// # Example
///
/// ```no_run
/// use git_commitx::git::{repo_root, staged_files};
///
/// # fn main() -> anyhow::Result<()> {
/// let root = repo_root(&std::env::current_dir()?)?;
/// for file in staged_files(&root)? {
///     println!("- {}", file);
/// }
/// # Ok(())
/// # }
/// ```
pub fn staged_files(root: &Path) -> Result<Vec<String>> {
    let output = git_output(root, &["diff", "--name-only", "--cached"])
        .context("Failed to get staged files")?;
    Ok(parse_file_list(&output))
}

fn parse_file_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collect the staged diff of each file into one text block
///
/// Each file's diff is preceded by a `File: <path>` header line.
pub fn staged_diff(root: &Path, files: &[String]) -> Result<String> {
    let mut diff = String::new();
    for file in files {
        let file_diff = git_output(root, &["diff", "--cached", "--", file.as_str()])
            .with_context(|| format!("Failed to get diff for file {}", file))?;
        append_file_diff(&mut diff, file, &file_diff);
    }
    Ok(diff)
}

fn append_file_diff(diff: &mut String, file: &str, file_diff: &str) {
    diff.push_str("\nFile: ");
    diff.push_str(file);
    diff.push('\n');
    diff.push_str(file_diff);
    diff.push('\n');
}

/// Write the commit message to `<git-dir>/COMMIT_MSG_GENERATED`
///
/// This creates a file in the git directory that will be used as the
/// default message when launching the git commit editor.
///
/// # Returns
///
/// * `Result<PathBuf>` - Path to the written file
pub fn write_commit_message(root: &Path, message: &str) -> Result<PathBuf> {
    let git_dir = git_output(root, &["rev-parse", "--absolute-git-dir"])
        .context("Failed to locate the git directory")?;
    let path = PathBuf::from(git_dir.trim()).join(COMMIT_MSG_FILE);
    fs::write(&path, message)
        .with_context(|| format!("Failed to write commit message to {}", path.display()))?;
    Ok(path)
}

/// Execute git commit -v -e -F to launch an editor
///
/// The user reviews and edits the generated message in their configured
/// editor; saving an empty message aborts the commit.
///
/// # Errors
///
/// * Failed to execute git command
/// * User aborted the commit
/// * Commit validation failed
pub fn run_git_commit(root: &Path, msg_file: &Path) -> Result<()> {
    let status = Command::new("git")
        .arg("commit")
        .args(["-v", "-e", "-F"])
        .arg(msg_file)
        .current_dir(root)
        .status()
        .context("Failed to execute git commit command")?;

    if !status.success() {
        anyhow::bail!(
            "Git commit command failed with exit code: {:?}",
            status.code()
        );
    }

    Ok(())
}


// Note: functions that shell out to git depend on an actual repository and
// are exercised by running the binary rather than unit tests.
