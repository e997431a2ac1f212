//! Prompt construction for commit message generation
//!
//! The configured template refers to the staged changes through two
//! placeholders, `${files}` and `${diff}`. Rendering is checked against a
//! size limit before the prompt string is allocated.

use crate::error::LlmError;

/// Default maximum allowed prompt size in bytes (1MB)
pub const DEFAULT_MAX_PROMPT_SIZE: usize = 1_000_000;

/// Placeholder replaced by the staged file paths, one per line
pub const FILES_PLACEHOLDER: &str = "${files}";

/// Placeholder replaced by the staged diff
pub const DIFF_PLACEHOLDER: &str = "${diff}";

/// Separator used when the template has no placeholders ("\n\n")
const SEPARATOR: &str = "\n\n";

/// Calculate the rendered prompt size without allocating it
///
/// # Example
///
/// ```
/// use git_commitx::prompt::prompt_size;
///
/// let files = vec!["a.rs".to_string(), "b.rs".to_string()];
/// assert_eq!(prompt_size("Files: ${files}", &files, "+x"), "Files: a.rs\nb.rs".len());
/// ```
pub fn prompt_size(template: &str, files: &[String], diff: &str) -> usize {
    let file_count = template.matches(FILES_PLACEHOLDER).count();
    let diff_count = template.matches(DIFF_PLACEHOLDER).count();

    if file_count == 0 && diff_count == 0 {
        return template.len() + SEPARATOR.len() + diff.len();
    }

    let files_len =
        files.iter().map(String::len).sum::<usize>() + files.len().saturating_sub(1);

    template.len() - file_count * FILES_PLACEHOLDER.len() - diff_count * DIFF_PLACEHOLDER.len()
        + file_count * files_len
        + diff_count * diff.len()
}

/// Render the prompt template with the staged files and diff
///
/// Placeholders are substituted in a single pass, so text inserted for one
/// placeholder is never scanned for the other. A template without any
/// placeholder gets the diff appended after a blank line.
///
/// # Arguments
///
/// * `template` - Prompt template from configuration
/// * `files` - Staged file paths
/// * `diff` - Concatenated staged diff
/// * `max_size` - Maximum allowed rendered size in bytes
///
/// # Errors
///
/// * `PromptTooLarge` if the rendered prompt would exceed `max_size`
///
/// # Example
///
/// ```
/// use git_commitx::prompt::render_prompt;
///
/// let files = vec!["src/lib.rs".to_string()];
/// let prompt = render_prompt("Files:\n${files}\nDiff:\n${diff}", &files, "+x", 1_000_000).unwrap();
/// assert_eq!(prompt, "Files:\nsrc/lib.rs\nDiff:\n+x");
/// ```
pub fn render_prompt(
    template: &str,
    files: &[String],
    diff: &str,
    max_size: usize,
) -> Result<String, LlmError> {
    let size = prompt_size(template, files, diff);
    if size > max_size {
        return Err(LlmError::PromptTooLarge {
            size,
            max: max_size,
        });
    }

    let mut prompt = String::with_capacity(size);
    if !template.contains(FILES_PLACEHOLDER) && !template.contains(DIFF_PLACEHOLDER) {
        prompt.push_str(template);
        prompt.push_str(SEPARATOR);
        prompt.push_str(diff);
        return Ok(prompt);
    }

    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let (before, tail) = rest.split_at(start);
        prompt.push_str(before);

        if let Some(after) = tail.strip_prefix(FILES_PLACEHOLDER) {
            for (i, file) in files.iter().enumerate() {
                if i > 0 {
                    prompt.push('\n');
                }
                prompt.push_str(file);
            }
            rest = after;
        } else if let Some(after) = tail.strip_prefix(DIFF_PLACEHOLDER) {
            prompt.push_str(diff);
            rest = after;
        } else {
            prompt.push_str("${");
            rest = &tail[2..];
        }
    }
    prompt.push_str(rest);

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_render_prompt_basic() {
        // Arrange - setup test data
        let template = "Generate a commit message.\nFiles: ${files}\nChanges: ${diff}";
        let staged = files(&["src/main.rs", "README.md"]);
        let diff = "diff --git a/README.md b/README.md\n+new line";

        // Act - execute the function
        let result = render_prompt(template, &staged, diff, DEFAULT_MAX_PROMPT_SIZE).unwrap();

        // Assert - verify the result
        assert_eq!(
            result,
            "Generate a commit message.\nFiles: src/main.rs\nREADME.md\nChanges: diff --git a/README.md b/README.md\n+new line"
        );
    }

    #[test]
    fn test_render_prompt_repeated_placeholders() {
        // Arrange
        let template = "${diff}|${files}|${diff}";

        // Act
        let result = render_prompt(template, &files(&["a"]), "D", DEFAULT_MAX_PROMPT_SIZE).unwrap();

        // Assert - every occurrence is replaced
        assert_eq!(result, "D|a|D");
    }

    #[test]
    fn test_render_prompt_does_not_rescan_inserted_text() {
        // Arrange - a file name that looks like the diff placeholder
        let staged = files(&["${diff}.txt"]);

        // Act
        let result = render_prompt("${files}", &staged, "SECRET", DEFAULT_MAX_PROMPT_SIZE).unwrap();

        // Assert - inserted text is left alone
        assert_eq!(result, "${diff}.txt");
    }

    #[test]
    fn test_render_prompt_unknown_placeholder_kept() {
        let result =
            render_prompt("${branch} ${diff} $", &[], "+x", DEFAULT_MAX_PROMPT_SIZE).unwrap();

        assert_eq!(result, "${branch} +x $");
    }

    #[test]
    fn test_render_prompt_without_placeholders_appends_diff() {
        // Arrange - template with no placeholders
        let template = "Generate a commit message:";
        let diff = "+added line";

        // Act
        let result = render_prompt(template, &files(&["a.rs"]), diff, DEFAULT_MAX_PROMPT_SIZE)
            .unwrap();

        // Assert - diff follows after a blank line
        assert_eq!(result, "Generate a commit message:\n\n+added line");
    }

    #[test]
    fn test_render_prompt_no_files() {
        let result = render_prompt("[${files}]", &[], "", DEFAULT_MAX_PROMPT_SIZE).unwrap();

        assert_eq!(result, "[]");
    }

    #[test]
    fn test_render_prompt_special_characters() {
        // Arrange - special characters including newlines, Unicode, and emojis
        let diff = "diff --git a/日本語.txt b/日本語.txt\n+こんにちは 🎉\n+Special: \t\\n\"quotes\"";
        let template = "Prompt with 絵文字 🚀 and\nmultiple\nlines\n${diff}";

        // Act
        let result = render_prompt(template, &[], diff, DEFAULT_MAX_PROMPT_SIZE).unwrap();

        // Assert - all special characters should be preserved
        assert!(result.contains("絵文字 🚀"));
        assert!(result.contains("こんにちは 🎉"));
        assert!(result.contains("multiple\nlines"));
        assert!(result.contains("Special: \t\\n\"quotes\""));
    }

    #[test]
    fn test_prompt_size_matches_rendered_length() {
        // Arrange - multi-byte characters in every part
        let template = "変更: ${files} / ${diff} / ${files} 🎉";
        let staged = files(&["日本語.txt", "b.rs", "c"]);
        let diff = "+こんにちは";

        // Act
        let size = prompt_size(template, &staged, diff);
        let rendered = render_prompt(template, &staged, diff, DEFAULT_MAX_PROMPT_SIZE).unwrap();

        // Assert - counts bytes, not characters
        assert_eq!(size, rendered.len());
    }

    #[test]
    fn test_render_prompt_exactly_at_limit() {
        // Arrange - exactly 1MB total size
        let template = "Diff:${diff}";
        let diff = "+".repeat(DEFAULT_MAX_PROMPT_SIZE - "Diff:".len());

        // Act
        let result = render_prompt(template, &[], &diff, DEFAULT_MAX_PROMPT_SIZE);

        // Assert - should succeed (exactly at limit)
        assert_eq!(result.unwrap().len(), DEFAULT_MAX_PROMPT_SIZE);
    }

    #[test]
    fn test_render_prompt_just_over_limit() {
        // Arrange - 1 byte over 1MB
        let template = "Diff:${diff}";
        let diff = "+".repeat(DEFAULT_MAX_PROMPT_SIZE - "Diff:".len() + 1);

        // Act
        let result = render_prompt(template, &[], &diff, DEFAULT_MAX_PROMPT_SIZE);

        // Assert - should fail
        match result {
            Err(LlmError::PromptTooLarge { size, max }) => {
                assert_eq!(size, DEFAULT_MAX_PROMPT_SIZE + 1);
                assert_eq!(max, DEFAULT_MAX_PROMPT_SIZE);
            }
            other => panic!("expected PromptTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_render_prompt_error_message_format() {
        // Arrange - exceeds limit without placeholders
        let template = "X".repeat(600_000);
        let diff = "Y".repeat(500_000);

        // Act
        let result = render_prompt(&template, &[], &diff, DEFAULT_MAX_PROMPT_SIZE);

        // Assert - verify error message contains helpful information
        let error_msg = result.unwrap_err().to_string();
        assert!(error_msg.contains("1100002 bytes")); // actual size
        assert!(error_msg.contains("1000000 bytes")); // max size
        assert!(error_msg.contains("splitting into multiple commits"));
    }

    #[test]
    fn test_render_prompt_custom_size_limit_exceeded() {
        // Arrange - custom size limit (100 bytes)
        let diff = "+".repeat(200);

        // Act
        let result = render_prompt("${diff}", &[], &diff, 100);

        // Assert - should fail (exceeds custom limit)
        assert!(matches!(result, Err(LlmError::PromptTooLarge { size: 200, max: 100 })));
    }
}
