//! Prompt and review-file construction for commit messages.

use serde::Serialize;

use crate::error::TemplateError;
use crate::review::{COMMENT_CHAR, SCISSORS, prefix_lines};
use crate::template::{COMMIT_FORMAT, COMMIT_PROMPT, COMMIT_REVIEW, TemplateEngine};

#[derive(Serialize)]
struct PromptData<'a> {
    staged: &'a str,
    format: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct ReviewFooterData<'a> {
    comment_char: &'a str,
    scissors: &'a str,
}

/// Render the commit prompt for the staged diff and the user's extra context.
pub fn build_commit_prompt(
    templates: &TemplateEngine,
    staged: &str,
    extra_context: &str,
) -> Result<String, TemplateError> {
    let format = templates.render_string(COMMIT_FORMAT, &())?;
    templates.render_string(
        COMMIT_PROMPT,
        &PromptData {
            staged,
            format: &format,
            message: extra_context,
        },
    )
}

/// Build the file the user edits before committing.
///
/// The suggested message comes first, then the commented explanation and
/// scissors line, then `git status` as comments and the raw staged diff.
/// [`clean_review_document`] reduces the edited file back to the message.
pub fn build_review_document(
    templates: &TemplateEngine,
    message: &str,
    status: &str,
    staged: &str,
) -> Result<String, TemplateError> {
    let prefix = format!("{} ", COMMENT_CHAR);
    let footer = templates.render_string(
        COMMIT_REVIEW,
        &ReviewFooterData {
            comment_char: COMMENT_CHAR,
            scissors: SCISSORS,
        },
    )?;

    let mut document = String::with_capacity(message.len() + status.len() + staged.len() + 256);
    document.push_str(message);
    document.push_str("\n\n");
    document.push_str(&prefix_lines(&footer, &prefix));
    document.push_str(&prefix_lines(status, &prefix));
    document.push_str(staged);
    Ok(document)
}

/// Reduce an edited review document to the commit message.
///
/// Everything from the commented scissors line down is dropped, as are
/// comment lines, trailing whitespace and surplus blank lines. An empty
/// result means the user cleared the message.
pub fn clean_review_document(edited: &str) -> String {
    let scissors_line = format!("{} {}", COMMENT_CHAR, SCISSORS);

    let mut message = String::with_capacity(edited.len());
    let mut blank_pending = false;
    for line in edited
        .lines()
        .take_while(|line| line.trim_end() != scissors_line)
        .filter(|line| !line.starts_with(COMMENT_CHAR))
        .map(str::trim_end)
    {
        if line.is_empty() {
            blank_pending = !message.is_empty();
            continue;
        }
        if blank_pending {
            message.push('\n');
            blank_pending = false;
        }
        message.push_str(line);
        message.push('\n');
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_diff_format_and_context() {
        let templates = TemplateEngine::new();

        let prompt =
            build_commit_prompt(&templates, "diff --git a/x b/x\n+hello", "fixes the <b> tag").unwrap();

        assert!(prompt.contains("diff --git a/x b/x\n+hello"));
        assert!(prompt.contains("fixes the <b> tag"));
        let format = templates.render_string(COMMIT_FORMAT, &()).unwrap();
        assert!(prompt.contains(format.trim()));
    }

    #[test]
    fn test_prompt_with_empty_context() {
        let templates = TemplateEngine::new();

        let prompt = build_commit_prompt(&templates, "+x", "").unwrap();

        assert!(prompt.contains("+x"));
    }

    #[test]
    fn test_review_document_layout() {
        let templates = TemplateEngine::new();

        let document = build_review_document(
            &templates,
            "Add feature X",
            "On branch main\nChanges to be committed:",
            "diff --git a/x b/x\n",
        )
        .unwrap();

        assert!(document.starts_with("Add feature X\n\n# "));
        assert!(document.contains(&format!("# {}\n", SCISSORS)));
        assert!(document.contains("# On branch main\n# Changes to be committed:\n"));
        assert!(document.ends_with("diff --git a/x b/x\n"));

        let scissors_at = document.find(SCISSORS).unwrap();
        let status_at = document.find("# On branch main").unwrap();
        assert!(scissors_at < status_at);
    }

    #[test]
    fn test_clean_keeps_only_the_message() {
        let templates = TemplateEngine::new();
        let document = build_review_document(
            &templates,
            "Add feature X\n\nExplain the change.",
            "On branch main",
            "diff --git a/x b/x\n+x\n",
        )
        .unwrap();

        assert_eq!(
            clean_review_document(&document),
            "Add feature X\n\nExplain the change.\n"
        );
    }

    #[test]
    fn test_clean_drops_comments_and_collapses_blank_lines() {
        let edited = "\n# note\nFix typo   \n\n\n\nBody line\n# trailing note\n\n";

        assert_eq!(clean_review_document(edited), "Fix typo\n\nBody line\n");
    }

    #[test]
    fn test_clean_cuts_at_scissors_even_without_comments_after() {
        let edited = format!("Subject\n# {}\nnot a comment but below the cut\n", SCISSORS);

        assert_eq!(clean_review_document(&edited), "Subject\n");
    }

    #[test]
    fn test_clean_of_comment_only_document_is_empty() {
        let templates = TemplateEngine::new();
        let document = build_review_document(&templates, "", "On branch main", "+x\n").unwrap();

        assert_eq!(clean_review_document(&document), "");
        assert_eq!(clean_review_document("# just a comment\n   \n"), "");
    }
}
