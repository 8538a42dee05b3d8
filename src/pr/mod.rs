//! AI-generated pull requests for the current branch.
//!
//! The description is generated from the commits since the remote's default
//! branch, the title from the description. Both go to `gh pr create --web`
//! so the user confirms the final PR in the browser.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{GenerationError, PrError};
use crate::exec::Command;
use crate::git;
use crate::review::{ScratchFile, open_editor, resolve_editor};
use crate::session::{RunOptions, Session};
use crate::template::{PR_DESCRIPTION_FORMAT, PR_DESCRIPTION_PROMPT, PR_TITLE_PROMPT};

const PR_MSG_FILE: &str = "PULLREQ_EDITMSG";
const SCRATCH_PREFIX: &str = "git-auto-pr-";

/// Generated title and body for a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    pub description: String,
}

#[derive(Serialize)]
struct DescriptionData<'a> {
    git_log: &'a str,
    format: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct TitleData<'a> {
    description: &'a str,
}

/// Generate a description for the commits in `git_log`.
pub async fn generate_description(
    session: &Session<'_>,
    git_log: &str,
    extra_context: &str,
) -> Result<String, GenerationError> {
    let format = session.templates.render_string(PR_DESCRIPTION_FORMAT, &())?;
    let prompt = session.templates.render_string(
        PR_DESCRIPTION_PROMPT,
        &DescriptionData {
            git_log,
            format: &format,
            message: extra_context,
        },
    )?;
    debug!(prompt_len = prompt.len(), "pull request description prompt rendered");

    Ok(session.complete(&prompt).await?)
}

/// Generate a one-line title for a PR with `description`.
///
/// A reply that cleans down to nothing is [`GenerationError::BlankTitle`].
pub async fn generate_title(
    session: &Session<'_>,
    description: &str,
) -> Result<String, GenerationError> {
    let prompt = session
        .templates
        .render_string(PR_TITLE_PROMPT, &TitleData { description })?;

    let title = clean_title(&session.complete(&prompt).await?);
    if title.is_empty() {
        return Err(GenerationError::BlankTitle);
    }
    Ok(title)
}

/// First non-blank line, without surrounding whitespace or quotes.
fn clean_title(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

fn log_generation_failure(what: &str, e: &GenerationError) {
    match e {
        GenerationError::Completion(c) if c.is_refusal() => {
            warn!(error = %e, "model refused to generate pull request {}", what)
        }
        _ => error!(error = %e, "failed to generate pull request {}", what),
    }
}

/// Collect the branch's commits and generate a title and description.
///
/// Fails at [`PrError::CollectLog`] without contacting the provider when the
/// remote's default branch cannot be determined.
pub async fn draft_pull_request(
    session: &Session<'_>,
    extra_context: &str,
) -> Result<PullRequestDraft, PrError> {
    let git_log = git::log_since_default_branch(session.runner)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to collect log for pull request");
            PrError::CollectLog(e)
        })?;

    let description = generate_description(session, &git_log, extra_context)
        .await
        .map_err(|e| {
            log_generation_failure("description", &e);
            PrError::Description(e)
        })?;

    let title = generate_title(session, &description).await.map_err(|e| {
        log_generation_failure("title", &e);
        PrError::Title(e)
    })?;

    Ok(PullRequestDraft { title, description })
}

/// Hand a draft to `gh pr create`, optionally reviewing the body first.
pub async fn create_pull_request(
    session: &Session<'_>,
    options: &RunOptions,
    draft: &PullRequestDraft,
) -> Result<(), PrError> {
    let editor = if options.wants_review() {
        Some(resolve_editor(session.editor, session.runner).map_err(PrError::Review)?)
    } else {
        None
    };

    let scratch =
        ScratchFile::create(SCRATCH_PREFIX, PR_MSG_FILE, &draft.description).map_err(PrError::BodyFile)?;

    if let Some(editor) = editor {
        info!(%editor, "opening editor for pull request review");
        open_editor(session.runner, &editor, scratch.path())
            .await
            .map_err(PrError::Review)?;
    }

    info!(title = %draft.title, "creating pull request");
    let command = Command::new("gh")
        .args(["pr", "create", "--title"])
        .arg(draft.title.as_str())
        .arg("--body-file")
        .arg(scratch.arg())
        .arg("--web")
        .args(&options.passthrough_args)
        .interactive();

    session.runner.run(command).await.map_err(PrError::Create)
}

/// Draft a pull request for the current branch and open it with `gh`.
pub async fn auto_pull_request(session: &Session<'_>, options: &RunOptions) -> Result<(), PrError> {
    info!(
        verbose = options.verbose,
        extra_args = ?options.passthrough_args,
        "starting auto-pr"
    );

    let draft = draft_pull_request(session, &options.extra_context).await?;
    create_pull_request(session, options, &draft).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompletionError, GitError};
    use crate::exec::{Method, ScriptedRunner};
    use crate::llm::MockCompletionClient;
    use crate::template::TemplateEngine;
    use mockall::Sequence;
    use tokio_util::sync::CancellationToken;

    const REMOTE_SHOW: &str = "* remote origin\n  Fetch URL: git@example.com:o/r.git\n  HEAD branch: main\n";

    fn session<'a>(
        runner: &'a ScriptedRunner,
        templates: &'a TemplateEngine,
        llm: &'a MockCompletionClient,
        editor: Option<&'a str>,
    ) -> Session<'a> {
        Session {
            runner,
            templates,
            llm,
            editor,
            cancel: CancellationToken::new(),
        }
    }

    fn description_then_title(description: &'static str, title: &'static str) -> MockCompletionClient {
        let mut llm = MockCompletionClient::new();
        let mut seq = Sequence::new();
        llm.expect_generate_completion()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|prompt, _| prompt.contains("abc123 Add parser"))
            .returning(move |_, _| Ok(description.to_string()));
        llm.expect_generate_completion()
            .times(1)
            .in_sequence(&mut seq)
            .withf(move |prompt, _| prompt.contains(description))
            .returning(move |_, _| Ok(title.to_string()));
        llm
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Add parser"), "Add parser");
        assert_eq!(clean_title("\n  \"Add parser\"  \nextra"), "Add parser");
        assert_eq!(clean_title(""), "");
        assert_eq!(clean_title("\n \"\" \n"), "");
        assert_eq!(clean_title("``"), "");
    }

    #[tokio::test]
    async fn test_blank_title_is_title_stage_and_skips_gh() {
        let runner = ScriptedRunner::new();
        runner.push_output(REMOTE_SHOW).push_output("abc123 Add parser\n");
        let templates = TemplateEngine::new();
        let llm = description_then_title("## Summary\nParser.", "  \"\"  \n\n");

        let err = auto_pull_request(&session(&runner, &templates, &llm, None), &RunOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PrError::Title(GenerationError::BlankTitle)));
        assert!(err.to_string().contains("blank title"));
        assert!(!runner.was_invoked("gh", &[]));
        assert!(!runner.run_called());
    }

    #[tokio::test]
    async fn test_auto_pull_request_runs_gh_with_body_file() {
        let runner = ScriptedRunner::new();
        runner
            .push_output(REMOTE_SHOW)
            .push_output("abc123 Add parser\n")
            .push_ok();
        let templates = TemplateEngine::new();
        let llm = description_then_title("## Summary\nParser.", "Add parser\n");
        let options = RunOptions {
            passthrough_args: vec!["--draft".into()],
            ..Default::default()
        };

        auto_pull_request(&session(&runner, &templates, &llm, None), &options)
            .await
            .unwrap();

        let calls = runner.invocations();
        assert_eq!(calls[0].command_line(), "git remote show origin");
        assert_eq!(calls[1].command_line(), "git log origin/main...HEAD");

        let gh = &calls[2];
        assert_eq!(gh.method, Method::Run);
        assert_eq!(gh.program, "gh");
        assert_eq!(&gh.args[..4], ["pr", "create", "--title", "Add parser"]);
        assert_eq!(gh.args[4], "--body-file");
        assert!(gh.args[5].ends_with(PR_MSG_FILE));
        assert_eq!(&gh.args[6..], ["--web", "--draft"]);
        assert_eq!(gh.file_snapshots[0].1, "## Summary\nParser.");
    }

    #[tokio::test]
    async fn test_missing_head_branch_never_contacts_provider() {
        let runner = ScriptedRunner::new();
        runner.push_output("* remote origin\n  Fetch URL: x\n");
        let templates = TemplateEngine::new();
        let mut llm = MockCompletionClient::new();
        llm.expect_generate_completion().never();

        let err = auto_pull_request(&session(&runner, &templates, &llm, None), &RunOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PrError::CollectLog(GitError::DefaultBranchNotFound { .. })
        ));
        assert!(!runner.run_called());
    }

    #[tokio::test]
    async fn test_title_refusal_is_title_stage() {
        let runner = ScriptedRunner::new();
        runner.push_output(REMOTE_SHOW).push_output("abc123 Add parser\n");
        let templates = TemplateEngine::new();
        let mut llm = MockCompletionClient::new();
        let mut seq = Sequence::new();
        llm.expect_generate_completion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("Body".into()));
        llm.expect_generate_completion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(CompletionError::Refusal("no".into())));

        let err = auto_pull_request(&session(&runner, &templates, &llm, None), &RunOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PrError::Title(GenerationError::Completion(CompletionError::Refusal(_)))
        ));
        assert!(!runner.was_invoked("gh", &[]));
    }

    #[tokio::test]
    async fn test_review_edits_body_before_gh() {
        let runner = ScriptedRunner::new();
        runner
            .push_output(REMOTE_SHOW)
            .push_output("abc123 Add parser\n")
            .push_ok()
            .push_ok();
        let templates = TemplateEngine::new();
        let llm = description_then_title("Body text", "Add parser");
        let options = RunOptions {
            verbose: true,
            ..Default::default()
        };

        auto_pull_request(&session(&runner, &templates, &llm, Some("nano")), &options)
            .await
            .unwrap();

        let calls = runner.invocations();
        assert_eq!(calls[2].program, "nano");
        assert_eq!(calls[2].file_snapshots[0].1, "Body text");
        assert_eq!(calls[3].program, "gh");
        assert_eq!(calls[2].args[0], calls[3].args[5]);
    }

    #[tokio::test]
    async fn test_description_prompt_includes_extra_context() {
        let runner = ScriptedRunner::new();
        runner.push_output(REMOTE_SHOW).push_output("abc123 Add parser\n");
        let templates = TemplateEngine::new();
        let mut llm = MockCompletionClient::new();
        llm.expect_generate_completion()
            .withf(|prompt, _| prompt.contains("targets the 2.x line"))
            .times(1)
            .returning(|_, _| Ok("Body".into()));
        llm.expect_generate_completion()
            .times(1)
            .returning(|_, _| Ok("Title".into()));

        let draft = draft_pull_request(
            &session(&runner, &templates, &llm, None),
            "targets the 2.x line",
        )
        .await
        .unwrap();

        assert_eq!(
            draft,
            PullRequestDraft {
                title: "Title".into(),
                description: "Body".into(),
            }
        );
    }
}
