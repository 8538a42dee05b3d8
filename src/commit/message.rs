//! The commit flow: staged diff to generated message to `git commit`.

use tracing::{debug, error, info, warn};

use crate::commit::prompt::{build_commit_prompt, build_review_document, clean_review_document};
use crate::error::{CommitError, ReviewError};
use crate::exec::{Command, Input, Output};
use crate::git;
use crate::review::{ScratchFile, open_editor, resolve_editor};
use crate::session::{RunOptions, Session};

/// Name git itself uses for the message file; editors key syntax modes off it.
const COMMIT_MSG_FILE: &str = "COMMIT_EDITMSG";
const SCRATCH_PREFIX: &str = "git-auto-commit-";

/// Generate a commit message for the staged changes.
///
/// Returns the staged diff alongside the message so callers that go on to
/// review don't need to collect it twice.
pub async fn generate_commit_message(
    session: &Session<'_>,
    extra_context: &str,
) -> Result<(String, String), CommitError> {
    let staged = git::diff(session.runner, true).await.map_err(|e| {
        error!(error = %e, "failed to get staged changes");
        CommitError::CollectDiff(e)
    })?;
    if staged.trim().is_empty() {
        return Err(CommitError::NothingStaged);
    }

    let prompt = build_commit_prompt(session.templates, &staged, extra_context).map_err(|e| {
        error!(error = %e, "failed to render commit message prompt");
        CommitError::Prompt(e)
    })?;
    debug!(prompt_len = prompt.len(), "commit message prompt rendered");

    let message = session.complete(&prompt).await.map_err(|e| {
        if e.is_refusal() {
            warn!(error = %e, "model refused to generate commit message");
        } else {
            error!(error = %e, "failed to generate commit message");
        }
        CommitError::Completion(e)
    })?;
    debug!(%message, "generated commit message");

    Ok((staged, message))
}

/// Commit the staged changes with a generated message.
///
/// With review requested the message is opened in an editor first and the
/// cleaned-up edit is committed; otherwise the message goes straight to
/// `git commit --file -`. Passthrough arguments are appended either way.
pub async fn auto_commit(session: &Session<'_>, options: &RunOptions) -> Result<(), CommitError> {
    info!(
        verbose = options.verbose,
        extra_args = ?options.passthrough_args,
        "starting auto-commit"
    );

    let (staged, message) = generate_commit_message(session, &options.extra_context).await?;

    if options.wants_review() {
        review_and_commit(session, options, &staged, &message).await
    } else {
        commit_message(session, options, message).await
    }
}

async fn commit_message(
    session: &Session<'_>,
    options: &RunOptions,
    message: String,
) -> Result<(), CommitError> {
    info!(extra_args = ?options.passthrough_args, "committing changes");

    let command = Command::new("git")
        .args(["commit", "--file", "-"])
        .args(&options.passthrough_args)
        .stdin(Input::Bytes(message.into_bytes()))
        .stdout(Output::Inherit)
        .stderr(Output::Inherit);

    session.runner.run(command).await.map_err(CommitError::Commit)
}

async fn review_and_commit(
    session: &Session<'_>,
    options: &RunOptions,
    staged: &str,
    message: &str,
) -> Result<(), CommitError> {
    let editor = resolve_editor(session.editor, session.runner).map_err(CommitError::Review)?;

    let status = git::status(session.runner)
        .await
        .map_err(CommitError::Status)?;
    let document = build_review_document(session.templates, message, &status, staged)
        .map_err(CommitError::Prompt)?;

    let scratch = ScratchFile::create(SCRATCH_PREFIX, COMMIT_MSG_FILE, &document)
        .map_err(|e| CommitError::Review(ReviewError::TempFile(e)))?;

    info!(%editor, "opening editor for commit message review");
    open_editor(session.runner, &editor, scratch.path())
        .await
        .map_err(CommitError::Review)?;

    let edited = scratch
        .read()
        .map_err(|e| CommitError::Review(ReviewError::TempFile(e)))?;
    let message = clean_review_document(&edited);
    if message.is_empty() {
        warn!("commit message is empty after review, not committing");
        return Err(CommitError::EmptyMessage);
    }
    scratch
        .write(&message)
        .map_err(|e| CommitError::Review(ReviewError::TempFile(e)))?;

    let command = Command::new("git")
        .args(["commit", "--file"])
        .arg(scratch.arg())
        .args(&options.passthrough_args)
        .interactive();

    session.runner.run(command).await.map_err(CommitError::Commit)
}
