//! Error types for git-auto-commit modules using thiserror.

use std::process::ExitStatus;

use thiserror::Error;

/// Errors from resolving the layered configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read environment variable {var}: value is not valid Unicode")]
    Environment { var: String },
}

/// Errors from launching external programs (git, gh, editors).
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}{}", stderr_suffix(stderr))]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("I/O error while talking to {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No scripted response left for {program} {}", args.join(" "))]
    Unscripted { program: String, args: Vec<String> },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

impl ExecError {
    /// True when the program could not be found on `PATH`.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExecError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Exit code of the program, if it ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::Exit { status, .. } => status.code(),
            _ => None,
        }
    }
}

/// Errors from git queries.
#[derive(Error, Debug)]
pub enum GitError {
    #[error(transparent)]
    Command(#[from] ExecError),

    #[error("Default branch not found in `git remote show {remote}` output")]
    DefaultBranchNotFound { remote: String },
}

/// Errors from looking up or rendering prompt templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to parse template '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Failed to render template '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// Errors from the streaming chat-completion client.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("The model refused to respond: {0}")]
    Refusal(String),

    #[error("Stream transport failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Provider returned an error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode stream chunk: {0}")]
    Decode(String),

    #[error("Completion was cancelled")]
    Cancelled,

    #[error("Provider returned no choices")]
    EmptyResponse,

    #[error("Unsupported provider '{0}' (supported: openai)")]
    UnsupportedProvider(String),
}

impl CompletionError {
    /// True when the model declined to answer, as opposed to a transport failure.
    pub fn is_refusal(&self) -> bool {
        matches!(self, CompletionError::Refusal(_))
    }
}

/// Errors from interactive review in an editor.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("No editor found (tried {}), set $EDITOR", tried.join(", "))]
    NoEditor { tried: Vec<String> },

    #[error("Failed to prepare review file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Editor failed: {0}")]
    Editor(#[source] ExecError),
}

/// Errors from the commit flow, one variant per stage.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Failed to collect staged changes: {0}")]
    CollectDiff(#[source] GitError),

    #[error("No changes added to commit (use `git add` to stage changes)")]
    NothingStaged,

    #[error("Failed to build commit prompt: {0}")]
    Prompt(#[source] TemplateError),

    #[error("Failed to generate commit message: {0}")]
    Completion(#[source] CompletionError),

    #[error("Failed to collect status for review: {0}")]
    Status(#[source] GitError),

    #[error("Commit message review failed: {0}")]
    Review(#[source] ReviewError),

    #[error("Aborting commit due to empty commit message")]
    EmptyMessage,

    #[error("git commit failed: {0}")]
    Commit(#[source] ExecError),
}

impl CommitError {
    /// True when the failure was the model refusing to produce a message.
    pub fn is_refusal(&self) -> bool {
        matches!(self, CommitError::Completion(e) if e.is_refusal())
    }
}

/// Errors from the pull request flow, one variant per stage.
#[derive(Error, Debug)]
pub enum PrError {
    #[error("Failed to collect log for PR: {0}")]
    CollectLog(#[source] GitError),

    #[error("Failed to generate PR description: {0}")]
    Description(#[source] GenerationError),

    #[error("Failed to generate PR title: {0}")]
    Title(#[source] GenerationError),

    #[error("PR description review failed: {0}")]
    Review(#[source] ReviewError),

    #[error("Failed to write PR body file: {0}")]
    BodyFile(#[source] std::io::Error),

    #[error("gh pr create failed: {0}")]
    Create(#[source] ExecError),
}

/// A generation stage failed either while building its prompt or while streaming.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Model returned a blank title")]
    BlankTitle,
}
