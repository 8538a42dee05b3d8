//! Git queries over a [`CommandRunner`].
//!
//! All operations shell out to the system `git` binary, inheriting the user's
//! existing git config, and surface the runner's error unchanged.

use tracing::debug;

use crate::error::{ExecError, GitError};
use crate::exec::{Command, CommandRunner};

/// Remote used to resolve the default branch and PR log range.
pub const ORIGIN: &str = "origin";

const HEAD_BRANCH_PREFIX: &str = "HEAD branch:";

async fn git_output(runner: &dyn CommandRunner, args: &[&str]) -> Result<String, ExecError> {
    let out = runner
        .output(Command::new("git").args(args.iter().copied()))
        .await?;
    Ok(String::from_utf8_lossy(&out).to_string())
}

/// Output of `git status`.
pub async fn status(runner: &dyn CommandRunner) -> Result<String, GitError> {
    Ok(git_output(runner, &["status"]).await?)
}

/// Output of `git diff`, or `git diff --cached` when `cached` is set.
pub async fn diff(runner: &dyn CommandRunner, cached: bool) -> Result<String, GitError> {
    let args: &[&str] = if cached {
        &["diff", "--cached"]
    } else {
        &["diff"]
    };
    Ok(git_output(runner, args).await?)
}

/// Output of `git log <range>`.
pub async fn log(runner: &dyn CommandRunner, range: &str) -> Result<String, GitError> {
    Ok(git_output(runner, &["log", range]).await?)
}

/// Read a single value with `git config --get <key>`, trimmed.
pub async fn config_get(runner: &dyn CommandRunner, key: &str) -> Result<String, GitError> {
    let value = git_output(runner, &["config", "--get", key]).await?;
    Ok(value.trim().to_string())
}

/// Extract the branch name from a `HEAD branch: <name>` line.
pub fn parse_head_branch(remote_show: &str) -> Option<String> {
    remote_show
        .lines()
        .filter_map(|line| line.trim().strip_prefix(HEAD_BRANCH_PREFIX))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

/// Default branch of `origin`, as reported by `git remote show origin`.
pub async fn default_branch(runner: &dyn CommandRunner) -> Result<String, GitError> {
    let out = git_output(runner, &["remote", "show", ORIGIN]).await?;
    let branch = parse_head_branch(&out).ok_or_else(|| GitError::DefaultBranchNotFound {
        remote: ORIGIN.to_string(),
    })?;
    debug!(branch = %branch, "resolved default branch");
    Ok(branch)
}

/// `git log origin/<default>...HEAD`: the commits a PR from HEAD would contain.
pub async fn log_since_default_branch(runner: &dyn CommandRunner) -> Result<String, GitError> {
    let branch = default_branch(runner).await?;
    log(runner, &format!("{}/{}...HEAD", ORIGIN, branch)).await
}
