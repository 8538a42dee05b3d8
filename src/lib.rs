//! git-auto-commit - Git commit messages and pull request descriptions written by an LLM.
//!
//! # Overview
//!
//! `git-auto-commit` reads the staged diff, asks an OpenAI-compatible model for a
//! commit message, and commits with it, optionally after a review in `$EDITOR`.
//! `git-auto-pr` does the same for the commits on the current branch, handing a
//! generated title and body to `gh pr create --web`.
//!
//! Every external program goes through an injected [`exec::CommandRunner`], so
//! the flows run unchanged against [`exec::ScriptedRunner`] in tests.

pub mod cli;
pub mod commit;
pub mod config;
pub mod error;
pub mod exec;
pub mod git;
pub mod llm;
pub mod pr;
pub mod review;
pub mod session;
pub mod template;

// Re-export commonly used types
pub use config::{Config, FlagOverrides};
pub use error::{
    CommitError, CompletionError, ConfigError, ExecError, GitError, PrError, ReviewError,
    TemplateError,
};
pub use exec::{CommandRunner, ScriptedRunner, SystemRunner};
pub use llm::{CompletionClient, OpenAiClient};
pub use session::{RunOptions, Session};
pub use template::TemplateEngine;
