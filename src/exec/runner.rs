//! The process-launching capability shared by every component.

use std::path::PathBuf;

use async_trait::async_trait;

use super::Command;
use crate::error::ExecError;

/// Launches external programs.
///
/// Every git, gh and editor invocation goes through this trait so the
/// flows can be driven by [`super::ScriptedRunner`] in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and return captured stdout.
    ///
    /// A non-zero exit is reported as [`ExecError::Exit`] carrying the
    /// captured stderr.
    async fn output(&self, command: Command) -> Result<Vec<u8>, ExecError>;

    /// Run to completion with the stdio attachments set on `command`.
    async fn run(&self, command: Command) -> Result<(), ExecError>;

    /// Resolve `program` on the execution path.
    fn look_path(&self, program: &str) -> Option<PathBuf>;
}
