//! Per-invocation options and the injected services a flow runs against.

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::exec::CommandRunner;
use crate::llm::CompletionClient;
use crate::template::TemplateEngine;

/// Options for one run of a flow. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Review the generated text in an editor before using it.
    pub verbose: bool,
    /// Skip any review, even with `verbose`.
    pub auto_confirm: bool,
    /// Free-text context passed to the model.
    pub extra_context: String,
    /// Appended verbatim to `git commit` / `gh pr create`.
    pub passthrough_args: Vec<String>,
}

impl RunOptions {
    pub fn wants_review(&self) -> bool {
        self.verbose && !self.auto_confirm
    }
}

/// Everything a flow needs, borrowed for the duration of one run.
pub struct Session<'a> {
    pub runner: &'a dyn CommandRunner,
    pub templates: &'a TemplateEngine,
    pub llm: &'a dyn CompletionClient,
    /// Editor from configuration; fallbacks are tried when `None`.
    pub editor: Option<&'a str>,
    pub cancel: CancellationToken,
}

impl<'a> Session<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        templates: &'a TemplateEngine,
        llm: &'a dyn CompletionClient,
    ) -> Self {
        Self {
            runner,
            templates,
            llm,
            editor: config.editor.as_deref(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` to abort in-flight completions.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stream a completion for `prompt`, honouring the session's cancellation.
    pub(crate) async fn complete(
        &self,
        prompt: &str,
    ) -> Result<String, crate::error::CompletionError> {
        self.llm.generate_completion(prompt, &self.cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_requires_verbose_without_auto_confirm() {
        let mut options = RunOptions::default();
        assert!(!options.wants_review());

        options.verbose = true;
        assert!(options.wants_review());

        options.auto_confirm = true;
        assert!(!options.wants_review());
    }
}
