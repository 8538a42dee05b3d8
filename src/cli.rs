//! Flags shared by both binaries, and logging setup.

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::config::FlagOverrides;
use crate::session::RunOptions;

/// Flags common to `git-auto-commit` and `git-auto-pr`.
#[derive(Args, Debug, Clone, Default)]
pub struct SharedArgs {
    /// LLM provider to use
    #[arg(long, value_name = "NAME")]
    pub provider: Option<String>,

    /// Model to request from the provider
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// OpenAI API key (overrides OPENAI_API_KEY)
    #[arg(long = "openai-key", value_name = "KEY")]
    pub openai_key: Option<String>,

    /// Review the generated text in $EDITOR before using it
    #[arg(short, long)]
    pub verbose: bool,

    /// Use the generated text without prompting
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Extra context for the model (why the change was made)
    #[arg(short, long, value_name = "TEXT", default_value = "")]
    pub message: String,

    /// Log level: debug, info, warn, error or fatal
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Arguments passed through to the underlying git/gh command
    #[arg(last = true, value_name = "ARGS")]
    pub passthrough: Vec<String>,
}

impl SharedArgs {
    pub fn flag_overrides(&self) -> FlagOverrides {
        FlagOverrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            api_key: self.openai_key.clone(),
            log_level: self.log_level.clone(),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            verbose: self.verbose,
            auto_confirm: self.yes,
            extra_context: self.message.clone(),
            passthrough_args: self.passthrough.clone(),
        }
    }
}

/// Map a configured level name to a tracing filter directive.
///
/// Returns `None` for names we don't recognise.
pub fn level_directive(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "fatal" => Some("error"),
        _ => None,
    }
}

/// Install a stderr fmt subscriber filtered at `level`.
///
/// Unknown levels fall back to `info` and are reported once logging is up.
pub fn init_logging(level: &str) {
    let directive = level_directive(level);
    let filter = EnvFilter::new(directive.unwrap_or("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if directive.is_none() {
        error!(log_level = level, "invalid log level");
    }
}

/// A token cancelled on the first Ctrl-C.
///
/// Must be called from within a tokio runtime.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            token.cancel();
        }
    });
    cancel
}
