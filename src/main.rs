//! git-auto-commit - CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use git_auto_commit::cli::{SharedArgs, cancel_on_ctrl_c, init_logging};
use git_auto_commit::{OpenAiClient, Session, SystemRunner, TemplateEngine, commit, config};

/// Commit staged changes with a message written by an LLM.
#[derive(Parser, Debug)]
#[command(name = "git-auto-commit")]
#[command(about = "Commit staged changes with a message written by an LLM")]
#[command(after_help = "Examples:\n  git auto-commit -v\n  git auto-commit --model gpt-4o -- --amend")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    shared: SharedArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let runner = SystemRunner::new();

    let flags = cli.shared.flag_overrides();

    // Logging is up before config resolution so git config read failures show.
    let log_level = config::resolve_log_level(&flags).context("Failed to load configuration")?;
    init_logging(&log_level);

    let config = config::resolve(&runner, &flags)
        .await
        .context("Failed to load configuration")?;

    let llm = OpenAiClient::from_config(&config).context("Failed to set up the LLM client")?;
    let templates = TemplateEngine::new();
    let session =
        Session::new(&config, &runner, &templates, &llm).with_cancellation(cancel_on_ctrl_c());

    commit::auto_commit(&session, &cli.shared.run_options())
        .await
        .context("Failed to auto-commit")?;

    Ok(())
}
