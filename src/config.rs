//! Layered configuration.
//!
//! Sources, in ascending priority:
//! 1. Built-in defaults
//! 2. Git config (`auto-commit.provider`, `auto-commit.model`; never secrets)
//! 3. Environment variables
//! 4. CLI flags
//!
//! A later source only overrides a field when its value is non-empty.
//!
//! The log level never comes from git config, so [`resolve_log_level`] can
//! run before logging is installed and before any process is spawned.

use std::env::{self, VarError};
use std::fmt;

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::exec::CommandRunner;
use crate::git;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub const PROVIDER_ENV: &str = "GIT_AUTO_COMMIT_PROVIDER";
pub const MODEL_ENV: &str = "GIT_AUTO_COMMIT_MODEL";
pub const LOG_LEVEL_ENV: &str = "GIT_AUTO_COMMIT_LOG_LEVEL";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const EDITOR_ENV: &str = "EDITOR";

pub const PROVIDER_GIT_KEY: &str = "auto-commit.provider";
pub const MODEL_GIT_KEY: &str = "auto-commit.model";

/// Resolved configuration. Read-only once [`resolve`] returns.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: String,
    pub model: String,
    /// Only ever sourced from the environment or a flag.
    pub api_key: String,
    pub log_level: String,
    pub base_url: String,
    /// `$EDITOR`, captured once so flows never read the environment.
    pub editor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            editor: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &api_key)
            .field("log_level", &self.log_level)
            .field("base_url", &self.base_url)
            .field("editor", &self.editor)
            .finish()
    }
}

/// Values passed on the command line. Empty strings count as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
}

fn override_with(target: &mut String, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        *target = v.to_string();
    }
}

/// Resolve just the log level from the process environment and flags.
pub fn resolve_log_level(flags: &FlagOverrides) -> Result<String, ConfigError> {
    resolve_log_level_with(flags, |name| env::var(name))
}

/// [`resolve_log_level`] with an explicit environment lookup.
pub fn resolve_log_level_with<F>(flags: &FlagOverrides, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let mut level = DEFAULT_LOG_LEVEL.to_string();
    override_with(&mut level, env_value(&lookup, LOG_LEVEL_ENV)?.as_deref());
    override_with(&mut level, flags.log_level.as_deref());
    Ok(level)
}

/// Resolve configuration from the process environment.
pub async fn resolve(
    runner: &dyn CommandRunner,
    flags: &FlagOverrides,
) -> Result<Config, ConfigError> {
    resolve_with(runner, flags, |name| env::var(name)).await
}

/// Resolve configuration with an explicit environment lookup.
///
/// `lookup` has the same contract as [`std::env::var`].
pub async fn resolve_with<F>(
    runner: &dyn CommandRunner,
    flags: &FlagOverrides,
    lookup: F,
) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let mut cfg = Config::default();

    apply_git_config(runner, &mut cfg).await;
    apply_env(&mut cfg, lookup)?;
    apply_flags(&mut cfg, flags);

    debug!(config = ?cfg, "resolved configuration");
    Ok(cfg)
}

/// Overlay non-secret values from Git config. Read failures are logged and
/// leave the prior value in place.
async fn apply_git_config(runner: &dyn CommandRunner, cfg: &mut Config) {
    for (key, field) in [
        (PROVIDER_GIT_KEY, &mut cfg.provider),
        (MODEL_GIT_KEY, &mut cfg.model),
    ] {
        match git::config_get(runner, key).await {
            Ok(value) => override_with(field, Some(&value)),
            Err(e) => debug!(key, error = %e, "could not read git config"),
        }
    }
}

fn env_value<F>(lookup: &F, var: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(var) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => {
            warn!(var, "environment variable is not valid Unicode");
            Err(ConfigError::Environment {
                var: var.to_string(),
            })
        }
    }
}

fn apply_env<F>(cfg: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    override_with(&mut cfg.provider, env_value(&lookup, PROVIDER_ENV)?.as_deref());
    override_with(&mut cfg.model, env_value(&lookup, MODEL_ENV)?.as_deref());
    override_with(&mut cfg.log_level, env_value(&lookup, LOG_LEVEL_ENV)?.as_deref());
    override_with(&mut cfg.api_key, env_value(&lookup, API_KEY_ENV)?.as_deref());
    override_with(&mut cfg.base_url, env_value(&lookup, BASE_URL_ENV)?.as_deref());

    if let Some(editor) = env_value(&lookup, EDITOR_ENV)?.filter(|e| !e.trim().is_empty()) {
        cfg.editor = Some(editor);
    }
    Ok(())
}

fn apply_flags(cfg: &mut Config, flags: &FlagOverrides) {
    override_with(&mut cfg.provider, flags.provider.as_deref());
    override_with(&mut cfg.model, flags.model.as_deref());
    override_with(&mut cfg.api_key, flags.api_key.as_deref());
    override_with(&mut cfg.log_level, flags.log_level.as_deref());
}
