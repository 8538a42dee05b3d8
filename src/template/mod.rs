//! Named prompt templates, parsed lazily and cached.
//!
//! Template sources are embedded at build time from `templates/`. The first
//! lookup of a name compiles it and publishes it into a handlebars registry
//! guarded by a read-mostly lock; later lookups and renders share the read
//! lock. Only successfully parsed templates are ever cached.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use handlebars::{Handlebars, Template};
use serde::Serialize;
use tracing::debug;

use crate::error::TemplateError;

pub const COMMIT_PROMPT: &str = "prompt/commit";
pub const COMMIT_FORMAT: &str = "format/commit";
pub const COMMIT_REVIEW: &str = "format/commit_review";
pub const PR_DESCRIPTION_PROMPT: &str = "prompt/pr_description";
pub const PR_DESCRIPTION_FORMAT: &str = "format/pull_request";
pub const PR_TITLE_PROMPT: &str = "prompt/pr_title";

/// Templates compiled into the binary.
const EMBEDDED: &[(&str, &str)] = &[
    (COMMIT_PROMPT, include_str!("../../templates/prompt/commit.hbs")),
    (COMMIT_FORMAT, include_str!("../../templates/format/commit.hbs")),
    (COMMIT_REVIEW, include_str!("../../templates/format/commit_review.hbs")),
    (
        PR_DESCRIPTION_PROMPT,
        include_str!("../../templates/prompt/pr_description.hbs"),
    ),
    (
        PR_DESCRIPTION_FORMAT,
        include_str!("../../templates/format/pull_request.hbs"),
    ),
    (PR_TITLE_PROMPT, include_str!("../../templates/prompt/pr_title.hbs")),
];

/// Renders named templates against arbitrary serializable data.
pub struct TemplateEngine {
    sources: HashMap<String, String>,
    registry: RwLock<Handlebars<'static>>,
    parses: AtomicUsize,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Engine over the embedded template set.
    pub fn new() -> Self {
        Self::with_sources(
            EMBEDDED
                .iter()
                .map(|(name, source)| (name.to_string(), source.to_string())),
        )
    }

    /// Engine over an arbitrary name → source set.
    pub fn with_sources<I, N, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut registry = Handlebars::new();
        // Prompts are plain text.
        registry.register_escape_fn(handlebars::no_escape);

        Self {
            sources: sources
                .into_iter()
                .map(|(n, s)| (n.into(), s.into()))
                .collect(),
            registry: RwLock::new(registry),
            parses: AtomicUsize::new(0),
        }
    }

    /// Look up a template, compiling and caching it on first use.
    pub fn lookup(&self, name: &str) -> Result<Template, TemplateError> {
        {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(template) = registry.get_template(name) {
                return Ok(template.clone());
            }
        }

        // Check and insert under one exclusive section so two callers that
        // both missed cannot both compile.
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(template) = registry.get_template(name) {
            return Ok(template.clone());
        }

        let source = self
            .sources
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        self.parses.fetch_add(1, Ordering::SeqCst);
        let template = Template::compile(source).map_err(|e| TemplateError::Parse {
            name: name.to_string(),
            source: Box::new(e),
        })?;

        debug!(template = name, "compiled template");
        registry.register_template(name, template.clone());
        Ok(template)
    }

    /// Whether `name` has been compiled into the cache.
    pub fn is_cached(&self, name: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_template(name)
            .is_some()
    }

    /// Render `name` with `data`. Fields missing from `data` render empty.
    pub fn render_string<T>(&self, name: &str, data: &T) -> Result<String, TemplateError>
    where
        T: Serialize,
    {
        self.lookup(name)?;

        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.render(name, data).map_err(|e| TemplateError::Render {
            name: name.to_string(),
            source: Box::new(e),
        })
    }

    pub fn render_bytes<T>(&self, name: &str, data: &T) -> Result<Vec<u8>, TemplateError>
    where
        T: Serialize,
    {
        self.render_string(name, data).map(String::into_bytes)
    }

    /// Render into a reader over the output.
    pub fn render<T>(&self, name: &str, data: &T) -> Result<Cursor<Vec<u8>>, TemplateError>
    where
        T: Serialize,
    {
        self.render_bytes(name, data).map(Cursor::new)
    }
}
