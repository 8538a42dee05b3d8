//! Interactive review of generated text in the user's editor.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::ReviewError;
use crate::exec::{Command, CommandRunner};

/// Tried in order when `$EDITOR` is not set.
pub const EDITOR_FALLBACKS: [&str; 3] = ["nano", "vim", "vi"];

/// Prefix for lines git strips from the message.
pub const COMMENT_CHAR: &str = "#";

/// Git's cut line; everything below it is dropped from the message.
pub const SCISSORS: &str = "------------------------ >8 ------------------------";

/// Pick the editor: the configured one if any, else the first fallback on the path.
pub fn resolve_editor(
    configured: Option<&str>,
    runner: &dyn CommandRunner,
) -> Result<String, ReviewError> {
    if let Some(editor) = configured.map(str::trim).filter(|e| !e.is_empty()) {
        return Ok(editor.to_string());
    }

    match EDITOR_FALLBACKS
        .iter()
        .find(|candidate| runner.look_path(candidate).is_some())
    {
        Some(editor) => Ok(editor.to_string()),
        None => {
            warn!(fallbacks_tried = ?EDITOR_FALLBACKS, "no editor found");
            Err(ReviewError::NoEditor {
                tried: EDITOR_FALLBACKS.iter().map(|e| e.to_string()).collect(),
            })
        }
    }
}

/// Open `path` in `editor`, attached to this process's stdio, and wait.
///
/// `editor` may carry its own arguments (`code --wait`); the path goes last.
pub async fn open_editor(
    runner: &dyn CommandRunner,
    editor: &str,
    path: &Path,
) -> Result<(), ReviewError> {
    let mut parts = editor.split_whitespace();
    let program = parts.next().ok_or_else(|| ReviewError::NoEditor {
        tried: vec![editor.to_string()],
    })?;

    info!(editor, path = %path.display(), "opening editor for review");
    let command = Command::new(program)
        .args(parts)
        .arg(path.to_string_lossy())
        .interactive();
    runner.run(command).await.map_err(ReviewError::Editor)
}

/// Prefix every line of `text` with `prefix`. Each output line ends in `\n`.
pub fn prefix_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}\n", prefix, line))
        .collect()
}

/// A file inside its own temporary directory. Both are removed on drop.
#[derive(Debug)]
pub struct ScratchFile {
    _dir: TempDir,
    path: PathBuf,
}

impl ScratchFile {
    /// Create `<tmp>/<dir_prefix>XXXX/<file_name>` holding `contents`.
    pub fn create(dir_prefix: &str, file_name: &str, contents: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(dir_prefix).tempdir()?;
        let path = dir.path().join(file_name);
        std::fs::write(&path, contents)?;
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as an argument string.
    pub fn arg(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    pub fn read(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    pub fn write(&self, contents: &str) -> std::io::Result<()> {
        std::fs::write(&self.path, contents)
    }
}
