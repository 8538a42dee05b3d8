//! Scripted runner for tests.
//!
//! Replies are queued up front and handed out in call order, whichever of
//! `output` or `run` is called. Every invocation is recorded so tests can
//! assert on the exact programs, arguments and stdin that a flow produced.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{Command, CommandRunner, Input, Output};
use crate::error::ExecError;

/// Which runner method handled an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Output,
    Run,
}

/// A recorded call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub method: Method,
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Input,
    pub stdout: Output,
    pub stderr: Output,
    /// Contents of every argument that named an existing file at call time.
    pub file_snapshots: Vec<(PathBuf, String)>,
}

impl Invocation {
    /// `program arg1 arg2 ...`
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Stdin bytes as text, if the command was fed bytes.
    pub fn stdin_text(&self) -> Option<String> {
        match &self.stdin {
            Input::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
            _ => None,
        }
    }
}

enum Reply {
    Result(Result<Vec<u8>, ExecError>),
    /// Succeed after overwriting the file arguments, the way an editor would.
    Edit(String),
}

/// A [`CommandRunner`] that returns pre-programmed replies.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<Reply>>,
    invocations: Mutex<Vec<Invocation>>,
    paths: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply with the given stdout.
    pub fn push_output(&self, output: impl Into<Vec<u8>>) -> &Self {
        lock(&self.replies).push_back(Reply::Result(Ok(output.into())));
        self
    }

    /// Queue a successful reply with no output.
    pub fn push_ok(&self) -> &Self {
        self.push_output(Vec::new())
    }

    /// Queue a failing reply.
    pub fn push_error(&self, error: ExecError) -> &Self {
        lock(&self.replies).push_back(Reply::Result(Err(error)));
        self
    }

    /// Queue a successful reply that first replaces the contents of every
    /// existing absolute file argument with `contents`.
    pub fn push_edit(&self, contents: impl Into<String>) -> &Self {
        lock(&self.replies).push_back(Reply::Edit(contents.into()));
        self
    }

    /// Make `program` resolvable through [`CommandRunner::look_path`].
    pub fn with_path(self, program: &str) -> Self {
        lock(&self.paths).insert(program.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.invocations).clone()
    }

    pub fn output_called(&self) -> bool {
        lock(&self.invocations)
            .iter()
            .any(|i| i.method == Method::Output)
    }

    pub fn run_called(&self) -> bool {
        lock(&self.invocations).iter().any(|i| i.method == Method::Run)
    }

    /// True if any recorded invocation started with `program` and `args`.
    pub fn was_invoked(&self, program: &str, args: &[&str]) -> bool {
        lock(&self.invocations).iter().any(|i| {
            i.program == program
                && i.args.len() >= args.len()
                && i.args.iter().zip(args).all(|(a, b)| a == b)
        })
    }

    fn record(&self, method: Method, command: Command) -> Result<Vec<u8>, ExecError> {
        let file_snapshots: Vec<(PathBuf, String)> = command
            .get_args()
            .iter()
            .map(Path::new)
            .filter(|p| p.is_absolute() && p.is_file())
            .filter_map(|p| {
                std::fs::read_to_string(p)
                    .ok()
                    .map(|contents| (p.to_path_buf(), contents))
            })
            .collect();

        let invocation = Invocation {
            method,
            program: command.program().to_string(),
            args: command.get_args().to_vec(),
            stdin: command.get_stdin().clone(),
            stdout: command.get_stdout(),
            stderr: command.get_stderr(),
            file_snapshots: file_snapshots.clone(),
        };
        lock(&self.invocations).push(invocation);

        let reply = lock(&self.replies).pop_front();
        match reply {
            Some(Reply::Result(result)) => result,
            Some(Reply::Edit(contents)) => {
                for (path, _) in &file_snapshots {
                    std::fs::write(path, &contents).map_err(|source| ExecError::Io {
                        program: command.program().to_string(),
                        source,
                    })?;
                }
                Ok(Vec::new())
            }
            None => Err(ExecError::Unscripted {
                program: command.program().to_string(),
                args: command.get_args().to_vec(),
            }),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn output(&self, command: Command) -> Result<Vec<u8>, ExecError> {
        self.record(Method::Output, command)
    }

    async fn run(&self, command: Command) -> Result<(), ExecError> {
        self.record(Method::Run, command).map(|_| ())
    }

    fn look_path(&self, program: &str) -> Option<PathBuf> {
        if lock(&self.paths).contains(program) {
            Some(PathBuf::from("/usr/bin").join(program))
        } else {
            None
        }
    }
}
