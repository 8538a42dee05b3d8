//! Real process spawning with tokio.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use super::{Command, CommandRunner, Input, Output};
use crate::error::ExecError;

/// Runner that launches real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

fn stdin_for(input: &Input) -> Stdio {
    match input {
        Input::Null => Stdio::null(),
        Input::Inherit => Stdio::inherit(),
        Input::Bytes(_) => Stdio::piped(),
    }
}

fn stdio_for(output: Output) -> Stdio {
    match output {
        Output::Inherit => Stdio::inherit(),
        Output::Null => Stdio::null(),
    }
}

/// Spawn `command` with the given stdout/stderr, feed any stdin bytes and
/// wait for it to exit.
async fn spawn_and_wait(
    command: Command,
    stdout: Stdio,
    stderr: Stdio,
) -> Result<std::process::Output, ExecError> {
    debug!(program = command.program(), args = ?command.get_args(), "running command");

    let program = command.program().to_string();
    let mut child = TokioCommand::new(&program)
        .args(command.get_args())
        .stdin(stdin_for(command.get_stdin()))
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

    if let Input::Bytes(bytes) = command.get_stdin() {
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(bytes).await {
                Ok(()) => {}
                // The child quit without reading all of stdin; its exit status says why.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!(program = %program, "child closed stdin early");
                }
                Err(source) => {
                    return Err(ExecError::Io {
                        program: program.clone(),
                        source,
                    });
                }
            }
            // Dropping closes the pipe so the child sees EOF.
        }
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|source| ExecError::Io {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ExecError::Exit {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(output)
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(&self, command: Command) -> Result<Vec<u8>, ExecError> {
        let output = spawn_and_wait(command, Stdio::piped(), Stdio::piped()).await?;
        Ok(output.stdout)
    }

    async fn run(&self, command: Command) -> Result<(), ExecError> {
        let stdout = stdio_for(command.get_stdout());
        let stderr = stdio_for(command.get_stderr());
        spawn_and_wait(command, stdout, stderr).await?;
        Ok(())
    }

    fn look_path(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[cfg(unix)]
    async fn test_output_returns_stdout() {
        let output = SystemRunner
            .output(Command::new("echo").arg("hello"))
            .await
            .expect("echo should succeed");

        assert_eq!(String::from_utf8_lossy(&output).trim(), "hello");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let err = SystemRunner
            .output(Command::new("this-command-does-not-exist-12345"))
            .await
            .unwrap_err();

        assert!(err.is_not_found(), "expected not-found spawn error, got {:?}", err);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_non_zero_exit_keeps_code_and_stderr() {
        let err = SystemRunner
            .output(Command::new("sh").args(["-c", "echo 'bad things' >&2; exit 3"]))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), Some(3));
        match err {
            ExecError::Exit { stderr, .. } => assert!(stderr.contains("bad things")),
            other => panic!("Expected Exit error, got {:?}", other),
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_stdin_bytes_are_delivered() {
        let output = SystemRunner
            .output(Command::new("cat").stdin(Input::Bytes(b"piped message".to_vec())))
            .await
            .expect("cat should succeed");

        assert_eq!(output, b"piped message");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_child_ignoring_stdin_reports_its_exit_status() {
        let message = vec![b'x'; 1 << 20];

        let err = SystemRunner
            .run(
                Command::new("sh")
                    .args(["-c", "exit 4"])
                    .stdin(Input::Bytes(message))
                    .stdout(Output::Null)
                    .stderr(Output::Null),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::Exit { .. }), "got {:?}", err);
        assert_eq!(err.exit_code(), Some(4));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_reports_exit_status() {
        let result = SystemRunner
            .run(Command::new("false").stdout(Output::Null).stderr(Output::Null))
            .await;

        assert_eq!(result.unwrap_err().exit_code(), Some(1));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_run_succeeds_for_true() {
        let result = SystemRunner.run(Command::new("true")).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_look_path_misses_unknown_program() {
        assert!(SystemRunner.look_path("this-command-does-not-exist-12345").is_none());
    }
}
