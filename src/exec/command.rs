//! Description of a single external-process invocation.

use std::fmt;

/// Where the child's stdin comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    #[default]
    Null,
    /// Share this process's stdin.
    Inherit,
    /// Feed these bytes, then close the pipe.
    Bytes(Vec<u8>),
}

/// Where the child's stdout/stderr go during [`super::CommandRunner::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Inherit,
    Null,
}

/// A program plus its arguments and stdio attachments.
///
/// Built fresh for every invocation and consumed by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
    stdin: Input,
    stdout: Output,
    stderr: Output,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: Input::Null,
            stdout: Output::Inherit,
            stderr: Output::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: Input) -> Self {
        self.stdin = input;
        self
    }

    pub fn stdout(mut self, output: Output) -> Self {
        self.stdout = output;
        self
    }

    pub fn stderr(mut self, output: Output) -> Self {
        self.stderr = output;
        self
    }

    /// Attach all three standard streams to this process's own stdio.
    pub fn interactive(self) -> Self {
        self.stdin(Input::Inherit)
            .stdout(Output::Inherit)
            .stderr(Output::Inherit)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_stdin(&self) -> &Input {
        &self.stdin
    }

    pub fn get_stdout(&self) -> Output {
        self.stdout
    }

    pub fn get_stderr(&self) -> Output {
        self.stderr
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_args_in_order() {
        let cmd = Command::new("git").arg("commit").args(["--file", "-"]);

        assert_eq!(cmd.program(), "git");
        assert_eq!(cmd.get_args(), ["commit", "--file", "-"]);
        assert_eq!(cmd.to_string(), "git commit --file -");
    }

    #[test]
    fn test_defaults_to_null_stdin_and_inherited_output() {
        let cmd = Command::new("git");

        assert_eq!(cmd.get_stdin(), &Input::Null);
        assert_eq!(cmd.get_stdout(), Output::Inherit);
        assert_eq!(cmd.get_stderr(), Output::Inherit);
    }

    #[test]
    fn test_interactive_inherits_all_streams() {
        let cmd = Command::new("vim").stdout(Output::Null).interactive();

        assert_eq!(cmd.get_stdin(), &Input::Inherit);
        assert_eq!(cmd.get_stdout(), Output::Inherit);
        assert_eq!(cmd.get_stderr(), Output::Inherit);
    }
}
