//! External process execution behind a swappable runner.

pub mod command;
pub mod runner;
pub mod scripted;
pub mod system;

pub use command::{Command, Input, Output};
#[cfg(test)]
pub use runner::MockCommandRunner;
pub use runner::CommandRunner;
pub use scripted::{Invocation, Method, ScriptedRunner};
pub use system::SystemRunner;
