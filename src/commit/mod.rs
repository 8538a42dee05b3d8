//! AI-generated commit messages for staged changes.

pub mod message;
pub mod prompt;

pub use message::{auto_commit, generate_commit_message};
pub use prompt::{build_commit_prompt, build_review_document};
