//! Interactive questions.
//!
//! [`Prompter`] is the seam between the question sequence in [`survey`] and
//! the terminal, so the sequence can run against scripted answers.

pub mod survey;
pub mod terminal;

pub use survey::{SurveyError, ask_path, ask_rest};
pub use terminal::DialoguerPrompter;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Prompt was interrupted")]
    Interrupted,

    #[error("Failed to read answer to '{prompt}': {message}")]
    Terminal { prompt: String, message: String },

    #[error("Answer {index} to '{prompt}' is not one of the choices")]
    InvalidChoice { prompt: String, index: usize },
}

/// One question at a time, answered by the operator.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Pick one of `items`; returns its index.
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize, PromptError>;

    /// Free text, `default` when left empty.
    fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError>;
}
