use super::{PromptError, Prompter};
use dialoguer::{Confirm, Error as DialoguerError, Input, Select};
use std::io::ErrorKind;

/// Asks on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerPrompter;

fn prompt_error(prompt: &str, err: DialoguerError) -> PromptError {
    match err {
        DialoguerError::IO(err) if err.kind() == ErrorKind::Interrupted => PromptError::Interrupted,
        err => PromptError::Terminal {
            prompt: prompt.to_string(),
            message: err.to_string(),
        },
    }
}

impl Prompter for DialoguerPrompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize, PromptError> {
        let selection = Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact_opt()
            .map_err(|err| prompt_error(prompt, err))?;

        selection.ok_or(PromptError::Interrupted)
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError> {
        let mut input = Input::<String>::new().with_prompt(prompt);
        if default.is_empty() {
            input = input.allow_empty(true);
        } else {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(|err| prompt_error(prompt, err))
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        let answer = Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact_opt()
            .map_err(|err| prompt_error(prompt, err))?;

        answer.ok_or(PromptError::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_interrupt_maps_to_interrupted() {
        let err = prompt_error("path", DialoguerError::IO(io::Error::from(ErrorKind::Interrupted)));
        assert_eq!(err, PromptError::Interrupted);
    }

    #[test]
    fn test_other_io_errors_keep_prompt() {
        let err = prompt_error("path", DialoguerError::IO(io::Error::from(ErrorKind::NotFound)));
        assert!(matches!(err, PromptError::Terminal { prompt, .. } if prompt == "path"));
    }
}
