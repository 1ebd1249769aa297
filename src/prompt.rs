use inquire::{InquireError, Text};

use crate::error::{Error, Result};

/// Source of yes/no/skip decisions. Returns one line of free text per call;
/// a closed or broken input stream is an error, never an empty answer.
pub trait Prompter {
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Install,
    Skip,
    Decline,
}

impl Answer {
    pub fn parse(line: &str) -> Answer {
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Answer::Install,
            "s" | "skip" => Answer::Skip,
            _ => Answer::Decline,
        }
    }
}

/// Prompts on the terminal.
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match Text::new(prompt).prompt() {
            Ok(line) => Ok(line),
            // Esc is a "no", Ctrl-C and a dead terminal abort the run
            Err(InquireError::OperationCanceled) => Ok(String::new()),
            Err(e) => Err(Error::Input(e.to_string())),
        }
    }
}
