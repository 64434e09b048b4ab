//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! operations requiring user input must either have defaults or fail
//! with a clear error message.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::IoError(err.to_string())
    }
}

fn write_prompt(message: &str) -> Result<(), PromptError> {
    let mut stderr = io::stderr();
    write!(stderr, "{} > ", message)?;
    stderr.flush()?;
    Ok(())
}

/// Read one line from `reader`, trimmed. EOF means the user cancelled.
fn read_answer(reader: &mut impl BufRead) -> Result<String, PromptError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(PromptError::Cancelled);
    }
    Ok(line.trim().to_string())
}

fn parse_confirm(answer: &str, default: bool) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Prompt for confirmation (yes/no).
///
/// An empty answer takes `default`; an unrecognized answer re-prompts.
pub fn confirm(message: &str, default: bool, interactive: bool) -> Result<bool, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    loop {
        write_prompt(&format!("{} {}", message, hint))?;
        if let Some(answer) = parse_confirm(&read_answer(&mut reader)?, default) {
            return Ok(answer);
        }
    }
}

/// Prompt for text input.
///
/// Returns the trimmed answer, or `default` when the answer is empty.
pub fn input(
    message: &str,
    default: Option<&str>,
    interactive: bool,
) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    write_prompt(message)?;
    let answer = read_answer(&mut io::stdin().lock())?;
    match (answer.is_empty(), default) {
        (true, Some(d)) => Ok(d.to_string()),
        _ => Ok(answer),
    }
}

/// Prompt for masked input (e.g., tokens).
///
/// The input is not echoed to the terminal.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    let answer = rpassword::prompt_password(format!("{} > ", message))?;
    let answer = answer.trim().to_string();
    if answer.is_empty() {
        return Err(PromptError::Cancelled);
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_refuses() {
        assert!(matches!(
            confirm("go?", true, false),
            Err(PromptError::NotInteractive)
        ));
        assert!(matches!(
            input("name", None, false),
            Err(PromptError::NotInteractive)
        ));
        assert!(matches!(
            password("token", false),
            Err(PromptError::NotInteractive)
        ));
    }

    #[test]
    fn confirm_answers() {
        assert_eq!(parse_confirm("", true), Some(true));
        assert_eq!(parse_confirm("", false), Some(false));
        assert_eq!(parse_confirm("Y", false), Some(true));
        assert_eq!(parse_confirm("no", true), Some(false));
        assert_eq!(parse_confirm("maybe", true), None);
    }

    #[test]
    fn read_answer_trims_and_detects_eof() {
        let mut reader = io::Cursor::new(b"  origin \n".to_vec());
        assert_eq!(read_answer(&mut reader).unwrap(), "origin");
        assert!(matches!(
            read_answer(&mut reader),
            Err(PromptError::Cancelled)
        ));
    }
}
