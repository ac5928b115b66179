//! Line parsing for the debug shell.

use crate::control_msg::{Action, Brightness, Request};
use crate::error::ParseError;

pub const HELP: &str = "Valid commands are: set=NUM, fade=NUM, sd_set_brightness=NUM, sd_fade_brightness=NUM, status, reset, help, quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Invoke(Request),
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    #[error("expected input in the form of key=value or a bare command")]
    Syntax,
    #[error("unknown key {0}")]
    UnknownKey(String),
    #[error("Invalid value: {0}")]
    Value(#[from] ParseError),
}

/// Parses one line typed at the prompt. `Ok(None)` for blank lines.
pub fn parse_line(input: &str) -> Result<Option<ShellCommand>, ShellError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let command = match input.split_once('=') {
        None => match input {
            "help" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            "status" => ShellCommand::Invoke(Request::Status),
            "reset" => ShellCommand::Invoke(Request::Reset),
            _ => return Err(ShellError::Syntax),
        },
        Some((key, value)) => {
            let action = Action::from_string(key).map_err(|_| ShellError::UnknownKey(key.trim().to_string()))?;
            ShellCommand::Invoke(action.request(Brightness::parse(value)?))
        }
    };
    Ok(Some(command))
}
