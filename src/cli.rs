//! Slash commands for the interactive front end
//!
//! Any line that does not start with `/` is a chat message.

use crate::state_machine::{state::UnknownMode, ChatMode};
use std::path::PathBuf;
use thiserror::Error;

pub const HELP: &str = "\
Type a message to chat with the assistant. Commands:
  /mode <image|elearning|outline>  switch mode (starts a new session)
  /clear                           start a new session in the current mode
  /generate [index]                generate from the latest final prompt
  /ref                             show the reference panel
  /ref close                       close the reference panel
  /ref text <content>              use pasted text as reference content
  /upload <path>                   upload a Word document as reference content
  /show                            reprint the transcript
  /download [dir]                  save the generated image
  /help                            show this help
  /quit                            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Mode(ChatMode),
    Clear,
    Generate(Option<usize>),
    ReferenceOpen,
    ReferenceClose,
    ReferenceText(String),
    Upload(PathBuf),
    Show,
    Download(Option<PathBuf>),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command /{0}, try /help")]
    Unknown(String),
    #[error("/{0} needs an argument, try /help")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Mode(#[from] UnknownMode),
    #[error("'{0}' is not a message number")]
    InvalidIndex(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(command) = line.trim_start().strip_prefix('/') else {
            return Ok(Command::Send(line.to_string()));
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, rest)| (name, rest.trim()));

        match name {
            "mode" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("mode"));
                }
                Ok(Command::Mode(rest.parse()?))
            }
            "clear" => Ok(Command::Clear),
            "generate" | "gen" => {
                if rest.is_empty() {
                    return Ok(Command::Generate(None));
                }
                rest.parse()
                    .map(|index| Command::Generate(Some(index)))
                    .map_err(|_| CommandError::InvalidIndex(rest.to_string()))
            }
            "ref" => match rest.split_once(char::is_whitespace) {
                Some(("text", text)) => Ok(Command::ReferenceText(text.to_string())),
                None if rest == "text" => Err(CommandError::MissingArgument("ref text")),
                None if rest == "close" => Ok(Command::ReferenceClose),
                None if rest.is_empty() => Ok(Command::ReferenceOpen),
                _ => Err(CommandError::Unknown(format!("ref {rest}"))),
            },
            "upload" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("upload"));
                }
                Ok(Command::Upload(PathBuf::from(rest)))
            }
            "show" => Ok(Command::Show),
            "download" => Ok(Command::Download(
                (!rest.is_empty()).then(|| PathBuf::from(rest)),
            )),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
