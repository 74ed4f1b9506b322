//! Special commands parser for interactive chat mode
//!
//! This module parses the slash commands that can be entered during an
//! interactive chat session. Special commands allow users to:
//! - Reload the chat history
//! - Upload a file attachment
//! - Show the logged-in identity
//! - Log out
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive; arguments (such
//! as file paths) keep their case.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the session or conversation rather than being sent
/// to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Reload the conversation from the server
    History,

    /// Upload the file at the given path
    Upload(PathBuf),

    /// Show the logged-in identity
    WhoAmI,

    /// Log out and leave the session
    Logout,

    /// Display help information
    Help,

    /// Exit the interactive session without logging out
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a regular chat message.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not
/// a valid command, and `CommandError::MissingArgument` if a command requires
/// an argument but none was provided.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use educonnect::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/upload Notes/Chapter1.pdf").unwrap();
/// assert_eq!(cmd, SpecialCommand::Upload(PathBuf::from("Notes/Chapter1.pdf")));
///
/// let cmd = parse_special_command("What is osmosis?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/history" | "/reload" => Ok(SpecialCommand::History),
        "/whoami" | "/me" => Ok(SpecialCommand::WhoAmI),
        "/logout" => Ok(SpecialCommand::Logout),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),

        "/upload" => Err(CommandError::MissingArgument {
            command: "/upload".to_string(),
            usage: "/upload <path>".to_string(),
        }),
        input if input.starts_with("/upload ") => {
            // Slice the original text so the path keeps its case.
            let path = trimmed["/upload ".len()..].trim();
            Ok(SpecialCommand::Upload(PathBuf::from(path)))
        }

        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the help text for interactive chat mode
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
==========================================

CONVERSATION:
  /history        - Reload the chat history from the server
  /reload         - Same as /history
  /upload <path>  - Upload a file attachment

SESSION:
  /whoami         - Show the logged-in user
  /logout         - Log out and end the session

OTHER:
  /help           - Show this help
  /exit, exit     - Leave chat mode (you stay logged in)

Anything else is sent to the assistant. Only one message can be in flight
at a time.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("Explain photosynthesis").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_history_aliases() {
        assert_eq!(
            parse_special_command("/history").unwrap(),
            SpecialCommand::History
        );
        assert_eq!(
            parse_special_command("/RELOAD").unwrap(),
            SpecialCommand::History
        );
    }

    #[test]
    fn test_parse_upload_keeps_path_case() {
        assert_eq!(
            parse_special_command("/Upload  ~/Docs/Essay Draft.docx ").unwrap(),
            SpecialCommand::Upload(PathBuf::from("~/Docs/Essay Draft.docx"))
        );
    }

    #[test]
    fn test_parse_upload_without_path() {
        assert!(matches!(
            parse_special_command("/upload"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(
            parse_special_command("/whoami").unwrap(),
            SpecialCommand::WhoAmI
        );
        assert_eq!(
            parse_special_command("/logout").unwrap(),
            SpecialCommand::Logout
        );
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "QUIT", "/exit", "/quit"] {
            assert_eq!(
                parse_special_command(input).unwrap(),
                SpecialCommand::Exit,
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_unknown_command_error_mentions_help() {
        let err = parse_special_command("/mode write").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/mode write".to_string()));
        assert!(err.to_string().contains("/help"));
    }
}
