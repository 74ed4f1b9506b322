/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `login`   - Face login from a still-image camera
- `session` - Identity display and logout
- `chat`    - One-shot send, history, upload and the interactive chat mode

Every handler builds an [`EduConnect`] client from the loaded configuration,
so a session persisted by `login` is picked up by later invocations.
*/

use crate::client::EduConnect;
use crate::config::Config;
use crate::conversation::{Message, Origin};
use crate::error::{EduConnectError, Result};
use crate::session::Session;

// Special commands parser for the interactive chat mode
pub mod special_commands;

/// Render one conversation entry as `label: text`, colored by origin.
pub fn format_message(message: &Message) -> String {
    use colored::Colorize;

    let label = match message.origin {
        Origin::Assistant => message.display_label.cyan().bold(),
        Origin::User => message.display_label.green().bold(),
    };
    format!("{}: {}", label, message.text)
}

/// One-line description of a logged-in identity.
pub fn describe_session(session: &Session) -> String {
    let mut line = format!("{} ({})", session.display_name(), session.role());
    if !session.user_id().is_empty() {
        line.push_str(&format!(" [id {}]", session.user_id()));
    }
    line
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("(no messages yet)");
        return;
    }
    for message in messages {
        println!("{}", format_message(message));
    }
}

// Login command handler
pub mod login {
    //! Face login handler.
    //!
    //! The image file stands in for the camera feed: it is opened as a
    //! [`StillImageCamera`], one frame is captured through the
    //! [`CaptureAdapter`], and the stream is released before the login
    //! request is sent.

    use super::*;
    use crate::capture::{CaptureAdapter, StillImageCamera};
    use std::path::Path;
    use std::sync::Arc;

    /// Log in with a face image
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `image` - Image file acting as the camera feed
    ///
    /// # Errors
    ///
    /// Returns the lifecycle error of the failed step: camera, capture, or
    /// the login request itself.
    pub async fn run_login(config: Config, image: &Path) -> Result<()> {
        tracing::info!("Starting face login from {}", image.display());

        let client = EduConnect::from_config(&config)?;
        let adapter = CaptureAdapter::new(Arc::new(StillImageCamera::new(image)));

        match client.capture_and_login(&adapter).await {
            Ok(session) => {
                use colored::Colorize;
                println!(
                    "{} {}",
                    "Logged in as".green(),
                    describe_session(&session)
                );
                Ok(())
            }
            Err(e) => {
                if e.is_terminal_for_attempt() {
                    eprintln!("Login attempt ended; capture a new image to try again.");
                }
                Err(e.into())
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::config::SessionBackendKind;

        #[tokio::test]
        async fn test_run_login_missing_image_is_camera_error() {
            let mut config = Config::default();
            config.session.backend = SessionBackendKind::Memory;

            let err = run_login(config, Path::new("/nonexistent/face.jpg"))
                .await
                .unwrap_err();
            let err = err.downcast::<EduConnectError>().unwrap();
            assert!(matches!(err, EduConnectError::CameraUnavailable(_)));
        }
    }
}

// Session command handlers
pub mod session {
    //! Identity display and logout handlers.

    use super::*;

    /// Print the currently logged-in identity
    pub fn whoami(config: Config) -> Result<()> {
        let client = EduConnect::from_config(&config)?;
        match client.session() {
            Some(session) => println!("{}", describe_session(&session)),
            None => println!("Not logged in"),
        }
        Ok(())
    }

    /// Log out and clear the stored session
    ///
    /// The local session is cleared before the server is notified. The
    /// notification is awaited here only so it can finish before the
    /// process exits; its failure never changes the outcome.
    pub async fn run_logout(config: Config) -> Result<()> {
        let client = EduConnect::from_config(&config)?;
        let was_authenticated = client.is_authenticated();

        if let Some(notification) = client.logout() {
            if let Err(e) = notification.await {
                tracing::warn!("Logout notification task failed: {}", e);
            }
        }

        if was_authenticated {
            println!("Logged out");
        } else {
            println!("Not logged in");
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::config::SessionBackendKind;

        fn memory_config() -> Config {
            let mut config = Config::default();
            config.session.backend = SessionBackendKind::Memory;
            config
        }

        #[test]
        fn test_whoami_without_session_succeeds() {
            assert!(whoami(memory_config()).is_ok());
        }

        #[tokio::test]
        async fn test_logout_without_session_succeeds() {
            assert!(run_logout(memory_config()).await.is_ok());
        }
    }
}

// Chat command handlers
pub mod chat {
    //! Chat handlers: one-shot send, history, upload, and the interactive
    //! readline-based chat loop.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::api::Attachment;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::Path;

    fn authenticated_client(config: &Config) -> Result<EduConnect> {
        let client = EduConnect::from_config(config)?;
        if !client.is_authenticated() {
            return Err(EduConnectError::NotAuthenticated.into());
        }
        Ok(client)
    }

    /// Send one message and print the reply
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session and `SendFailed` when
    /// the request fails.
    pub async fn run_send(config: Config, text: &str) -> Result<()> {
        let client = authenticated_client(&config)?;
        match client.send_message(text).await? {
            Some(reply) => println!("{}", format_message(&reply)),
            None => tracing::debug!("Ignoring blank message"),
        }
        Ok(())
    }

    /// Fetch and print the chat history
    pub async fn run_history(config: Config) -> Result<()> {
        let client = authenticated_client(&config)?;
        let count = client.load_history().await?;
        tracing::debug!("Loaded {} history messages", count);
        print_messages(&client.conversation().messages());
        Ok(())
    }

    /// Upload a file attachment
    pub async fn run_upload(config: Config, file: &Path) -> Result<()> {
        let client = authenticated_client(&config)?;
        let attachment = Attachment::from_path(file).await?;
        let message = client.upload_attachment(attachment).await?;
        println!("{}", format_message(&message));
        Ok(())
    }

    /// Start interactive chat mode
    ///
    /// Loads the history once, then submits every line that is not a special
    /// command as a chat message. Failures are printed and the loop goes on;
    /// only `/logout`, `/exit` or end-of-input leave it.
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    ///
    /// # Examples
    ///
    /// ```
    /// use educonnect::commands::chat;
    /// use educonnect::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default()).await?;
    /// ```
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let client = authenticated_client(&config)?;
        let user_label = client
            .session()
            .map(|s| s.display_name().to_string())
            .unwrap_or_else(|| config.chat.user_label_fallback.clone());

        print_welcome_banner(&user_label);

        match client.load_history().await {
            Ok(_) => print_messages(&client.conversation().messages()),
            Err(e) => println!("{}", format!("{} (starting empty)", e).yellow()),
        }

        let mut rl = DefaultEditor::new()?;
        let prompt = format!("{}> ", user_label);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::History => {
                            match client.load_history().await {
                                Ok(_) => print_messages(&client.conversation().messages()),
                                Err(e) => eprintln!("{}", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::Upload(path) => {
                            let result = match Attachment::from_path(&path).await {
                                Ok(attachment) => client.upload_attachment(attachment).await,
                                Err(e) => Err(e),
                            };
                            match result {
                                Ok(message) => println!("{}", format_message(&message)),
                                Err(e) => eprintln!("{}", e.to_string().red()),
                            }
                            continue;
                        }
                        SpecialCommand::WhoAmI => {
                            match client.session() {
                                Some(session) => println!("{}", describe_session(&session)),
                                None => println!("Not logged in"),
                            }
                            continue;
                        }
                        SpecialCommand::Logout => {
                            if let Some(notification) = client.logout() {
                                if let Err(e) = notification.await {
                                    tracing::warn!("Logout notification task failed: {}", e);
                                }
                            }
                            println!("Logged out");
                            break;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            // Regular chat message
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    match client.send_message(trimmed).await {
                        Ok(Some(reply)) => println!("{}\n", format_message(&reply)),
                        Ok(None) => {}
                        Err(EduConnectError::NotAuthenticated) => {
                            eprintln!("{}", "Session ended; log in again.".red());
                            break;
                        }
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        tracing::info!("Leaving interactive chat mode");
        Ok(())
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(user_label: &str) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              EduConnect Chat - Welcome!                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Logged in as {}", user_label.green().bold());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_session;

    #[test]
    fn test_format_message_includes_label_and_text() {
        colored::control::set_override(false);
        let message = Message::assistant("Plants make food from light.", "EduConnect");
        assert_eq!(
            format_message(&message),
            "EduConnect: Plants make food from light."
        );
    }

    #[test]
    fn test_describe_session() {
        let session = sample_session("t1");
        assert_eq!(describe_session(&session), "Ana (student) [id u1]");
    }
}
