//! Command-line interface definition for EduConnect
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for face login, chatting, uploads, and logout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// EduConnect - face-login chat client
///
/// Log in by presenting a captured face image, then chat with the
/// EduConnect AI tutor.
#[derive(Parser, Debug, Clone)]
#[command(name = "educonnect")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the API base URL from config
    #[arg(long)]
    pub api_base: Option<String>,

    /// Session profile to use (each profile holds its own login)
    #[arg(long)]
    pub profile: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for EduConnect
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in with a face image read from the still-image camera
    Login {
        /// Image file acting as the camera feed (any format `image` can decode)
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Show the currently logged-in identity
    Whoami,

    /// Send a single chat message and print the reply
    Send {
        /// Message text
        text: String,
    },

    /// Print the chat history for the current session
    History,

    /// Upload a file attachment
    Upload {
        /// Path of the file to upload
        file: PathBuf,
    },

    /// Log out and clear the stored session
    Logout,

    /// Start an interactive chat session
    Chat,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_base: None,
            profile: None,
            command: Commands::Whoami,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.api_base.is_none());
    }

    #[test]
    fn test_cli_parse_login() {
        let cli = Cli::try_parse_from(["educonnect", "login", "--image", "face.jpg"]).unwrap();
        match cli.command {
            Commands::Login { image } => assert_eq!(image, PathBuf::from("face.jpg")),
            other => panic!("Expected Login command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_send_with_overrides() {
        let cli = Cli::try_parse_from([
            "educonnect",
            "--api-base",
            "http://localhost:9000",
            "--profile",
            "tab2",
            "send",
            "Explain photosynthesis",
        ])
        .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cli.profile.as_deref(), Some("tab2"));
        match cli.command {
            Commands::Send { text } => assert_eq!(text, "Explain photosynthesis"),
            other => panic!("Expected Send command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_upload() {
        let cli = Cli::try_parse_from(["educonnect", "upload", "notes.pdf"]).unwrap();
        assert!(matches!(cli.command, Commands::Upload { .. }));
    }

    #[test]
    fn test_cli_login_requires_image() {
        let result = Cli::try_parse_from(["educonnect", "login"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["educonnect", "-v", "logout"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Logout));
    }
}
