//! EduConnect - face-login chat client library
//!
//! This library provides the session and conversation lifecycle of the
//! EduConnect client: a face image is captured, exchanged for a session at
//! the login endpoint, and the resulting bearer token drives chat, history,
//! upload and logout requests.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `capture`: Camera device abstraction and JPEG frame capture
//! - `session`: Session value, the shared session store, and its persistence
//! - `api`: HTTP client for the EduConnect endpoints and their wire types
//! - `auth`: Login flow turning a captured image into a session
//! - `conversation`: Message log, single-flight send, history and uploads
//! - `logout`: Local session teardown and best-effort server notification
//! - `client`: Facade wiring all of the above around one session store
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use educonnect::{Config, EduConnect};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = EduConnect::from_config(&config)?;
//!     if let Some(reply) = client.send_message("Explain photosynthesis").await? {
//!         println!("{}: {}", reply.display_label, reply.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod capture;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod logout;
pub mod session;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, Attachment};
pub use auth::AuthFlow;
pub use capture::{CameraDevice, CaptureAdapter, CapturedImage, StillImageCamera};
pub use client::EduConnect;
pub use config::Config;
pub use conversation::{ConversationController, ConversationState, Message, Origin};
pub use error::{ClientResult, EduConnectError, Result};
pub use logout::LogoutFlow;
pub use session::{Role, Session, SessionStore};

#[cfg(test)]
pub mod test_utils;
