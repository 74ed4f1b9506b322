//! Session persistence backends
//!
//! The [`SessionStore`](super::SessionStore) writes through a
//! [`SessionBackend`] so a login survives process restarts within the same
//! profile, the way a browser tab keeps its session storage across reloads.
//!
//! Sessions are serialized to JSON before storage and deserialized on load.
//! Three backends are provided:
//!
//! - [`FileBackend`] -- a JSON file per profile in the per-user data
//!   directory, written atomically.
//! - [`KeyringBackend`] -- the OS native credential store (Keychain on
//!   macOS, Secret Service on Linux, Windows Credential Manager on Windows).
//! - [`MemoryBackend`] -- process memory; nothing survives a restart.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use directories::ProjectDirs;

use super::Session;
use crate::config::{SessionBackendKind, SessionConfig};
use crate::error::{ClientResult, EduConnectError};

/// Storage for the single persisted session of one profile.
///
/// `load` returns `Ok(None)` when nothing was saved, so callers can tell
/// "never logged in" apart from a genuine storage error. `delete` is a no-op
/// when nothing is stored.
pub trait SessionBackend: Send + Sync + std::fmt::Debug {
    /// Loads the persisted session, if any.
    fn load(&self) -> ClientResult<Option<Session>>;

    /// Persists `session`, replacing any previous record.
    fn save(&self, session: &Session) -> ClientResult<()>;

    /// Removes the persisted record.
    fn delete(&self) -> ClientResult<()>;
}

/// Builds the backend selected by configuration.
///
/// # Errors
///
/// Returns [`EduConnectError::SessionStorage`] when the file backend has no
/// explicit path and the per-user data directory cannot be determined.
pub fn build_backend(config: &SessionConfig) -> ClientResult<Box<dyn SessionBackend>> {
    let backend: Box<dyn SessionBackend> = match config.backend {
        SessionBackendKind::File => match &config.path {
            Some(path) => Box::new(FileBackend::new(path.clone())),
            None => Box::new(FileBackend::default_location(&config.profile)?),
        },
        SessionBackendKind::Keyring => Box::new(KeyringBackend::new(&config.profile)),
        SessionBackendKind::Memory => Box::new(MemoryBackend::new()),
    };
    tracing::debug!("Using session backend: {:?}", backend);
    Ok(backend)
}

// ---------------------------------------------------------------------------
// FileBackend
// ---------------------------------------------------------------------------

/// JSON file holding one profile's session.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend that stores the session at `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Creates a backend under the per-user data directory, one file per
    /// profile.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::SessionStorage`] if the data directory
    /// cannot be determined.
    pub fn default_location(profile: &str) -> ClientResult<Self> {
        let proj_dirs = ProjectDirs::from("space", "bitbasher", "educonnect").ok_or_else(|| {
            EduConnectError::SessionStorage("Could not determine data directory".into())
        })?;
        let file_name = format!("{}.json", sanitize_profile(profile));
        Ok(Self::new(proj_dirs.data_dir().join("sessions").join(file_name)))
    }

    /// Location of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionBackend for FileBackend {
    fn load(&self) -> ClientResult<Option<Session>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: Session = serde_json::from_str(&contents)?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EduConnectError::SessionStorage(format!(
                    "Failed to create session directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(session)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn delete(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps profile names usable as file names.
fn sanitize_profile(profile: &str) -> String {
    profile
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// KeyringBackend
// ---------------------------------------------------------------------------

/// OS keyring entry holding one profile's session.
#[derive(Debug, Clone)]
pub struct KeyringBackend {
    profile: String,
}

impl KeyringBackend {
    /// Creates a keyring accessor for `profile`.
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
        }
    }

    /// Builds the keyring service name for the profile.
    ///
    /// The name is prefixed with `educonnect-session-` to avoid collisions
    /// with other applications that use the same keyring.
    fn service_name(&self) -> String {
        format!("educonnect-session-{}", self.profile)
    }

    fn entry(&self) -> ClientResult<keyring::Entry> {
        keyring::Entry::new(&self.service_name(), &self.profile).map_err(EduConnectError::Keyring)
    }
}

impl SessionBackend for KeyringBackend {
    fn load(&self) -> ClientResult<Option<Session>> {
        match self.entry()?.get_password() {
            Ok(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(EduConnectError::Keyring(e)),
        }
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        let json_str = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&json_str)
            .map_err(EduConnectError::Keyring)
    }

    fn delete(&self) -> ClientResult<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(EduConnectError::Keyring(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Serialized session kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    record: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with a raw record, as if a previous run
    /// had written it.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(raw.into())),
        }
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> ClientResult<Option<Session>> {
        let record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        match record.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        let raw = serde_json::to_string(session)?;
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw);
        Ok(())
    }

    fn delete(&self) -> ClientResult<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
