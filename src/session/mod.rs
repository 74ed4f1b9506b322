//! Session data model and the tab-scoped Session Store
//!
//! A [`Session`] is the authenticated identity returned by a successful face
//! login: the opaque bearer token plus the identity fields that arrived in
//! the same login response. The [`SessionStore`] exclusively owns the current
//! session, persists it through a [`SessionBackend`] so a restart within the
//! same profile keeps the login, and is cleared on logout.
//!
//! Every component that issues an authenticated request holds an
//! `Arc<SessionStore>` and reads the token at call time; nothing caches the
//! token separately, so a [`SessionStore::clear`] takes effect for the very
//! next request.
//!
//! # Stale responses
//!
//! The store carries a generation counter bumped on every `set` and `clear`.
//! Requests capture the generation at dispatch through
//! [`SessionStore::snapshot`] and check [`SessionStore::is_current`] before
//! applying a response, so a reply that lands after a logout (or a new
//! login) is dropped instead of mutating the conversation.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClientResult, EduConnectError};

pub mod persistence;

pub use persistence::{build_backend, FileBackend, KeyringBackend, MemoryBackend, SessionBackend};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role of the logged-in user as reported by the login endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    /// Absent or unrecognized role string
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Maps a role string from the login response onto [`Role`].
    ///
    /// Matching is case-insensitive; anything unrecognized is
    /// [`Role::Unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// use educonnect::session::Role;
    ///
    /// assert_eq!(Role::parse("Student"), Role::Student);
    /// assert_eq!(Role::parse("janitor"), Role::Unknown);
    /// ```
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "student" => Self::Student,
            "teacher" => Self::Teacher,
            "admin" => Self::Admin,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Authenticated identity state, valid until logout or expiry.
///
/// Fields are private: a `Session` can only be built through
/// [`Session::new`], which refuses an empty token, so a value of this type is
/// never a partial session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    user_id: String,
    display_name: String,
    role: Role,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session from the fields of one login response.
    ///
    /// # Errors
    ///
    /// Returns [`EduConnectError::SessionStorage`] when `token` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use educonnect::session::{Role, Session};
    ///
    /// let session = Session::new("t1", "u1", "Ana", Role::Student).unwrap();
    /// assert_eq!(session.token(), "t1");
    /// assert_eq!(session.display_name(), "Ana");
    /// assert!(Session::new("", "u1", "Ana", Role::Student).is_err());
    /// ```
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> ClientResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(EduConnectError::SessionStorage(
                "session token cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            token,
            user_id: user_id.into(),
            display_name: display_name.into(),
            role,
            created_at: Utc::now(),
        })
    }

    /// Opaque bearer token
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// When the login that produced this session completed
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when a rehydrated record still satisfies the session
    /// invariant (non-empty token).
    pub(crate) fn is_valid(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &redact_token(&self.token))
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Shortens a token for log output.
///
/// # Examples
///
/// ```
/// use educonnect::session::redact_token;
///
/// assert_eq!(redact_token("abcdef123456"), "abcd…");
/// assert_eq!(redact_token("ab"), "…");
/// ```
pub fn redact_token(token: &str) -> String {
    if token.chars().count() <= 4 {
        return "…".to_string();
    }
    let prefix: String = token.chars().take(4).collect();
    format!("{}…", prefix)
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    session: Option<Session>,
    generation: u64,
}

/// Process-wide holder of the current [`Session`].
///
/// Writers are the Auth Flow (`set` on successful login) and the Logout Flow
/// (`clear`); every other component only reads.
#[derive(Debug)]
pub struct SessionStore {
    state: RwLock<StoreState>,
    backend: Box<dyn SessionBackend>,
}

impl SessionStore {
    /// Opens the store and rehydrates any previously persisted session.
    ///
    /// A persisted record that fails to load or violates the session
    /// invariant is discarded (and deleted from the backend) so the store
    /// starts logged out rather than in a partial state.
    pub fn open(backend: Box<dyn SessionBackend>) -> Self {
        let session = match backend.load() {
            Ok(Some(session)) if session.is_valid() => {
                tracing::info!(
                    "Restored session for user '{}' ({})",
                    session.display_name(),
                    session.role()
                );
                Some(session)
            }
            Ok(Some(_)) => {
                tracing::warn!("Discarding persisted session with an empty token");
                discard_persisted(backend.as_ref());
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Discarding unreadable persisted session: {}", e);
                discard_persisted(backend.as_ref());
                None
            }
        };

        Self {
            state: RwLock::new(StoreState {
                session,
                generation: 0,
            }),
            backend,
        }
    }

    /// Convenience constructor backed by process memory only.
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryBackend::new()))
    }

    /// Replaces the current session and persists it.
    ///
    /// The in-memory session is updated even when persisting fails, so the
    /// login remains usable for this process.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the session could not be persisted.
    pub fn set(&self, session: Session) -> ClientResult<()> {
        let persisted = self.backend.save(&session);
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            tracing::debug!(
                "Storing session {} for user '{}'",
                redact_token(session.token()),
                session.user_id()
            );
            state.session = Some(session);
            state.generation += 1;
        }
        persisted
    }

    /// Returns a copy of the current session, if any.
    pub fn get(&self) -> Option<Session> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session
            .clone()
    }

    /// Returns the current bearer token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session
            .as_ref()
            .map(|s| s.token().to_string())
    }

    /// Clears the current session locally and in the backend.
    ///
    /// Memory is cleared first; `get()` returns `None` afterwards even when
    /// deleting the persisted record fails.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the persisted record could not be
    /// deleted.
    pub fn clear(&self) -> ClientResult<()> {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.session = None;
            state.generation += 1;
        }
        self.backend.delete()
    }

    /// Returns `true` when a session is present.
    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session
            .is_some()
    }

    /// Current session together with the generation it belongs to.
    pub fn snapshot(&self) -> (Option<Session>, u64) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (state.session.clone(), state.generation)
    }

    /// Returns `true` when no `set`/`clear` happened since `generation` was
    /// observed.
    pub fn is_current(&self, generation: u64) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
            == generation
    }
}

fn discard_persisted(backend: &dyn SessionBackend) {
    if let Err(e) = backend.delete() {
        tracing::warn!("Failed to delete discarded session record: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_session;

    #[test]
    fn test_role_deserializes_unknown_values() {
        let role: Role = serde_json::from_str("\"principal\"").unwrap();
        assert_eq!(role, Role::Unknown);
        let role: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(role, Role::Teacher);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("secret-token-value", "u1", "Ana", Role::Student).unwrap();
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-token-value"));
        assert!(debug.contains("secr…"));
    }

    #[test]
    fn test_session_rejects_blank_token() {
        assert!(Session::new("   ", "u1", "Ana", Role::Student).is_err());
    }

    #[test]
    fn test_set_then_get_returns_same_session() {
        let store = SessionStore::in_memory();
        let session = sample_session("t1");
        store.set(session.clone()).unwrap();
        assert_eq!(store.get(), Some(session.clone()));
        assert_eq!(store.get(), Some(session));
        assert_eq!(store.token().as_deref(), Some("t1"));
    }

    #[test]
    fn test_get_after_clear_is_empty() {
        let store = SessionStore::in_memory();
        store.set(sample_session("t1")).unwrap();
        store.clear().unwrap();
        assert!(store.get().is_none());
        assert!(store.token().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_generation_changes_on_set_and_clear() {
        let store = SessionStore::in_memory();
        let (_, g0) = store.snapshot();
        store.set(sample_session("t1")).unwrap();
        assert!(!store.is_current(g0));
        let (_, g1) = store.snapshot();
        assert!(store.is_current(g1));
        store.clear().unwrap();
        assert!(!store.is_current(g1));
    }

    #[test]
    fn test_open_rehydrates_persisted_session() {
        let backend = MemoryBackend::new();
        backend.save(&sample_session("persisted")).unwrap();
        let store = SessionStore::open(Box::new(backend));
        assert_eq!(store.token().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_open_discards_corrupt_record() {
        let backend = MemoryBackend::with_raw("{not json");
        let store = SessionStore::open(Box::new(backend));
        assert!(store.get().is_none());
    }
}
