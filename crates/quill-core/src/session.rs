//! Session identity and authoritative-backend selection.
//!
//! The backend is chosen exactly once, when the session is constructed, and
//! is never re-evaluated mid-session. There is no per-call fallback: every
//! operation for the lifetime of the session goes to the selected backend.

/// User id under which unauthenticated sessions store their notes.
///
/// Local storage is single-tenant, so notes saved as guest and notes saved
/// while authenticated against a remote never share storage.
pub const GUEST_USER: &str = "local-guest";

/// Remote connection settings as configured by the user.
#[derive(Debug, Clone)]
pub struct RemoteCredentials {
    pub base_url: String,
    pub api_key: String,
}

impl RemoteCredentials {
    fn is_valid(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Which backend is authoritative for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Remote,
}

impl StorageBackend {
    /// Computed once from whether valid remote credentials are configured.
    pub fn select(credentials: Option<&RemoteCredentials>) -> Self {
        match credentials {
            Some(c) if c.is_valid() => StorageBackend::Remote,
            _ => StorageBackend::Local,
        }
    }
}

/// Explicit session object threaded through every facade and backend call.
/// Nothing in the storage layer reads identity from ambient global state.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    backend: StorageBackend,
}

impl Session {
    pub fn new(user_id: impl Into<String>, credentials: Option<&RemoteCredentials>) -> Self {
        Self {
            user_id: user_id.into(),
            backend: StorageBackend::select(credentials),
        }
    }

    /// An unauthenticated session; always local.
    pub fn guest() -> Self {
        Self {
            user_id: GUEST_USER.to_string(),
            backend: StorageBackend::Local,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend
    }
}
