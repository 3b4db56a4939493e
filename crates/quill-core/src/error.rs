use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The remote backend could not be reached. Propagated to the caller;
    /// there is no retry and no fallback to the other backend.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The mirror capability was revoked or never granted. Contained inside
    /// the mirror write path; never surfaced on the authoritative path.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}
