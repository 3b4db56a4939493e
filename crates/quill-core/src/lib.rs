//! Quill core library - shared types, the storage contract, and the
//! in-memory note/folder repository.
//!
//! This crate performs no I/O of its own; the authoritative backends
//! implement [`Store`] and are injected at session construction.

mod error;
mod folder;
mod note;
mod repo;
mod session;
mod store;
mod trash;

pub use error::Error;
pub use folder::{default_folders, tint, BoardColumn, BoardConfig, Folder, FolderPatch};
pub use note::{new_id, AudioRecording, Note, NoteDraft, NotePatch, DEFAULT_STATUS, UNTITLED};
pub use repo::Repository;
pub use session::{RemoteCredentials, Session, StorageBackend, GUEST_USER};
pub use store::Store;
pub use trash::{expired, retention, RETENTION_HOURS};
