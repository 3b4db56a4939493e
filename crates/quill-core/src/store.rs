use crate::{Error, Folder, Note, Session};

/// Storage facade contract implemented by the local key-value backend and
/// the remote relational backend.
///
/// Uses `async_trait` with `?Send`: the whole system runs on one
/// cooperatively-scheduled event loop, and every method is a suspension
/// point. Operations are scoped by the [`Session`] passed in; no
/// implementation may read identity or credentials from global state.
#[async_trait::async_trait(?Send)]
pub trait Store {
    /// Fetch the full note collection, trash included. No pagination.
    async fn fetch_notes(&self, session: &Session) -> Result<Vec<Note>, Error>;

    /// Upsert by id. Assigns an id when the incoming one is empty, preserves
    /// `created_at` of an existing row, always refreshes `updated_at`, and
    /// returns the canonical stored entity.
    async fn save_note(&self, note: Note, session: &Session) -> Result<Note, Error>;

    /// Move a note to the trash: set `deleted_at` to now and clear both
    /// `is_pinned` and `is_favorite`. Absent id is a successful no-op.
    async fn soft_delete_note(&self, id: &str, session: &Session) -> Result<(), Error>;

    /// Clear `deleted_at`, leaving every other field untouched. Absent id is
    /// a successful no-op.
    async fn restore_note(&self, id: &str, session: &Session) -> Result<(), Error>;

    /// Hard delete. Absent id is a successful no-op, not an error.
    async fn delete_note(&self, id: &str, session: &Session) -> Result<(), Error>;

    /// Hard-delete every note with a non-null `deleted_at`.
    async fn empty_trash(&self, session: &Session) -> Result<(), Error>;

    /// Fetch the folder collection. `None` means "no folders configured
    /// yet" and triggers default-folder seeding by the caller; it is
    /// distinct from an empty list.
    async fn fetch_folders(&self, session: &Session) -> Result<Option<Vec<Folder>>, Error>;

    /// Upsert a folder by id and return the canonical stored entity.
    async fn save_folder(&self, folder: Folder, session: &Session) -> Result<Folder, Error>;

    /// Delete a folder. Never cascades into notes; absent id is a no-op.
    async fn delete_folder(&self, id: &str, session: &Session) -> Result<(), Error>;
}
