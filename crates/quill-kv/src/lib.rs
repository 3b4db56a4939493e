//! Local key-value backend.
//!
//! Durable single-tenant storage in the shape of a browser profile: the
//! full note and folder collections are serialized as two JSON blobs under
//! fixed keys in a small SQLite-backed key-value table. There is no
//! per-note key and no user scoping - a guest session and an authenticated
//! session against the remote backend never share this storage.
//!
//! Every successful write is additionally fanned out to an attached
//! [`Mirror`] best-effort: outcomes are logged, never propagated, never
//! retried, so the mirror can silently drift from the source of truth.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use quill_core::{new_id, Error, Folder, Note, Session, Store};
use quill_mirror::{Mirror, MirrorOutcome};

/// Fixed key holding the serialized note collection.
const NOTES_KEY: &str = "quill.notes";
/// Fixed key holding the serialized folder collection. Absence of the key
/// means "no folders configured yet", which is distinct from an empty list.
const FOLDERS_KEY: &str = "quill.folders";
/// Key in the secondary grant store remembering the mirror root.
const MIRROR_ROOT_KEY: &str = "quill.mirrorRoot";

/// SQLite-backed string key-value table.
pub struct KvStore {
    conn: Mutex<Connection>,
}

impl KvStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let conn = Connection::open(path).map_err(|e| Error::Storage(e.to_string()))?;
        Self::init(conn)
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Storage(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Storage(e.to_string()))
    }

    pub fn put(&self, key: &str, value: &str) -> Result<(), Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<(), Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }
}

/// The persisted mirror capability: the granted root directory survives
/// sessions in a secondary key-value store so the user is not re-prompted.
pub fn remembered_mirror_root(kv: &KvStore) -> Result<Option<PathBuf>, Error> {
    Ok(kv.get(MIRROR_ROOT_KEY)?.map(PathBuf::from))
}

pub fn remember_mirror_root(kv: &KvStore, root: &Path) -> Result<(), Error> {
    kv.put(MIRROR_ROOT_KEY, &root.to_string_lossy())
}

pub fn forget_mirror_root(kv: &KvStore) -> Result<(), Error> {
    kv.delete(MIRROR_ROOT_KEY)
}

/// Local authoritative backend over a [`KvStore`], with optional mirror
/// write-through.
pub struct LocalStore {
    kv: KvStore,
    mirror: Option<Mirror>,
}

impl LocalStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv, mirror: None }
    }

    pub fn with_mirror(kv: KvStore, mirror: Mirror) -> Self {
        Self {
            kv,
            mirror: Some(mirror),
        }
    }

    fn load_notes(&self) -> Result<Vec<Note>, Error> {
        match self.kv.get(NOTES_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| Error::Storage(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn store_notes(&self, notes: &[Note]) -> Result<(), Error> {
        let json = serde_json::to_string(notes).map_err(|e| Error::Storage(e.to_string()))?;
        self.kv.put(NOTES_KEY, &json)
    }

    fn load_folders(&self) -> Result<Option<Vec<Folder>>, Error> {
        match self.kv.get(FOLDERS_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| Error::Storage(e.to_string())),
            None => Ok(None),
        }
    }

    fn store_folders(&self, folders: &[Folder]) -> Result<(), Error> {
        let json = serde_json::to_string(folders).map_err(|e| Error::Storage(e.to_string()))?;
        self.kv.put(FOLDERS_KEY, &json)
    }

    /// Overwrite both collections from a mirror snapshot. This is the manual
    /// recovery path behind `load_all`; nothing calls it automatically.
    pub fn import_snapshot(&self, notes: &[Note], folders: &[Folder]) -> Result<(), Error> {
        self.store_notes(notes)?;
        self.store_folders(folders)
    }

    // Mirror fan-out. Fire-and-forget by policy: log the outcome, never
    // propagate, never retry.

    fn mirror_note(&self, note: &Note) {
        if let Some(mirror) = &self.mirror {
            log_outcome("save note", mirror.save_note(note));
        }
    }

    fn mirror_delete(&self, id: &str) {
        if let Some(mirror) = &self.mirror {
            log_outcome("delete note", mirror.delete_note(id));
        }
    }

    fn mirror_folders(&self, folders: &[Folder]) {
        if let Some(mirror) = &self.mirror {
            log_outcome("save folders", mirror.save_folders(folders));
        }
    }
}

fn log_outcome(op: &str, outcome: MirrorOutcome) {
    match outcome {
        MirrorOutcome::Written => log::debug!("mirror {op}: written"),
        MirrorOutcome::Skipped => log::debug!("mirror {op}: skipped"),
        MirrorOutcome::Failed(reason) => log::warn!("mirror {op} failed: {reason}"),
    }
}

#[async_trait::async_trait(?Send)]
impl Store for LocalStore {
    async fn fetch_notes(&self, _session: &Session) -> Result<Vec<Note>, Error> {
        self.load_notes()
    }

    async fn save_note(&self, mut note: Note, _session: &Session) -> Result<Note, Error> {
        if note.id.is_empty() {
            note.id = new_id();
        }
        note.updated_at = Utc::now();

        let mut notes = self.load_notes()?;
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => {
                note.created_at = existing.created_at;
                *existing = note.clone();
            }
            None => notes.push(note.clone()),
        }
        self.store_notes(&notes)?;
        self.mirror_note(&note);
        Ok(note)
    }

    async fn soft_delete_note(&self, id: &str, _session: &Session) -> Result<(), Error> {
        let mut notes = self.load_notes()?;
        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return Ok(());
        };
        note.deleted_at = Some(Utc::now());
        note.is_pinned = false;
        note.is_favorite = false;
        let mirrored = note.clone();
        self.store_notes(&notes)?;
        self.mirror_note(&mirrored);
        Ok(())
    }

    async fn restore_note(&self, id: &str, _session: &Session) -> Result<(), Error> {
        let mut notes = self.load_notes()?;
        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return Ok(());
        };
        note.deleted_at = None;
        let mirrored = note.clone();
        self.store_notes(&notes)?;
        self.mirror_note(&mirrored);
        Ok(())
    }

    async fn delete_note(&self, id: &str, _session: &Session) -> Result<(), Error> {
        let mut notes = self.load_notes()?;
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() == before {
            return Ok(());
        }
        self.store_notes(&notes)?;
        self.mirror_delete(id);
        Ok(())
    }

    async fn empty_trash(&self, _session: &Session) -> Result<(), Error> {
        let notes = self.load_notes()?;
        let (trashed, active): (Vec<Note>, Vec<Note>) =
            notes.into_iter().partition(|n| n.is_deleted());
        if trashed.is_empty() {
            return Ok(());
        }
        self.store_notes(&active)?;
        for note in &trashed {
            self.mirror_delete(&note.id);
        }
        Ok(())
    }

    async fn fetch_folders(&self, _session: &Session) -> Result<Option<Vec<Folder>>, Error> {
        self.load_folders()
    }

    async fn save_folder(&self, folder: Folder, _session: &Session) -> Result<Folder, Error> {
        let mut folders = self.load_folders()?.unwrap_or_default();
        match folders.iter_mut().find(|f| f.id == folder.id) {
            Some(existing) => *existing = folder.clone(),
            None => folders.push(folder.clone()),
        }
        self.store_folders(&folders)?;
        self.mirror_folders(&folders);
        Ok(folder)
    }

    async fn delete_folder(&self, id: &str, _session: &Session) -> Result<(), Error> {
        let Some(mut folders) = self.load_folders()? else {
            return Ok(());
        };
        folders.retain(|f| f.id != id);
        self.store_folders(&folders)?;
        self.mirror_folders(&folders);
        Ok(())
    }
}
