//! On-disk mirror of the authoritative note store.
//!
//! The mirror is a best-effort write-through copy, never authoritative:
//!
//! ```text
//! {root}/
//!   notes/
//!     {id}.json      # one file per note, soft-deleted notes included
//!   folders.json     # consolidated folder file, fully overwritten each save
//! ```
//!
//! It operates only under a root the user explicitly granted; the grant is
//! persisted by the local backend so it survives sessions. Every write path
//! reports a [`MirrorOutcome`] instead of an error so the authoritative
//! write it shadows can never be failed by the mirror, and so callers and
//! tests can assert on sync state instead of log output. The mirror is
//! allowed to drift silently from the source of truth: outcomes are logged
//! by the caller, never retried.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use quill_core::{Folder, Note};

/// Result of one best-effort mirror write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// The file was created, rewritten, or removed.
    Written,
    /// There was nothing to do (e.g. deleting a file that is already gone).
    Skipped,
    /// The write failed; the on-disk copy has drifted from the store.
    Failed(String),
}

impl MirrorOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, MirrorOutcome::Written)
    }

    fn from_io(result: std::io::Result<()>) -> Self {
        match result {
            Ok(()) => MirrorOutcome::Written,
            Err(err) => MirrorOutcome::Failed(err.to_string()),
        }
    }
}

/// Everything the mirror holds on disk, as read by [`Mirror::load_all`].
#[derive(Debug, Default)]
pub struct MirrorSnapshot {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
}

/// Handle over a granted mirror root directory.
pub struct Mirror {
    root: PathBuf,
}

impl Mirror {
    /// Wrap a previously granted root. No I/O happens here; each write
    /// checks the capability for itself and reports the outcome.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    fn note_path(&self, id: &str) -> PathBuf {
        self.notes_dir().join(format!("{id}.json"))
    }

    fn folders_path(&self) -> PathBuf {
        self.root.join("folders.json")
    }

    /// Write (or rewrite) one note file. A soft delete lands here too: the
    /// file is rewritten with `deletedAt` set and stays on disk until a hard
    /// delete removes it.
    pub fn save_note(&self, note: &Note) -> MirrorOutcome {
        let json = match serde_json::to_string_pretty(note) {
            Ok(json) => json,
            Err(err) => return MirrorOutcome::Failed(err.to_string()),
        };
        MirrorOutcome::from_io(self.write_atomic(&self.note_path(&note.id), &json))
    }

    /// Remove a note file after a hard delete. A file that is already gone
    /// is not a failure.
    pub fn delete_note(&self, id: &str) -> MirrorOutcome {
        match fs::remove_file(self.note_path(id)) {
            Ok(()) => MirrorOutcome::Written,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => MirrorOutcome::Skipped,
            Err(err) => MirrorOutcome::Failed(err.to_string()),
        }
    }

    /// Overwrite the consolidated folder file with the full collection.
    pub fn save_folders(&self, folders: &[Folder]) -> MirrorOutcome {
        let json = match serde_json::to_string_pretty(folders) {
            Ok(json) => json,
            Err(err) => return MirrorOutcome::Failed(err.to_string()),
        };
        MirrorOutcome::from_io(self.write_atomic(&self.folders_path(), &json))
    }

    /// Read everything back from disk. This is a manual recovery path, not a
    /// sync mechanism - nothing invokes it automatically. Unparseable note
    /// files are skipped with a warning.
    pub fn load_all(&self) -> std::io::Result<MirrorSnapshot> {
        let mut snapshot = MirrorSnapshot::default();

        match fs::read_dir(self.notes_dir()) {
            Ok(entries) => {
                for entry in entries {
                    let path = entry?.path();
                    if path.extension().map(|e| e == "json").unwrap_or(false) {
                        let contents = fs::read_to_string(&path)?;
                        match serde_json::from_str::<Note>(&contents) {
                            Ok(note) => snapshot.notes.push(note),
                            Err(err) => {
                                log::warn!("skipping unparseable mirror file {}: {err}", path.display());
                            }
                        }
                    }
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }

        match fs::read_to_string(self.folders_path()) {
            Ok(contents) => match serde_json::from_str::<Vec<Folder>>(&contents) {
                Ok(folders) => snapshot.folders = folders,
                Err(err) => log::warn!("skipping unparseable folders.json: {err}"),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }

        Ok(snapshot)
    }

    /// Temp file, sync, rename. Readers never observe a half-written file.
    fn write_atomic(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("mirror path has no parent"))?;
        fs::create_dir_all(parent)?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
