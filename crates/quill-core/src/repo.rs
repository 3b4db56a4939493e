use std::collections::HashSet;

use chrono::Utc;

use crate::folder::{default_folders, Folder, FolderPatch};
use crate::note::{AudioRecording, Note, NoteDraft, NotePatch};
use crate::session::Session;
use crate::store::Store;
use crate::{trash, Error};

/// In-memory cache of the full note and folder collections, with derived
/// views and mutators that round-trip through the storage facade.
///
/// Mutators follow read-modify-write: look up the cached entity, shallow-merge
/// the supplied changes, call the store, and on success replace the cached
/// entry with the store's canonical return value. There is no rollback path
/// when a store call fails; the cache simply keeps its pre-call state.
///
/// Every cache change is followed by a retention sweep over the trash.
pub struct Repository<S: Store> {
    store: S,
    session: Session,
    notes: Vec<Note>,
    folders: Vec<Folder>,
    search_query: String,
    /// Ids selected for expiry whose hard delete has been issued but has not
    /// resolved yet. Keeps a re-entrant sweep from racing a second delete
    /// for the same note.
    pending_expiry: HashSet<String>,
}

impl<S: Store> Repository<S> {
    pub fn new(store: S, session: Session) -> Self {
        Self {
            store,
            session,
            notes: Vec::new(),
            folders: Vec::new(),
            search_query: String::new(),
            pending_expiry: HashSet::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Full refetch of both collections. Called whenever the active identity
    /// changes (startup, login, logout) - never incrementally. Seeds the
    /// default folder set when storage reports that none has ever been
    /// configured.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.notes = self.store.fetch_notes(&self.session).await?;
        self.folders = match self.store.fetch_folders(&self.session).await? {
            Some(folders) => folders,
            None => self.seed_default_folders().await?,
        };
        self.sweep().await;
        Ok(())
    }

    async fn seed_default_folders(&mut self) -> Result<Vec<Folder>, Error> {
        let mut saved = Vec::with_capacity(8);
        for folder in default_folders() {
            saved.push(self.store.save_folder(folder, &self.session).await?);
        }
        Ok(saved)
    }

    // --- derived views ---

    /// Everything fetched, trash included.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get_note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn active_notes(&self) -> Vec<&Note> {
        self.notes.iter().filter(|n| !n.is_deleted()).collect()
    }

    /// Trashed notes, most recently deleted first.
    pub fn trash_notes(&self) -> Vec<&Note> {
        let mut trashed: Vec<&Note> = self.notes.iter().filter(|n| n.is_deleted()).collect();
        trashed.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        trashed
    }

    /// Active notes matching the current search query, pinned notes first
    /// (stable among pinned), then by `updated_at` descending.
    pub fn filtered_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| !n.is_deleted() && n.matches_query(&self.search_query))
            .collect();
        notes.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        notes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Resolve a note tag to its folder. Notes may carry tags whose folder
    /// was deleted; those resolve to `None` and consumers hide them.
    pub fn folder_for_tag(&self, tag: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == tag)
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    // --- note mutators ---

    /// Upsert a note and return its id. The draft is materialized through
    /// the entity factory, so partial input is defaulted here and nowhere
    /// else.
    pub async fn add_note(&mut self, draft: NoteDraft) -> Result<String, Error> {
        let note = draft.materialize();
        let saved = self.store.save_note(note, &self.session).await?;
        let id = saved.id.clone();
        self.upsert_cached(saved);
        self.sweep().await;
        Ok(id)
    }

    /// Merge a patch over the cached note and save the result. Unknown id is
    /// a no-op.
    pub async fn update_note(&mut self, id: &str, patch: NotePatch) -> Result<(), Error> {
        let Some(current) = self.get_note(id).cloned() else {
            return Ok(());
        };
        let saved = self
            .store
            .save_note(current.apply(patch), &self.session)
            .await?;
        self.upsert_cached(saved);
        self.sweep().await;
        Ok(())
    }

    /// Soft delete by default; `permanent` skips the trash entirely.
    pub async fn delete_note(&mut self, id: &str, permanent: bool) -> Result<(), Error> {
        if permanent {
            self.store.delete_note(id, &self.session).await?;
            self.notes.retain(|n| n.id != id);
        } else {
            self.store.soft_delete_note(id, &self.session).await?;
            if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
                note.deleted_at = Some(Utc::now());
                note.is_pinned = false;
                note.is_favorite = false;
            }
        }
        self.sweep().await;
        Ok(())
    }

    /// Bring a note back from the trash. Pin and favorite state cleared by
    /// the soft delete is not restored.
    pub async fn restore_note(&mut self, id: &str) -> Result<(), Error> {
        self.store.restore_note(id, &self.session).await?;
        if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
            note.deleted_at = None;
        }
        self.sweep().await;
        Ok(())
    }

    /// Hard-delete every trashed note.
    pub async fn empty_trash(&mut self) -> Result<(), Error> {
        self.store.empty_trash(&self.session).await?;
        self.notes.retain(|n| !n.is_deleted());
        self.sweep().await;
        Ok(())
    }

    pub async fn toggle_pin(&mut self, id: &str) -> Result<(), Error> {
        let Some(current) = self.get_note(id).cloned() else {
            return Ok(());
        };
        self.update_note(
            id,
            NotePatch {
                is_pinned: Some(!current.is_pinned),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn toggle_favorite(&mut self, id: &str) -> Result<(), Error> {
        let Some(current) = self.get_note(id).cloned() else {
            return Ok(());
        };
        self.update_note(
            id,
            NotePatch {
                is_favorite: Some(!current.is_favorite),
                ..Default::default()
            },
        )
        .await
    }

    // --- audio recordings ---

    /// Attach a recording to a note and return the recording id. Unknown
    /// note id is a no-op and returns `None`.
    pub async fn add_audio_to_note(
        &mut self,
        note_id: &str,
        audio_ref: &str,
        transcript: Option<String>,
    ) -> Result<Option<String>, Error> {
        let Some(current) = self.get_note(note_id).cloned() else {
            return Ok(None);
        };
        let recording = AudioRecording::new(audio_ref, transcript);
        let recording_id = recording.id.clone();
        let mut recordings = current.audio_recordings.clone();
        recordings.push(recording);
        self.update_note(
            note_id,
            NotePatch {
                audio_recordings: Some(recordings),
                ..Default::default()
            },
        )
        .await?;
        Ok(Some(recording_id))
    }

    pub async fn delete_audio_from_note(
        &mut self,
        note_id: &str,
        audio_id: &str,
    ) -> Result<(), Error> {
        let Some(current) = self.get_note(note_id).cloned() else {
            return Ok(());
        };
        let recordings: Vec<AudioRecording> = current
            .audio_recordings
            .into_iter()
            .filter(|a| a.id != audio_id)
            .collect();
        self.update_note(
            note_id,
            NotePatch {
                audio_recordings: Some(recordings),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_audio_transcript(
        &mut self,
        note_id: &str,
        audio_id: &str,
        transcript: &str,
    ) -> Result<(), Error> {
        let Some(current) = self.get_note(note_id).cloned() else {
            return Ok(());
        };
        let recordings: Vec<AudioRecording> = current
            .audio_recordings
            .into_iter()
            .map(|mut a| {
                if a.id == audio_id {
                    a.transcript = Some(transcript.to_string());
                }
                a
            })
            .collect();
        self.update_note(
            note_id,
            NotePatch {
                audio_recordings: Some(recordings),
                ..Default::default()
            },
        )
        .await
    }

    // --- folder mutators ---

    pub async fn add_folder(&mut self, folder: Folder) -> Result<String, Error> {
        let saved = self.store.save_folder(folder, &self.session).await?;
        let id = saved.id.clone();
        self.upsert_cached_folder(saved);
        Ok(id)
    }

    pub async fn update_folder(&mut self, id: &str, patch: FolderPatch) -> Result<(), Error> {
        let Some(current) = self.folders.iter().find(|f| f.id == id).cloned() else {
            return Ok(());
        };
        let saved = self
            .store
            .save_folder(current.apply(patch), &self.session)
            .await?;
        self.upsert_cached_folder(saved);
        Ok(())
    }

    /// Remove a folder. Notes keep any tag referencing it; the dangling tag
    /// simply stops resolving.
    pub async fn delete_folder(&mut self, id: &str) -> Result<(), Error> {
        self.store.delete_folder(id, &self.session).await?;
        self.folders.retain(|f| f.id != id);
        Ok(())
    }

    // --- trash sweep ---

    /// Hard-delete every note whose retention window has elapsed. Safe to
    /// run repeatedly: ids are marked pending before their delete is issued,
    /// so an overlapping sweep never issues a duplicate delete, and a note
    /// vanishing mid-sweep is harmless because hard delete of an absent id
    /// is a no-op by contract.
    ///
    /// Failures are logged and the pending mark is cleared so a later sweep
    /// can retry; they never propagate to the mutation that triggered the
    /// sweep.
    pub async fn sweep(&mut self) {
        let now = Utc::now();
        let expired: Vec<String> = trash::expired(&self.notes, now)
            .into_iter()
            .filter(|id| !self.pending_expiry.contains(id))
            .collect();

        for id in expired {
            self.pending_expiry.insert(id.clone());
            match self.store.delete_note(&id, &self.session).await {
                Ok(()) => {
                    self.notes.retain(|n| n.id != id);
                }
                Err(err) => {
                    log::warn!("trash sweep could not expire note {id}: {err}");
                }
            }
            self.pending_expiry.remove(&id);
        }
    }

    fn upsert_cached(&mut self, note: Note) {
        match self.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note,
            None => self.notes.insert(0, note),
        }
    }

    fn upsert_cached_folder(&mut self, folder: Folder) {
        match self.folders.iter_mut().find(|f| f.id == folder.id) {
            Some(existing) => *existing = folder,
            None => self.folders.push(folder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::BoardConfig;
    use chrono::Duration;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// In-memory store double with local-backend semantics.
    #[derive(Default)]
    struct MemoryStore {
        notes: RefCell<Vec<Note>>,
        folders: RefCell<Option<Vec<Folder>>>,
        delete_calls: RefCell<Vec<String>>,
        fail_deletes: Cell<bool>,
    }

    #[async_trait::async_trait(?Send)]
    impl Store for Rc<MemoryStore> {
        async fn fetch_notes(&self, _session: &Session) -> Result<Vec<Note>, Error> {
            Ok(self.notes.borrow().clone())
        }

        async fn save_note(&self, mut note: Note, _session: &Session) -> Result<Note, Error> {
            if note.id.is_empty() {
                note.id = crate::new_id();
            }
            note.updated_at = Utc::now();
            let mut notes = self.notes.borrow_mut();
            match notes.iter_mut().find(|n| n.id == note.id) {
                Some(existing) => {
                    note.created_at = existing.created_at;
                    *existing = note.clone();
                }
                None => notes.push(note.clone()),
            }
            Ok(note)
        }

        async fn soft_delete_note(&self, id: &str, _session: &Session) -> Result<(), Error> {
            if let Some(note) = self.notes.borrow_mut().iter_mut().find(|n| n.id == id) {
                note.deleted_at = Some(Utc::now());
                note.is_pinned = false;
                note.is_favorite = false;
            }
            Ok(())
        }

        async fn restore_note(&self, id: &str, _session: &Session) -> Result<(), Error> {
            if let Some(note) = self.notes.borrow_mut().iter_mut().find(|n| n.id == id) {
                note.deleted_at = None;
            }
            Ok(())
        }

        async fn delete_note(&self, id: &str, _session: &Session) -> Result<(), Error> {
            self.delete_calls.borrow_mut().push(id.to_string());
            if self.fail_deletes.get() {
                return Err(Error::BackendUnavailable("remote offline".to_string()));
            }
            self.notes.borrow_mut().retain(|n| n.id != id);
            Ok(())
        }

        async fn empty_trash(&self, _session: &Session) -> Result<(), Error> {
            self.notes.borrow_mut().retain(|n| !n.is_deleted());
            Ok(())
        }

        async fn fetch_folders(&self, _session: &Session) -> Result<Option<Vec<Folder>>, Error> {
            Ok(self.folders.borrow().clone())
        }

        async fn save_folder(&self, folder: Folder, _session: &Session) -> Result<Folder, Error> {
            let mut slot = self.folders.borrow_mut();
            let folders = slot.get_or_insert_with(Vec::new);
            match folders.iter_mut().find(|f| f.id == folder.id) {
                Some(existing) => *existing = folder.clone(),
                None => folders.push(folder.clone()),
            }
            Ok(folder)
        }

        async fn delete_folder(&self, id: &str, _session: &Session) -> Result<(), Error> {
            if let Some(folders) = self.folders.borrow_mut().as_mut() {
                folders.retain(|f| f.id != id);
            }
            Ok(())
        }
    }

    fn setup() -> (Rc<MemoryStore>, Repository<Rc<MemoryStore>>) {
        let store = Rc::new(MemoryStore::default());
        // Pre-mark folders as configured so tests opt into seeding explicitly.
        *store.folders.borrow_mut() = Some(Vec::new());
        let repo = Repository::new(store.clone(), Session::guest());
        (store, repo)
    }

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn add_note_round_trips_through_store() {
        let (store, mut repo) = setup();
        let id = repo.add_note(draft("Grocery List", "milk")).await.unwrap();

        let cached = repo.get_note(&id).unwrap();
        assert_eq!(cached.title, "Grocery List");
        assert_eq!(cached.content, "milk");

        let stored = store.notes.borrow();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
    }

    #[tokio::test]
    async fn cache_takes_the_canonical_store_value() {
        let (_store, mut repo) = setup();
        let id = repo.add_note(draft("Draft", "v1")).await.unwrap();
        let before = repo.get_note(&id).unwrap().updated_at;

        repo.update_note(
            &id,
            NotePatch {
                content: Some("v2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let after = repo.get_note(&id).unwrap();
        assert_eq!(after.content, "v2");
        // The store stamps updated_at; the cache must carry that stamp, not
        // a locally-computed one.
        assert!(after.updated_at >= before);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_a_noop() {
        let (store, mut repo) = setup();
        repo.update_note(
            "missing",
            NotePatch {
                title: Some("x".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(store.notes.borrow().is_empty());
    }

    #[tokio::test]
    async fn soft_delete_then_restore_preserves_everything_but_flags() {
        let (_store, mut repo) = setup();
        let id = repo.add_note(draft("Pinned", "body")).await.unwrap();
        repo.update_note(
            &id,
            NotePatch {
                is_pinned: Some(true),
                is_favorite: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let before = repo.get_note(&id).unwrap().clone();

        repo.delete_note(&id, false).await.unwrap();
        let trashed = repo.get_note(&id).unwrap();
        assert!(trashed.is_deleted());
        assert!(!trashed.is_pinned);
        assert!(!trashed.is_favorite);

        repo.restore_note(&id).await.unwrap();
        let restored = repo.get_note(&id).unwrap();
        assert!(restored.deleted_at.is_none());
        // Cleared flags stay cleared; everything else is as before.
        assert!(!restored.is_pinned);
        assert!(!restored.is_favorite);
        assert_eq!(restored.title, before.title);
        assert_eq!(restored.content, before.content);
        assert_eq!(restored.created_at, before.created_at);
    }

    #[tokio::test]
    async fn views_split_trash_from_active() {
        let (_store, mut repo) = setup();
        let keep = repo.add_note(draft("Keep", "a")).await.unwrap();
        let toss = repo.add_note(draft("Toss", "b")).await.unwrap();

        repo.delete_note(&toss, false).await.unwrap();

        assert!(repo.active_notes().iter().all(|n| n.id != toss));
        assert!(repo.filtered_notes().iter().all(|n| n.id != toss));
        assert!(repo.trash_notes().iter().any(|n| n.id == toss));
        assert!(repo.active_notes().iter().any(|n| n.id == keep));
    }

    #[tokio::test]
    async fn trash_is_ordered_most_recently_deleted_first() {
        let (store, mut repo) = setup();
        let first = repo.add_note(draft("First", "")).await.unwrap();
        let second = repo.add_note(draft("Second", "")).await.unwrap();

        repo.delete_note(&first, false).await.unwrap();
        repo.delete_note(&second, false).await.unwrap();
        // Force distinct timestamps regardless of clock granularity.
        if let Some(n) = store.notes.borrow_mut().iter_mut().find(|n| n.id == first) {
            n.deleted_at = Some(Utc::now() - Duration::minutes(5));
        }
        repo.refresh().await.unwrap();

        let trash: Vec<&str> = repo.trash_notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(trash, vec![second.as_str(), first.as_str()]);
    }

    #[tokio::test]
    async fn empty_trash_leaves_active_notes_untouched() {
        let (_store, mut repo) = setup();
        let keep = repo.add_note(draft("Keep", "payload")).await.unwrap();
        let toss = repo.add_note(draft("Toss", "")).await.unwrap();
        repo.delete_note(&toss, false).await.unwrap();
        let before = repo.get_note(&keep).unwrap().clone();

        repo.empty_trash().await.unwrap();

        assert!(repo.get_note(&toss).is_none());
        assert_eq!(repo.get_note(&keep).unwrap(), &before);
    }

    #[tokio::test]
    async fn filtered_notes_search_and_pin_ordering() {
        let (store, mut repo) = setup();
        let plain = repo.add_note(draft("Meeting notes", "agenda")).await.unwrap();
        let pinned = repo.add_note(draft("Grocery List", "milk")).await.unwrap();
        repo.toggle_pin(&pinned).await.unwrap();
        // Make the unpinned note the most recently updated one.
        if let Some(n) = store.notes.borrow_mut().iter_mut().find(|n| n.id == plain) {
            n.updated_at = Utc::now() + Duration::minutes(1);
        }
        repo.refresh().await.unwrap();

        let ordered: Vec<&str> = repo.filtered_notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ordered, vec![pinned.as_str(), plain.as_str()]);

        repo.set_search_query("MILK");
        let matched: Vec<&str> = repo.filtered_notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(matched, vec![pinned.as_str()]);
    }

    #[tokio::test]
    async fn deleting_a_folder_leaves_orphan_tags_valid() {
        let (_store, mut repo) = setup();
        let folder_id = repo.add_folder(Folder::new("Work", "#3b82f6")).await.unwrap();
        let note_id = repo
            .add_note(NoteDraft {
                tags: Some(vec![folder_id.clone()]),
                ..Default::default()
            })
            .await
            .unwrap();

        repo.delete_folder(&folder_id).await.unwrap();

        assert!(repo.folders().iter().all(|f| f.id != folder_id));
        let note = repo.get_note(&note_id).unwrap();
        assert_eq!(note.tags, vec![folder_id.clone()]);
        assert!(repo.folder_for_tag(&folder_id).is_none());
    }

    #[tokio::test]
    async fn refresh_seeds_default_folders_when_none_configured() {
        let store = Rc::new(MemoryStore::default());
        let mut repo = Repository::new(store.clone(), Session::guest());
        assert!(store.folders.borrow().is_none());

        repo.refresh().await.unwrap();

        assert_eq!(repo.folders().len(), 8);
        assert_eq!(store.folders.borrow().as_ref().unwrap().len(), 8);

        // A configured-but-empty collection must not reseed.
        *store.folders.borrow_mut() = Some(Vec::new());
        repo.refresh().await.unwrap();
        assert!(repo.folders().is_empty());
    }

    #[tokio::test]
    async fn sweep_expires_past_the_retention_window() {
        let (store, mut repo) = setup();
        let fresh = repo.add_note(draft("Fresh", "")).await.unwrap();
        let stale = repo.add_note(draft("Stale", "")).await.unwrap();
        repo.delete_note(&fresh, false).await.unwrap();
        repo.delete_note(&stale, false).await.unwrap();
        {
            let mut notes = store.notes.borrow_mut();
            notes.iter_mut().find(|n| n.id == fresh).unwrap().deleted_at =
                Some(Utc::now() - Duration::hours(71));
            notes.iter_mut().find(|n| n.id == stale).unwrap().deleted_at =
                Some(Utc::now() - Duration::hours(73));
        }

        repo.refresh().await.unwrap();

        assert!(repo.get_note(&stale).is_none());
        assert!(store.notes.borrow().iter().all(|n| n.id != stale));
        assert!(repo.trash_notes().iter().any(|n| n.id == fresh));
    }

    #[tokio::test]
    async fn sweep_retries_after_a_failed_delete_without_duplicates() {
        let (store, mut repo) = setup();
        let id = repo.add_note(draft("Doomed", "")).await.unwrap();
        repo.delete_note(&id, false).await.unwrap();
        store.notes.borrow_mut().iter_mut().find(|n| n.id == id).unwrap().deleted_at =
            Some(Utc::now() - Duration::hours(73));
        store.delete_calls.borrow_mut().clear();
        store.fail_deletes.set(true);

        repo.refresh().await.unwrap();
        // Delete failed: the note survives and the pending mark is cleared.
        assert_eq!(store.delete_calls.borrow().len(), 1);
        assert!(repo.get_note(&id).is_some());

        repo.sweep().await;
        assert_eq!(store.delete_calls.borrow().len(), 2);

        store.fail_deletes.set(false);
        repo.sweep().await;
        assert_eq!(store.delete_calls.borrow().len(), 3);
        assert!(repo.get_note(&id).is_none());
    }

    #[tokio::test]
    async fn grocery_list_scenario() {
        let (store, mut repo) = setup();
        let id = repo.add_note(draft("Grocery List", "milk")).await.unwrap();
        assert_eq!(repo.get_note(&id).unwrap().title, "Grocery List");

        repo.delete_note(&id, false).await.unwrap();
        assert!(repo.trash_notes().iter().any(|n| n.id == id));
        assert!(repo.filtered_notes().iter().all(|n| n.id != id));

        // Simulate a 73 hour clock advance and re-run the sweep.
        store.notes.borrow_mut().iter_mut().find(|n| n.id == id).unwrap().deleted_at =
            Some(Utc::now() - Duration::hours(73));
        repo.refresh().await.unwrap();

        assert!(repo.trash_notes().iter().all(|n| n.id != id));
        assert!(store.notes.borrow().iter().all(|n| n.id != id));
    }

    #[tokio::test]
    async fn audio_lifecycle_round_trips() {
        let (_store, mut repo) = setup();
        let note_id = repo.add_note(draft("Voice memo", "")).await.unwrap();

        let audio_id = repo
            .add_audio_to_note(&note_id, "blob:rec-1", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repo.get_note(&note_id).unwrap().audio_recordings.len(), 1);

        repo.update_audio_transcript(&note_id, &audio_id, "buy milk")
            .await
            .unwrap();
        let note = repo.get_note(&note_id).unwrap();
        assert_eq!(
            note.audio_recordings[0].transcript.as_deref(),
            Some("buy milk")
        );

        repo.delete_audio_from_note(&note_id, &audio_id).await.unwrap();
        assert!(repo.get_note(&note_id).unwrap().audio_recordings.is_empty());
    }

    #[tokio::test]
    async fn toggle_favorite_flips_state_through_the_store() {
        let (store, mut repo) = setup();
        let id = repo.add_note(draft("Starred", "")).await.unwrap();

        repo.toggle_favorite(&id).await.unwrap();
        assert!(repo.get_note(&id).unwrap().is_favorite);
        assert!(store.notes.borrow()[0].is_favorite);

        repo.toggle_favorite(&id).await.unwrap();
        assert!(!repo.get_note(&id).unwrap().is_favorite);
    }

    #[tokio::test]
    async fn update_folder_merges_patch() {
        let (_store, mut repo) = setup();
        let id = repo.add_folder(Folder::new("Work", "#3b82f6")).await.unwrap();

        repo.update_folder(
            &id,
            FolderPatch {
                board_config: Some(BoardConfig {
                    enabled: true,
                    columns: BoardConfig::default_columns(),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let folder = repo.folder_for_tag(&id).unwrap();
        assert_eq!(folder.name, "Work");
        let board = folder.board_config.as_ref().unwrap();
        assert!(board.enabled);
        assert_eq!(board.columns.len(), 3);
    }
}
