use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title applied when a note is created without one.
pub const UNTITLED: &str = "Untitled Note";

/// Board column a note lands in when none is chosen.
pub const DEFAULT_STATUS: &str = "todo";

/// Generate a fresh opaque note/folder/recording id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// A full note with all fields.
///
/// `content` is an opaque rich-text blob: stored verbatim, never parsed.
/// `tags` holds folder ids and may reference folders that no longer exist;
/// consumers treat an unresolvable id as "ignore".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub audio_recordings: Vec<AudioRecording>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` means active; `Some` means the note sits in the trash until
    /// restored, hard-deleted, or expired by the retention sweep.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Note {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Case-insensitive substring match against title or content.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.content.to_lowercase().contains(&query)
    }

    /// Shallow-merge a patch over this note, producing the entity handed to
    /// the storage facade. Unset patch fields keep their current values.
    pub fn apply(&self, patch: NotePatch) -> Note {
        Note {
            id: self.id.clone(),
            title: patch.title.unwrap_or_else(|| self.title.clone()),
            content: patch.content.unwrap_or_else(|| self.content.clone()),
            tags: patch.tags.unwrap_or_else(|| self.tags.clone()),
            is_pinned: patch.is_pinned.unwrap_or(self.is_pinned),
            is_favorite: patch.is_favorite.unwrap_or(self.is_favorite),
            status: patch.status.unwrap_or_else(|| self.status.clone()),
            audio_recordings: patch
                .audio_recordings
                .unwrap_or_else(|| self.audio_recordings.clone()),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// An audio clip attached to a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRecording {
    pub id: String,
    /// Opaque reference to the audio payload (object key, data URL, path).
    pub audio_ref: String,
    #[serde(default)]
    pub transcript: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AudioRecording {
    pub fn new(audio_ref: impl Into<String>, transcript: Option<String>) -> Self {
        Self {
            id: new_id(),
            audio_ref: audio_ref.into(),
            transcript,
            created_at: Utc::now(),
        }
    }
}

/// Parameters for creating a note. Every field is optional; [`NoteDraft::materialize`]
/// is the single place defaults are applied.
#[derive(Debug, Default, Clone)]
pub struct NoteDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_favorite: Option<bool>,
    pub status: Option<String>,
    pub audio_recordings: Option<Vec<AudioRecording>>,
}

impl NoteDraft {
    /// Turn a possibly-incomplete draft into a complete entity. Missing
    /// fields are defaulted here, never rejected, and never re-defaulted
    /// at call sites.
    pub fn materialize(self) -> Note {
        let now = Utc::now();
        Note {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(new_id),
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            content: self.content.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            is_pinned: self.is_pinned.unwrap_or(false),
            is_favorite: self.is_favorite.unwrap_or(false),
            status: self.status.unwrap_or_else(default_status),
            audio_recordings: self.audio_recordings.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Partial update for an existing note, merged in the repository's
/// read-modify-write path.
#[derive(Debug, Default, Clone)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_favorite: Option<bool>,
    pub status: Option<String>,
    pub audio_recordings: Option<Vec<AudioRecording>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_applies_defaults_once() {
        let note = NoteDraft::default().materialize();
        assert!(!note.id.is_empty());
        assert_eq!(note.title, UNTITLED);
        assert_eq!(note.content, "");
        assert_eq!(note.status, DEFAULT_STATUS);
        assert!(!note.is_pinned);
        assert!(!note.is_favorite);
        assert!(note.tags.is_empty());
        assert!(note.audio_recordings.is_empty());
        assert!(note.deleted_at.is_none());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn materialize_keeps_supplied_fields() {
        let note = NoteDraft {
            id: Some("n-1".to_string()),
            title: Some("Grocery List".to_string()),
            content: Some("milk".to_string()),
            tags: Some(vec!["personal".to_string()]),
            is_pinned: Some(true),
            ..Default::default()
        }
        .materialize();
        assert_eq!(note.id, "n-1");
        assert_eq!(note.title, "Grocery List");
        assert_eq!(note.content, "milk");
        assert_eq!(note.tags, vec!["personal"]);
        assert!(note.is_pinned);
    }

    #[test]
    fn blank_title_and_id_are_defaulted() {
        let note = NoteDraft {
            id: Some(String::new()),
            title: Some("   ".to_string()),
            ..Default::default()
        }
        .materialize();
        assert!(!note.id.is_empty());
        assert_eq!(note.title, UNTITLED);
    }

    #[test]
    fn apply_merges_shallowly() {
        let note = NoteDraft {
            title: Some("Original".to_string()),
            content: Some("body".to_string()),
            ..Default::default()
        }
        .materialize();

        let patched = note.apply(NotePatch {
            title: Some("Renamed".to_string()),
            is_pinned: Some(true),
            ..Default::default()
        });

        assert_eq!(patched.title, "Renamed");
        assert!(patched.is_pinned);
        assert_eq!(patched.content, "body");
        assert_eq!(patched.id, note.id);
        assert_eq!(patched.created_at, note.created_at);
    }

    #[test]
    fn note_json_uses_camel_case_field_names() {
        let note = NoteDraft::default().materialize();
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"isPinned\""));
        assert!(json.contains("\"audioRecordings\""));
        assert!(json.contains("\"deletedAt\""));
        assert!(!json.contains("\"is_pinned\""));
    }
}
