//! Trash retention policy.
//!
//! Not a background timer: the repository runs [`expired`] against its
//! in-memory collection every time that collection changes.

use chrono::{DateTime, Duration, Utc};

use crate::Note;

/// How long a soft-deleted note survives before the sweep hard-deletes it.
pub const RETENTION_HOURS: i64 = 72;

pub fn retention() -> Duration {
    Duration::hours(RETENTION_HOURS)
}

/// Ids of notes whose retention window has elapsed at `now`.
pub fn expired(notes: &[Note], now: DateTime<Utc>) -> Vec<String> {
    notes
        .iter()
        .filter(|note| match note.deleted_at {
            Some(deleted_at) => now - deleted_at > retention(),
            None => false,
        })
        .map(|note| note.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteDraft;

    fn deleted_hours_ago(id: &str, hours: i64) -> Note {
        let mut note = NoteDraft {
            id: Some(id.to_string()),
            ..Default::default()
        }
        .materialize();
        note.deleted_at = Some(Utc::now() - Duration::hours(hours));
        note
    }

    #[test]
    fn note_inside_window_survives() {
        let notes = vec![deleted_hours_ago("a", 71)];
        assert!(expired(&notes, Utc::now()).is_empty());
    }

    #[test]
    fn note_past_window_expires() {
        let notes = vec![deleted_hours_ago("a", 73)];
        assert_eq!(expired(&notes, Utc::now()), vec!["a"]);
    }

    #[test]
    fn active_notes_never_expire() {
        let mut old = NoteDraft::default().materialize();
        old.created_at = Utc::now() - Duration::days(365);
        old.updated_at = old.created_at;
        assert!(expired(&[old], Utc::now()).is_empty());
    }

    #[test]
    fn only_expired_ids_are_selected() {
        let notes = vec![
            deleted_hours_ago("fresh", 1),
            deleted_hours_ago("stale", 100),
            deleted_hours_ago("edge", 71),
        ];
        assert_eq!(expired(&notes, Utc::now()), vec!["stale"]);
    }
}
