//! Remote relational backend.
//!
//! Multi-tenant storage over a PostgREST-style HTTP API: every row is
//! scoped by `user_id`, and the wire schema (snake_case, server-side
//! defaults) is translated to and from the in-memory entity shape through
//! dedicated row structs. Upserts resolve conflicts last-write-wins by
//! primary key. There is no offline queue: if the remote is unreachable the
//! operation fails outright and the failure propagates to the caller.

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use quill_core::{
    new_id, tint, Error, Folder, Note, RemoteCredentials, Session, Store, DEFAULT_STATUS,
};

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";

/// HTTP client for the remote store.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    pub fn new(credentials: &RemoteCredentials) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: credentials.base_url.trim_end_matches('/').to_string(),
            api_key: credentials.api_key.clone(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Transport failures mean the backend is unreachable; error statuses
    /// mean the backend rejected the operation. Both propagate - there is
    /// no retry and no fallback to the local backend.
    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!("remote returned {status}: {body}")));
        }
        Ok(response)
    }

    fn user_filter(session: &Session) -> (String, String) {
        ("user_id".to_string(), format!("eq.{}", session.user_id()))
    }
}

/// A note as stored in the remote `notes` table. The wire schema does not
/// carry `status`, `audio_recordings`, or board data; those fields are
/// defaulted on read and dropped on write.
#[derive(Debug, Serialize, Deserialize)]
struct NoteRow {
    id: String,
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_pinned: bool,
    #[serde(default)]
    is_favorite: bool,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
}

impl NoteRow {
    fn from_note(note: &Note, user_id: &str) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            tags: note.tags.clone(),
            is_pinned: note.is_pinned,
            is_favorite: note.is_favorite,
            user_id: user_id.to_string(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            deleted_at: note.deleted_at,
        }
    }

    fn into_note(self) -> Note {
        Note {
            id: self.id,
            title: self.title,
            content: self.content,
            tags: self.tags,
            is_pinned: self.is_pinned,
            is_favorite: self.is_favorite,
            status: DEFAULT_STATUS.to_string(),
            audio_recordings: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// A folder as stored in the remote `folders` table.
#[derive(Debug, Serialize, Deserialize)]
struct FolderRow {
    id: String,
    name: String,
    color_hex: String,
    #[serde(default)]
    bg_color: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    category_color: Option<String>,
    user_id: String,
}

impl FolderRow {
    fn from_folder(folder: &Folder, user_id: &str) -> Self {
        Self {
            id: folder.id.clone(),
            name: folder.name.clone(),
            color_hex: folder.color.clone(),
            bg_color: Some(folder.bg_color.clone()),
            category_name: Some(folder.category_name.clone()),
            category_color: Some(folder.category_color.clone()),
            user_id: user_id.to_string(),
        }
    }

    fn into_folder(self) -> Folder {
        Folder {
            bg_color: self
                .bg_color
                .unwrap_or_else(|| tint(&self.color_hex)),
            category_name: self.category_name.unwrap_or_else(|| self.name.clone()),
            category_color: self
                .category_color
                .unwrap_or_else(|| self.color_hex.clone()),
            id: self.id,
            name: self.name,
            color: self.color_hex,
            board_config: None,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Store for RemoteStore {
    async fn fetch_notes(&self, session: &Session) -> Result<Vec<Note>, Error> {
        let response = self
            .send(
                self.request(Method::GET, "notes")
                    .query(&[Self::user_filter(session), ("select".to_string(), "*".to_string())]),
            )
            .await?;
        let rows: Vec<NoteRow> = response
            .json()
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(rows.into_iter().map(NoteRow::into_note).collect())
    }

    async fn save_note(&self, mut note: Note, session: &Session) -> Result<Note, Error> {
        if note.id.is_empty() {
            note.id = new_id();
        }
        note.updated_at = Utc::now();

        let row = NoteRow::from_note(&note, session.user_id());
        let response = self
            .send(
                self.request(Method::POST, "notes")
                    .header("Prefer", UPSERT_PREFER)
                    .json(&[row]),
            )
            .await?;
        let mut rows: Vec<NoteRow> = response
            .json()
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        match rows.pop() {
            Some(row) => Ok(row.into_note()),
            None => Err(Error::Storage("remote upsert returned no row".to_string())),
        }
    }

    async fn soft_delete_note(&self, id: &str, session: &Session) -> Result<(), Error> {
        self.send(
            self.request(Method::PATCH, "notes")
                .query(&[
                    ("id".to_string(), format!("eq.{id}")),
                    Self::user_filter(session),
                ])
                .json(&serde_json::json!({
                    "deleted_at": Utc::now(),
                    "is_pinned": false,
                    "is_favorite": false,
                })),
        )
        .await?;
        Ok(())
    }

    async fn restore_note(&self, id: &str, session: &Session) -> Result<(), Error> {
        self.send(
            self.request(Method::PATCH, "notes")
                .query(&[
                    ("id".to_string(), format!("eq.{id}")),
                    Self::user_filter(session),
                ])
                .json(&serde_json::json!({ "deleted_at": null })),
        )
        .await?;
        Ok(())
    }

    async fn delete_note(&self, id: &str, session: &Session) -> Result<(), Error> {
        self.send(
            self.request(Method::DELETE, "notes").query(&[
                ("id".to_string(), format!("eq.{id}")),
                Self::user_filter(session),
            ]),
        )
        .await?;
        Ok(())
    }

    async fn empty_trash(&self, session: &Session) -> Result<(), Error> {
        self.send(
            self.request(Method::DELETE, "notes").query(&[
                ("deleted_at".to_string(), "not.is.null".to_string()),
                Self::user_filter(session),
            ]),
        )
        .await?;
        Ok(())
    }

    /// A reachable remote that cannot serve the folders table (not migrated
    /// yet, for instance) reports "not configured", which lets the caller
    /// seed defaults; only transport failures propagate.
    async fn fetch_folders(&self, session: &Session) -> Result<Option<Vec<Folder>>, Error> {
        let response = self
            .request(Method::GET, "folders")
            .query(&[Self::user_filter(session), ("select".to_string(), "*".to_string())])
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            log::warn!(
                "remote folders fetch failed with {}; treating as unconfigured",
                response.status()
            );
            return Ok(None);
        }

        let rows: Vec<FolderRow> = response
            .json()
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Some(rows.into_iter().map(FolderRow::into_folder).collect()))
    }

    async fn save_folder(&self, folder: Folder, session: &Session) -> Result<Folder, Error> {
        let row = FolderRow::from_folder(&folder, session.user_id());
        let response = self
            .send(
                self.request(Method::POST, "folders")
                    .header("Prefer", UPSERT_PREFER)
                    .json(&[row]),
            )
            .await?;
        let mut rows: Vec<FolderRow> = response
            .json()
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        match rows.pop() {
            // Board configuration is not part of the wire schema; keep the
            // caller's copy rather than the row's defaulted one.
            Some(row) => Ok(Folder {
                board_config: folder.board_config,
                ..row.into_folder()
            }),
            None => Ok(folder),
        }
    }

    async fn delete_folder(&self, id: &str, session: &Session) -> Result<(), Error> {
        self.send(
            self.request(Method::DELETE, "folders").query(&[
                ("id".to_string(), format!("eq.{id}")),
                Self::user_filter(session),
            ]),
        )
        .await?;
        Ok(())
    }
}
