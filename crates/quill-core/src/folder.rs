use serde::{Deserialize, Serialize};

use crate::note::new_id;

/// A folder used to organize notes. Notes reference folders through their
/// `tags` list; deleting a folder never touches the notes that reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Display tint behind the folder label, derived from `color` unless
    /// overridden.
    pub bg_color: String,
    /// Tag-display name, independently overridable; falls back to `name`.
    pub category_name: String,
    /// Tag-display color, independently overridable; falls back to `color`.
    pub category_color: String,
    #[serde(default)]
    pub board_config: Option<BoardConfig>,
}

impl Folder {
    /// Build a folder from a name and hex color, deriving the display fields.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        let name = name.into();
        let color = color.into();
        Self {
            id: new_id(),
            bg_color: tint(&color),
            category_name: name.clone(),
            category_color: color.clone(),
            name,
            color,
            board_config: None,
        }
    }

    /// Shallow-merge a patch over this folder.
    pub fn apply(&self, patch: FolderPatch) -> Folder {
        Folder {
            id: self.id.clone(),
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            color: patch.color.unwrap_or_else(|| self.color.clone()),
            bg_color: patch.bg_color.unwrap_or_else(|| self.bg_color.clone()),
            category_name: patch
                .category_name
                .unwrap_or_else(|| self.category_name.clone()),
            category_color: patch
                .category_color
                .unwrap_or_else(|| self.category_color.clone()),
            board_config: match patch.board_config {
                Some(config) => Some(config),
                None => self.board_config.clone(),
            },
        }
    }
}

/// Partial update for an existing folder.
#[derive(Debug, Default, Clone)]
pub struct FolderPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub bg_color: Option<String>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub board_config: Option<BoardConfig>,
}

/// Per-folder kanban board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub enabled: bool,
    pub columns: Vec<BoardColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub id: String,
    pub title: String,
    pub color: String,
}

impl BoardConfig {
    /// The columns every board starts with.
    pub fn default_columns() -> Vec<BoardColumn> {
        [
            ("todo", "To Do", "#3b82f6"),
            ("in-progress", "In Progress", "#f59e0b"),
            ("done", "Done", "#10b981"),
        ]
        .into_iter()
        .map(|(id, title, color)| BoardColumn {
            id: id.to_string(),
            title: title.to_string(),
            color: color.to_string(),
        })
        .collect()
    }
}

/// 15% alpha suffix over a `#rrggbb` color.
pub fn tint(color: &str) -> String {
    format!("{color}26")
}

/// The folder set seeded when storage reports that no folder collection has
/// ever been configured.
pub fn default_folders() -> Vec<Folder> {
    [
        ("work", "Work", "#3b82f6"),
        ("personal", "Personal", "#8b5cf6"),
        ("ideas", "Ideas", "#f59e0b"),
        ("tasks", "Tasks", "#10b981"),
        ("meetings", "Meetings", "#ec4899"),
        ("learning", "Learning", "#06b6d4"),
        ("finance", "Finance", "#84cc16"),
        ("health", "Health", "#ef4444"),
    ]
    .into_iter()
    .map(|(id, name, color)| Folder {
        id: id.to_string(),
        ..Folder::new(name, color)
    })
    .collect()
}
