//! Note entity and the caller-editable draft used for writes.

use crate::model::folder::FolderId;
use serde::{Deserialize, Serialize};

/// Store-assigned note identifier.
pub type NoteId = i64;

/// A persisted note as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Never null; a stored NULL reads back as empty.
    pub title: String,
    /// Never null; a stored NULL reads back as empty.
    pub content: String,
    /// Unix epoch milliseconds of the last mutation.
    pub updated_at: i64,
    /// `None` means the note is unfiled.
    pub folder_id: Option<FolderId>,
    pub pinned: bool,
    pub favorite: bool,
}

/// Mutable note fields supplied by callers on create and full update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub folder_id: Option<FolderId>,
    pub pinned: bool,
    pub favorite: bool,
}

impl NoteDraft {
    /// Creates an unfiled, unflagged draft.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Files the draft under `folder_id`.
    pub fn in_folder(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    /// Returns whether both title and content are blank.
    ///
    /// Blank notes are storable; the CLI logs a warning before saving one.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            folder_id: note.folder_id,
            pinned: note.pinned,
            favorite: note.favorite,
        }
    }
}
