//! Folder entity.

use serde::{Deserialize, Serialize};

/// Store-assigned folder identifier.
pub type FolderId = i64;

/// A named, flat grouping of notes. Names are unique in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
}

/// Normalizes a folder name for persistence.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_folder_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
