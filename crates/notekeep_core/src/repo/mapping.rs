//! Row to entity conversion.
//!
//! # Invariants
//! - `title` / `content` NULL read back as empty strings.
//! - `folder_id` NULL reads back as `None`.
//! - A flag is set only when stored as 1. Other non-zero values read back as
//!   unset and are logged, so one foreign row cannot fail a whole listing.
//! - A missing column is schema drift, not a recoverable condition.

use crate::model::folder::Folder;
use crate::model::note::Note;
use crate::repo::{RepoError, RepoResult};
use log::{error, warn};
use rusqlite::types::FromSql;
use rusqlite::Row;

/// Column list selected for every note read.
pub const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    updated_at,
    folder_id,
    pinned,
    favorite
FROM notes";

/// Column list selected for every folder read.
pub const FOLDER_SELECT_SQL: &str = "SELECT id, name FROM folders";

pub fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    Ok(Note {
        id: column(row, "id")?,
        title: column::<Option<String>>(row, "title")?.unwrap_or_default(),
        content: column::<Option<String>>(row, "content")?.unwrap_or_default(),
        updated_at: column(row, "updated_at")?,
        folder_id: column(row, "folder_id")?,
        pinned: parse_flag(column(row, "pinned")?, "notes.pinned"),
        favorite: parse_flag(column(row, "favorite")?, "notes.favorite"),
    })
}

pub fn parse_folder_row(row: &Row<'_>) -> RepoResult<Folder> {
    Ok(Folder {
        id: column(row, "id")?,
        name: column::<Option<String>>(row, "name")?.unwrap_or_default(),
    })
}

pub fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn parse_flag(value: i64, column: &str) -> bool {
    if value != 0 && value != 1 {
        warn!("event=row_map module=repo status=warn error_code=flag_out_of_range column={column} value={value}");
    }
    value == 1
}

fn column<T: FromSql>(row: &Row<'_>, name: &str) -> RepoResult<T> {
    row.get::<_, T>(name).map_err(|err| {
        let err = RepoError::from(err);
        if err.is_schema_drift() {
            error!(
                "event=row_map module=repo status=error error_code=schema_drift column={name}"
            );
        }
        err
    })
}
