//! Notes schema definition and idempotent creation.
//!
//! There is exactly one schema version. A database stamped with a newer
//! version is refused rather than read with a mismatched mapping.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

pub const FOLDERS_TABLE: &str = "folders";
pub const NOTES_TABLE: &str = "notes";

/// Columns the row mapping reads from `folders`.
pub const FOLDER_COLUMNS: &[&str] = &["id", "name"];

/// Columns the row mapping reads from `notes`.
pub const NOTE_COLUMNS: &[&str] = &[
    "id",
    "title",
    "content",
    "updated_at",
    "folder_id",
    "pinned",
    "favorite",
];

/// Secondary indexes backing the listing queries.
pub const NOTE_INDEXES: &[&str] = &[
    "idx_notes_updated",
    "idx_notes_pinned",
    "idx_notes_favorite",
    "idx_notes_folder",
];

const INIT_SQL: &str = include_str!("sql/0001_init.sql");

/// Creates the schema when missing and stamps the version.
///
/// Safe to call on every open.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(INIT_SQL)?;
    if current < SCHEMA_VERSION {
        tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    tx.commit()?;
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{current_user_version, ensure_schema, SCHEMA_VERSION};
    use rusqlite::Connection;

    #[test]
    fn ensure_schema_twice_keeps_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        ensure_schema(&mut conn).unwrap();
        assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn folder_delete_sets_note_folder_to_null_at_engine_level() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute("INSERT INTO folders (name) VALUES ('x');", [])
            .unwrap();
        conn.execute(
            "INSERT INTO notes (title, content, updated_at, folder_id) VALUES ('t', 'c', 1, 1);",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM folders WHERE id = 1;", []).unwrap();

        let folder_id: Option<i64> = conn
            .query_row("SELECT folder_id FROM notes;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folder_id, None);
    }
}
