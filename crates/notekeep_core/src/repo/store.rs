//! Notes/folders store contract and SQLite implementation.
//!
//! # Responsibility
//! - Execute single statements (or one transaction) per operation.
//! - Bind every caller-supplied value as a parameter.
//!
//! # Invariants
//! - Note listings are ordered by `pinned DESC, updated_at DESC, id DESC`.
//! - Folder deletion unfiles its notes and removes the folder atomically.
//! - Timestamps are passed in by the caller; the store never reads a clock.

use crate::db::schema::{FOLDERS_TABLE, FOLDER_COLUMNS, NOTES_TABLE, NOTE_COLUMNS};
use crate::model::folder::{normalize_folder_name, Folder, FolderId};
use crate::model::note::{Note, NoteDraft, NoteId};
use crate::query::filter::{SqlFilter, FOLDER_ORDER_BY, NOTE_ORDER_BY};
use crate::repo::mapping::{
    bool_to_int, parse_folder_row, parse_note_row, FOLDER_SELECT_SQL, NOTE_SELECT_SQL,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};

/// Single-column note flags toggled by partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteFlag {
    Pinned,
    Favorite,
}

impl NoteFlag {
    fn column(self) -> &'static str {
        match self {
            Self::Pinned => "pinned",
            Self::Favorite => "favorite",
        }
    }
}

/// Outcome of a folder delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderDeletion {
    /// Notes whose `folder_id` was cleared.
    pub notes_unfiled: usize,
    /// Whether a folder row was removed.
    pub folder_removed: bool,
}

/// Persistence contract executed on the repository lane.
pub trait NoteStore {
    /// Lists notes matching `filter` (all notes when `None`).
    fn list_notes(&self, filter: Option<&SqlFilter>) -> RepoResult<Vec<Note>>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Inserts a note stamped with `now_ms` and returns its id.
    fn insert_note(&self, draft: &NoteDraft, now_ms: i64) -> RepoResult<NoteId>;
    /// Overwrites all mutable fields. Returns affected row count.
    fn update_note(&self, id: NoteId, draft: &NoteDraft, now_ms: i64) -> RepoResult<usize>;
    fn delete_note(&self, id: NoteId) -> RepoResult<usize>;
    /// Sets one flag and refreshes `updated_at`. Returns affected row count.
    fn set_flag(&self, id: NoteId, flag: NoteFlag, value: bool, now_ms: i64)
        -> RepoResult<usize>;
    fn list_folders(&self) -> RepoResult<Vec<Folder>>;
    /// Inserts a folder under its trimmed name.
    fn insert_folder(&self, name: &str) -> RepoResult<FolderId>;
    /// Unfiles the folder's notes, then deletes the folder row.
    fn delete_folder(&self, id: FolderId) -> RepoResult<FolderDeletion>;
}

/// SQLite-backed store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Wraps a connection after checking the tables and columns it relies on.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already verified by [`SqliteNoteStore::try_new`].
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn list_notes(&self, filter: Option<&SqlFilter>) -> RepoResult<Vec<Note>> {
        let mut sql = String::from(NOTE_SELECT_SQL);
        let mut bind_values = Vec::new();
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.clause);
            bind_values.extend(filter.args.iter().cloned());
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(NOTE_ORDER_BY);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_note(&self, draft: &NoteDraft, now_ms: i64) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (
                title,
                content,
                updated_at,
                folder_id,
                pinned,
                favorite
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                draft.title.as_str(),
                draft.content.as_str(),
                now_ms,
                draft.folder_id,
                bool_to_int(draft.pinned),
                bool_to_int(draft.favorite),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_note(&self, id: NoteId, draft: &NoteDraft, now_ms: i64) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                updated_at = ?4,
                folder_id = ?5,
                pinned = ?6,
                favorite = ?7
             WHERE id = ?1;",
            params![
                id,
                draft.title.as_str(),
                draft.content.as_str(),
                now_ms,
                draft.folder_id,
                bool_to_int(draft.pinned),
                bool_to_int(draft.favorite),
            ],
        )?;
        Ok(changed)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        Ok(changed)
    }

    fn set_flag(
        &self,
        id: NoteId,
        flag: NoteFlag,
        value: bool,
        now_ms: i64,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE notes SET {} = ?2, updated_at = ?3 WHERE id = ?1;",
                flag.column()
            ),
            params![id, bool_to_int(value), now_ms],
        )?;
        Ok(changed)
    }

    fn list_folders(&self) -> RepoResult<Vec<Folder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FOLDER_SELECT_SQL} ORDER BY {FOLDER_ORDER_BY};"))?;
        let mut rows = stmt.query([])?;
        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            folders.push(parse_folder_row(row)?);
        }
        Ok(folders)
    }

    fn insert_folder(&self, name: &str) -> RepoResult<FolderId> {
        let name = normalize_folder_name(name)
            .ok_or_else(|| RepoError::InvalidInput("folder name cannot be blank".to_string()))?;

        match self
            .conn
            .execute("INSERT INTO folders (name) VALUES (?1);", [name.as_str()])
        {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) => match RepoError::from(err) {
                RepoError::ConstraintViolation(_) => Err(RepoError::DuplicateFolderName { name }),
                other => Err(other),
            },
        }
    }

    fn delete_folder(&self, id: FolderId) -> RepoResult<FolderDeletion> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let notes_unfiled = tx.execute(
            "UPDATE notes SET folder_id = NULL WHERE folder_id = ?1;",
            [id],
        )?;
        let removed = tx.execute("DELETE FROM folders WHERE id = ?1;", [id])?;
        tx.commit()?;

        Ok(FolderDeletion {
            notes_unfiled,
            folder_removed: removed > 0,
        })
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    for (table, columns) in [(FOLDERS_TABLE, FOLDER_COLUMNS), (NOTES_TABLE, NOTE_COLUMNS)] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table,
                    column: *column,
                });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
