//! Synchronous persistence layer executed on the serialized lane.
//!
//! # Responsibility
//! - Define the store contract for notes and folders.
//! - Convert SQLite failures into semantic repository errors.
//!
//! # Invariants
//! - Mutations of a missing row succeed with zero affected rows.
//! - Constraint failures are surfaced, never swallowed.
//! - Read paths reject rows that do not fit the mapping instead of masking them.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod mapping;
pub mod store;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error delivered to repository callers.
#[derive(Debug)]
pub enum RepoError {
    /// Another folder already has this (trimmed) name.
    DuplicateFolderName { name: String },
    /// Any other store constraint failure, e.g. an unknown `folder_id`.
    ConstraintViolation(String),
    /// Caller input rejected before reaching the store.
    InvalidInput(String),
    /// A column the mapping expects is absent from the result set.
    SchemaDrift { column: String },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Engine or filesystem failure. Never retried.
    Db(DbError),
    /// The lane worker is gone; the operation never ran.
    LaneClosed,
    /// The operation panicked on the lane.
    LanePanicked,
}

impl RepoError {
    /// Returns whether this error indicates schema and mapping code have drifted.
    pub fn is_schema_drift(&self) -> bool {
        matches!(
            self,
            Self::SchemaDrift { .. }
                | Self::MissingRequiredTable(_)
                | Self::MissingRequiredColumn { .. }
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateFolderName { name } => write!(f, "folder `{name}` already exists"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::SchemaDrift { column } => {
                write!(f, "result set is missing expected column `{column}`")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "notes store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "notes store requires column `{column}` in table `{table}`"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::LaneClosed => write!(f, "repository lane is closed"),
            Self::LanePanicked => write!(f, "repository operation panicked"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::InvalidColumnName(column) => Self::SchemaDrift { column },
            rusqlite::Error::SqliteFailure(err, message)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(message.unwrap_or_else(|| err.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}
