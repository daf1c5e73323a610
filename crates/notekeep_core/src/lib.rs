//! Asynchronous notes store for NoteKeep.
//!
//! Notes and folders live in one SQLite database. All access goes through
//! [`NotesRepository`], which runs every operation on a single serialized lane
//! and delivers results on a caller-chosen [`Dispatcher`].

pub mod config;
pub mod db;
pub mod dispatch;
pub mod lane;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod repository;

pub use config::{ConfigError, LoggingConfig, NotesConfig};
pub use db::{open_db, open_db_in_memory, open_db_with, DbError, DbOptions};
pub use dispatch::{completion, Completion, Dispatcher, MainLoop};
pub use logging::{
    default_log_level, init_from_config, init_logging, init_stderr_logging, logging_status,
    LogTarget,
};
pub use model::folder::{Folder, FolderId};
pub use model::note::{Note, NoteDraft, NoteId};
pub use query::filter::NoteScope;
pub use repo::store::FolderDeletion;
pub use repo::{RepoError, RepoResult};
pub use repository::NotesRepository;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
