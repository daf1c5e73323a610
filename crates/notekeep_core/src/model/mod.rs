//! Domain model for notes and folders.
//!
//! # Invariants
//! - Ids are assigned by the store and never reused by the caller.
//! - `updated_at` is owned by the repository; drafts never carry it.
//! - Deletion is a hard delete; there are no tombstones.

pub mod folder;
pub mod note;
