//! Query composition for note listings.
//!
//! # Responsibility
//! - Compose WHERE fragments and ordered bind arguments for listing queries.
//! - Keep user input out of SQL text.
//!
//! # Invariants
//! - Builders are pure; they never touch a connection.
//! - Argument order always matches placeholder order in the clause.

pub mod filter;
