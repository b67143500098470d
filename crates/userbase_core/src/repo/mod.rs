//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract consumed by the user service.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Soft-deleted rows are invisible to every repository read and write.
//! - Mutations report explicit outcomes instead of raw affected-row counts.

pub mod user_repo;
