//! Domain model for the user directory.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Define the listing window and page navigation shapes.
//!
//! # Invariants
//! - Every user is identified by a stable `UserId`.
//! - Deletion is represented by a soft-delete timestamp, not hard delete.

pub mod pagination;
pub mod user;
