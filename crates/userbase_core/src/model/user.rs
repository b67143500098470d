//! User domain model.
//!
//! # Responsibility
//! - Define the canonical user record stored in the `users` table.
//! - Provide validation and soft-delete state helpers.
//!
//! # Invariants
//! - `id` is assigned by the store on creation and never reused.
//! - `deleted_at` is the source of truth for tombstone state.
//! - A stored `username` is non-empty after trimming.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every user row.
pub type UserId = Uuid;

/// Validation errors for user input and persisted rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Username is empty or whitespace-only.
    EmptyUsername,
    /// Nil UUID cannot identify a stored user.
    NilId,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::NilId => write!(f, "user id must not be nil"),
        }
    }
}

impl Error for UserValidationError {}

/// Canonical user record.
///
/// Timestamps are Unix epoch milliseconds written by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Soft delete tombstone. `None` means the row is active.
    pub deleted_at: Option<i64>,
}

impl User {
    /// Returns whether this user is visible to lookups and listings.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Validates invariants of a persisted user row.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.id.is_nil() {
            return Err(UserValidationError::NilId);
        }
        normalize_username(&self.username)?;
        Ok(())
    }
}

/// Trims a username candidate and rejects empty results.
pub fn normalize_username(raw: &str) -> Result<String, UserValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UserValidationError::EmptyUsername);
    }
    Ok(trimmed.to_string())
}
