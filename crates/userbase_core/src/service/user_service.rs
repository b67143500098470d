//! User use-case service.
//!
//! # Responsibility
//! - Provide create/get/update/delete/list entry points for boundary callers.
//! - Assemble paginated listing results with navigation metadata.
//!
//! # Invariants
//! - Username input is validated before any store call.
//! - Every operation performs its store calls once; nothing is retried.
//! - Store failures are returned unmodified inside `ServiceError::Repo`.

use crate::model::pagination::{ListFilter, PaginatedList};
use crate::model::user::{normalize_username, User, UserId, UserValidationError};
use crate::repo::user_repo::{RepoError, UserRepository, WriteOutcome};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for user use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Username input is empty after trimming.
    InvalidUsername(UserValidationError),
    /// No active user has this id.
    NotFound(UserId),
    /// Persistence-layer failure, passed through as reported.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(err) => write!(f, "invalid username: {err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent user state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUsername(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<UserValidationError> for ServiceError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUsername(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidUsername(err),
            other => Self::Repo(other),
        }
    }
}

/// User service facade over repository implementations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one user and returns the stored row.
    pub fn create_user(&self, username: &str) -> ServiceResult<User> {
        let username = normalize_username(username)?;
        let id = self
            .repo
            .insert_user(&username)
            .map_err(|err| store_failure("user_create", err))?;

        info!("event=user_create module=service status=ok user_id={id}");
        self.repo
            .get_active_user(id)
            .map_err(|err| store_failure("user_create", err))?
            .ok_or(ServiceError::InconsistentState(
                "created user not found in read-back",
            ))
    }

    /// Gets one active user by id.
    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        match self
            .repo
            .get_active_user(id)
            .map_err(|err| store_failure("user_get", err))?
        {
            Some(user) => Ok(user),
            None => Err(not_found("user_get", id)),
        }
    }

    /// Replaces the username of an active user and returns the updated row.
    ///
    /// # Contract
    /// - Unknown and soft-deleted ids both yield `NotFound`.
    /// - Only `username` and `updated_at` change.
    pub fn update_user(&self, id: UserId, username: &str) -> ServiceResult<User> {
        let username = normalize_username(username)?;
        let outcome = self
            .repo
            .update_username(id, &username)
            .map_err(|err| store_failure("user_update", err))?;

        match outcome {
            WriteOutcome::Updated => {
                info!("event=user_update module=service status=ok user_id={id}");
                self.repo
                    .get_active_user(id)
                    .map_err(|err| store_failure("user_update", err))?
                    .ok_or(ServiceError::InconsistentState(
                        "updated user not found in read-back",
                    ))
            }
            WriteOutcome::NotFound => Err(not_found("user_update", id)),
            WriteOutcome::Deleted => Err(ServiceError::InconsistentState(
                "update reported a delete outcome",
            )),
        }
    }

    /// Soft-deletes an active user.
    ///
    /// Deleting the same id twice yields `NotFound` the second time.
    pub fn delete_user(&self, id: UserId) -> ServiceResult<()> {
        let outcome = self
            .repo
            .soft_delete_user(id)
            .map_err(|err| store_failure("user_delete", err))?;

        match outcome {
            WriteOutcome::Deleted => {
                info!("event=user_delete module=service status=ok user_id={id}");
                Ok(())
            }
            WriteOutcome::NotFound => Err(not_found("user_delete", id)),
            WriteOutcome::Updated => Err(ServiceError::InconsistentState(
                "delete reported an update outcome",
            )),
        }
    }

    /// Lists one window of active users with page navigation filled in.
    ///
    /// # Contract
    /// - One store round trip returns both the window and the active total.
    /// - `total` counts every active user, not only the returned window.
    pub fn list_users(&self, filter: ListFilter) -> ServiceResult<PaginatedList<User>> {
        let started_at = Instant::now();
        let page = self
            .repo
            .fetch_active_page(&filter)
            .map_err(|err| store_failure("user_list", err))?;

        let mut list = PaginatedList::new(page.users, page.total, filter);
        list.enrich_navigation();

        debug!(
            "event=user_list module=service status=ok limit={} offset={} total={} returned={} page={} pages={} duration_ms={}",
            list.limit,
            list.offset,
            list.total,
            list.items.len(),
            list.page,
            list.pages,
            started_at.elapsed().as_millis()
        );
        Ok(list)
    }
}

fn store_failure(event: &str, err: RepoError) -> ServiceError {
    if !matches!(err, RepoError::Validation(_)) {
        error!("event={event} module=service status=error error={err}");
    }
    ServiceError::from(err)
}

fn not_found(event: &str, id: UserId) -> ServiceError {
    info!("event={event} module=service status=not_found user_id={id}");
    ServiceError::NotFound(id)
}
