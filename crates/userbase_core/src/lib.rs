//! Core domain logic for the userbase directory.
//! This crate is the single source of truth for user and pagination invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::pagination::{
    compute_page_info, ListFilter, PageInfo, PageLink, PageLinkParseError, PaginatedList,
    DEFAULT_LIST_LIMIT,
};
pub use model::user::{normalize_username, User, UserId, UserValidationError};
pub use repo::user_repo::{
    RepoError, RepoResult, SqliteUserRepository, UserPage, UserRepository, WriteOutcome,
};
pub use service::user_service::{ServiceError, ServiceResult, UserService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
