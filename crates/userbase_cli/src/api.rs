//! Boundary layer between CLI input/output and the core service.
//!
//! # Responsibility
//! - Normalize raw list parameters into a valid `ListFilter`.
//! - Map service errors to stable client-facing error codes.
//! - Render results as JSON documents.
//!
//! # Invariants
//! - The core never receives a non-positive limit or negative offset.
//! - Store failure details are logged, never echoed to the client.

use log::error;
use serde::Serialize;
use std::num::NonZeroU32;
use userbase_core::{ListFilter, PageLink, ServiceError, UserId};
use uuid::Uuid;

/// Stable client-facing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidUsername,
    UserNotFound,
    InvalidArgument,
    Unknown,
}

/// Error document written to stdout on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ApiError {
    fn new(code: ErrorCode) -> Self {
        Self { code, meta: None }
    }

    pub(crate) fn invalid_argument(argument: &str, value: &str) -> Self {
        Self {
            code: ErrorCode::InvalidArgument,
            meta: Some(serde_json::json!({ "argument": argument, "value": value })),
        }
    }

    /// Wraps a failure that must not leak to the client.
    pub fn unknown(context: &str, err: &dyn std::error::Error) -> Self {
        error!("event={context} module=cli status=error error_code=unknown error={err}");
        Self::new(ErrorCode::Unknown)
    }

    /// Process exit status: 2 for client-facing errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::Unknown => 1,
            _ => 2,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"code":"unknown"}"#.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::InvalidUsername(_) => Self::new(ErrorCode::InvalidUsername),
            ServiceError::NotFound(_) => Self::new(ErrorCode::UserNotFound),
            other => Self::unknown("service_call", &other),
        }
    }
}

/// Parses a user id argument.
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::invalid_argument("id", raw))
}

/// Defaults and ceiling applied to list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    default_limit: NonZeroU32,
    max_limit: NonZeroU32,
}

impl ListParams {
    /// `max_limit` below `default_limit` is raised to `default_limit`.
    pub fn new(default_limit: NonZeroU32, max_limit: NonZeroU32) -> Self {
        Self {
            default_limit,
            max_limit: max_limit.max(default_limit),
        }
    }

    /// Builds a filter from raw `limit`/`offset` values.
    ///
    /// Missing, unparsable, non-positive limits and negative offsets fall
    /// back to the defaults instead of failing.
    pub fn filter_from_raw(&self, limit: Option<&str>, offset: Option<&str>) -> ListFilter {
        let limit = limit
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .map(|value| u32::try_from(value).unwrap_or(u32::MAX))
            .and_then(NonZeroU32::new)
            .unwrap_or(self.default_limit);

        let offset = offset
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(0);

        ListFilter::new(self.clamp(limit), offset)
    }

    /// Builds a filter from a navigation token such as `limit=10&offset=20`.
    pub fn filter_from_link(&self, raw: &str) -> Result<ListFilter, ApiError> {
        let link: PageLink = raw
            .parse()
            .map_err(|_| ApiError::invalid_argument("link", raw))?;
        Ok(ListFilter::new(self.clamp(link.limit), link.offset))
    }

    fn clamp(&self, limit: NonZeroU32) -> NonZeroU32 {
        limit.min(self.max_limit)
    }
}
