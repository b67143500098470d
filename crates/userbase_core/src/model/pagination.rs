//! Offset/limit pagination model.
//!
//! # Responsibility
//! - Carry the `(limit, offset)` window requested by callers.
//! - Turn a window plus total row count into page navigation metadata.
//!
//! # Invariants
//! - `limit` is always positive; it is a `NonZeroU32` end to end.
//! - Rounding is half away from zero (`0.5 -> 1`, `1.5 -> 2`).
//! - `pages` rounds the rows before the window and the rows from the window
//!   to the end separately, so a window straddling a page boundary counts
//!   from where the current offset sits.

use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;
use std::str::FromStr;

/// Page size applied when callers do not supply one.
pub const DEFAULT_LIST_LIMIT: NonZeroU32 = match NonZeroU32::new(10) {
    Some(limit) => limit,
    None => panic!("default list limit must be positive"),
};

/// Requested listing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListFilter {
    /// Maximum rows in the window.
    pub limit: NonZeroU32,
    /// Rows skipped before the window starts.
    pub offset: u32,
}

impl ListFilter {
    pub fn new(limit: NonZeroU32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Window starting at the first row.
    pub fn first_page(limit: NonZeroU32) -> Self {
        Self { limit, offset: 0 }
    }
}

impl Default for ListFilter {
    fn default() -> Self {
        Self::first_page(DEFAULT_LIST_LIMIT)
    }
}

impl From<PageLink> for ListFilter {
    fn from(link: PageLink) -> Self {
        Self::new(link.limit, link.offset)
    }
}

/// Navigation token pointing at another window.
///
/// Rendered as a query-string fragment: `limit=<L>&offset=<O>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub limit: NonZeroU32,
    pub offset: u32,
}

impl Display for PageLink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "limit={}&offset={}", self.limit, self.offset)
    }
}

/// Error returned when a navigation token cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinkParseError(String);

impl Display for PageLinkParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid page link `{}`", self.0)
    }
}

impl Error for PageLinkParseError {}

impl FromStr for PageLink {
    type Err = PageLinkParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || PageLinkParseError(value.to_string());
        let mut limit = None;
        let mut offset = None;

        for pair in value.trim().split('&') {
            let (key, raw) = pair.split_once('=').ok_or_else(invalid)?;
            match key {
                "limit" if limit.is_none() => {
                    limit = Some(raw.parse::<NonZeroU32>().map_err(|_| invalid())?);
                }
                "offset" if offset.is_none() => {
                    offset = Some(raw.parse::<u32>().map_err(|_| invalid())?);
                }
                _ => return Err(invalid()),
            }
        }

        match (limit, offset) {
            (Some(limit), Some(offset)) => Ok(Self { limit, offset }),
            _ => Err(invalid()),
        }
    }
}

/// Navigation metadata for one listing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// 1-based page the window starts on.
    pub page: u64,
    pub pages: u64,
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
}

/// Computes page navigation for a `(limit, offset)` window over `total` rows.
///
/// Pure and total over its domain.
pub fn compute_page_info(limit: NonZeroU32, offset: u32, total: u64) -> PageInfo {
    let (page, pages) = signed_page_counts(limit, offset, total);
    debug_assert!(pages >= 0, "negative page count for limit={limit} offset={offset}");

    let prev = (offset != 0).then(|| PageLink {
        limit,
        offset: offset.saturating_sub(limit.get()),
    });

    let next = offset
        .checked_add(limit.get())
        .filter(|next_offset| u64::from(*next_offset) < total)
        .map(|next_offset| PageLink {
            limit,
            offset: next_offset,
        });

    PageInfo {
        page: to_u64(page),
        pages: to_u64(pages),
        prev,
        next,
    }
}

/// `(page, pages)` before conversion to unsigned.
fn signed_page_counts(limit: NonZeroU32, offset: u32, total: u64) -> (i128, i128) {
    let limit_wide = i128::from(limit.get());
    let offset_wide = i128::from(offset);
    let total_wide = i128::from(total);

    let consumed = round_half_away_div(offset_wide, limit_wide);
    let page = consumed + 1;

    let mut pages = if offset == 0 { 0 } else { consumed };
    pages += round_half_away_div(total_wide - offset_wide, limit_wide);

    (page, pages)
}

/// Integer division rounding half away from zero. `divisor` must be positive.
fn round_half_away_div(dividend: i128, divisor: i128) -> i128 {
    let magnitude = (2 * dividend.abs() + divisor) / (2 * divisor);
    if dividend < 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn to_u64(value: i128) -> u64 {
    u64::try_from(value.max(0)).unwrap_or(u64::MAX)
}

/// One listing window plus its navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    /// Active rows in scope, independent of the window.
    pub total: u64,
    pub limit: NonZeroU32,
    pub offset: u32,
    pub page: u64,
    pub pages: u64,
    #[serde(serialize_with = "serialize_link")]
    pub prev: Option<PageLink>,
    #[serde(serialize_with = "serialize_link")]
    pub next: Option<PageLink>,
}

impl<T> PaginatedList<T> {
    /// Wraps a fetched window. Navigation fields stay empty until
    /// [`PaginatedList::enrich_navigation`] runs.
    pub fn new(items: Vec<T>, total: u64, filter: ListFilter) -> Self {
        Self {
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
            page: 0,
            pages: 0,
            prev: None,
            next: None,
        }
    }

    /// Fills `page`, `pages`, `prev` and `next` from the window and total.
    pub fn enrich_navigation(&mut self) {
        self.apply_page_info(compute_page_info(self.limit, self.offset, self.total));
    }

    pub fn apply_page_info(&mut self, info: PageInfo) {
        self.page = info.page;
        self.pages = info.pages;
        self.prev = info.prev;
        self.next = info.next;
    }

    /// Previous-window token, empty when on the first window.
    pub fn prev_token(&self) -> String {
        self.prev.map(|link| link.to_string()).unwrap_or_default()
    }

    /// Next-window token, empty when no rows remain after this window.
    pub fn next_token(&self) -> String {
        self.next.map(|link| link.to_string()).unwrap_or_default()
    }
}

fn serialize_link<S>(link: &Option<PageLink>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match link {
        Some(link) => serializer.collect_str(link),
        None => serializer.serialize_str(""),
    }
}
