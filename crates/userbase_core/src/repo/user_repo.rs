//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the canonical `users` table.
//! - Serve listing windows together with the active-row total in one query.
//!
//! # Invariants
//! - Every read and write path filters on `deleted_at IS NULL`.
//! - Mutations report `WriteOutcome::NotFound` when no active row matched.
//! - Listing order is `created_at DESC, rowid DESC`.
//! - A listing window and its total come from one read snapshot.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::pagination::ListFilter;
use crate::model::user::{normalize_username, User, UserId, UserValidationError};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    created_at,
    updated_at,
    deleted_at
FROM users";

/// Active window plus the active-row total, evaluated before `LIMIT/OFFSET`.
const ACTIVE_WINDOW_SQL: &str = "SELECT
    id,
    username,
    created_at,
    updated_at,
    deleted_at,
    COUNT(*) OVER () AS total
FROM users
WHERE deleted_at IS NULL
ORDER BY created_at DESC, rowid DESC
LIMIT ?1 OFFSET ?2;";

const NOW_EPOCH_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

const REQUIRED_USER_COLUMNS: [&str; 5] =
    ["id", "username", "created_at", "updated_at", "deleted_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Write input rejected before reaching SQL.
    Validation(UserValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid user.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "user repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "user repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "user repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a mutation that targets exactly one active row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Updated,
    Deleted,
    /// No active row matched: the id is unknown or already soft-deleted.
    NotFound,
}

impl WriteOutcome {
    fn from_changed(changed: usize, hit: Self) -> Self {
        if changed == 0 {
            Self::NotFound
        } else {
            hit
        }
    }
}

/// One listing window of active users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    /// Rows in `[offset, offset + limit)` of the ordered active set.
    pub users: Vec<User>,
    /// Count of all active rows, independent of the window.
    pub total: u64,
}

/// Store contract consumed by the user service.
pub trait UserRepository {
    /// Inserts a new active user under a fresh id and returns that id.
    fn insert_user(&self, username: &str) -> RepoResult<UserId>;
    /// Point lookup restricted to active rows.
    fn get_active_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Replaces the username and refreshes `updated_at` of an active row.
    fn update_username(&self, id: UserId, username: &str) -> RepoResult<WriteOutcome>;
    /// Sets `deleted_at` on an active row.
    fn soft_delete_user(&self, id: UserId) -> RepoResult<WriteOutcome>;
    /// Returns one ordered window of active users plus the active total.
    fn fetch_active_page(&self, filter: &ListFilter) -> RepoResult<UserPage>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` is not the latest.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_user_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, username: &str) -> RepoResult<UserId> {
        let username = normalize_username(username)?;
        let id = Uuid::new_v4();

        self.conn.execute(
            "INSERT INTO users (id, username) VALUES (?1, ?2);",
            params![id.to_string(), username],
        )?;

        Ok(id)
    }

    fn get_active_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn update_username(&self, id: UserId, username: &str) -> RepoResult<WriteOutcome> {
        let username = normalize_username(username)?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE users
                 SET
                    username = ?2,
                    updated_at = {NOW_EPOCH_MS_SQL}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            params![id.to_string(), username],
        )?;

        Ok(WriteOutcome::from_changed(changed, WriteOutcome::Updated))
    }

    fn soft_delete_user(&self, id: UserId) -> RepoResult<WriteOutcome> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE users
                 SET deleted_at = {NOW_EPOCH_MS_SQL}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            [id.to_string()],
        )?;

        Ok(WriteOutcome::from_changed(changed, WriteOutcome::Deleted))
    }

    fn fetch_active_page(&self, filter: &ListFilter) -> RepoResult<UserPage> {
        // Window and fallback count read from one snapshot.
        let tx = self.conn.unchecked_transaction()?;

        let (users, window_total) = {
            let mut stmt = tx.prepare(ACTIVE_WINDOW_SQL)?;
            let mut rows = stmt.query(params![
                i64::from(filter.limit.get()),
                i64::from(filter.offset)
            ])?;

            let mut users = Vec::new();
            let mut total = None;
            while let Some(row) = rows.next()? {
                if total.is_none() {
                    total = Some(parse_total(row.get("total")?)?);
                }
                users.push(parse_user_row(row)?);
            }
            (users, total)
        };

        let total = match window_total {
            Some(total) => total,
            None if filter.offset == 0 => 0,
            // An empty window past the end carries no window aggregate.
            None => {
                debug!(
                    "event=user_window_past_end module=repo status=ok limit={} offset={}",
                    filter.limit, filter.offset
                );
                count_active(&tx)?
            }
        };
        tx.commit()?;

        Ok(UserPage { users, total })
    }
}

fn count_active(conn: &Connection) -> RepoResult<u64> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL;",
        [],
        |row| row.get(0),
    )?;
    parse_total(total)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in users.id")))?;

    let user = User {
        id,
        username: row.get("username")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    user.validate()
        .map_err(|err| RepoError::InvalidData(format!("user `{id}`: {err}")))?;
    Ok(user)
}

fn parse_total(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}

fn ensure_user_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "users")? {
        return Err(RepoError::MissingRequiredTable("users"));
    }

    for column in REQUIRED_USER_COLUMNS {
        if !table_has_column(conn, "users", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM pragma_table_info(?1)
            WHERE name = ?2
        );",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
