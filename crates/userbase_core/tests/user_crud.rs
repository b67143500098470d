use userbase_core::db::migrations::latest_version;
use userbase_core::db::open_db_in_memory;
use userbase_core::{
    ListFilter, RepoError, SqliteUserRepository, UserRepository, UserValidationError, WriteOutcome,
};
use rusqlite::{params, Connection};
use std::num::NonZeroU32;
use uuid::Uuid;

fn filter(limit: u32, offset: u32) -> ListFilter {
    ListFilter::new(NonZeroU32::new(limit).unwrap(), offset)
}

fn seed(repo: &SqliteUserRepository<'_>, count: usize) -> Vec<Uuid> {
    (0..count)
        .map(|index| repo.insert_user(&format!("user-{index}")).unwrap())
        .collect()
}

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let id = repo.insert_user("  alice  ").unwrap();
    assert!(!id.is_nil());

    let loaded = repo.get_active_user(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.username, "alice");
    assert!(loaded.created_at > 0);
    assert_eq!(loaded.created_at, loaded.updated_at);
    assert!(loaded.is_active());
}

#[test]
fn insert_assigns_fresh_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let first = repo.insert_user("same").unwrap();
    repo.soft_delete_user(first).unwrap();
    let second = repo.insert_user("same").unwrap();

    assert_ne!(first, second);
}

#[test]
fn insert_rejects_blank_username() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo.insert_user("   ").unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(UserValidationError::EmptyUsername)
    ));
}

#[test]
fn get_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert!(repo.get_active_user(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn update_changes_username_and_refreshes_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let id = repo.insert_user("draft").unwrap();
    conn.execute(
        "UPDATE users SET created_at = 1000, updated_at = 1000 WHERE id = ?1;",
        params![id.to_string()],
    )
    .unwrap();

    let outcome = repo.update_username(id, "final").unwrap();
    assert_eq!(outcome, WriteOutcome::Updated);

    let loaded = repo.get_active_user(id).unwrap().unwrap();
    assert_eq!(loaded.username, "final");
    assert_eq!(loaded.created_at, 1000);
    assert!(loaded.updated_at > 1000);
    assert_eq!(loaded.deleted_at, None);
}

#[test]
fn update_unknown_or_deleted_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert_eq!(
        repo.update_username(Uuid::new_v4(), "ghost").unwrap(),
        WriteOutcome::NotFound
    );

    let id = repo.insert_user("short-lived").unwrap();
    repo.soft_delete_user(id).unwrap();
    assert_eq!(
        repo.update_username(id, "revived").unwrap(),
        WriteOutcome::NotFound
    );

    let stored: String = conn
        .query_row(
            "SELECT username FROM users WHERE id = ?1;",
            params![id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, "short-lived");
}

#[test]
fn soft_delete_hides_row_but_keeps_it_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let id = repo.insert_user("bob").unwrap();
    assert_eq!(repo.soft_delete_user(id).unwrap(), WriteOutcome::Deleted);

    assert!(repo.get_active_user(id).unwrap().is_none());

    let deleted_at: Option<i64> = conn
        .query_row(
            "SELECT deleted_at FROM users WHERE id = ?1;",
            params![id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert!(deleted_at.is_some());
}

#[test]
fn soft_delete_twice_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let id = repo.insert_user("carol").unwrap();
    assert_eq!(repo.soft_delete_user(id).unwrap(), WriteOutcome::Deleted);
    assert_eq!(repo.soft_delete_user(id).unwrap(), WriteOutcome::NotFound);
    assert_eq!(
        repo.soft_delete_user(Uuid::new_v4()).unwrap(),
        WriteOutcome::NotFound
    );
}

#[test]
fn window_returns_newest_first_with_total() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let ids = seed(&repo, 5);

    let page = repo.fetch_active_page(&filter(2, 0)).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.users.len(), 2);
    assert_eq!(page.users[0].id, ids[4]);
    assert_eq!(page.users[1].id, ids[3]);

    let page = repo.fetch_active_page(&filter(2, 4)).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.users.len(), 1);
    assert_eq!(page.users[0].id, ids[0]);
}

#[test]
fn window_orders_by_created_at_before_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let ids = seed(&repo, 3);

    conn.execute(
        "UPDATE users SET created_at = 9999999999999 WHERE id = ?1;",
        params![ids[0].to_string()],
    )
    .unwrap();

    let page = repo.fetch_active_page(&filter(10, 0)).unwrap();
    let order: Vec<_> = page.users.iter().map(|user| user.id).collect();
    assert_eq!(order, vec![ids[0], ids[2], ids[1]]);
}

#[test]
fn window_excludes_deleted_rows_from_items_and_total() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let ids = seed(&repo, 4);
    repo.soft_delete_user(ids[1]).unwrap();
    repo.soft_delete_user(ids[3]).unwrap();

    let page = repo.fetch_active_page(&filter(10, 0)).unwrap();
    assert_eq!(page.total, 2);
    let listed: Vec<_> = page.users.iter().map(|user| user.id).collect();
    assert_eq!(listed, vec![ids[2], ids[0]]);
    assert!(page.users.iter().all(|user| user.is_active()));
}

#[test]
fn window_on_empty_table_is_empty_not_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let page = repo.fetch_active_page(&filter(10, 0)).unwrap();
    assert_eq!(page.total, 0);
    assert!(page.users.is_empty());
}

#[test]
fn window_past_the_end_still_reports_active_total() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let ids = seed(&repo, 3);
    repo.soft_delete_user(ids[0]).unwrap();

    let page = repo.fetch_active_page(&filter(10, 20)).unwrap();
    assert!(page.users.is_empty());
    assert_eq!(page.total, 2);
}

#[test]
fn window_read_transaction_is_closed_after_listing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    seed(&repo, 3);

    repo.fetch_active_page(&filter(2, 0)).unwrap();
    assert!(conn.is_autocommit());

    let page = repo.fetch_active_page(&filter(2, 10)).unwrap();
    assert_eq!(page.total, 3);
    assert!(conn.is_autocommit());

    let id = repo.insert_user("after-listing").unwrap();
    let page = repo.fetch_active_page(&filter(2, 10)).unwrap();
    assert_eq!(page.total, 4);
    assert!(repo.get_active_user(id).unwrap().is_some());
}

#[test]
fn failed_window_rolls_back_its_read_transaction() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO users (id, username) VALUES ('not-a-uuid', 'broken');",
        [],
    )
    .unwrap();

    assert!(repo.fetch_active_page(&filter(10, 0)).is_err());
    assert!(conn.is_autocommit());
}

#[test]
fn window_surfaces_store_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    conn.execute_batch("DROP TABLE users;").unwrap();

    let err = repo.fetch_active_page(&filter(10, 0)).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn read_rejects_corrupted_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO users (id, username) VALUES ('not-a-uuid', 'broken');",
        [],
    )
    .unwrap();

    let err = repo.fetch_active_page(&filter(10, 0)).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("not-a-uuid")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteUserRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_users_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteUserRepository::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("users"))));
}

#[test]
fn repository_rejects_connection_missing_deleted_at_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteUserRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "users",
            column: "deleted_at"
        })
    ));
}
