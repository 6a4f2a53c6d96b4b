use blocknote_core::db::migrations::latest_version;
use blocknote_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, ErrorCode};

const NOTE_ID: &str = "00000000-0000-4000-8000-000000000001";

#[test]
fn fresh_store_reaches_latest_version_with_both_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(
        column_names(&conn, "notes"),
        ["uuid", "content", "created_at", "updated_at", "is_deleted"]
    );
    assert_eq!(
        column_names(&conn, "note_checklist_items"),
        ["note_uuid", "position", "content", "is_checked"]
    );
}

#[test]
fn checklist_items_cascade_with_their_note() {
    let conn = open_db_in_memory().unwrap();
    insert_note(&conn, NOTE_ID);
    insert_item(&conn, NOTE_ID, 0, "milk").unwrap();
    insert_item(&conn, NOTE_ID, 1, "eggs").unwrap();

    conn.execute("DELETE FROM notes WHERE uuid = ?1;", [NOTE_ID])
        .unwrap();

    assert_eq!(item_count(&conn), 0);
}

#[test]
fn checklist_items_require_an_existing_note() {
    let conn = open_db_in_memory().unwrap();
    let err = insert_item(&conn, NOTE_ID, 0, "orphan").unwrap_err();
    assert_eq!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation));
}

#[test]
fn checklist_positions_are_unique_and_non_negative() {
    let conn = open_db_in_memory().unwrap();
    insert_note(&conn, NOTE_ID);
    insert_item(&conn, NOTE_ID, 0, "first").unwrap();

    let duplicate = insert_item(&conn, NOTE_ID, 0, "again").unwrap_err();
    assert_eq!(
        duplicate.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    );
    let negative = insert_item(&conn, NOTE_ID, -1, "before").unwrap_err();
    assert_eq!(
        negative.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    );
    assert_eq!(item_count(&conn), 1);
}

#[test]
fn version_one_store_upgrades_and_keeps_notes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            uuid        TEXT PRIMARY KEY NOT NULL,
            content     TEXT NOT NULL DEFAULT '',
            created_at  INTEGER NOT NULL DEFAULT 0,
            updated_at  INTEGER NOT NULL DEFAULT 0,
            is_deleted  INTEGER NOT NULL DEFAULT 0
        );
        PRAGMA user_version = 1;",
    )
    .unwrap();
    insert_note(&conn, NOTE_ID);
    drop(conn);

    let upgraded = open_db(&path).unwrap();
    assert_eq!(schema_version(&upgraded), latest_version());
    insert_item(&upgraded, NOTE_ID, 0, "kept").unwrap();
    assert_eq!(item_count(&upgraded), 1);
}

#[test]
fn reopening_store_does_not_reapply_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocknote.db");

    let first = open_db(&path).unwrap();
    insert_note(&first, NOTE_ID);
    insert_item(&first, NOTE_ID, 0, "persisted").unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_eq!(item_count(&second), 1);
}

#[test]
fn failing_migration_reports_version_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.db");

    // A pre-existing `notes` table without `updated_at` breaks the index step.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE notes (uuid TEXT PRIMARY KEY);")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::MigrationFailed { version, .. } => assert_eq!(version, 1),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    assert!(!table_exists(&conn, "note_checklist_items"));
}

#[test]
fn newer_store_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn insert_note(conn: &Connection, note_id: &str) {
    conn.execute("INSERT INTO notes (uuid) VALUES (?1);", [note_id])
        .unwrap();
}

fn insert_item(
    conn: &Connection,
    note_id: &str,
    position: i64,
    content: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO note_checklist_items (note_uuid, position, content, is_checked)
         VALUES (?1, ?2, ?3, 0);",
        params![note_id, position, content],
    )
}

fn item_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM note_checklist_items;", [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [table],
        |row| row.get(0),
    )
    .unwrap()
}
