use rusqlite::Connection;
use shoroshim_core::db::migrations::{latest_version, schema_version};
use shoroshim_core::db::{open_db, open_db_in_memory, DbError, BUSY_TIMEOUT};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "persons");
    assert_table_exists(&conn, "relationships");
}

#[test]
fn reopening_a_file_database_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("family.sqlite3");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO persons (display_name, gender) VALUES ('Leah', 'F');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_version());
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM persons;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

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

#[test]
fn busy_timeout_is_configured() {
    let conn = open_db_in_memory().unwrap();
    let timeout_ms: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout_ms, BUSY_TIMEOUT.as_millis() as i64);
}

#[test]
fn schema_rejects_negative_relationship_types() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO persons (id, display_name, gender) VALUES (1, 'Parent', 'M'), (2, 'Child', 'F');",
    )
    .unwrap();

    let negative = conn.execute(
        "INSERT INTO relationships (person_id, related_person_id, type) VALUES (1, 2, -1);",
        [],
    );
    assert!(negative.is_err());

    let dangling = conn.execute(
        "INSERT INTO relationships (person_id, related_person_id, type) VALUES (1, 99, 1);",
        [],
    );
    assert!(dangling.is_err(), "foreign keys must be enforced");
}

#[test]
fn schema_rejects_blank_display_name_and_unknown_gender() {
    let conn = open_db_in_memory().unwrap();

    assert!(conn
        .execute(
            "INSERT INTO persons (display_name, gender) VALUES ('   ', 'M');",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO persons (display_name, gender) VALUES ('Noa', 'X');",
            [],
        )
        .is_err());
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "missing table `{table_name}`");
}
