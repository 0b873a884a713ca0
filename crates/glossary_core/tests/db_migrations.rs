use glossary_core::db::migrations::{apply_migrations, schema_status, target_version};
use glossary_core::db::{open_db, open_db_in_memory, DbError, SchemaStatus};
use glossary_core::{SqliteTermRepository, TermDraft, TermService};
use rusqlite::Connection;

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn insert_linked_term(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO terms (uuid, title, content, created_at, updated_at)
             VALUES ('t1', 'Lifetime', 'Scope of a borrow.', 1, 1);
         INSERT INTO tags (uuid, name) VALUES ('g1', 'rust');
         INSERT INTO term_tags (term_uuid, tag_uuid) VALUES ('t1', 'g1');",
    )
    .unwrap();
}

#[test]
fn blank_connection_is_brought_to_target_in_one_pass() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert_eq!(
        schema_status(&conn).unwrap(),
        SchemaStatus::Behind {
            found: 0,
            target: target_version()
        }
    );

    assert_eq!(apply_migrations(&mut conn).unwrap(), 1);
    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
    assert_eq!(
        schema_status(&conn).unwrap(),
        SchemaStatus::Current(target_version())
    );
    for table in ["terms", "tags", "term_tags"] {
        let sql = format!("SELECT COUNT(*) FROM {table};");
        assert_eq!(count(&conn, &sql), 0);
    }
}

#[test]
fn reopened_glossary_file_keeps_its_terms() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.sqlite3");

    {
        let mut conn = open_db(&path).unwrap();
        let mut service = TermService::new(SqliteTermRepository::try_new(&mut conn).unwrap());
        service
            .create_term(&TermDraft::new("Arc", "Shared ownership.", ["sync"]))
            .unwrap();
    }

    let mut conn = open_db(&path).unwrap();
    assert_eq!(
        schema_status(&conn).unwrap(),
        SchemaStatus::Current(target_version())
    );
    let service = TermService::new(SqliteTermRepository::try_new(&mut conn).unwrap());
    let terms = service.list_terms().unwrap();
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].tag_names().collect::<Vec<_>>(), vec!["sync"]);
}

#[test]
fn glossary_from_newer_release_is_refused_and_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 999;")
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::NewerSchema { found: 999, supported } if supported == target_version()
    ));
    assert!(err.to_string().contains("v999"));

    let raw = Connection::open(&path).unwrap();
    assert_eq!(count(&raw, "PRAGMA user_version;"), 999);
    assert_eq!(
        count(
            &raw,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'terms';"
        ),
        0
    );
}

#[test]
fn tag_names_are_unique_but_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("INSERT INTO tags (uuid, name) VALUES ('a', 'Web'), ('b', 'web');")
        .unwrap();

    let duplicate = conn.execute("INSERT INTO tags (uuid, name) VALUES ('c', 'Web');", []);
    assert!(duplicate.is_err());
}

#[test]
fn deleting_a_term_row_drops_links_but_keeps_tags() {
    let conn = open_db_in_memory().unwrap();
    insert_linked_term(&conn);

    conn.execute("DELETE FROM terms WHERE uuid = 't1';", [])
        .unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM term_tags;"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM tags;"), 1);
}

#[test]
fn linked_tag_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    insert_linked_term(&conn);

    let removed = conn.execute("DELETE FROM tags WHERE uuid = 'g1';", []);
    assert!(removed.is_err());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM term_tags;"), 1);
}

#[test]
fn blank_titles_and_definitions_are_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();
    for (title, content) in [("   ", "body"), ("Title", "")] {
        let inserted = conn.execute(
            "INSERT INTO terms (uuid, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, 1);",
            rusqlite::params![format!("{title}-{content}"), title, content],
        );
        assert!(inserted.is_err());
    }
}
