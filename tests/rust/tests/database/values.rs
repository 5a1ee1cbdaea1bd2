//! Bound values as SQLite stores them

use opscope_core::{CallContext, Value};
use opscope_storage::{SqlValue, Statement};
use pretty_assertions::assert_eq;
use tests::db::TestDatabase;
use tests::fixtures;

const SAMPLES: &str = "
    CREATE TABLE samples (
        id INTEGER PRIMARY KEY,
        n INTEGER,
        f REAL,
        active INTEGER,
        at TEXT,
        label TEXT,
        missing TEXT,
        big TEXT
    );
";

fn samples_db() -> TestDatabase {
    let test_db = TestDatabase::in_memory();
    test_db.db.connection().execute_batch(SAMPLES).unwrap();
    test_db
}

fn count(test_db: &TestDatabase, sql: &str, value: impl Into<Value>) -> i64 {
    let row = test_db
        .db
        .row(Statement::new("samples", sql).bind(value))
        .unwrap();
    row.get_i64("c").unwrap()
}

#[test]
fn test_every_value_kind_is_stored_as_bound() {
    let test_db = samples_db();
    let ctx = CallContext::new();
    let none: Option<&str> = None;

    test_db
        .db
        .insert(
            Statement::new(
                "samples",
                "INSERT INTO samples (id, n, f, active, at, label, missing, big) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .with_context(ctx.clone())
            .bind(1)
            .bind(-42i64)
            .bind(2.75)
            .bind(true)
            .bind(fixtures::fixed_timestamp())
            .bind("it's")
            .bind(none)
            .bind(u64::MAX),
        )
        .unwrap();

    let row = test_db
        .db
        .row(
            Statement::new("samples", "SELECT * FROM samples WHERE id=?")
                .with_context(ctx)
                .bind(1),
        )
        .unwrap();

    assert_eq!(row.get("n"), Some(&SqlValue::Integer(-42)));
    assert_eq!(row.get("f"), Some(&SqlValue::Real(2.75)));
    assert_eq!(row.get("active"), Some(&SqlValue::Integer(1)));
    assert_eq!(row.get("at"), Some(&SqlValue::Text("2024-01-02 03:04:05.678".to_string())));
    assert_eq!(row.get("label"), Some(&SqlValue::Text("it's".to_string())));
    assert_eq!(row.get("missing"), Some(&SqlValue::Null));
    assert_eq!(row.get("big"), Some(&SqlValue::Text(u64::MAX.to_string())));
}

#[test]
fn test_stored_values_match_bound_values_in_queries() {
    let test_db = samples_db();

    for (id, active) in [(1, true), (2, false), (3, true)] {
        test_db
            .db
            .insert(
                Statement::new("samples", "INSERT INTO samples (id, active, at) VALUES (?, ?, ?)")
                    .bind(id)
                    .bind(active)
                    .bind(fixtures::fixed_timestamp()),
            )
            .unwrap();
    }

    assert_eq!(count(&test_db, "SELECT count(*) AS c FROM samples WHERE active=?", true), 2);
    assert_eq!(count(&test_db, "SELECT count(*) AS c FROM samples WHERE active=?", false), 1);
    assert_eq!(
        count(&test_db, "SELECT count(*) AS c FROM samples WHERE at=?", fixtures::fixed_timestamp()),
        3
    );
    assert_eq!(
        count(&test_db, "SELECT count(*) AS c FROM samples WHERE at>?", "2024-01-02 03:04:05"),
        3
    );
}

#[test]
fn test_event_keeps_display_form_while_row_keeps_precision() {
    let test_db = samples_db();

    test_db
        .db
        .insert(
            Statement::new("samples", "INSERT INTO samples (id, active, at) VALUES (?, ?, ?)")
                .with_context(CallContext::new())
                .bind(1)
                .bind(false)
                .bind(fixtures::fixed_timestamp()),
        )
        .unwrap();

    let event = &test_db.logger.events()[0];
    assert_eq!(
        event.field_str("rendered_statement").as_deref(),
        Some("INSERT INTO samples (id, active, at) VALUES (1, 'false', '2024-01-02 03:04:05')")
    );

    let row = test_db
        .db
        .row(Statement::new("samples", "SELECT active, at FROM samples WHERE id=?").bind(1))
        .unwrap();
    assert_eq!(row.get_i64("active"), Some(0));
    assert_eq!(row.get_text("at"), Some("2024-01-02 03:04:05.678"));
}
