//! Logger plugin behavior across all operation kinds

use opscope_core::{CallContext, CallSlot, FieldValue, Level, OperationKind};
use opscope_storage::{chain_name, Phase, Statement, PLUGIN_NAME, SCENE};
use pretty_assertions::assert_eq;
use tests::db::TestDatabase;
use tests::fixtures;

#[test]
fn test_every_operation_emits_one_event() {
    let test_db = TestDatabase::in_memory();
    let db = &test_db.db;
    let ctx = CallContext::new();

    db.insert(fixtures::insert_user(&ctx, 1, "ann")).unwrap();
    db.update(
        Statement::new("users", "UPDATE users SET name=? WHERE id=?")
            .with_context(ctx.clone())
            .bind("bob")
            .bind(1),
    )
    .unwrap();
    let rows = db
        .select(Statement::new("users", "SELECT * FROM users").with_context(ctx.clone()))
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = db.row(fixtures::user_by_id(&ctx, 1)).unwrap();
    assert_eq!(row.get_text("name"), Some("bob"));
    db.delete(
        Statement::new("users", "DELETE FROM users WHERE id=?")
            .with_context(ctx.clone())
            .bind(1),
    )
    .unwrap();
    db.raw(Statement::raw("VACUUM").with_context(ctx.clone())).unwrap();

    let events = test_db.logger.events();
    let kinds: Vec<String> = events
        .iter()
        .map(|e| e.field_str("operation_kind").unwrap())
        .collect();
    assert_eq!(kinds, vec!["insert", "update", "select", "row", "delete", "raw"]);

    for event in &events {
        assert_eq!(event.level, Level::Debug);
        assert_eq!(event.trace_id.as_deref(), Some(ctx.trace_id.as_str()));
        assert_eq!(event.field_str("scene").as_deref(), Some(SCENE));
        assert!(matches!(event.field("latency"), Some(FieldValue::Duration(_))));
    }
}

#[test]
fn test_plugin_registers_named_callbacks() {
    let test_db = TestDatabase::in_memory();
    assert_eq!(test_db.db.plugins(), [PLUGIN_NAME.to_string()]);

    for kind in OperationKind::ALL {
        let chain = chain_name(kind);
        assert_eq!(
            test_db.db.callbacks().names(kind, Phase::Before),
            vec![format!("logger:before_{}", chain)]
        );
        assert_eq!(
            test_db.db.callbacks().names(kind, Phase::After),
            vec![format!("logger:after_{}", chain)]
        );
    }
}

#[test]
fn test_not_found_is_debug_other_errors_are_error() {
    let test_db = TestDatabase::in_memory();
    let db = &test_db.db;
    let ctx = CallContext::new();

    let err = db.row(fixtures::user_by_id(&ctx, 404)).unwrap_err();
    assert!(err.is_record_not_found());

    db.insert(fixtures::insert_user(&ctx, 1, "ann")).unwrap();
    let err = db.insert(fixtures::insert_user(&ctx, 1, "dup")).unwrap_err();
    assert!(!err.is_record_not_found());

    let events = test_db.logger.events();
    assert_eq!(events.len(), 3);

    assert_eq!(events[0].level, Level::Debug);
    assert!(!events[0].has_field("error"));

    assert_eq!(events[2].level, Level::Error);
    assert_eq!(events[2].message, "db exec failed");
    assert_eq!(events[2].field_str("error"), Some(err.to_string()));
}

#[test]
fn test_statements_without_context_are_not_logged() {
    let test_db = TestDatabase::in_memory();

    test_db
        .db
        .insert(Statement::new("users", "INSERT INTO users (id, name) VALUES (?, ?)").bind(1).bind("ann"))
        .unwrap();
    test_db.db.row(Statement::new("users", "SELECT 1 FROM users WHERE id=?").bind(2)).unwrap_err();

    assert!(test_db.logger.is_empty());
}

#[test]
fn test_nested_call_does_not_consume_outer_state() {
    let test_db = TestDatabase::in_memory();
    let ctx = CallContext::new();
    let mut outer = CallSlot::new();

    outer.begin(Some(&ctx), OperationKind::Select);
    test_db.db.row(fixtures::user_by_id(&ctx, 1)).unwrap_err();

    // An end for another kind leaves the outer state pending
    assert_eq!(outer.end(Some(&ctx), OperationKind::Row), None);
    assert_eq!(outer.pending_kind(), Some(OperationKind::Select));
    assert!(outer.end(Some(&ctx), OperationKind::Select).is_some());
    assert_eq!(test_db.logger.len(), 1);
}

#[test]
fn test_file_backed_database() {
    let test_db = TestDatabase::new();
    let ctx = CallContext::new();

    test_db.db.insert(fixtures::insert_user(&ctx, 9, "zed")).unwrap();

    assert!(test_db.path().exists());
    assert_eq!(test_db.logger.len(), 1);
}
