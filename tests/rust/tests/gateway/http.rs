//! HTTP middleware over handlers that hit the database

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use opscope_core::{CallContext, FieldValue, Level};
use opscope_gateway::{HandlerError, HttpLoggerConfig, HttpLogging};
use opscope_storage::{Database, Statement};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tests::db::TestDatabase;
use tests::{fixtures, http};
use tokio::sync::Mutex;

type SharedDb = Arc<Mutex<Database>>;

#[derive(Deserialize)]
struct NewUser {
    id: i64,
    name: String,
}

async fn get_user(
    State(db): State<SharedDb>,
    Extension(ctx): Extension<CallContext>,
    Path(id): Path<i64>,
) -> Result<Json<JsonValue>, HandlerError> {
    let db = db.lock().await;
    let row = db.row(fixtures::user_by_id(&ctx, id)).map_err(|e| {
        if e.is_record_not_found() {
            HandlerError::NotFound(format!("user {}", id))
        } else {
            HandlerError::Internal(e.to_string())
        }
    })?;
    Ok(Json(json!({ "id": row.get_i64("id"), "name": row.get_text("name") })))
}

async fn create_user(
    State(db): State<SharedDb>,
    Extension(ctx): Extension<CallContext>,
    Json(user): Json<NewUser>,
) -> Result<Json<JsonValue>, HandlerError> {
    let db = db.lock().await;
    db.insert(
        Statement::new("users", "INSERT INTO users (id, name) VALUES (?, ?)")
            .with_context(ctx)
            .bind(user.id)
            .bind(user.name),
    )
    .map_err(|e| HandlerError::BadRequest(e.to_string()))?;
    Ok(Json(json!({ "created": user.id })))
}

fn app(test_db: TestDatabase, config: HttpLoggerConfig) -> (Router, tests::CaptureLogger) {
    let logger = test_db.logger.clone();
    let db: SharedDb = Arc::new(Mutex::new(test_db.db));
    let router = Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/health", get(|| async { "ok" }))
        .with_state(db);
    let app = HttpLogging::new(Arc::new(logger.clone()), config).apply(router);
    (app, logger)
}

#[tokio::test]
async fn test_http_and_db_events_share_trace_id() {
    let config = HttpLoggerConfig::new()
        .with_request_body(true)
        .with_response_body(true);
    let (app, logger) = app(TestDatabase::in_memory(), config);

    let (status, body) = http::send(app, http::post_json("/users", r#"{"id":5,"name":"eve"}"#)).await;
    assert_eq!(status.as_u16(), 200);
    assert_eq!(serde_json::from_slice::<JsonValue>(&body).unwrap(), json!({ "created": 5 }));

    let events = logger.events();
    assert_eq!(events.len(), 2);

    let (db_event, http_event) = (&events[0], &events[1]);
    assert_eq!(db_event.message, "db exec succeeded");
    assert_eq!(http_event.message, "http request and response");
    assert_eq!(http_event.level, Level::Info);
    assert!(db_event.trace_id.is_some());
    assert_eq!(db_event.trace_id, http_event.trace_id);

    assert_eq!(
        http_event.field("request_body").unwrap().to_json(),
        json!({ "id": 5, "name": "eve" })
    );
    assert_eq!(http_event.field("response_body").unwrap().to_json(), json!({ "created": 5 }));
}

#[tokio::test]
async fn test_missing_record_is_http_error_but_db_debug() {
    let (app, logger) = app(TestDatabase::in_memory(), HttpLoggerConfig::new());

    let (status, _) = http::send(app, http::get("/users/99")).await;
    assert_eq!(status.as_u16(), 404);

    let events = logger.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].level, Level::Debug);
    assert!(!events[0].has_field("error"));
    assert_eq!(events[1].level, Level::Error);
    assert_eq!(events[1].field_str("error").as_deref(), Some("not found: user 99"));
    assert_eq!(events[1].field("status_code"), Some(&FieldValue::U64(404)));
}

#[tokio::test]
async fn test_skip_predicate_suppresses_event() {
    let config = HttpLoggerConfig::new().skip_when(|request| request.uri().path() == "/health");
    let (app, logger) = app(TestDatabase::in_memory(), config);

    let (status, body) = http::send(app, http::get("/health")).await;
    assert_eq!(status.as_u16(), 200);
    assert_eq!(&body[..], b"ok");
    assert!(logger.is_empty());
}

#[tokio::test]
async fn test_existing_context_is_reused() {
    let (app, logger) = app(TestDatabase::in_memory(), HttpLoggerConfig::new());
    let ctx = CallContext::new().with_trace_id("abc123");

    let mut request = http::get("/users/1");
    request.extensions_mut().insert(ctx);
    http::send(app, request).await;

    for event in logger.events() {
        assert_eq!(event.trace_id.as_deref(), Some("abc123"));
    }
}
