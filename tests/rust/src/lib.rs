//! Shared test utilities and fixtures for Opscope integration tests.

pub use opscope_core::testing::{CaptureLogger, CapturedEvent};

/// Database fixtures
pub mod db {
    use opscope_storage::{Database, DbLoggerPlugin};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::CaptureLogger;

    /// Database file name
    const DB_FILE: &str = "opscope.db";

    pub const SCHEMA: &str = "
        CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT
        );
    ";

    /// A temporary database with the logging plugin installed
    pub struct TestDatabase {
        pub db: Database,
        pub logger: CaptureLogger,
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestDatabase {
        /// Create a new test database in a temporary directory
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db_path = temp_dir.path().join(DB_FILE);
            let db = Database::open(&db_path).expect("Failed to open test database");
            Self::with_plugin(db, temp_dir, db_path)
        }

        /// Create an in-memory database for fast tests
        pub fn in_memory() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db = Database::open_in_memory().expect("Failed to open in-memory database");
            Self::with_plugin(db, temp_dir, PathBuf::new())
        }

        fn with_plugin(mut db: Database, temp_dir: TempDir, db_path: PathBuf) -> Self {
            db.connection()
                .execute_batch(SCHEMA)
                .expect("Failed to create schema");

            let logger = CaptureLogger::new();
            db.use_plugin(DbLoggerPlugin::new(Arc::new(logger.clone())))
                .expect("Failed to install logger plugin");

            Self {
                db,
                logger,
                _temp_dir: temp_dir,
                db_path,
            }
        }

        /// Get the database file path
        pub fn path(&self) -> &Path {
            &self.db_path
        }
    }

    impl Default for TestDatabase {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Statement builders
pub mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use opscope_core::CallContext;
    use opscope_storage::Statement;

    /// `2024-01-02T03:04:05.678`
    pub fn fixed_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_milli_opt(3, 4, 5, 678))
            .expect("valid timestamp")
    }

    pub fn insert_user(ctx: &CallContext, id: i64, name: &str) -> Statement {
        Statement::new("users", "INSERT INTO users (id, name, created_at) VALUES (?, ?, ?)")
            .with_context(ctx.clone())
            .bind(id)
            .bind(name)
            .bind(fixed_timestamp())
    }

    pub fn user_by_id(ctx: &CallContext, id: i64) -> Statement {
        Statement::new("users", "SELECT id, name FROM users WHERE id=?")
            .with_context(ctx.clone())
            .bind(id)
    }
}

/// HTTP helpers
pub mod http {
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use axum::Router;
    use bytes::Bytes;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Send `request` through `app` and drain the response body.
    pub async fn send(app: Router, request: Request) -> (StatusCode, Bytes) {
        let response = app.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();
        (status, body)
    }

    pub fn get(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    pub fn post_json(uri: &str, body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }
}
