//! Opscope Storage Layer
//!
//! SQLite database handle whose operations run through named callback
//! chains, plus the plugin that logs every completed statement.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Application                       │
//! ├──────────────────────────────────────────────────────┤
//! │   Database::{insert, update, select, delete, row, raw}│
//! ├──────────────────────────────────────────────────────┤
//! │          Callbacks (one chain per operation)         │
//! │      before ─► SQLite ─► after   (Plugin installs)   │
//! ├──────────────────────────────────────────────────────┤
//! │                   rusqlite                           │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use opscope_core::{CallContext, TracingLogger};
//! use opscope_storage::{Database, DbLoggerPlugin, Statement};
//! use std::sync::Arc;
//!
//! let mut db = Database::open(&path)?;
//! db.use_plugin(DbLoggerPlugin::new(Arc::new(TracingLogger::new().module("db"))))?;
//!
//! let row = db.row(
//!     Statement::new("users", "SELECT * FROM users WHERE id = ?")
//!         .with_context(CallContext::new())
//!         .bind(7),
//! )?;
//! ```

mod callbacks;
mod database;
mod error;
mod logger_plugin;
mod statement;

pub use callbacks::{chain_name, Callback, Callbacks, Phase, Plugin};
pub use database::Database;
pub use error::DbError;
pub use logger_plugin::{DbLoggerPlugin, PLUGIN_NAME, SCENE};
pub use rusqlite::types::Value as SqlValue;
pub use statement::{Row, Statement};
