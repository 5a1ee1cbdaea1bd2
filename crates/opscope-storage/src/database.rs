//! Database handle for SQLite storage.
//!
//! Every operation builds on a [`Statement`] and runs the matching callback
//! chain around the SQLite call:
//!
//! ```text
//! before callbacks ──► SQLite ──► statement.error filled ──► after callbacks
//! ```
//!
//! The caller always gets the original result back; callbacks observe it but
//! cannot change it.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use opscope_core::OperationKind;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::callbacks::{Callbacks, Phase, Plugin};
use crate::error::DbError;
use crate::statement::{Row, Statement};

/// SQLite database wrapper with callback chains.
pub struct Database {
    conn: Connection,
    callbacks: Callbacks,
    plugins: Vec<String>,
}

impl Database {
    /// Open a database at the given path.
    ///
    /// If the database doesn't exist, it will be created.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        // Enable foreign keys
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Set journal mode to WAL for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;

        debug!("Opened database at {:?}", path);

        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        // Enable foreign keys
        conn.pragma_update(None, "foreign_keys", "ON")?;

        debug!("Opened in-memory database");

        Ok(Self::from_connection(conn))
    }

    /// Wrap an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            callbacks: Callbacks::new(),
            plugins: Vec::new(),
        }
    }

    /// Get a reference to the underlying connection.
    ///
    /// Calls made directly on it bypass every callback.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    /// Install a plugin. A plugin name can only be used once per handle.
    pub fn use_plugin(&mut self, plugin: impl Plugin) -> Result<(), DbError> {
        let name = plugin.name().to_string();
        if self.plugins.contains(&name) {
            return Err(DbError::PluginRegistered(name));
        }
        plugin.initialize(&mut self.callbacks)?;
        info!(plugin = %name, "Installed database plugin");
        self.plugins.push(name);
        Ok(())
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Run an INSERT. Returns the number of inserted rows.
    pub fn insert(&self, stmt: Statement) -> Result<usize, DbError> {
        self.run(OperationKind::Insert, stmt, execute)
    }

    /// Run an UPDATE. Returns the number of changed rows.
    pub fn update(&self, stmt: Statement) -> Result<usize, DbError> {
        self.run(OperationKind::Update, stmt, execute)
    }

    /// Run a DELETE. Returns the number of removed rows.
    pub fn delete(&self, stmt: Statement) -> Result<usize, DbError> {
        self.run(OperationKind::Delete, stmt, execute)
    }

    /// Run a query and fetch every row. An empty result is not an error.
    pub fn select(&self, stmt: Statement) -> Result<Vec<Row>, DbError> {
        self.run(OperationKind::Select, stmt, query_all)
    }

    /// Fetch the first row; [`DbError::RecordNotFound`] when there is none.
    pub fn row(&self, stmt: Statement) -> Result<Row, DbError> {
        self.run(OperationKind::Row, stmt, query_first)
    }

    /// Execute arbitrary SQL. Returns the number of affected rows.
    pub fn raw(&self, stmt: Statement) -> Result<usize, DbError> {
        self.run(OperationKind::Raw, stmt, execute)
    }

    fn run<T>(
        &self,
        kind: OperationKind,
        mut stmt: Statement,
        op: impl FnOnce(&Connection, &Statement) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        self.callbacks.run(kind, Phase::Before, &mut stmt);

        let result = op(&self.conn, &stmt);
        if let Err(err) = &result {
            stmt.error = Some(err.clone());
        }

        self.callbacks.run(kind, Phase::After, &mut stmt);
        result
    }
}

fn execute(conn: &Connection, stmt: &Statement) -> Result<usize, DbError> {
    Ok(conn.execute(&stmt.sql, stmt.params())?)
}

fn column_names(prepared: &rusqlite::Statement<'_>) -> Arc<[String]> {
    prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>()
        .into()
}

fn read_values(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<SqlValue>> {
    (0..width).map(|i| row.get::<_, SqlValue>(i)).collect()
}

fn query_all(conn: &Connection, stmt: &Statement) -> Result<Vec<Row>, DbError> {
    let mut prepared = conn.prepare(&stmt.sql)?;
    let columns = column_names(&prepared);
    let width = columns.len();

    let rows = prepared
        .query_map(stmt.params(), |row| read_values(row, width))?
        .map(|values| values.map(|v| Row::new(columns.clone(), v)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_first(conn: &Connection, stmt: &Statement) -> Result<Row, DbError> {
    let mut prepared = conn.prepare(&stmt.sql)?;
    let columns = column_names(&prepared);
    let width = columns.len();

    let mut rows = prepared.query(stmt.params())?;
    match rows.next()? {
        Some(row) => Ok(Row::new(columns, read_values(row, width)?)),
        None => Err(DbError::RecordNotFound),
    }
}
