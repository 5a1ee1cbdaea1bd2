//! Storage error types.

use std::sync::Arc;

/// Errors produced by [`Database`](crate::Database) operations.
///
/// Cloneable so a copy can sit on the [`Statement`](crate::Statement) for
/// after-callbacks while the original goes back to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DbError {
    /// No row matched. Expected outcome, not a failure.
    #[error("record not found")]
    RecordNotFound,

    #[error("sqlite error: {0}")]
    Sqlite(#[source] Arc<rusqlite::Error>),

    #[error("callback `{name}` already registered on the `{chain}` chain")]
    CallbackRegistered { chain: &'static str, name: String },

    #[error("plugin `{0}` already registered")]
    PluginRegistered(String),
}

impl DbError {
    pub fn is_record_not_found(&self) -> bool {
        matches!(self, DbError::RecordNotFound)
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => DbError::RecordNotFound,
            other => DbError::Sqlite(Arc::new(other)),
        }
    }
}
