//! Errors recorded by handlers and surfaced to the logging middleware.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A handler failure carried on the response as an extension.
///
/// The middleware reads it after the handler returns and attaches it as the
/// `error` field, raising the event to Error.
#[derive(Clone)]
pub struct RecordedError(Arc<dyn StdError + Send + Sync>);

impl RecordedError {
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(Arc::from(err.into()))
    }

    /// Record `err` on `response`. A later record replaces an earlier one.
    pub fn attach(response: &mut Response, err: impl Into<Box<dyn StdError + Send + Sync>>) {
        response.extensions_mut().insert(Self::new(err));
    }

    pub fn from_response(response: &Response) -> Option<&Self> {
        response.extensions().get::<Self>()
    }
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordedError").field(&self.0.to_string()).finish()
    }
}

impl StdError for RecordedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Error type for handlers behind the logging middleware.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound(_) => StatusCode::NOT_FOUND,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({ "error": self.to_string() });
        let mut response = (status, Json(body)).into_response();
        RecordedError::attach(&mut response, self);
        response
    }
}

/// The request body could not be collected.
#[derive(Debug, Error)]
#[error("failed to read request body: {0}")]
pub struct BodyReadError(#[from] pub axum::Error);
