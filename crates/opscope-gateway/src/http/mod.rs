//! HTTP server instrumentation for axum routers.
//!
//! ```rust,ignore
//! let logging = HttpLogging::new(logger, HttpLoggerConfig::new().with_response_body(true));
//! let app = logging.apply(Router::new().route("/users/{id}", get(get_user)));
//! ```

mod body;
mod error;
mod middleware;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use axum::{extract::Request, Router};
use opscope_core::SharedLogger;

pub use body::{CaptureBody, Completion};
pub use error::{BodyReadError, HandlerError, RecordedError};
pub use middleware::{client_ip, http_logging_middleware, SCENE};

/// Predicate deciding that a request is not instrumented.
pub type SkipFn = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Options of the HTTP logging middleware.
#[derive(Clone)]
pub struct HttpLoggerConfig {
    /// Buffer and log the request body.
    pub enable_request_body: bool,
    /// Log the response body when it is a structured payload.
    pub enable_response_body: bool,
    pub skip: SkipFn,
}

impl Default for HttpLoggerConfig {
    fn default() -> Self {
        Self {
            enable_request_body: false,
            enable_response_body: false,
            skip: Arc::new(|_: &Request| false),
        }
    }
}

impl HttpLoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_body(mut self, enabled: bool) -> Self {
        self.enable_request_body = enabled;
        self
    }

    pub fn with_response_body(mut self, enabled: bool) -> Self {
        self.enable_response_body = enabled;
        self
    }

    /// Replace the skip predicate.
    pub fn skip_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.skip = Arc::new(predicate);
        self
    }

    /// Skip requests whose path equals one of `paths`. Replaces the skip
    /// predicate.
    pub fn skip_paths<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: HashSet<String> = paths.into_iter().map(Into::into).collect();
        self.skip_when(move |request| paths.contains(request.uri().path()))
    }

    pub fn should_skip(&self, request: &Request) -> bool {
        (self.skip)(request)
    }
}

impl fmt::Debug for HttpLoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLoggerConfig")
            .field("enable_request_body", &self.enable_request_body)
            .field("enable_response_body", &self.enable_response_body)
            .finish_non_exhaustive()
    }
}

/// Middleware state: the logger plus its options.
#[derive(Clone)]
pub struct HttpLogging {
    logger: SharedLogger,
    config: Arc<HttpLoggerConfig>,
}

impl HttpLogging {
    pub fn new(logger: SharedLogger, config: HttpLoggerConfig) -> Self {
        Self {
            logger,
            config: Arc::new(config),
        }
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    pub fn config(&self) -> &HttpLoggerConfig {
        &self.config
    }

    /// Wrap every route of `router` with the logging middleware.
    ///
    /// Uses `Router::layer`, which also wraps the fallback, so unmatched
    /// paths are logged with their 404. Only routes and a fallback added
    /// before this call are covered. Install the middleware through
    /// `Router::route_layer` instead to leave unmatched paths unlogged.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        tracing::debug!(config = ?self.config, "Installing HTTP logging middleware");
        router.layer(axum::middleware::from_fn_with_state(self, http_logging_middleware))
    }
}

impl fmt::Debug for HttpLogging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLogging")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
