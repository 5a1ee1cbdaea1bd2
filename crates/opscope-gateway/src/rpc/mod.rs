//! Unary RPC server instrumentation.
//!
//! [`UnaryInterceptor`] wraps one handler invocation; [`RpcLoggingLayer`]
//! applies it to any tower service taking [`RpcRequest`]s.

mod layer;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use opscope_core::{CallContext, Field, FieldValue, SharedLogger};
use serde::Serialize;

pub use layer::{RpcLogging, RpcLoggingLayer, RpcRequest};

/// Scene tag of RPC server events.
pub const SCENE: &str = "rpc_server_request";

const EXCHANGE_MESSAGE: &str = "rpc request and response";

/// Static description of the invoked method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryServerInfo {
    /// Fully qualified method name, e.g. `/user.v1.UserService/GetUser`.
    pub full_method: String,
}

impl UnaryServerInfo {
    pub fn new(full_method: impl Into<String>) -> Self {
        Self {
            full_method: full_method.into(),
        }
    }
}

/// Predicate deciding that a call is not instrumented.
pub type RpcSkipFn = Arc<dyn Fn(&CallContext, &str) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct RpcLoggerConfig {
    pub enable_request_body: bool,
    pub enable_response_body: bool,
    pub skip: RpcSkipFn,
}

impl Default for RpcLoggerConfig {
    fn default() -> Self {
        Self {
            enable_request_body: false,
            enable_response_body: false,
            skip: Arc::new(|_: &CallContext, _: &str| false),
        }
    }
}

impl RpcLoggerConfig {
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

    pub fn skip_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CallContext, &str) -> bool + Send + Sync + 'static,
    {
        self.skip = Arc::new(predicate);
        self
    }
}

impl fmt::Debug for RpcLoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcLoggerConfig")
            .field("enable_request_body", &self.enable_request_body)
            .field("enable_response_body", &self.enable_response_body)
            .finish_non_exhaustive()
    }
}

/// Times one unary call and emits a single event describing it.
#[derive(Clone)]
pub struct UnaryInterceptor {
    logger: SharedLogger,
    config: Arc<RpcLoggerConfig>,
}

impl UnaryInterceptor {
    pub fn new(logger: SharedLogger, config: RpcLoggerConfig) -> Self {
        Self {
            logger,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RpcLoggerConfig {
        &self.config
    }

    /// Run `handler` and log the exchange. The handler's result is returned
    /// unchanged.
    pub async fn intercept<Req, Resp, E, F, Fut>(
        &self,
        ctx: CallContext,
        request: Req,
        info: &UnaryServerInfo,
        handler: F,
    ) -> Result<Resp, E>
    where
        Req: Serialize,
        Resp: Serialize,
        E: fmt::Display,
        F: FnOnce(CallContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
    {
        if (self.config.skip)(&ctx, &info.full_method) {
            return handler(ctx, request).await;
        }

        let started = Instant::now();
        let mut fields = vec![
            Field::any("scene", SCENE),
            Field::any("method", info.full_method.clone()),
            Field::any("trace_id", ctx.trace_id.clone()),
        ];
        if self.config.enable_request_body {
            fields.push(payload_field("request_body", &request));
        }

        let result = handler(ctx.clone(), request).await;

        match &result {
            Ok(_) => fields.push(Field::any("status", "ok")),
            Err(err) => {
                fields.push(Field::any("error", FieldValue::Error(err.to_string())));
                fields.push(Field::any("status", "error"));
            }
        }
        fields.push(Field::any(
            "latency_in_milliseconds",
            started.elapsed().as_millis() as u64,
        ));
        if let (true, Ok(response)) = (self.config.enable_response_body, &result) {
            fields.push(payload_field("response_body", response));
        }

        if result.is_err() {
            self.logger.error(Some(&ctx), EXCHANGE_MESSAGE, fields);
        } else {
            self.logger.info(Some(&ctx), EXCHANGE_MESSAGE, fields);
        }
        result
    }
}

impl fmt::Debug for UnaryInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryInterceptor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn payload_field<T: Serialize>(key: &'static str, payload: &T) -> Field {
    match serde_json::to_value(payload) {
        Ok(json) => Field::any(key, json),
        Err(err) => Field::str(key, format_args!("<unserializable: {}>", err)),
    }
}
