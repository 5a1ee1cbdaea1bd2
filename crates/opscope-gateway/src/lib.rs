//! Opscope Gateway - server-side transport instrumentation
//!
//! This crate provides:
//! - HTTP request/response logging middleware for axum
//! - A streaming response body decorator that mirrors structured payloads
//! - A unary RPC interceptor and its tower layer

pub mod http;
pub mod rpc;

pub use http::{
    http_logging_middleware, CaptureBody, Completion, HandlerError, HttpLoggerConfig,
    HttpLogging, RecordedError,
};
pub use rpc::{
    RpcLoggerConfig, RpcLogging, RpcLoggingLayer, RpcRequest, UnaryInterceptor, UnaryServerInfo,
};
