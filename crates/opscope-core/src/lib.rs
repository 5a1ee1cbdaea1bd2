//! # Opscope Core
//!
//! Transport-agnostic building blocks for call instrumentation.
//!
//! ## Modules
//!
//! - `context` - Per-call trace id and cancellation carrier
//! - `correlator` - Typed begin/end state slot per call
//! - `field` - Structured fields and raw (pre-serialized) payloads
//! - `statement` - Bound values and `?`-template rendering
//! - `capture` - Response capture shim
//! - `logger` - Leveled logger capability and tracing engine
//! - `config` - Engine configuration and subscriber initialization
//! - `testing` - In-memory logger for assertions

pub mod capture;
pub mod config;
pub mod context;
pub mod correlator;
pub mod field;
pub mod logger;
pub mod statement;
pub mod testing;

pub use capture::{CaptureWriter, ResponseCapture, STRUCTURED_CONTENT_TYPE};
pub use config::{init, ConfigError, LogFormat, LogOutput, LoggingConfig, LoggingGuard};
pub use context::{generate_trace_id, CallContext};
pub use correlator::{CallSlot, CallState, OperationKind};
pub use field::{fields_to_json, Field, FieldValue, Fields, RawPayload};
pub use logger::{Level, Logger, SharedLogger, TracingLogger};
pub use statement::{render, Value};
