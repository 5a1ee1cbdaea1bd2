//! Leveled logger capability and its `tracing`-backed engine.
//!
//! Adapters only see the [`Logger`] trait. [`TracingLogger`] turns each call
//! into one `tracing` event carrying the trace id and the ordered field list.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::field::{Field, Fields};

/// Severity of an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn as_tracing(&self) -> tracing::Level {
        match self {
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warning => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

/// The leveled logging capability consumed by every adapter.
pub trait Logger: Send + Sync {
    fn log(&self, ctx: Option<&CallContext>, level: Level, message: &str, fields: Vec<Field>);

    fn debug(&self, ctx: Option<&CallContext>, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Debug, message, fields)
    }

    fn info(&self, ctx: Option<&CallContext>, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Info, message, fields)
    }

    fn warning(&self, ctx: Option<&CallContext>, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Warning, message, fields)
    }

    fn error(&self, ctx: Option<&CallContext>, message: &str, fields: Vec<Field>) {
        self.log(ctx, Level::Error, message, fields)
    }
}

/// Shared handle adapters hold on to.
pub type SharedLogger = Arc<dyn Logger>;

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, ctx: Option<&CallContext>, level: Level, message: &str, fields: Vec<Field>) {
        (**self).log(ctx, level, message, fields)
    }
}

macro_rules! emit {
    ($level:expr, $module:expr, $trace_id:expr, $fields:expr, $message:expr) => {
        tracing::event!(
            $level,
            module = $module,
            trace_id = $trace_id,
            fields = %$fields,
            "{}",
            $message
        )
    };
}

/// Logger engine emitting through the global `tracing` subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    module: Option<Arc<str>>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A logger whose events all carry `module = name`.
    pub fn module(&self, name: &str) -> Self {
        Self {
            module: Some(Arc::from(name)),
        }
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module.as_deref()
    }
}

impl Logger for TracingLogger {
    fn log(&self, ctx: Option<&CallContext>, level: Level, message: &str, fields: Vec<Field>) {
        let module = self.module.as_deref();
        let trace_id = ctx.map(|c| c.trace_id.as_str());
        let fields = Fields(&fields);

        match level {
            Level::Debug => emit!(tracing::Level::DEBUG, module, trace_id, fields, message),
            Level::Info => emit!(tracing::Level::INFO, module, trace_id, fields, message),
            Level::Warning => emit!(tracing::Level::WARN, module, trace_id, fields, message),
            Level::Error => emit!(tracing::Level::ERROR, module, trace_id, fields, message),
        }
    }
}
