//! In-memory logger for deterministic assertions in tests.
//!
//! `CaptureLogger` implements [`Logger`] by recording every call instead of
//! emitting it, so adapter tests can assert on levels, messages and fields.

use std::sync::{Arc, Mutex};

use crate::context::CallContext;
use crate::field::{Field, FieldValue};
use crate::logger::{Level, Logger};

/// A recorded log call with all its fields.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub trace_id: Option<String>,
    pub fields: Vec<Field>,
}

impl CapturedEvent {
    /// Value of the first field named `key`.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.key() == key)
            .map(|f| f.value())
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Field value rendered as text, convenient for equality checks.
    pub fn field_str(&self, key: &str) -> Option<String> {
        self.field(key).map(|v| v.to_string())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key()).collect()
    }
}

/// Clone-friendly recorder; clones share the same event list.
#[derive(Clone, Default)]
pub struct CaptureLogger {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Logger for CaptureLogger {
    fn log(&self, ctx: Option<&CallContext>, level: Level, message: &str, fields: Vec<Field>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(CapturedEvent {
                level,
                message: message.to_string(),
                trace_id: ctx.map(|c| c.trace_id.clone()),
                fields,
            });
        }
    }
}
