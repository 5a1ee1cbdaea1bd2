//! Call-state correlation between before/after hook pairs.
//!
//! A [`CallSlot`] lives on the per-call object a framework hands to both of
//! its hooks. The before hook stores a [`CallState`]; the after hook takes it
//! back out exactly once, provided the operation kinds agree.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::context::CallContext;

/// Category of a database action, used to pair begin/end hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Update,
    Select,
    Delete,
    Row,
    Raw,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Insert,
        OperationKind::Update,
        OperationKind::Select,
        OperationKind::Delete,
        OperationKind::Row,
        OperationKind::Raw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Select => "select",
            OperationKind::Delete => "delete",
            OperationKind::Row => "row",
            OperationKind::Raw => "raw",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State recorded when a call starts.
#[derive(Debug, Clone, Copy)]
pub struct CallState {
    pub started_at: Instant,
    pub kind: OperationKind,
}

/// Typed per-call storage for at most one [`CallState`].
#[derive(Debug, Default)]
pub struct CallSlot {
    state: Option<CallState>,
}

impl CallSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a call. Calls without a context are not
    /// instrumentable and leave the slot untouched.
    pub fn begin(&mut self, context: Option<&CallContext>, kind: OperationKind) {
        if context.is_none() {
            return;
        }
        self.state = Some(CallState {
            started_at: Instant::now(),
            kind,
        });
    }

    /// Consume the stored state and return the elapsed time.
    ///
    /// Returns `None` without touching the slot when the context is missing
    /// or the stored kind belongs to a different operation (an outer call
    /// still owns it). A cancelled context is still accepted.
    pub fn end(&mut self, context: Option<&CallContext>, kind: OperationKind) -> Option<Duration> {
        context?;
        match self.state {
            Some(state) if state.kind == kind => {
                self.state = None;
                Some(state.started_at.elapsed())
            }
            _ => None,
        }
    }

    /// Whether a begin is waiting for its end.
    pub fn is_pending(&self) -> bool {
        self.state.is_some()
    }

    pub fn pending_kind(&self) -> Option<OperationKind> {
        self.state.map(|s| s.kind)
    }
}
