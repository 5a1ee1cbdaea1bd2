//! Named callback chains and plugins.
//!
//! Each operation kind owns one chain with ordered before/after lists.
//! Callbacks run synchronously on the calling thread, in registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use opscope_core::OperationKind;

use crate::error::DbError;
use crate::statement::Statement;

/// A hook receiving the mutable per-call statement.
pub type Callback = Arc<dyn Fn(&mut Statement) + Send + Sync>;

/// Which side of the database call a callback runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

/// Name of the chain serving `kind`.
pub fn chain_name(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Insert => "create",
        OperationKind::Update => "update",
        OperationKind::Select => "query",
        OperationKind::Delete => "delete",
        OperationKind::Row => "row",
        OperationKind::Raw => "raw",
    }
}

#[derive(Default)]
struct CallbackChain {
    before: Vec<(String, Callback)>,
    after: Vec<(String, Callback)>,
}

impl CallbackChain {
    fn phase(&self, phase: Phase) -> &[(String, Callback)] {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut Vec<(String, Callback)> {
        match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        }
    }
}

/// Registry of all callback chains of one database handle.
#[derive(Default)]
pub struct Callbacks {
    chains: HashMap<OperationKind, CallbackChain>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`. Names are unique per chain.
    pub fn register<F>(
        &mut self,
        kind: OperationKind,
        phase: Phase,
        name: impl Into<String>,
        callback: F,
    ) -> Result<(), DbError>
    where
        F: Fn(&mut Statement) + Send + Sync + 'static,
    {
        let name = name.into();
        let chain = self.chains.entry(kind).or_default();
        let taken = chain.before.iter().chain(chain.after.iter()).any(|(n, _)| *n == name);
        if taken {
            return Err(DbError::CallbackRegistered {
                chain: chain_name(kind),
                name,
            });
        }
        tracing::debug!(chain = chain_name(kind), callback = %name, ?phase, "Registered callback");
        chain.phase_mut(phase).push((name, Arc::new(callback)));
        Ok(())
    }

    pub fn before<F>(&mut self, kind: OperationKind, name: impl Into<String>, callback: F) -> Result<(), DbError>
    where
        F: Fn(&mut Statement) + Send + Sync + 'static,
    {
        self.register(kind, Phase::Before, name, callback)
    }

    pub fn after<F>(&mut self, kind: OperationKind, name: impl Into<String>, callback: F) -> Result<(), DbError>
    where
        F: Fn(&mut Statement) + Send + Sync + 'static,
    {
        self.register(kind, Phase::After, name, callback)
    }

    /// Registered callback names, in run order.
    pub fn names(&self, kind: OperationKind, phase: Phase) -> Vec<&str> {
        self.chains
            .get(&kind)
            .map(|c| c.phase(phase).iter().map(|(n, _)| n.as_str()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn run(&self, kind: OperationKind, phase: Phase, stmt: &mut Statement) {
        if let Some(chain) = self.chains.get(&kind) {
            for (_, callback) in chain.phase(phase) {
                callback(stmt);
            }
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in OperationKind::ALL {
            map.entry(
                &chain_name(kind),
                &(self.names(kind, Phase::Before), self.names(kind, Phase::After)),
            );
        }
        map.finish()
    }
}

/// A bundle of callbacks installed together.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn initialize(&self, callbacks: &mut Callbacks) -> Result<(), DbError>;
}
