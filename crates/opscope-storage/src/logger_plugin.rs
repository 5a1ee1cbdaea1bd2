//! Statement logging plugin.
//!
//! Registers a before/after pair on every chain. The before hook starts the
//! call clock on the statement's slot; the after hook stops it and emits one
//! event carrying the rendered statement.

use opscope_core::{Field, Logger, OperationKind, SharedLogger};

use crate::callbacks::{chain_name, Callbacks, Plugin};
use crate::error::DbError;
use crate::statement::Statement;

pub const PLUGIN_NAME: &str = "logger";

/// Scene tag of database events.
pub const SCENE: &str = "mysql_client";

/// Plugin emitting one event per completed database call.
pub struct DbLoggerPlugin {
    logger: SharedLogger,
}

impl DbLoggerPlugin {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }

    /// Whether `err` deserves an Error-level event.
    pub fn is_error_ignorable(err: &DbError) -> bool {
        err.is_record_not_found()
    }
}

impl Plugin for DbLoggerPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn initialize(&self, callbacks: &mut Callbacks) -> Result<(), DbError> {
        for kind in OperationKind::ALL {
            let chain = chain_name(kind);

            callbacks.before(kind, format!("logger:before_{}", chain), move |stmt: &mut Statement| {
                before(kind, stmt)
            })?;

            let logger = self.logger.clone();
            callbacks.after(kind, format!("logger:after_{}", chain), move |stmt: &mut Statement| {
                after(logger.as_ref(), kind, stmt)
            })?;
        }
        Ok(())
    }
}

fn before(kind: OperationKind, stmt: &mut Statement) {
    stmt.slot.begin(stmt.context.as_ref(), kind);
}

fn after(logger: &dyn Logger, kind: OperationKind, stmt: &mut Statement) {
    let Some(latency) = stmt.slot.end(stmt.context.as_ref(), kind) else {
        return;
    };

    let failure = stmt
        .error
        .as_ref()
        .filter(|err| !DbLoggerPlugin::is_error_ignorable(err));

    let mut fields = Vec::with_capacity(6);
    fields.push(Field::any("scene", SCENE));
    if let Some(err) = failure {
        fields.push(Field::err(err));
    }
    fields.push(Field::any("table", stmt.table.clone()));
    fields.push(Field::any("operation_kind", kind.as_str()));
    fields.push(Field::any("latency", latency));
    fields.push(Field::any("rendered_statement", stmt.rendered()));

    let ctx = stmt.context.as_ref();
    if failure.is_some() {
        logger.error(ctx, "db exec failed", fields);
    } else {
        logger.debug(ctx, "db exec succeeded", fields);
    }
}
