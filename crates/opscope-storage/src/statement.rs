//! Per-call statement object handed to every callback.

use std::sync::Arc;

use opscope_core::{render, CallContext, CallSlot, Value};
use rusqlite::types::Value as SqlValue;

use crate::error::DbError;

/// Bind format of timestamps, with sub-second digits.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One database call: template, bound values, target table and outcome.
///
/// `slot` is the call's own correlation storage. `error` is filled before
/// the after-callbacks run; it is a copy, the caller still receives the
/// original error.
#[derive(Debug, Default)]
pub struct Statement {
    pub context: Option<CallContext>,
    pub table: String,
    pub sql: String,
    pub vars: Vec<Value>,
    pub error: Option<DbError>,
    pub slot: CallSlot,
}

impl Statement {
    pub fn new(table: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Raw statements are not tied to a single table.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new("", sql)
    }

    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.vars.push(value.into());
        self
    }

    pub fn with_vars(mut self, vars: Vec<Value>) -> Self {
        self.vars = vars;
        self
    }

    /// Statement text with bound values substituted, for display.
    pub fn rendered(&self) -> String {
        render(&self.sql, &self.vars)
    }

    pub(crate) fn params(&self) -> rusqlite::ParamsFromIter<Vec<SqlValue>> {
        rusqlite::params_from_iter(self.vars.iter().map(to_sql_value).collect::<Vec<_>>())
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Float(v) => SqlValue::Real(*v),
        Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
        Value::Timestamp(ts) => SqlValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Null => SqlValue::Null,
    }
}

/// A fetched row with its column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            SqlValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            SqlValue::Real(v) => Some(*v),
            SqlValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_text(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            SqlValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
