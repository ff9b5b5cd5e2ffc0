//! Statement execution and result normalization.

use tracing::{debug, error};

use super::engine::{run_statement, EngineError, EngineValue, GraphEngine};
use crate::errors::{GraphMcpError, Result};
use crate::types::{Row, Scalar};

/// Runs statements against the shared engine connection and returns
/// transport-safe rows.
pub struct QueryExecutor<'a> {
    engine: &'a dyn GraphEngine,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(engine: &'a dyn GraphEngine) -> Self {
        Self { engine }
    }

    /// Executes `statement`, drains its cursor and returns every row.
    ///
    /// The cursor is released on success and on iteration failure alike.
    pub fn execute(&self, statement: &str) -> Result<Vec<Row>> {
        debug!(statement, "executing statement");
        let wrap = |e: EngineError| {
            error!(statement, error = %e, "statement failed");
            GraphMcpError::Engine {
                message: e.message,
                statement: statement.to_string(),
            }
        };

        let mut cursor = run_statement(self.engine, statement).map_err(wrap)?;
        let mut rows = Vec::new();
        while let Some(row) = cursor.next_row().map_err(wrap)? {
            rows.push(Row::new(
                row.into_iter()
                    .map(|(name, value)| (name, to_scalar(value)))
                    .collect(),
            ));
        }
        debug!(rows = rows.len(), "statement complete");
        Ok(rows)
    }
}

/// Converts an engine value into its transport-safe form.
///
/// 64-bit and wider integers become decimal strings; everything that fits
/// a JSON number losslessly stays numeric.
pub fn to_scalar(value: EngineValue) -> Scalar {
    match value {
        EngineValue::Null => Scalar::Null,
        EngineValue::Bool(b) => Scalar::Bool(b),
        EngineValue::Int32(v) => Scalar::Number(v.into()),
        EngineValue::UInt32(v) => Scalar::Number(v.into()),
        EngineValue::Int64(v) => Scalar::Text(v.to_string()),
        EngineValue::UInt64(v) => Scalar::Text(v.to_string()),
        EngineValue::Int128(v) => Scalar::Text(v.to_string()),
        EngineValue::Double(v) => match serde_json::Number::from_f64(v) {
            Some(n) => Scalar::Number(n),
            None => Scalar::Text(v.to_string()),
        },
        EngineValue::String(s) => Scalar::Text(s),
        EngineValue::List(items) => Scalar::List(items.into_iter().map(to_scalar).collect()),
        EngineValue::Struct(fields) => Scalar::Map(Row::new(
            fields
                .into_iter()
                .map(|(name, v)| (name, to_scalar(v)))
                .collect(),
        )),
    }
}
