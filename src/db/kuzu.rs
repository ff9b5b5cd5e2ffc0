//! Kùzu-backed [`GraphEngine`].

use std::path::Path;

use kuzu::{Connection, Database, QueryResult, SystemConfig, Value};
use tracing::info;

use super::engine::{Cursor, EngineError, EngineRow, EngineValue, GraphEngine, ProgressCallback};

/// A single connection to an on-disk Kùzu database.
pub struct KuzuEngine {
    conn: Connection<'static>,
}

impl KuzuEngine {
    /// Opens (creating it if missing, unless `read_only`) the database at
    /// `db_path` and connects to it.
    pub fn open(db_path: &Path, read_only: bool) -> Result<Self, EngineError> {
        let config = SystemConfig::default().read_only(read_only);
        let db = Database::new(db_path, config).map_err(|e| {
            EngineError::new(format!(
                "failed to open database '{}': {e}",
                db_path.display()
            ))
        })?;

        // The database lives until process exit, like the connection on it.
        let db: &'static Database = Box::leak(Box::new(db));
        let conn = Connection::new(db)
            .map_err(|e| EngineError::new(format!("failed to connect to database: {e}")))?;

        info!(path = %db_path.display(), read_only, "opened kuzu database");
        Ok(Self { conn })
    }
}

impl GraphEngine for KuzuEngine {
    fn execute<'a>(
        &'a self,
        statement: &str,
        _progress: ProgressCallback<'_>,
    ) -> Result<Box<dyn Cursor + 'a>, EngineError> {
        let result = self
            .conn
            .query(statement)
            .map_err(|e| EngineError::new(e.to_string()))?;
        let columns = result.get_column_names();
        Ok(Box::new(KuzuCursor {
            columns,
            result: Some(result),
        }))
    }
}

struct KuzuCursor<'a> {
    columns: Vec<String>,
    result: Option<QueryResult<'a>>,
}

impl Cursor for KuzuCursor<'_> {
    fn next_row(&mut self) -> Result<Option<EngineRow>, EngineError> {
        let Some(result) = self.result.as_mut() else {
            return Err(EngineError::new("cursor already released"));
        };
        Ok(result.next().map(|values| {
            self.columns
                .iter()
                .cloned()
                .zip(values.into_iter().map(convert_value))
                .collect()
        }))
    }

    fn release(&mut self) {
        self.result.take();
    }
}

fn convert_value(value: Value) -> EngineValue {
    match value {
        Value::Null(_) => EngineValue::Null,
        Value::Bool(b) => EngineValue::Bool(b),
        Value::Int8(v) => EngineValue::Int32(v.into()),
        Value::Int16(v) => EngineValue::Int32(v.into()),
        Value::Int32(v) => EngineValue::Int32(v),
        Value::UInt8(v) => EngineValue::UInt32(v.into()),
        Value::UInt16(v) => EngineValue::UInt32(v.into()),
        Value::UInt32(v) => EngineValue::UInt32(v),
        Value::Int64(v) => EngineValue::Int64(v),
        Value::UInt64(v) => EngineValue::UInt64(v),
        Value::Int128(v) => EngineValue::Int128(v),
        Value::Float(v) => EngineValue::Double(v.into()),
        Value::Double(v) => EngineValue::Double(v),
        Value::String(s) => EngineValue::String(s),
        Value::List(_, items) | Value::Array(_, items) => {
            EngineValue::List(items.into_iter().map(convert_value).collect())
        }
        Value::Struct(fields) => EngineValue::Struct(
            fields
                .into_iter()
                .map(|(name, v)| (name, convert_value(v)))
                .collect(),
        ),
        Value::Node(node) => labelled(node.get_label_name(), node.get_properties()),
        Value::Rel(rel) => labelled(rel.get_label_name(), rel.get_properties()),
        // Dates, timestamps, intervals, UUIDs, blobs, maps, unions, ids.
        other => EngineValue::String(other.to_string()),
    }
}

fn labelled(label: &str, properties: &[(String, Value)]) -> EngineValue {
    let mut fields = Vec::with_capacity(properties.len() + 1);
    fields.push(("_label".to_string(), EngineValue::String(label.to_string())));
    fields.extend(
        properties
            .iter()
            .map(|(name, v)| (name.clone(), convert_value(v.clone()))),
    );
    EngineValue::Struct(fields)
}
