use tracing::{debug, warn};

use super::SHOW_TABLES;
use crate::db::{GraphEngine, QueryExecutor};
use crate::errors::{GraphMcpError, Result};
use crate::types::*;

/// Reads the engine catalog and normalizes it into a [`GraphSchema`].
///
/// Nothing is cached: every call reflects the live catalog.
pub struct SchemaReflector<'a> {
    executor: QueryExecutor<'a>,
}

impl<'a> SchemaReflector<'a> {
    /// Creates a new `SchemaReflector` over the given engine connection.
    pub fn new(engine: &'a dyn GraphEngine) -> Self {
        Self {
            executor: QueryExecutor::new(engine),
        }
    }

    /// Reflects every node and rel table, sorted by name.
    ///
    /// Failing to list the tables fails the call. Failing to read a single
    /// table's properties or connectivity only drops that table.
    pub fn reflect(&self) -> Result<GraphSchema> {
        let tables = self.executor.execute(SHOW_TABLES)?;
        let mut schema = GraphSchema::default();

        for row in &tables {
            let Some(name) = row.get_str("name") else {
                warn!("catalog row without a table name, skipping");
                continue;
            };
            let kind_str = row.get_str("type").unwrap_or_default();
            let Some(kind) = TableKind::from_catalog(kind_str) else {
                debug!(table = name, kind = kind_str, "ignoring catalog entry");
                continue;
            };
            let comment = row
                .get_str("comment")
                .filter(|c| !c.is_empty())
                .map(str::to_string);

            match self.reflect_table(name, kind, comment) {
                Ok(table) => match kind {
                    TableKind::Entity => schema.entity_tables.push(table),
                    TableKind::Relationship => schema.relationship_tables.push(table),
                },
                Err(e) => {
                    warn!(
                        table = name,
                        kind = kind.as_str(),
                        error = %e,
                        "skipping table whose metadata could not be read"
                    );
                }
            }
        }

        schema.sort();
        debug!(
            entity_tables = schema.entity_tables.len(),
            relationship_tables = schema.relationship_tables.len(),
            "schema reflected"
        );
        Ok(schema)
    }

    fn reflect_table(
        &self,
        name: &str,
        kind: TableKind,
        comment: Option<String>,
    ) -> Result<TableDescriptor> {
        let statement = table_info_statement(name);
        let properties = self
            .executor
            .execute(&statement)?
            .iter()
            .map(|row| property_from_row(row, kind, &statement))
            .collect::<Result<Vec<_>>>()?;

        let connectivity = match kind {
            TableKind::Entity => None,
            TableKind::Relationship => Some(self.connectivity(name)?),
        };

        Ok(TableDescriptor {
            name: name.to_string(),
            kind,
            comment,
            properties,
            connectivity,
        })
    }

    fn connectivity(&self, name: &str) -> Result<Vec<Connectivity>> {
        let statement = show_connection_statement(name);
        let mut pairs = self
            .executor
            .execute(&statement)?
            .iter()
            .map(|row| {
                let src = row.get_str("source table name");
                let dst = row.get_str("destination table name");
                match (src, dst) {
                    (Some(src), Some(dst)) => Ok(Connectivity {
                        src: src.to_string(),
                        dst: dst.to_string(),
                    }),
                    _ => Err(malformed(&statement, "connection row without source/destination")),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        pairs.sort();
        pairs.dedup();
        Ok(pairs)
    }
}

fn property_from_row(row: &Row, kind: TableKind, statement: &str) -> Result<PropertyDescriptor> {
    let name = row
        .get_str("name")
        .ok_or_else(|| malformed(statement, "property row without a name"))?;
    let data_type = row
        .get_str("type")
        .ok_or_else(|| malformed(statement, "property row without a type"))?;

    let is_primary_key = match kind {
        TableKind::Entity => Some(
            row.get("primary key")
                .and_then(Scalar::as_bool)
                .unwrap_or(false),
        ),
        TableKind::Relationship => None,
    };

    Ok(PropertyDescriptor {
        name: name.to_string(),
        data_type: data_type.to_string(),
        is_primary_key,
    })
}

fn malformed(statement: &str, message: &str) -> GraphMcpError {
    GraphMcpError::Engine {
        message: format!("unexpected catalog output: {message}"),
        statement: statement.to_string(),
    }
}

/// Quotes a table name as a Cypher string literal.
fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Statement listing the properties of one table.
pub fn table_info_statement(table: &str) -> String {
    format!("CALL table_info({}) RETURN *;", quote_literal(table))
}

/// Statement listing the endpoint pairs of one rel table.
pub fn show_connection_statement(table: &str) -> String {
    format!("CALL show_connection({}) RETURN *;", quote_literal(table))
}
