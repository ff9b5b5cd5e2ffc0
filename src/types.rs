use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Kinds of tables in the graph catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    /// A node table: one vertex type.
    Entity,
    /// A rel table: one edge type with one or more endpoint pairs.
    Relationship,
}

impl TableKind {
    /// Returns the string representation of this table kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Entity => "ENTITY",
            TableKind::Relationship => "RELATIONSHIP",
        }
    }

    /// Maps the `type` column of the engine's table listing to a kind.
    ///
    /// Returns `None` for catalog objects that are neither node nor rel
    /// tables (rel groups, RDF graphs and the like).
    pub fn from_catalog(s: &str) -> Option<TableKind> {
        match s.to_ascii_uppercase().as_str() {
            "NODE" => Some(TableKind::Entity),
            "REL" => Some(TableKind::Relationship),
            _ => None,
        }
    }
}

/// One property (column) of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    /// Declared type as reported by the engine, e.g. `INT64` or `STRING[]`.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Only present on entity-table properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_primary_key: Option<bool>,
}

/// An allowed (source, destination) pair of a relationship table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connectivity {
    pub src: String,
    pub dst: String,
}

/// A table as reflected from the engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub kind: TableKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub properties: Vec<PropertyDescriptor>,
    /// Only present on relationship tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<Vec<Connectivity>>,
}

/// The reflected schema: entity tables and relationship tables, each sorted
/// by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSchema {
    pub entity_tables: Vec<TableDescriptor>,
    pub relationship_tables: Vec<TableDescriptor>,
}

impl GraphSchema {
    /// Sorts both table lists by name, ascending.
    pub fn sort(&mut self) {
        self.entity_tables.sort_by(|a, b| a.name.cmp(&b.name));
        self.relationship_tables.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Total number of reflected tables.
    pub fn table_count(&self) -> usize {
        self.entity_tables.len() + self.relationship_tables.len()
    }
}

/// Liveness of the engine connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Result of a health check. Built fresh for every check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: HealthState,
    /// Database directory as configured.
    pub database_path: String,
    pub read_only: bool,
    /// Catalog entries seen by the probe; 0 when unhealthy.
    pub tables_count: usize,
    /// When the probe ran, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
    /// Server version.
    pub version: String,
    /// Engine message; present only when unhealthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A transport-safe value.
///
/// JSON numbers cannot carry the full 64-bit integer range, so wide integers
/// never appear here as `Number`; they are rendered as decimal `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Integers up to 32 bits and finite doubles.
    Number(serde_json::Number),
    /// Strings, 64-bit and wider integers, and values without a JSON form.
    Text(String),
    List(Vec<Scalar>),
    /// Structs, nodes and rels, fields in engine order.
    Map(Row),
}

impl Scalar {
    /// Returns the text, if this holds text. Stringified integers count.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean, if this holds one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One result row: column name to value, in the column order of the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Scalar)>,
}

impl Row {
    /// Builds a row from `(column, value)` pairs in result order.
    pub fn new(columns: Vec<(String, Scalar)>) -> Self {
        Self { columns }
    }

    /// Returns the value of the named column, if present.
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns the named column as a string slice, if it holds text.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Scalar::as_str)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_kind_from_catalog() {
        assert_eq!(TableKind::from_catalog("NODE"), Some(TableKind::Entity));
        assert_eq!(TableKind::from_catalog("rel"), Some(TableKind::Relationship));
        assert_eq!(TableKind::from_catalog("REL_GROUP"), None);
        assert_eq!(TableKind::from_catalog(""), None);
    }

    #[test]
    fn test_table_descriptor_wire_shape() {
        let table = TableDescriptor {
            name: "KNOWS".to_string(),
            kind: TableKind::Relationship,
            comment: None,
            properties: vec![],
            connectivity: Some(vec![Connectivity {
                src: "Person".to_string(),
                dst: "Person".to_string(),
            }]),
        };
        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!({
                "name": "KNOWS",
                "kind": "RELATIONSHIP",
                "properties": [],
                "connectivity": [{"src": "Person", "dst": "Person"}]
            })
        );
    }

    #[test]
    fn test_nested_map_keeps_field_order() {
        let value = Scalar::List(vec![Scalar::Map(Row::new(vec![
            ("since".to_string(), Scalar::Text("2020".to_string())),
            ("_label".to_string(), Scalar::Text("KNOWS".to_string())),
        ]))]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"[{"since":"2020","_label":"KNOWS"}]"#
        );
    }

    #[test]
    fn test_relationship_property_omits_primary_key() {
        let prop = PropertyDescriptor {
            name: "since".to_string(),
            data_type: "INT64".to_string(),
            is_primary_key: None,
        };
        let value = serde_json::to_value(&prop).unwrap();
        assert_eq!(value, json!({"name": "since", "type": "INT64"}));
    }

    #[test]
    fn test_schema_sort_is_by_name() {
        let table = |name: &str| TableDescriptor {
            name: name.to_string(),
            kind: TableKind::Entity,
            comment: None,
            properties: vec![],
            connectivity: None,
        };
        let mut schema = GraphSchema {
            entity_tables: vec![table("Movie"), table("City"), table("Person")],
            relationship_tables: vec![],
        };
        schema.sort();
        let names: Vec<&str> = schema.entity_tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["City", "Movie", "Person"]);
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = Row::new(vec![
            ("z".to_string(), Scalar::Text("last".to_string())),
            ("a".to_string(), Scalar::Null),
        ]);
        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"z":"last","a":null}"#);
        assert_eq!(row.get_str("z"), Some("last"));
        assert_eq!(row.get("a"), Some(&Scalar::Null));
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_health_state_serialization() {
        assert_eq!(serde_json::to_value(HealthState::Healthy).unwrap(), json!("healthy"));
        assert_eq!(
            serde_json::to_value(HealthState::Unhealthy).unwrap(),
            json!("unhealthy")
        );
    }
}
