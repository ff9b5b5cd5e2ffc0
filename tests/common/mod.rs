//! A scripted stand-in for the Kùzu engine.
//!
//! Answers the three catalog calls from an in-memory table list, replays
//! scripted statements, and records every statement and cursor release.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use kuzu_mcp::db::{Cursor, EngineError, EngineRow, EngineValue, GraphEngine};
use kuzu_mcp::mcp::{JsonRpcRequest, JsonRpcResponse, McpServer};
use kuzu_mcp::service::GraphService;
use serde_json::{json, Value};

pub const DB_PATH: &str = "/tmp/kuzu-mcp-test/database";

struct FakeTable {
    name: String,
    kind: &'static str,
    comment: String,
    properties: Vec<(String, String, bool)>,
    connections: Vec<(String, String)>,
}

enum Script {
    Rows(Vec<EngineRow>),
    FailAfter(Vec<EngineRow>, usize),
    Error(String),
}

#[derive(Default)]
struct State {
    tables: RefCell<Vec<FakeTable>>,
    scripts: RefCell<HashMap<String, Script>>,
    broken: RefCell<HashSet<String>>,
    catalog_down: Cell<bool>,
    executed: RefCell<Vec<String>>,
    released: Cell<usize>,
}

/// Cloning shares the underlying state, so a test keeps one handle while
/// the service owns another.
#[derive(Clone, Default)]
pub struct CatalogEngine {
    state: Rc<State>,
}

impl CatalogEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node_table(&self, name: &str, properties: &[(&str, &str, bool)]) {
        self.state.tables.borrow_mut().push(FakeTable {
            name: name.to_string(),
            kind: "NODE",
            comment: String::new(),
            properties: properties
                .iter()
                .map(|(n, t, pk)| (n.to_string(), t.to_string(), *pk))
                .collect(),
            connections: vec![],
        });
    }

    pub fn add_rel_table(&self, name: &str, properties: &[(&str, &str)], connections: &[(&str, &str)]) {
        self.state.tables.borrow_mut().push(FakeTable {
            name: name.to_string(),
            kind: "REL",
            comment: String::new(),
            // Report a primary-key column for rels too; reflection must drop it.
            properties: properties
                .iter()
                .map(|(n, t)| (n.to_string(), t.to_string(), false))
                .collect(),
            connections: connections
                .iter()
                .map(|(s, d)| (s.to_string(), d.to_string()))
                .collect(),
        });
    }

    pub fn add_catalog_entry(&self, name: &str, kind: &'static str) {
        self.state.tables.borrow_mut().push(FakeTable {
            name: name.to_string(),
            kind,
            comment: String::new(),
            properties: vec![],
            connections: vec![],
        });
    }

    pub fn set_comment(&self, table: &str, comment: &str) {
        for t in self.state.tables.borrow_mut().iter_mut() {
            if t.name == table {
                t.comment = comment.to_string();
            }
        }
    }

    /// Makes `table_info` fail for `table`.
    pub fn break_table(&self, table: &str) {
        self.state.broken.borrow_mut().insert(table.to_string());
    }

    /// Makes every catalog listing fail.
    pub fn take_catalog_down(&self) {
        self.state.catalog_down.set(true);
    }

    pub fn script_rows(&self, statement: &str, rows: Vec<EngineRow>) {
        self.state
            .scripts
            .borrow_mut()
            .insert(statement.to_string(), Script::Rows(rows));
    }

    /// Scripts a statement whose cursor fails after yielding `after` rows.
    pub fn script_iteration_failure(&self, statement: &str, rows: Vec<EngineRow>, after: usize) {
        self.state
            .scripts
            .borrow_mut()
            .insert(statement.to_string(), Script::FailAfter(rows, after));
    }

    pub fn script_error(&self, statement: &str, message: &str) {
        self.state
            .scripts
            .borrow_mut()
            .insert(statement.to_string(), Script::Error(message.to_string()));
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.executed.borrow().clone()
    }

    pub fn released(&self) -> usize {
        self.state.released.get()
    }

    pub fn service(&self) -> GraphService {
        GraphService::new(Box::new(self.clone()), DB_PATH, false)
    }

    pub fn server(&self) -> McpServer {
        McpServer::new(self.service()).expect("catalog should be consistent")
    }

    fn show_tables(&self) -> Result<Vec<EngineRow>, EngineError> {
        if self.state.catalog_down.get() {
            return Err(EngineError::new("Connection exception: database is closed"));
        }
        Ok(self
            .state
            .tables
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, t)| {
                vec![
                    ("id".to_string(), EngineValue::Int64(i as i64)),
                    ("name".to_string(), EngineValue::String(t.name.clone())),
                    ("type".to_string(), EngineValue::String(t.kind.to_string())),
                    (
                        "database name".to_string(),
                        EngineValue::String("local(kuzu)".to_string()),
                    ),
                    ("comment".to_string(), EngineValue::String(t.comment.clone())),
                ]
            })
            .collect())
    }

    fn table_info(&self, name: &str) -> Result<Vec<EngineRow>, EngineError> {
        if self.state.broken.borrow().contains(name) {
            return Err(EngineError::new(format!(
                "Runtime exception: cannot read metadata of {name}"
            )));
        }
        let tables = self.state.tables.borrow();
        let table = tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| EngineError::new(format!("Binder exception: Table {name} does not exist.")))?;
        Ok(table
            .properties
            .iter()
            .enumerate()
            .map(|(i, (prop, ty, pk))| {
                vec![
                    ("property id".to_string(), EngineValue::Int32(i as i32)),
                    ("name".to_string(), EngineValue::String(prop.clone())),
                    ("type".to_string(), EngineValue::String(ty.clone())),
                    (
                        "default expression".to_string(),
                        EngineValue::String("NULL".to_string()),
                    ),
                    ("primary key".to_string(), EngineValue::Bool(*pk)),
                ]
            })
            .collect())
    }

    fn show_connection(&self, name: &str) -> Result<Vec<EngineRow>, EngineError> {
        let tables = self.state.tables.borrow();
        let table = tables
            .iter()
            .find(|t| t.name == name && t.kind == "REL")
            .ok_or_else(|| EngineError::new(format!("Binder exception: {name} is not a rel table.")))?;
        Ok(table
            .connections
            .iter()
            .map(|(src, dst)| {
                vec![
                    ("source table name".to_string(), EngineValue::String(src.clone())),
                    ("destination table name".to_string(), EngineValue::String(dst.clone())),
                    ("source table primary key".to_string(), EngineValue::String("id".to_string())),
                    (
                        "destination table primary key".to_string(),
                        EngineValue::String("id".to_string()),
                    ),
                ]
            })
            .collect())
    }
}

fn quoted_arg<'a>(statement: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = statement.strip_prefix(prefix)?;
    let end = rest.find('\'')?;
    Some(&rest[..end])
}

impl GraphEngine for CatalogEngine {
    fn execute<'a>(
        &'a self,
        statement: &str,
        progress: &dyn Fn(f64, f64, f64),
    ) -> Result<Box<dyn Cursor + 'a>, EngineError> {
        progress(0.0, 0.0, 1.0);
        self.state.executed.borrow_mut().push(statement.to_string());
        let trimmed = statement.trim();

        let (rows, fail_after) = if let Some(script) = self.state.scripts.borrow().get(trimmed) {
            match script {
                Script::Rows(rows) => (rows.clone(), None),
                Script::FailAfter(rows, after) => (rows.clone(), Some(*after)),
                Script::Error(message) => return Err(EngineError::new(message.clone())),
            }
        } else if trimmed == "CALL show_tables() RETURN *;" {
            (self.show_tables()?, None)
        } else if let Some(name) = quoted_arg(trimmed, "CALL table_info('") {
            (self.table_info(name)?, None)
        } else if let Some(name) = quoted_arg(trimmed, "CALL show_connection('") {
            (self.show_connection(name)?, None)
        } else {
            return Err(EngineError::new(format!(
                "Parser exception: Invalid input <{trimmed}>"
            )));
        };

        Ok(Box::new(FakeCursor {
            rows: rows.into(),
            fail_after,
            yielded: 0,
            state: Rc::clone(&self.state),
        }))
    }
}

struct FakeCursor {
    rows: VecDeque<EngineRow>,
    fail_after: Option<usize>,
    yielded: usize,
    state: Rc<State>,
}

impl Cursor for FakeCursor {
    fn next_row(&mut self) -> Result<Option<EngineRow>, EngineError> {
        if self.fail_after == Some(self.yielded) {
            return Err(EngineError::new("Runtime exception: buffer manager out of memory"));
        }
        self.yielded += 1;
        Ok(self.rows.pop_front())
    }

    fn release(&mut self) {
        self.state.released.set(self.state.released.get() + 1);
    }
}

/// Builds a JSON-RPC request with a numeric id.
pub fn request(method: &str, params: Value) -> JsonRpcRequest {
    serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    }))
    .expect("valid request")
}

/// Sends `tools/call` and returns the whole response.
pub fn call_tool(server: &McpServer, name: &str, arguments: Value) -> JsonRpcResponse {
    server
        .handle_request(&request(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        ))
        .expect("tools/call must be answered")
}

/// Sends `tools/call`, asserts transport success, and returns the result.
pub fn tool_result(server: &McpServer, name: &str, arguments: Value) -> Value {
    let response = call_tool(server, name, arguments);
    assert!(
        response.error.is_none(),
        "unexpected transport error calling {name}: {:?}",
        response.error
    );
    response.result.expect("result")
}

/// Returns the text of the first content block of a tool result.
pub fn result_text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().expect("text content")
}

/// Parses the text of a successful tool result as JSON.
pub fn tool_json(server: &McpServer, name: &str, arguments: Value) -> Value {
    let result = tool_result(server, name, arguments);
    assert_eq!(result["isError"], false, "tool {name} failed: {result}");
    serde_json::from_str(result_text(&result)).expect("tool output is JSON")
}

/// The `Person(id PK, name, age)` / `KNOWS(Person->Person, since)` schema.
pub fn people_engine() -> CatalogEngine {
    let engine = CatalogEngine::new();
    engine.add_node_table(
        "Person",
        &[("id", "INT64", true), ("name", "STRING", false), ("age", "INT64", false)],
    );
    engine.add_rel_table("KNOWS", &[("since", "INT64")], &[("Person", "Person")]);
    engine
}
