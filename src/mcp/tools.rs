//! MCP tool catalog and dispatch.
//!
//! The catalog is the [`Operation`] enum: every variant has a name, a
//! description, declared arguments and a handler, all resolved by exhaustive
//! `match`, so a tool cannot be advertised without a handler or vice versa.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::prompts::GENERATE_CYPHER_PROMPT;
use crate::errors::{GraphMcpError, Result};
use crate::service::GraphService;

/// How an argument is validated before its handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A string that is non-empty after trimming whitespace.
    NonEmptyString,
}

/// A declared tool or prompt argument.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ArgKind,
    pub required: bool,
}

/// The callable tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GraphQuery,
    GetSchema,
    HealthCheck,
    GenerateCypher,
}

const GRAPH_QUERY_ARGS: &[ArgSpec] = &[ArgSpec {
    name: "cypher",
    description: "Cypher statement to execute",
    kind: ArgKind::NonEmptyString,
    required: true,
}];

const GENERATE_CYPHER_ARGS: &[ArgSpec] = &[ArgSpec {
    name: "question",
    description: "Natural-language question about the graph",
    kind: ArgKind::NonEmptyString,
    required: true,
}];

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::GraphQuery,
        Operation::GetSchema,
        Operation::HealthCheck,
        Operation::GenerateCypher,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::GraphQuery => "graphQuery",
            Operation::GetSchema => "getSchema",
            Operation::HealthCheck => "healthCheck",
            Operation::GenerateCypher => "generateCypher",
        }
    }

    /// Looks up a tool by its advertised name.
    pub fn from_name(name: &str) -> Option<Operation> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::GraphQuery => {
                "Execute a Cypher statement against the Kùzu graph database and return the result rows as JSON. 64-bit integers are returned as strings."
            }
            Operation::GetSchema => {
                "Return the database schema: node tables with their properties and primary keys, and relationship tables with their properties and source/destination tables."
            }
            Operation::HealthCheck => {
                "Report whether the database connection is healthy, with database path, read-only mode and table count."
            }
            Operation::GenerateCypher => {
                "Turn a natural-language question into Cypher. Use the generateKuzuCypher prompt for this; the tool only points there."
            }
        }
    }

    pub fn arguments(self) -> &'static [ArgSpec] {
        match self {
            Operation::GraphQuery => GRAPH_QUERY_ARGS,
            Operation::GetSchema | Operation::HealthCheck => &[],
            Operation::GenerateCypher => GENERATE_CYPHER_ARGS,
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: input_schema(self.arguments()),
        }
    }

    fn run(self, service: &GraphService, args: &Map<String, Value>) -> Result<String> {
        match self {
            Operation::GraphQuery => {
                let rows = service.query(string_arg(args, "cypher")?)?;
                Ok(serde_json::to_string_pretty(&rows)?)
            }
            Operation::GetSchema => Ok(serde_json::to_string_pretty(&service.schema()?)?),
            Operation::HealthCheck => Ok(serde_json::to_string_pretty(&service.health())?),
            Operation::GenerateCypher => {
                let question = string_arg(args, "question")?;
                Ok(format!(
                    "Cypher generation is provided as a prompt, not a tool. Request the '{GENERATE_CYPHER_PROMPT}' prompt with question {question:?} to get schema-aware instructions, then run the resulting statement with the 'graphQuery' tool."
                ))
            }
        }
    }
}

/// A tool definition exposed by the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result of a tool call: text content plus the operation-level error flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// A single content block in a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn tool_error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }
}

/// Returns the list of all tool definitions exposed by this MCP server.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    Operation::ALL.into_iter().map(Operation::definition).collect()
}

/// Builds the JSON Schema for a list of declared arguments.
pub fn input_schema(args: &[ArgSpec]) -> Value {
    let properties: Map<String, Value> = args
        .iter()
        .map(|arg| {
            (
                arg.name.to_string(),
                json!({ "type": "string", "description": arg.description }),
            )
        })
        .collect();
    let required: Vec<&str> = args.iter().filter(|a| a.required).map(|a| a.name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Checks the static catalog: unique names, unique argument names per tool.
pub fn check_catalog() -> Result<()> {
    let mut names = HashSet::new();
    for op in Operation::ALL {
        if !names.insert(op.name()) {
            return Err(GraphMcpError::protocol(format!(
                "duplicate tool name in catalog: {}",
                op.name()
            )));
        }
        check_arg_specs(op.name(), op.arguments())?;
    }
    Ok(())
}

pub(crate) fn check_arg_specs(owner: &str, specs: &[ArgSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        if spec.name.is_empty() || !seen.insert(spec.name) {
            return Err(GraphMcpError::protocol(format!(
                "invalid argument declaration '{}' for {owner}",
                spec.name
            )));
        }
    }
    Ok(())
}

/// Normalizes a request's `arguments` to an object; absent means empty.
pub(crate) fn arguments_object(args: &Value) -> Result<Map<String, Value>> {
    match args {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        _ => Err(GraphMcpError::protocol("'arguments' must be an object")),
    }
}

/// Validates `args` against the declared specs.
pub fn validate_arguments(specs: &[ArgSpec], args: &Map<String, Value>) -> Result<()> {
    for spec in specs {
        match (args.get(spec.name), spec.kind) {
            (None | Some(Value::Null), _) if spec.required => {
                return Err(GraphMcpError::argument(
                    spec.name,
                    "missing required argument",
                ));
            }
            (None | Some(Value::Null), _) => {}
            (Some(Value::String(s)), ArgKind::NonEmptyString) => {
                if s.trim().is_empty() {
                    return Err(GraphMcpError::argument(spec.name, "must not be empty"));
                }
            }
            (Some(_), ArgKind::NonEmptyString) => {
                return Err(GraphMcpError::argument(spec.name, "must be a string"));
            }
        }
    }
    Ok(())
}

fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| GraphMcpError::argument(name, "missing required argument"))
}

/// Dispatches a tool call.
///
/// A missing or unknown tool name, or non-object arguments, is an `Err`
/// for the transport. Once the tool is resolved, every failure (argument
/// validation, engine, serialization) comes back as `Ok` with
/// `isError: true`.
pub fn handle_tool_call(service: &GraphService, tool_name: &str, args: &Value) -> Result<ToolResult> {
    if tool_name.trim().is_empty() {
        return Err(GraphMcpError::protocol("missing tool name"));
    }
    let op = Operation::from_name(tool_name)
        .ok_or_else(|| GraphMcpError::protocol(format!("unknown tool: {tool_name}")))?;
    let args = arguments_object(args)?;

    debug!(tool = op.name(), "dispatching tool call");
    let outcome = validate_arguments(op.arguments(), &args).and_then(|()| op.run(service, &args));

    Ok(match outcome {
        Ok(text) => ToolResult::text(text),
        Err(e) => {
            warn!(tool = op.name(), error = %e, "tool reported failure");
            ToolResult::tool_error(e.to_string())
        }
    })
}
