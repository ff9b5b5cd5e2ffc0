//! MCP (Model Context Protocol) server for the graph database.
//!
//! Provides a JSON-RPC 2.0 interface over stdio so that AI assistants can
//! run Cypher, inspect the schema, check health and fetch a schema-aware
//! Cypher-writing prompt.

/// Prompt catalog and rendering.
pub mod prompts;

/// MCP server implementation.
pub mod server;

/// Tool catalog and dispatch.
pub mod tools;

/// JSON-RPC 2.0 transport types.
pub mod transport;

pub use prompts::{get_prompt_definitions, handle_prompt_get, PromptTemplate, GENERATE_CYPHER_PROMPT};
pub use server::McpServer;
pub use tools::{get_tool_definitions, handle_tool_call, Operation, ToolDefinition, ToolResult};
pub use transport::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
