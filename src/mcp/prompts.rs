//! MCP prompt catalog and rendering.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::tools::{arguments_object, check_arg_specs, validate_arguments, ArgKind, ArgSpec};
use crate::errors::{GraphMcpError, Result};
use crate::service::GraphService;
use crate::types::GraphSchema;

/// Name of the Cypher-writing prompt.
pub const GENERATE_CYPHER_PROMPT: &str = "generateKuzuCypher";

const GENERATE_CYPHER_ARGS: &[ArgSpec] = &[ArgSpec {
    name: "question",
    description: "The question to answer with a Cypher statement",
    kind: ArgKind::NonEmptyString,
    required: true,
}];

/// The prompt templates this server renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptTemplate {
    GenerateKuzuCypher,
}

impl PromptTemplate {
    pub const ALL: [PromptTemplate; 1] = [PromptTemplate::GenerateKuzuCypher];

    pub fn name(self) -> &'static str {
        match self {
            PromptTemplate::GenerateKuzuCypher => GENERATE_CYPHER_PROMPT,
        }
    }

    pub fn from_name(name: &str) -> Option<PromptTemplate> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            PromptTemplate::GenerateKuzuCypher => {
                "Instructions for writing a Kùzu Cypher statement that answers a question, constrained to the live database schema."
            }
        }
    }

    pub fn arguments(self) -> &'static [ArgSpec] {
        match self {
            PromptTemplate::GenerateKuzuCypher => GENERATE_CYPHER_ARGS,
        }
    }

    pub fn definition(self) -> PromptDefinition {
        PromptDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            arguments: self
                .arguments()
                .iter()
                .map(|arg| PromptArgument {
                    name: arg.name.to_string(),
                    description: arg.description.to_string(),
                    required: arg.required,
                })
                .collect(),
        }
    }
}

/// A prompt definition as listed by `prompts/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: PromptContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl PromptResult {
    fn user_text(description: &str, text: String) -> Self {
        Self {
            description: description.to_string(),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: PromptContent {
                    content_type: "text".to_string(),
                    text,
                },
            }],
        }
    }
}

/// Returns the list of all prompt definitions.
pub fn get_prompt_definitions() -> Vec<PromptDefinition> {
    PromptTemplate::ALL
        .into_iter()
        .map(PromptTemplate::definition)
        .collect()
}

/// Checks the static prompt catalog.
pub fn check_prompt_catalog() -> Result<()> {
    let mut names = HashSet::new();
    for prompt in PromptTemplate::ALL {
        if !names.insert(prompt.name()) {
            return Err(GraphMcpError::protocol(format!(
                "duplicate prompt name in catalog: {}",
                prompt.name()
            )));
        }
        check_arg_specs(prompt.name(), prompt.arguments())?;
    }
    Ok(())
}

/// Renders the Cypher-writing instructions for `question` over `schema`.
pub fn render_cypher_prompt(question: &str, schema: &GraphSchema) -> Result<String> {
    let schema_json = serde_json::to_string_pretty(schema)?;
    Ok(format!(
        "Task: write one Kùzu Cypher statement that answers the question below.

Rules:
1. Use only the node tables, relationship tables and properties listed in the schema. Never invent labels, relationship types or properties.
2. Name the node label and relationship type explicitly in every pattern.
3. Relationship directions must follow the src/dst pairs listed under \"connectivity\".
4. Kùzu does not support FOREACH (use UNWIND) or FINISH (use RETURN COUNT(*)).
5. For case-insensitive string comparison apply lower() to both sides.
6. Return only what the question needs, with readable aliases.
7. Reply with the statement only: no explanations, apologies or Markdown fences.

Schema:
```json
{schema_json}
```

Question:
{question}"
    ))
}

/// Handles `prompts/get`.
///
/// Unknown prompt names and invalid arguments are `Err` for the transport:
/// a prompt result has no error flag to carry them.
pub fn handle_prompt_get(service: &GraphService, name: &str, args: &Value) -> Result<PromptResult> {
    if name.trim().is_empty() {
        return Err(GraphMcpError::protocol("missing prompt name"));
    }
    let prompt = PromptTemplate::from_name(name)
        .ok_or_else(|| GraphMcpError::protocol(format!("unknown prompt: {name}")))?;
    let args = arguments_object(args)?;
    validate_arguments(prompt.arguments(), &args)?;

    debug!(prompt = prompt.name(), "rendering prompt");
    match prompt {
        PromptTemplate::GenerateKuzuCypher => {
            let question = args
                .get("question")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim();
            let schema = service.schema()?;
            let text = render_cypher_prompt(question, &schema)?;
            Ok(PromptResult::user_text(prompt.description(), text))
        }
    }
}
