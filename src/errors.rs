use thiserror::Error;

/// Errors that can occur while serving graph requests.
#[derive(Error, Debug)]
pub enum GraphMcpError {
    /// Malformed envelope: missing or unknown tool/prompt name, missing params.
    #[error("{message}")]
    Protocol { message: String },

    #[error("invalid argument '{field}': {message}")]
    Argument { field: String, message: String },

    #[error("{message} (statement: {statement})")]
    Engine { message: String, statement: String },

    #[error("startup error: {message}")]
    Startup { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphMcpError {
    /// Builds a protocol error from a message.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Builds an argument error for the named field.
    pub fn argument(field: &str, message: impl Into<String>) -> Self {
        Self::Argument {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns `true` when the failure belongs inside a well-formed tool
    /// result (`isError: true`) rather than on the JSON-RPC error channel.
    pub fn is_operation_level(&self) -> bool {
        matches!(self, Self::Argument { .. } | Self::Engine { .. })
    }
}

/// Convenience alias for results using `GraphMcpError`.
pub type Result<T> = std::result::Result<T, GraphMcpError>;
