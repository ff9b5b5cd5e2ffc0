/// Engine boundary: connection trait, cursors and engine values.
pub mod engine;

/// Statement execution with transport-safe row conversion.
pub mod executor;

/// Native Kùzu engine.
#[cfg(feature = "kuzu")]
pub mod kuzu;

pub use engine::{run_statement, Cursor, CursorGuard, EngineError, EngineRow, EngineValue, GraphEngine};
pub use executor::{to_scalar, QueryExecutor};
#[cfg(feature = "kuzu")]
pub use kuzu::KuzuEngine;
