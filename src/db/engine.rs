//! The boundary to the embedded graph engine.
//!
//! Everything that talks to the engine goes through [`run_statement`], which
//! is the only caller of [`GraphEngine::execute`]. It supplies the progress
//! callback the engine API requires and wraps the returned cursor in a
//! [`CursorGuard`] so the cursor is released on every exit path.

use thiserror::Error;
use tracing::trace;

/// A failure reported by the engine itself (syntax, binder, runtime, I/O).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A value as produced by the engine, before transport normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineValue {
    Null,
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Int128(i128),
    Double(f64),
    String(String),
    List(Vec<EngineValue>),
    /// Structs, nodes and rels: ordered field name to value.
    Struct(Vec<(String, EngineValue)>),
}

/// One engine row: column name to value, in result column order.
pub type EngineRow = Vec<(String, EngineValue)>;

/// Progress reporting hook: `(pipeline progress, finished pipelines, total pipelines)`.
pub type ProgressCallback<'a> = &'a dyn Fn(f64, f64, f64);

/// An engine-side handle over the rows of one statement.
pub trait Cursor {
    /// Returns the next row, or `None` once the result is exhausted.
    fn next_row(&mut self) -> Result<Option<EngineRow>, EngineError>;

    /// Frees the engine-side result. Invoked exactly once, by [`CursorGuard`].
    fn release(&mut self);
}

/// A live connection to the graph engine.
///
/// The process opens exactly one and shares it with every component.
pub trait GraphEngine {
    /// Executes one statement in the engine's query language.
    ///
    /// `progress` must always be supplied; engines may call it any number of
    /// times while the statement runs.
    fn execute<'a>(
        &'a self,
        statement: &str,
        progress: ProgressCallback<'_>,
    ) -> Result<Box<dyn Cursor + 'a>, EngineError>;
}

/// Owns a cursor and releases it when dropped.
pub struct CursorGuard<'a> {
    cursor: Box<dyn Cursor + 'a>,
}

impl<'a> CursorGuard<'a> {
    pub fn next_row(&mut self) -> Result<Option<EngineRow>, EngineError> {
        self.cursor.next_row()
    }
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.cursor.release();
    }
}

fn ignore_progress(_progress: f64, _finished: f64, _total: f64) {}

/// Executes `statement` on `engine` and returns a guarded cursor.
pub fn run_statement<'a>(
    engine: &'a dyn GraphEngine,
    statement: &str,
) -> Result<CursorGuard<'a>, EngineError> {
    trace!(statement, "submitting statement to engine");
    let cursor = engine.execute(statement, &ignore_progress)?;
    Ok(CursorGuard { cursor })
}
