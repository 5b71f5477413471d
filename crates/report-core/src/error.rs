//! Error types for task execution

use std::time::Duration;
use thiserror::Error;

/// Uniform error kind returned by every task callable
///
/// The dispatcher's isolation logic only needs the message, but the
/// variants let callers distinguish a missing required payload (not
/// found) from transport or provider failures.
#[derive(Debug, Error)]
pub enum TaskError {
    /// External provider returned an error payload
    #[error("provider error: {0}")]
    Provider(String),

    /// Scraper/extraction call failed or returned unusable content
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Provider data could not be coerced to the expected shape
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A field the task cannot proceed without was absent
    #[error("missing data: {0}")]
    MissingData(String),

    /// Narrative-generation provider failed
    #[error("llm error: {0}")]
    Llm(String),

    /// The task exceeded its per-task timeout
    #[error("task timed out after {0:?}")]
    Timeout(Duration),

    /// The run-level deadline expired before the task finished
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for task callables
pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors raised by graph construction or by a failed required task
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two tasks share a key
    #[error("duplicate task key: {0}")]
    DuplicateKey(String),

    /// A task depends on a key no task provides
    #[error("task {task} depends on unknown task {dependency}")]
    UnknownDependency {
        task: String,
        dependency: String,
    },

    /// The dependency relation is not acyclic
    #[error("dependency cycle involving tasks: {0:?}")]
    DependencyCycle(Vec<String>),

    /// More than one task was marked required
    #[error("more than one required task: {0} and {1}")]
    MultipleRequired(String, String),

    /// The required task must gate the run, so it cannot wait on others
    #[error("required task {0} must not have dependencies")]
    RequiredHasDependencies(String),

    /// The single required task failed; the run was aborted
    #[error("required task {key} failed: {error}")]
    RequiredTaskFailed {
        key: String,
        error: TaskError,
    },
}
