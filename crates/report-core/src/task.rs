//! Task, result, and ledger types

use crate::error::TaskError;
use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;

/// JSON-compatible value produced by a task
pub type TaskValue = serde_json::Value;

/// Boxed future returned by a task callable
pub type TaskFuture = BoxFuture<'static, Result<TaskValue, TaskError>>;

/// Resolved dependency outputs handed to a task callable
///
/// A dependency that failed (or never ran) resolves to `Value::Null`;
/// fallback behavior for missing inputs lives inside the callable, not
/// in the scheduler.
#[derive(Debug, Default)]
pub struct TaskInputs {
    resolved: BTreeMap<String, TaskValue>,
}

impl TaskInputs {
    /// Build inputs for the given dependency keys from completed results
    pub(crate) fn from_results(deps: &[String], results: &BTreeMap<String, TaskResult>) -> Self {
        let resolved = deps
            .iter()
            .map(|dep| {
                let value = results
                    .get(dep)
                    .and_then(|r| r.value.clone())
                    .unwrap_or(TaskValue::Null);
                (dep.clone(), value)
            })
            .collect();
        Self { resolved }
    }

    /// Get a dependency's output, `Null` when absent or failed
    pub fn get(&self, key: &str) -> &TaskValue {
        self.resolved.get(key).unwrap_or(&TaskValue::Null)
    }

    /// Take ownership of a dependency's output
    pub fn take(&mut self, key: &str) -> TaskValue {
        self.resolved.remove(key).unwrap_or(TaskValue::Null)
    }
}

/// A named unit of work in the graph
///
/// Tasks are stateless between requests; each request constructs a fresh
/// set of specs whose callables capture the provider clients they need.
pub struct TaskSpec {
    pub(crate) key: String,
    pub(crate) deps: Vec<String>,
    pub(crate) required: bool,
    pub(crate) run: Box<dyn FnOnce(TaskInputs) -> TaskFuture + Send>,
}

impl TaskSpec {
    /// Create a new task from a key and an async callable
    pub fn new<K, F, Fut>(key: K, run: F) -> Self
    where
        K: Into<String>,
        F: FnOnce(TaskInputs) -> Fut + Send + 'static,
        Fut: Future<Output = Result<TaskValue, TaskError>> + Send + 'static,
    {
        Self {
            key: key.into(),
            deps: Vec::new(),
            required: false,
            run: Box::new(move |inputs| -> TaskFuture { Box::pin(run(inputs)) }),
        }
    }

    /// Declare dependencies whose outputs this task consumes
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Mark this task as the one whose failure aborts the whole run
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The task's key
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec")
            .field("key", &self.key)
            .field("deps", &self.deps)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Outcome of a single task
///
/// Exactly one of `value`/`error` is meaningfully populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    /// Task key
    pub key: String,
    /// Successful output, if any
    pub value: Option<TaskValue>,
    /// Failure message, if any
    pub error: Option<String>,
}

impl TaskResult {
    /// Successful result
    pub fn ok(key: impl Into<String>, value: TaskValue) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            error: None,
        }
    }

    /// Failed result
    pub fn err(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            error: Some(error.into()),
        }
    }

    /// Whether the task failed
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// The task's value, `Null` when it failed
    pub fn value_or_null(&self) -> TaskValue {
        self.value.clone().unwrap_or(TaskValue::Null)
    }
}

/// Per-request map of task key to error message
///
/// Returned to the caller alongside the report so partial failures are
/// visible even on a 200 response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorLedger(BTreeMap<String, String>);

impl ErrorLedger {
    /// Record a task failure
    pub fn record(&mut self, key: impl Into<String>, error: impl Into<String>) {
        self.0.insert(key.into(), error.into());
    }

    /// Look up a task's error
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether any task failed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failed tasks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over (key, error) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// The ledger as a JSON object
    pub fn to_value(&self) -> TaskValue {
        serde_json::to_value(&self.0).unwrap_or(TaskValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_result_constructors() {
        let ok = TaskResult::ok("fear_and_greed", json!({"current_index": 42}));
        assert!(!ok.is_err());
        assert_eq!(ok.value_or_null()["current_index"], 42);

        let err = TaskResult::err("fear_and_greed", "timed out");
        assert!(err.is_err());
        assert_eq!(err.value_or_null(), TaskValue::Null);
    }

    #[test]
    fn test_inputs_missing_key_is_null() {
        let inputs = TaskInputs::default();
        assert_eq!(*inputs.get("anything"), TaskValue::Null);
    }

    #[test]
    fn test_inputs_failed_dep_is_null() {
        let mut results = BTreeMap::new();
        results.insert(
            "a".to_string(),
            TaskResult::err("a", "provider error: boom"),
        );
        results.insert("b".to_string(), TaskResult::ok("b", json!(7)));

        let deps = vec!["a".to_string(), "b".to_string()];
        let mut inputs = TaskInputs::from_results(&deps, &results);
        assert_eq!(*inputs.get("a"), TaskValue::Null);
        assert_eq!(inputs.take("b"), json!(7));
    }

    #[test]
    fn test_ledger_serializes_as_object() {
        let mut ledger = ErrorLedger::default();
        ledger.record("cot_report", "extraction error: blocked");
        let value = ledger.to_value();
        assert_eq!(value["cot_report"], "extraction error: blocked");
        assert_eq!(ledger.len(), 1);
    }
}
