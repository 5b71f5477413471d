//! Declarative task graph and its executor

use crate::error::{GraphError, TaskError};
use crate::task::{ErrorLedger, TaskInputs, TaskResult, TaskSpec, TaskValue};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Execution limits for a graph run
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Timeout applied to every task individually; expiry is an isolated
    /// failure, not an abort
    pub task_timeout: Duration,

    /// Optional run-level deadline; on expiry unfinished tasks resolve
    /// with a deadline error and the partial result set is returned
    pub deadline: Option<Duration>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(30),
            deadline: None,
        }
    }
}

impl GraphConfig {
    /// Set the per-task timeout
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Set the run-level deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Completed run: one [`TaskResult`] per submitted task plus the ledger
#[derive(Debug)]
pub struct GraphRun {
    /// Results keyed by task, including failed tasks
    pub results: BTreeMap<String, TaskResult>,
    /// Error messages for every failed task
    pub ledger: ErrorLedger,
}

impl GraphRun {
    /// A task's output value, `Null` when it failed or never ran
    pub fn value(&self, key: &str) -> TaskValue {
        self.results
            .get(key)
            .map(TaskResult::value_or_null)
            .unwrap_or(TaskValue::Null)
    }

    /// A task's full result, if it was submitted
    pub fn result(&self, key: &str) -> Option<&TaskResult> {
        self.results.get(key)
    }
}

/// A validated set of tasks ready to execute
pub struct TaskGraph {
    tasks: Vec<TaskSpec>,
}

impl TaskGraph {
    /// Create a new graph builder
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::new()
    }

    /// Execute the graph
    ///
    /// Zero-dependency tasks are submitted immediately; a dependent task
    /// is submitted as soon as all of its dependencies have resolved,
    /// successfully or not (a failed dependency resolves to `Null` in the
    /// dependent's inputs). The only hard stop is a failure of the single
    /// required task, which aborts the run without awaiting siblings.
    pub async fn run(self, config: &GraphConfig) -> Result<GraphRun, GraphError> {
        let task_timeout = config.task_timeout;
        let deadline = config.deadline.map(|d| tokio::time::Instant::now() + d);
        let required_key = self
            .tasks
            .iter()
            .find(|t| t.required)
            .map(|t| t.key.clone());

        let mut pending: Vec<TaskSpec> = self.tasks;
        let mut results: BTreeMap<String, TaskResult> = BTreeMap::new();
        let mut ledger = ErrorLedger::default();
        let mut running: JoinSet<(String, Result<TaskValue, TaskError>)> = JoinSet::new();
        let mut key_of: HashMap<tokio::task::Id, String> = HashMap::new();

        loop {
            // Submit every task whose dependencies have all resolved
            let mut i = 0;
            while i < pending.len() {
                if pending[i].deps.iter().all(|d| results.contains_key(d)) {
                    let spec = pending.swap_remove(i);
                    let inputs = TaskInputs::from_results(&spec.deps, &results);
                    let key = spec.key;
                    let run = spec.run;
                    debug!(task = %key, "submitting task");
                    let task_key = key.clone();
                    let handle = running.spawn(async move {
                        let outcome = match tokio::time::timeout(task_timeout, (run)(inputs)).await
                        {
                            Ok(outcome) => outcome,
                            Err(_) => Err(TaskError::Timeout(task_timeout)),
                        };
                        (task_key, outcome)
                    });
                    key_of.insert(handle.id(), key);
                } else {
                    i += 1;
                }
            }

            if running.is_empty() {
                break;
            }

            let next = match deadline {
                Some(at) => {
                    let joined =
                        tokio::time::timeout_at(at, running.join_next_with_id()).await;
                    match joined {
                        Ok(next) => next,
                        Err(_) => {
                            warn!(
                                unfinished = key_of.len() + pending.len(),
                                "request deadline exceeded; returning partial results"
                            );
                            running.abort_all();
                            let unfinished = key_of
                                .into_values()
                                .chain(pending.into_iter().map(|spec| spec.key));
                            for key in unfinished {
                                ledger.record(&key, TaskError::DeadlineExceeded.to_string());
                                results.insert(
                                    key.clone(),
                                    TaskResult::err(key, TaskError::DeadlineExceeded.to_string()),
                                );
                            }
                            return Ok(GraphRun { results, ledger });
                        }
                    }
                }
                None => running.join_next_with_id().await,
            };

            match next {
                Some(Ok((id, (key, outcome)))) => {
                    key_of.remove(&id);
                    match outcome {
                        Ok(value) => {
                            debug!(task = %key, "task completed");
                            let result = TaskResult::ok(key.clone(), value);
                            results.insert(key, result);
                        }
                        Err(error) => {
                            if required_key.as_deref() == Some(key.as_str()) {
                                return Err(GraphError::RequiredTaskFailed { key, error });
                            }
                            warn!(task = %key, %error, "task failed; continuing");
                            ledger.record(&key, error.to_string());
                            let result = TaskResult::err(key.clone(), error.to_string());
                            results.insert(key, result);
                        }
                    }
                }
                Some(Err(join_err)) => {
                    let key = key_of
                        .remove(&join_err.id())
                        .unwrap_or_else(|| "unknown".to_string());
                    let error = TaskError::Other(format!("task panicked: {join_err}"));
                    if required_key.as_deref() == Some(key.as_str()) {
                        return Err(GraphError::RequiredTaskFailed { key, error });
                    }
                    warn!(task = %key, %error, "task panicked; continuing");
                    ledger.record(&key, error.to_string());
                    let result = TaskResult::err(key.clone(), error.to_string());
                    results.insert(key, result);
                }
                None => break,
            }
        }

        Ok(GraphRun { results, ledger })
    }
}

/// Builder that validates the task set before execution
pub struct TaskGraphBuilder {
    tasks: Vec<TaskSpec>,
}

impl TaskGraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a task to the graph
    pub fn task(mut self, spec: TaskSpec) -> Self {
        self.tasks.push(spec);
        self
    }

    /// Validate and build the graph
    pub fn build(self) -> Result<TaskGraph, GraphError> {
        let mut keys: HashSet<&str> = HashSet::new();
        for task in &self.tasks {
            if !keys.insert(task.key.as_str()) {
                return Err(GraphError::DuplicateKey(task.key.clone()));
            }
        }

        let mut required: Option<&TaskSpec> = None;
        for task in &self.tasks {
            for dep in &task.deps {
                if !keys.contains(dep.as_str()) {
                    return Err(GraphError::UnknownDependency {
                        task: task.key.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
            if task.required {
                if let Some(first) = required {
                    return Err(GraphError::MultipleRequired(
                        first.key.clone(),
                        task.key.clone(),
                    ));
                }
                if !task.deps.is_empty() {
                    return Err(GraphError::RequiredHasDependencies(task.key.clone()));
                }
                required = Some(task);
            }
        }

        if let Some(cycle) = detect_cycle(&self.tasks) {
            return Err(GraphError::DependencyCycle(cycle));
        }

        Ok(TaskGraph { tasks: self.tasks })
    }
}

impl Default for TaskGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Kahn's algorithm; returns the keys left on a cycle, if any
fn detect_cycle(tasks: &[TaskSpec]) -> Option<Vec<String>> {
    let mut indegree: HashMap<&str, usize> = tasks
        .iter()
        .map(|t| (t.key.as_str(), t.deps.len()))
        .collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        for dep in &task.deps {
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(task.key.as_str());
        }
    }

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(key, _)| *key)
        .collect();
    let mut seen = 0;
    while let Some(key) = queue.pop_front() {
        seen += 1;
        if let Some(next) = dependents.get(key) {
            for &dependent in next {
                if let Some(deg) = indegree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    if seen == tasks.len() {
        None
    } else {
        let mut remaining: Vec<String> = indegree
            .into_iter()
            .filter(|(_, deg)| *deg > 0)
            .map(|(key, _)| key.to_string())
            .collect();
        remaining.sort();
        Some(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok_task(key: &str, value: TaskValue) -> TaskSpec {
        TaskSpec::new(key, move |_| async move { Ok(value) })
    }

    fn err_task(key: &str, message: &str) -> TaskSpec {
        let message = message.to_string();
        TaskSpec::new(key, move |_| async move {
            Err(TaskError::Provider(message))
        })
    }

    #[tokio::test]
    async fn test_all_tasks_succeed() {
        let graph = TaskGraph::builder()
            .task(ok_task("a", json!(1)))
            .task(ok_task("b", json!(2)))
            .task(ok_task("c", json!(3)))
            .build()
            .expect("valid graph");

        let run = graph.run(&GraphConfig::default()).await.expect("run");
        assert_eq!(run.results.len(), 3);
        assert_eq!(run.value("a"), json!(1));
        assert_eq!(run.value("b"), json!(2));
        assert!(run.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let graph = TaskGraph::builder()
            .task(ok_task("a", json!("alpha")))
            .task(err_task("b", "boom"))
            .task(ok_task("c", json!("gamma")))
            .build()
            .expect("valid graph");

        let run = graph.run(&GraphConfig::default()).await.expect("run");
        // every submitted task yields a result
        assert_eq!(run.results.len(), 3);
        assert_eq!(run.value("a"), json!("alpha"));
        assert_eq!(run.value("b"), TaskValue::Null);
        assert_eq!(run.value("c"), json!("gamma"));
        assert_eq!(run.ledger.get("b"), Some("provider error: boom"));
        assert_eq!(run.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_required_failure_aborts_and_skips_dependents() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dependent_calls = Arc::clone(&calls);

        let graph = TaskGraph::builder()
            .task(
                TaskSpec::new("profile", |_| async {
                    Err(TaskError::MissingData("company_profile".to_string()))
                })
                .required(),
            )
            .task(
                TaskSpec::new("valuation", move |_| {
                    let calls = Arc::clone(&dependent_calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(json!({}))
                    }
                })
                .depends_on(["profile"]),
            )
            .build()
            .expect("valid graph");

        let err = graph.run(&GraphConfig::default()).await.unwrap_err();
        match err {
            GraphError::RequiredTaskFailed { key, error } => {
                assert_eq!(key, "profile");
                assert!(matches!(error, TaskError::MissingData(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dependent_receives_resolved_inputs() {
        let graph = TaskGraph::builder()
            .task(ok_task("profile", json!({"sector": "Technology"})))
            .task(
                TaskSpec::new("pe_ratios", |inputs| async move {
                    let sector = inputs.get("profile")["sector"].clone();
                    Ok(json!({"sector": sector}))
                })
                .depends_on(["profile"]),
            )
            .build()
            .expect("valid graph");

        let run = graph.run(&GraphConfig::default()).await.expect("run");
        assert_eq!(run.value("pe_ratios")["sector"], "Technology");
    }

    #[tokio::test]
    async fn test_failed_optional_dependency_resolves_null() {
        let graph = TaskGraph::builder()
            .task(err_task("sector", "scrape blocked"))
            .task(
                TaskSpec::new("comparison", |inputs| async move {
                    // fallback path: dependent still runs with Null input
                    let sector = inputs.get("sector").clone();
                    Ok(json!({"sector_was_null": sector.is_null()}))
                })
                .depends_on(["sector"]),
            )
            .build()
            .expect("valid graph");

        let run = graph.run(&GraphConfig::default()).await.expect("run");
        assert_eq!(run.value("comparison")["sector_was_null"], true);
        assert_eq!(run.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_task_timeout_is_isolated() {
        let config = GraphConfig::default().with_task_timeout(Duration::from_millis(50));
        let graph = TaskGraph::builder()
            .task(TaskSpec::new("slow", |_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(json!("never"))
            }))
            .task(ok_task("fast", json!("done")))
            .build()
            .expect("valid graph");

        let run = graph.run(&config).await.expect("run");
        assert_eq!(run.value("fast"), json!("done"));
        assert!(run.result("slow").expect("slow result").is_err());
        assert!(
            run.ledger
                .get("slow")
                .expect("ledger entry")
                .contains("timed out")
        );
    }

    #[tokio::test]
    async fn test_deadline_returns_partial_results() {
        let config = GraphConfig::default()
            .with_task_timeout(Duration::from_secs(30))
            .with_deadline(Duration::from_millis(80));
        let graph = TaskGraph::builder()
            .task(ok_task("quick", json!(true)))
            .task(TaskSpec::new("stuck", |_| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(json!("never"))
            }))
            .build()
            .expect("valid graph");

        let run = graph.run(&config).await.expect("run");
        assert_eq!(run.value("quick"), json!(true));
        assert_eq!(
            run.ledger.get("stuck"),
            Some("request deadline exceeded")
        );
        assert_eq!(run.results.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregation_is_order_independent() {
        // same graph with opposite completion orders
        async fn run_with(delays: [u64; 2]) -> BTreeMap<String, TaskResult> {
            let graph = TaskGraph::builder()
                .task(TaskSpec::new("first", move |_| async move {
                    tokio::time::sleep(Duration::from_millis(delays[0])).await;
                    Ok(json!("one"))
                }))
                .task(TaskSpec::new("second", move |_| async move {
                    tokio::time::sleep(Duration::from_millis(delays[1])).await;
                    Ok(json!("two"))
                }))
                .build()
                .expect("valid graph");
            graph
                .run(&GraphConfig::default())
                .await
                .expect("run")
                .results
        }

        let fast_first = run_with([1, 30]).await;
        let fast_second = run_with([30, 1]).await;
        assert_eq!(fast_first, fast_second);
    }

    #[tokio::test]
    async fn test_panic_is_captured_as_result() {
        let graph = TaskGraph::builder()
            .task(TaskSpec::new("bad", |_| async {
                panic!("task blew up");
            }))
            .task(ok_task("good", json!(1)))
            .build()
            .expect("valid graph");

        let run = graph.run(&GraphConfig::default()).await.expect("run");
        assert!(run.result("bad").expect("bad result").is_err());
        assert_eq!(run.value("good"), json!(1));
    }

    #[test]
    fn test_builder_rejects_duplicate_keys() {
        let err = TaskGraph::builder()
            .task(ok_task("a", json!(1)))
            .task(ok_task("a", json!(2)))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateKey(key) if key == "a"));
    }

    #[test]
    fn test_builder_rejects_unknown_dependency() {
        let err = TaskGraph::builder()
            .task(ok_task("a", json!(1)).depends_on(["missing"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownDependency { .. }));
    }

    #[test]
    fn test_builder_rejects_cycle() {
        let err = TaskGraph::builder()
            .task(ok_task("a", json!(1)).depends_on(["b"]))
            .task(ok_task("b", json!(2)).depends_on(["a"]))
            .build()
            .unwrap_err();
        match err {
            GraphError::DependencyCycle(keys) => {
                assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builder_rejects_second_required_task() {
        let err = TaskGraph::builder()
            .task(ok_task("a", json!(1)).required())
            .task(ok_task("b", json!(2)).required())
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::MultipleRequired(..)));
    }

    #[test]
    fn test_builder_rejects_required_with_dependencies() {
        let err = TaskGraph::builder()
            .task(ok_task("a", json!(1)))
            .task(ok_task("b", json!(2)).depends_on(["a"]).required())
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::RequiredHasDependencies(key) if key == "b"));
    }
}
