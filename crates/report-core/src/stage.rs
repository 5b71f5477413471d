//! Bounded concurrent execution of a fixed task batch
//!
//! Used for the summarization stage, which caps simultaneous calls to
//! the narrative-generation provider.

use crate::error::TaskError;
use crate::task::{TaskFuture, TaskResult};
use futures::StreamExt;
use std::time::Duration;
use tracing::warn;

/// Run a batch of keyed futures with at most `limit` in flight
///
/// Each future's failure (including timeout) converts to a [`TaskResult`]
/// with `error` set; nothing propagates. Results are returned in
/// completion order; callers merge by key.
pub async fn run_bounded(
    tasks: Vec<(String, TaskFuture)>,
    limit: usize,
    timeout: Duration,
) -> Vec<TaskResult> {
    futures::stream::iter(tasks.into_iter().map(|(key, fut)| async move {
        let outcome = match tokio::time::timeout(timeout, fut).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TaskError::Timeout(timeout)),
        };
        match outcome {
            Ok(value) => TaskResult::ok(key, value),
            Err(error) => {
                warn!(task = %key, %error, "bounded stage task failed");
                TaskResult::err(key, error.to_string())
            }
        }
    }))
    .buffer_unordered(limit.max(1))
    .collect()
    .await
}
