//! Document-store collaborator: agent configs and run records
//!
//! The managed document database is an external collaborator; the trait
//! captures its call contract and the in-memory implementation backs
//! tests and single-node deployments.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Document-store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure
    #[error("store error: {0}")]
    Backend(String),
}

/// CRUD surface over users, agent configs, and run records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a user document
    async fn get_user(&self, user_id: &str) -> Result<Option<Value>, StoreError>;

    /// Store an agent config under a fresh id, returning the id
    async fn create_agent(&self, user_id: &str, agent: Value) -> Result<String, StoreError>;

    /// Fetch an agent config
    async fn get_agent(&self, user_id: &str, agent_id: &str) -> Result<Option<Value>, StoreError>;

    /// Replace an agent config; false when it does not exist
    async fn update_agent(
        &self,
        user_id: &str,
        agent_id: &str,
        agent: Value,
    ) -> Result<bool, StoreError>;

    /// Delete an agent config; false when it does not exist
    async fn delete_agent(&self, user_id: &str, agent_id: &str) -> Result<bool, StoreError>;

    /// Append a run record, returning its id
    async fn record_run(&self, record: Value) -> Result<String, StoreError>;
}

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, Value>>,
    agents: RwLock<HashMap<(String, String), Value>>,
    runs: RwLock<Vec<Value>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user document
    pub async fn put_user(&self, user_id: impl Into<String>, user: Value) {
        self.users.write().await.insert(user_id.into(), user);
    }

    /// Number of recorded runs
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn create_agent(&self, user_id: &str, agent: Value) -> Result<String, StoreError> {
        let agent_id = Uuid::new_v4().to_string();
        self.agents
            .write()
            .await
            .insert((user_id.to_string(), agent_id.clone()), agent);
        Ok(agent_id)
    }

    async fn get_agent(&self, user_id: &str, agent_id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .agents
            .read()
            .await
            .get(&(user_id.to_string(), agent_id.to_string()))
            .cloned())
    }

    async fn update_agent(
        &self,
        user_id: &str,
        agent_id: &str,
        agent: Value,
    ) -> Result<bool, StoreError> {
        let key = (user_id.to_string(), agent_id.to_string());
        let mut agents = self.agents.write().await;
        if !agents.contains_key(&key) {
            return Ok(false);
        }
        agents.insert(key, agent);
        Ok(true)
    }

    async fn delete_agent(&self, user_id: &str, agent_id: &str) -> Result<bool, StoreError> {
        let key = (user_id.to_string(), agent_id.to_string());
        Ok(self.agents.write().await.remove(&key).is_some())
    }

    async fn record_run(&self, record: Value) -> Result<String, StoreError> {
        let run_id = record
            .get("run_id")
            .and_then(Value::as_str)
            .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);
        self.runs.write().await.push(record);
        Ok(run_id)
    }
}
