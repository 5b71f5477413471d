//! Sequential multi-agent team runner
//!
//! Agent configs are user-supplied JSON documents; each member is a
//! role-prompted analysis call, and members run in sequence with each
//! output feeding the next member's input.

use crate::{AnalysisEngine, AnalysisRequest, LlmError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

/// One member of an agent team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display name
    pub name: String,
    /// Role statement
    pub role: String,
    /// Step-by-step instructions
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

impl AgentSpec {
    /// Compose the member's prompt for the given input
    fn prompt_for(&self, input: &str) -> String {
        let mut prompt = format!("You are {}, {}.", self.name, self.role);
        if let Some(description) = &self.description {
            if !description.is_empty() {
                prompt.push_str(&format!(" {description}"));
            }
        }
        if !self.instructions.is_empty() {
            prompt.push_str("\n\nInstructions:");
            for instruction in &self.instructions {
                prompt.push_str(&format!("\n- {instruction}"));
            }
        }
        prompt.push_str(&format!("\n\nInput:\n{input}"));
        prompt
    }
}

/// A team of agents executed in sequence
///
/// The output of each member becomes the input of the next, so later
/// members refine or extend earlier work.
pub struct AgentTeam {
    agent_id: Option<String>,
    members: Vec<AgentSpec>,
    engine: AnalysisEngine,
}

impl AgentTeam {
    /// Build a team from a stored agent config document
    ///
    /// Expected shape: `{"agent_id"?, "agents": [{name, role, instructions?, description?}]}`.
    pub fn from_config(engine: AnalysisEngine, config: &Value) -> Result<Self> {
        let agents = config
            .get("agents")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                LlmError::InvalidAgentConfig("config must contain an \"agents\" array".to_string())
            })?;

        if agents.is_empty() {
            return Err(LlmError::InvalidAgentConfig(
                "\"agents\" array must not be empty".to_string(),
            ));
        }

        let members = agents
            .iter()
            .map(|agent| {
                serde_json::from_value::<AgentSpec>(agent.clone())
                    .map_err(|e| LlmError::InvalidAgentConfig(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let agent_id = config
            .get("agent_id")
            .and_then(Value::as_str)
            .map(ToString::to_string);

        Ok(Self {
            agent_id,
            members,
            engine,
        })
    }

    /// Run every member in sequence over the user input
    pub async fn run(&self, user_input: &str) -> Result<Value> {
        let mut current = user_input.to_string();
        let mut steps = Vec::with_capacity(self.members.len());

        for member in &self.members {
            debug!(agent = %member.name, "running team member");
            let output = self
                .engine
                .generate(AnalysisRequest::new(member.prompt_for(&current)))
                .await?;
            steps.push(json!({"agent": member.name, "output": output}));
            current = output;
        }

        Ok(json!({
            "agent_id": self.agent_id,
            "input": user_input,
            "output": current,
            "steps": steps,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionRequest, LlmProvider};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CountingProvider;

    #[async_trait]
    impl LlmProvider for CountingProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            // surface the prompt so chaining is observable
            Ok(format!("[{}]", request.prompt.lines().count()))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn engine() -> AnalysisEngine {
        AnalysisEngine::new(Arc::new(CountingProvider), "gpt-4o")
    }

    #[test]
    fn test_rejects_config_without_agents() {
        let err = AgentTeam::from_config(engine(), &json!({"name": "team"})).unwrap_err();
        assert!(matches!(err, LlmError::InvalidAgentConfig(_)));

        let err = AgentTeam::from_config(engine(), &json!({"agents": []})).unwrap_err();
        assert!(matches!(err, LlmError::InvalidAgentConfig(_)));
    }

    #[test]
    fn test_prompt_composition() {
        let spec = AgentSpec {
            name: "Analyst".to_string(),
            role: "a financial analyst".to_string(),
            instructions: vec!["Be terse".to_string()],
            description: Some("Covers equities".to_string()),
        };
        let prompt = spec.prompt_for("What moved NVDA today?");
        assert!(prompt.contains("You are Analyst"));
        assert!(prompt.contains("- Be terse"));
        assert!(prompt.contains("Covers equities"));
        assert!(prompt.ends_with("What moved NVDA today?"));
    }

    #[tokio::test]
    async fn test_run_chains_members() {
        let config = json!({
            "agent_id": "team-1",
            "agents": [
                {"name": "Researcher", "role": "a researcher"},
                {"name": "Writer", "role": "a writer"}
            ]
        });
        let team = AgentTeam::from_config(engine(), &config).expect("team");
        let result = team.run("hello").await.expect("run");

        assert_eq!(result["agent_id"], "team-1");
        assert_eq!(result["input"], "hello");
        assert_eq!(result["steps"].as_array().expect("steps").len(), 2);
        assert_eq!(result["steps"][0]["agent"], "Researcher");
        assert_eq!(result["steps"][1]["agent"], "Writer");
    }
}
