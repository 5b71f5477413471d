//! Agent-run endpoints (JWT-protected)

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use report_llm::AgentTeam;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

/// Run outputs larger than this are uploaded instead of stored inline
const MAX_INLINE_RESULT: usize = 256 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/run_agent", post(run_agent))
        .route("/run_agent_by_id", post(run_agent_by_id))
}

#[derive(Debug, Deserialize)]
struct RunAgentBody {
    agent_config: Option<Value>,
    user_input: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunAgentByIdBody {
    agent_id: Option<String>,
    user_input: Option<String>,
}

/// `POST /agents/run_agent`: save the config, run the team, record the run
async fn run_agent(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<RunAgentBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(agent_config), Some(user_input)) = (body.agent_config, body.user_input) else {
        return Err(ApiError::BadRequest(
            "user_id, agent_config and user_input are required".to_string(),
        ));
    };

    let team = AgentTeam::from_config(state.tasks.engine.clone(), &agent_config)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let agent_id = state.store.create_agent(&user.user_id, agent_config).await?;

    let result = team
        .run(&user_input)
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))?;

    record_run(&state, &user.user_id, &agent_id, &result).await?;

    Ok(Json(json!({"agent_id": agent_id, "result": result})))
}

/// `POST /agents/run_agent_by_id`: run a stored config
async fn run_agent_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<RunAgentByIdBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(agent_id), Some(user_input)) = (body.agent_id, body.user_input) else {
        return Err(ApiError::BadRequest(
            "user_id, agent_id, and user_input are required".to_string(),
        ));
    };

    let agent_config = state
        .store
        .get_agent(&user.user_id, &agent_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("agent_not_found".to_string()))?;

    let team = AgentTeam::from_config(state.tasks.engine.clone(), &agent_config)
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let result = team
        .run(&user_input)
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))?;

    record_run(&state, &user.user_id, &agent_id, &result).await?;

    Ok(Json(json!({"result": result})))
}

/// Write the audit record, offloading oversized outputs to object storage
async fn record_run(
    state: &AppState,
    user_id: &str,
    agent_id: &str,
    result: &Value,
) -> Result<(), ApiError> {
    let run_id = Uuid::new_v4().to_string();
    let payload = serde_json::to_vec(result).unwrap_or_default();

    let stored_result = if payload.len() > MAX_INLINE_RESULT {
        match state
            .storage
            .upload(&format!("runs/{run_id}.json"), payload, "application/json")
            .await
        {
            Ok(url) => json!({"result_url": url}),
            Err(error) => {
                warn!(%error, "run output upload failed, storing inline");
                result.clone()
            }
        }
    } else {
        result.clone()
    };

    state
        .store
        .record_run(json!({
            "run_id": run_id,
            "user_id": user_id,
            "agent_id": agent_id,
            "created_at": Utc::now().to_rfc3339(),
            "result": stored_result,
        }))
        .await?;
    Ok(())
}
