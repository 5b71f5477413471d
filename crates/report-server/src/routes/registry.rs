//! Document-store CRUD endpoints (agent configs and users)

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_user", get(get_user))
        .route("/add_agent", post(add_agent))
        .route("/update_agent", put(update_agent))
        .route("/delete_agent", delete(delete_agent))
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    id: Option<String>,
}

async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(user_id) = query.id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::BadRequest("User ID is required".to_string()));
    };

    state
        .store
        .get_user(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("user_not_found".to_string()))
}

#[derive(Debug, Deserialize)]
struct AddAgentBody {
    user_id: Option<String>,
    agent_data: Option<Value>,
}

async fn add_agent(
    State(state): State<AppState>,
    Json(body): Json<AddAgentBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(agent_data)) = (body.user_id, body.agent_data) else {
        return Err(ApiError::BadRequest(
            "User ID and agent data are required".to_string(),
        ));
    };

    let agent_id = state.store.create_agent(&user_id, agent_data).await?;
    Ok(Json(json!({"agent_id": agent_id})))
}

#[derive(Debug, Deserialize)]
struct UpdateAgentBody {
    user_id: Option<String>,
    agent_id: Option<String>,
    agent_data: Option<Value>,
}

async fn update_agent(
    State(state): State<AppState>,
    Json(body): Json<UpdateAgentBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(agent_id), Some(agent_data)) =
        (body.user_id, body.agent_id, body.agent_data)
    else {
        return Err(ApiError::BadRequest(
            "User ID, agent ID, and agent data are required".to_string(),
        ));
    };

    if !state.store.update_agent(&user_id, &agent_id, agent_data).await? {
        return Err(ApiError::NotFound("agent_not_found".to_string()));
    }
    Ok(Json(json!({"status": "updated"})))
}

#[derive(Debug, Deserialize)]
struct DeleteAgentBody {
    user_id: Option<String>,
    agent_id: Option<String>,
}

async fn delete_agent(
    State(state): State<AppState>,
    Json(body): Json<DeleteAgentBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(agent_id)) = (body.user_id, body.agent_id) else {
        return Err(ApiError::BadRequest(
            "User ID and agent ID are required".to_string(),
        ));
    };

    if !state.store.delete_agent(&user_id, &agent_id).await? {
        return Err(ApiError::NotFound("agent_not_found".to_string()));
    }
    Ok(Json(json!({"status": "deleted"})))
}
