//! HTTP handlers for the calling bot API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use brivas_graph_sdk::{CommsNotifications, OnlineMeeting};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::directory::Role;
use crate::error::Result;
use crate::orchestrator::CallResult;
use crate::scheduler::{ActionKind, ScheduledAction, SchedulerStats};
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Ready check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub users: usize,
    pub unresolved_roles: Vec<Role>,
}

/// Stats response
#[derive(Serialize)]
pub struct StatsResponse {
    pub uptime_secs: u64,
    pub tracked_calls: usize,
    pub actions: SchedulerStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMeetingRequest {
    pub join_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResponse {
    pub call_id: Option<String>,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledResponse {
    pub action_id: Uuid,
    pub call_id: String,
    pub kind: ActionKind,
    pub fire_after_secs: u64,
}

// ============================================
// Health & Stats
// ============================================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "calling-bot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Ready once the primary target resolves; other roles only fail their own actions
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let directory = state.orchestrator.directory();
    let unresolved_roles: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|role| directory.resolve(*role).is_err())
        .collect();
    let ready = !unresolved_roles.contains(&Role::PrimaryTarget);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            ready,
            users: directory.len(),
            unresolved_roles,
        }),
    )
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        uptime_secs: state.started_at.elapsed().as_secs(),
        tracked_calls: state.orchestrator.tracked_calls(),
        actions: state.orchestrator.scheduler_stats(),
    })
}

/// Follow-up actions that have not run yet
pub async fn list_actions(State(state): State<AppState>) -> Json<Vec<ScheduledAction>> {
    Json(state.orchestrator.pending_actions())
}

// ============================================
// Call Handlers
// ============================================

/// Trigger a test call; failures are reported in the body, never as a status
pub async fn make_test_call(State(state): State<AppState>) -> Json<CallResult> {
    Json(state.orchestrator.run_test_call().await)
}

pub async fn join_meeting(
    State(state): State<AppState>,
    Json(request): Json<JoinMeetingRequest>,
) -> Result<(StatusCode, Json<CallResponse>)> {
    let call = state
        .orchestrator
        .join_scheduled_meeting(&request.join_url)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CallResponse {
            call_id: call.id().map(str::to_string),
            tenant_id: call.tenant_id,
        }),
    ))
}

pub async fn invite_participant(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> (StatusCode, Json<ScheduledResponse>) {
    let task = state.orchestrator.invite_participant(&call_id);
    let action = task.action();

    (
        StatusCode::ACCEPTED,
        Json(ScheduledResponse {
            action_id: action.id,
            call_id: action.target_call_id.clone(),
            kind: action.kind,
            fire_after_secs: action.fire_after.as_secs(),
        }),
    )
}

pub async fn hang_up(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<StatusCode> {
    state.orchestrator.hang_up_call(&call_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_online_meeting(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<OnlineMeeting>)> {
    let meeting = state.orchestrator.create_online_meeting().await?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

// ============================================
// Platform Notifications
// ============================================

pub async fn callback(
    State(state): State<AppState>,
    Json(notifications): Json<CommsNotifications>,
) -> StatusCode {
    let updates = notifications.call_state_updates();
    debug!(
        notifications = notifications.value.len(),
        state_updates = updates.len(),
        "Callback received"
    );

    for update in updates {
        info!(call_id = %update.call_id, state = ?update.state, "Call state notification");
        state.orchestrator.observe_call_state(&update.call_id, update.state);
    }

    StatusCode::ACCEPTED
}
