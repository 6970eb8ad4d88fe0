use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::domain::{FieldValue, TeamRole, UnderwriterId};
use super::lifecycle::{Stage, Substage, Transition};
use super::notifications::{MemoryNotifications, Notification};
use super::report::{self, WorkbenchMetrics};
use super::submission::{FeedbackEntry, Submission, SubmissionId};
use super::workbench::{Workbench, WorkbenchError};

/// Shared handle on the workbench plus the notification buffer the UI polls.
#[derive(Clone)]
pub struct WorkbenchState {
    workbench: Arc<Mutex<Workbench>>,
    notifications: Arc<MemoryNotifications>,
}

impl WorkbenchState {
    pub fn new(workbench: Workbench, notifications: Arc<MemoryNotifications>) -> Self {
        Self {
            workbench: Arc::new(Mutex::new(workbench)),
            notifications,
        }
    }

    /// Run `action` with exclusive access to the workbench.
    pub fn with_workbench<T>(
        &self,
        action: impl FnOnce(&mut Workbench) -> T,
    ) -> Result<T, AppError> {
        let mut guard = self
            .workbench
            .lock()
            .map_err(|_| AppError::StateUnavailable)?;
        Ok(action(&mut guard))
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.events()
    }
}

/// Row shown in a team queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionSummary {
    pub id: SubmissionId,
    pub insured: String,
    pub industry: String,
    pub stage: Stage,
    pub substage: Substage,
    pub confidence: u8,
    pub requires_human_review: bool,
    pub review_reason: Option<String>,
    pub assigned_underwriter: Option<UnderwriterId>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Submission> for SubmissionSummary {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id.clone(),
            insured: submission.insured.name.value.clone(),
            industry: submission.insured.industry.value.clone(),
            stage: submission.stage(),
            substage: submission.substage(),
            confidence: submission.confidence,
            requires_human_review: submission.requires_human_review(),
            review_reason: submission.review_reason().map(str::to_string),
            assigned_underwriter: submission.assigned_underwriter().cloned(),
            updated_at: submission.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub role: Option<TeamRole>,
}

#[derive(Debug, Deserialize)]
pub struct EditFieldBody {
    pub field_path: String,
    pub value: FieldValue,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    pub underwriter_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: TeamRole,
}

#[derive(Debug, Deserialize)]
pub struct SelectionBody {
    pub submission_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub role: TeamRole,
    pub selected: Option<SubmissionId>,
}

/// Router exposing the workbench's UI event surface.
pub fn workbench_router(state: WorkbenchState) -> Router {
    Router::new()
        .route("/api/v1/submissions", get(list_handler))
        .route("/api/v1/submissions/:submission_id", get(detail_handler))
        .route(
            "/api/v1/submissions/:submission_id/fields",
            post(edit_handler),
        )
        .route(
            "/api/v1/submissions/:submission_id/advance",
            post(advance_handler),
        )
        .route(
            "/api/v1/submissions/:submission_id/assign",
            post(assign_handler),
        )
        .route("/api/v1/session/role", put(role_handler))
        .route("/api/v1/session/selection", put(selection_handler))
        .route("/api/v1/notifications", get(notifications_handler))
        .route("/api/v1/workbench/metrics", get(metrics_handler))
        .route("/api/v1/feedback.csv", get(feedback_csv_handler))
        .with_state(state)
}

pub(crate) async fn list_handler(
    State(state): State<WorkbenchState>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Vec<SubmissionSummary>>, AppError> {
    let rows: Vec<SubmissionSummary> = state.with_workbench(|workbench| match query.role {
        Some(role) => workbench
            .queue_for_role(role)
            .into_iter()
            .map(SubmissionSummary::from)
            .collect(),
        None => workbench.submissions().map(SubmissionSummary::from).collect(),
    })?;
    Ok(Json(rows))
}

pub(crate) async fn detail_handler(
    State(state): State<WorkbenchState>,
    Path(submission_id): Path<String>,
) -> Result<Json<Submission>, AppError> {
    let id = SubmissionId(submission_id);
    let submission = state.with_workbench(|workbench| workbench.submission(&id).cloned())?;
    submission
        .map(Json)
        .ok_or_else(|| AppError::from(WorkbenchError::SubmissionNotFound(id)))
}

pub(crate) async fn edit_handler(
    State(state): State<WorkbenchState>,
    Path(submission_id): Path<String>,
    Json(body): Json<EditFieldBody>,
) -> Result<Json<FeedbackEntry>, AppError> {
    let id = SubmissionId(submission_id);
    let feedback = state.with_workbench(|workbench| {
        workbench.edit_field(&id, &body.field_path, body.value, &body.comment)
    })??;
    Ok(Json(feedback))
}

pub(crate) async fn advance_handler(
    State(state): State<WorkbenchState>,
    Path(submission_id): Path<String>,
) -> Result<Json<Transition>, AppError> {
    let id = SubmissionId(submission_id);
    let transition = state.with_workbench(|workbench| workbench.advance_substage(&id))??;
    Ok(Json(transition))
}

pub(crate) async fn assign_handler(
    State(state): State<WorkbenchState>,
    Path(submission_id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<SubmissionSummary>, AppError> {
    let id = SubmissionId(submission_id);
    let underwriter = UnderwriterId(body.underwriter_id);
    let summary = state.with_workbench(|workbench| {
        workbench.assign_underwriter(&id, &underwriter)?;
        workbench
            .submission(&id)
            .map(SubmissionSummary::from)
            .ok_or_else(|| WorkbenchError::SubmissionNotFound(id.clone()))
    })??;
    Ok(Json(summary))
}

fn session_view(workbench: &Workbench) -> SessionView {
    SessionView {
        role: workbench.role(),
        selected: workbench.selected().map(|submission| submission.id.clone()),
    }
}

pub(crate) async fn role_handler(
    State(state): State<WorkbenchState>,
    Json(body): Json<RoleBody>,
) -> Result<Json<SessionView>, AppError> {
    let view = state.with_workbench(|workbench| {
        workbench.set_role(body.role);
        session_view(workbench)
    })?;
    Ok(Json(view))
}

pub(crate) async fn selection_handler(
    State(state): State<WorkbenchState>,
    Json(body): Json<SelectionBody>,
) -> Result<Json<SessionView>, AppError> {
    let selection = body.submission_id.map(SubmissionId);
    let view = state.with_workbench(|workbench| {
        workbench.select_submission(selection)?;
        Ok::<_, WorkbenchError>(session_view(workbench))
    })??;
    Ok(Json(view))
}

pub(crate) async fn notifications_handler(
    State(state): State<WorkbenchState>,
) -> Json<Vec<Notification>> {
    Json(state.notifications())
}

pub(crate) async fn metrics_handler(
    State(state): State<WorkbenchState>,
) -> Result<Json<WorkbenchMetrics>, AppError> {
    let metrics = state.with_workbench(|workbench| workbench.metrics())?;
    Ok(Json(metrics))
}

pub(crate) async fn feedback_csv_handler(
    State(state): State<WorkbenchState>,
) -> Result<Response, AppError> {
    let body = state.with_workbench(|workbench| {
        let mut buffer = Vec::new();
        report::write_feedback_csv(workbench.feedback_log(), &mut buffer).map(|_| buffer)
    })??;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response())
}
