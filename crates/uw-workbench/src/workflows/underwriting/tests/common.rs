use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::WorkbenchConfig;
use crate::workflows::underwriting::domain::{Actor, TeamRole, Underwriter, UnderwriterId, UnderwriterTier};
use crate::workflows::underwriting::lifecycle::{Position, Stage, Substage};
use crate::workflows::underwriting::notifications::{
    MemoryNotifications, Notification, NotificationKind, NotificationSink, NotifyError,
};
use crate::workflows::underwriting::scenarios;
use crate::workflows::underwriting::submission::{ExtractedRecord, Submission, SubmissionId};
use crate::workflows::underwriting::{IntakeChannel, Workbench};

pub(super) fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn position(stage: Stage, substage: Substage) -> Position {
    Position::new(stage, substage).expect("substage belongs to stage")
}

pub(super) fn staged(record: ExtractedRecord, stage: Stage, substage: Substage) -> Submission {
    Submission::new(
        SubmissionId("sub-test".to_string()),
        IntakeChannel::Email,
        record,
        90,
        at(0),
    )
    .with_position(position(stage, substage))
}

pub(super) fn acme_at(stage: Stage, substage: Substage) -> Submission {
    staged(scenarios::acme(), stage, substage)
}

pub(super) fn zenith_at(stage: Stage, substage: Substage) -> Submission {
    staged(scenarios::zenith(), stage, substage)
}

pub(super) fn reviewer() -> Actor {
    Actor::new("Priya Shah", TeamRole::Intake)
}

pub(super) fn instant_config() -> WorkbenchConfig {
    WorkbenchConfig {
        advance_delay_ms: 0,
        ..WorkbenchConfig::default()
    }
}

pub(super) fn build_workbench(config: &WorkbenchConfig) -> (Workbench, Arc<MemoryNotifications>) {
    let notifications = Arc::new(MemoryNotifications::default());
    let workbench = Workbench::new(config, scenarios::underwriters(), notifications.clone())
        .with_user("Priya Shah");
    (workbench, notifications)
}

pub(super) fn ingest_scenario(workbench: &mut Workbench, scenario: &str) -> SubmissionId {
    let item = scenarios::inbound_emails()
        .into_iter()
        .find(|item| item.scenario() == scenario)
        .expect("seeded inbound email");
    let record = scenarios::record_for(scenario).expect("seeded scenario");
    workbench.ingest(&item, record).expect("ingested")
}

pub(super) fn underwriter(id: &str, name: &str, specialty: &[&str]) -> Underwriter {
    Underwriter {
        id: UnderwriterId(id.to_string()),
        name: name.to_string(),
        email: format!("{id}@carrier.example"),
        specialty: specialty.iter().map(|value| value.to_string()).collect(),
        workload: 4,
        max_workload: 10,
        tier: UnderwriterTier::Standard,
        avg_turnaround: 2.0,
        bind_ratio: 0.6,
    }
}

/// Roster where only the second underwriter covers healthcare.
pub(super) fn healthcare_roster() -> Vec<Underwriter> {
    vec![
        underwriter("uw-101", "Retail Specialist", &["retail"]),
        underwriter("uw-102", "Healthcare Specialist", &["healthcare"]),
        underwriter("uw-103", "Manufacturing Specialist", &["manufacturing"]),
    ]
}

pub(super) fn kinds(notifications: &[Notification]) -> Vec<NotificationKind> {
    notifications.iter().map(|notification| notification.kind).collect()
}

pub(super) struct FailingSink;

impl NotificationSink for FailingSink {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("socket closed".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
