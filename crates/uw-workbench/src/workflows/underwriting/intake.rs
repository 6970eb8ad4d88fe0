//! Turns inbound broker items into submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::ConfidenceEvaluator;
use super::domain::{Actor, Field, IntakeChannel, TeamRole};
use super::submission::{EventKind, ExtractedRecord, Submission, SubmissionId};

pub const PORTAL_COMPLETENESS_THRESHOLD: u8 = 80;
pub const EDI_CONFIDENCE_THRESHOLD: u8 = 85;

/// Broker-keyed insured details that replace the extracted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuredOverrides {
    pub name: String,
    pub industry: String,
    pub annual_revenue: i64,
    pub employee_count: i64,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEmail {
    pub id: String,
    pub scenario: String,
    pub from: String,
    pub subject: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSubmission {
    pub id: String,
    pub scenario: String,
    pub broker: String,
    pub metadata_completeness: u8,
    pub insured: InsuredOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdiSubmission {
    pub id: String,
    pub scenario: String,
    pub sender: String,
    pub structured_confidence: u8,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    pub insured: InsuredOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum InboundItem {
    Email(InboundEmail),
    Portal(PortalSubmission),
    Edi(EdiSubmission),
}

impl InboundItem {
    pub fn id(&self) -> &str {
        match self {
            InboundItem::Email(email) => &email.id,
            InboundItem::Portal(portal) => &portal.id,
            InboundItem::Edi(edi) => &edi.id,
        }
    }

    pub fn scenario(&self) -> &str {
        match self {
            InboundItem::Email(email) => &email.scenario,
            InboundItem::Portal(portal) => &portal.scenario,
            InboundItem::Edi(edi) => &edi.scenario,
        }
    }

    pub fn channel(&self) -> IntakeChannel {
        match self {
            InboundItem::Email(_) => IntakeChannel::Email,
            InboundItem::Portal(_) => IntakeChannel::Portal,
            InboundItem::Edi(_) => IntakeChannel::Edi,
        }
    }
}

/// Create a submission at the start of the lifecycle from an inbound item and its
/// extracted record.
pub fn ingest(
    item: &InboundItem,
    mut record: ExtractedRecord,
    id: SubmissionId,
    evaluator: &ConfidenceEvaluator,
    at: DateTime<Utc>,
) -> Submission {
    let channel = item.channel();
    let (confidence, review_reason) = match item {
        InboundItem::Email(_) => (None, None),
        InboundItem::Portal(portal) => {
            apply_overrides(&mut record, &portal.insured, [95, 90, 92, 94, 98], "portal form");
            let reason = (portal.metadata_completeness < PORTAL_COMPLETENESS_THRESHOLD)
                .then(|| "Metadata completeness below threshold".to_string());
            (Some(portal.metadata_completeness), reason)
        }
        InboundItem::Edi(edi) => {
            apply_overrides(&mut record, &edi.insured, [98, 95, 97, 98, 99], "EDI payload");
            let reason = if !edi.validation_errors.is_empty() {
                Some(format!(
                    "Validation errors: {}",
                    edi.validation_errors.join(", ")
                ))
            } else if edi.structured_confidence < EDI_CONFIDENCE_THRESHOLD {
                Some("Confidence below threshold".to_string())
            } else {
                None
            };
            (Some(edi.structured_confidence), reason)
        }
    };

    let mut submission = Submission::new(id, channel, record, 0, at);
    submission.confidence = confidence.unwrap_or_else(|| evaluator.stage_confidence(&submission));
    submission.record_event(
        EventKind::StageChange,
        &Actor::new("System", TeamRole::Intake),
        format!("Submission created from {} ingestion", channel.label()),
        at,
    );
    if let Some(reason) = review_reason {
        submission.flag_for_review(reason, at);
    }
    submission
}

fn apply_overrides(
    record: &mut ExtractedRecord,
    overrides: &InsuredOverrides,
    confidences: [u8; 5],
    source: &str,
) {
    let [name, industry, revenue, employees, state] = confidences;
    let rationale = format!("Provided directly in {source}");
    let insured = &mut record.insured;
    insured.name = Field::new(overrides.name.clone(), name, rationale.as_str());
    insured.industry = Field::new(overrides.industry.clone(), industry, rationale.as_str());
    insured.annual_revenue = Field::new(overrides.annual_revenue, revenue, rationale.as_str());
    insured.employee_count = Field::new(overrides.employee_count, employees, rationale.as_str());
    insured.state = Field::new(overrides.state.clone(), state, rationale.as_str());
}
