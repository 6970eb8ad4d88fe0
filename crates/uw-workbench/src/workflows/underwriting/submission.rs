use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Actor, CoverageRecommendation, CyberControls, FieldValue, IntakeChannel, Insured, Quote,
    RiskProfile, TeamRole, UnderwriterId,
};
use super::lifecycle::{Position, Stage, Substage};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StageChange,
    SubstageChange,
    FieldEdit,
    DocumentUpload,
    Comment,
    Assignment,
    Approval,
    Decline,
}

impl EventKind {
    pub const fn label(self) -> &'static str {
        match self {
            EventKind::StageChange => "stage_change",
            EventKind::SubstageChange => "substage_change",
            EventKind::FieldEdit => "field_edit",
            EventKind::DocumentUpload => "document_upload",
            EventKind::Comment => "comment",
            EventKind::Assignment => "assignment",
            EventKind::Approval => "approval",
            EventKind::Decline => "decline",
        }
    }
}

/// Immutable entry in a submission's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub actor: String,
    pub actor_role: TeamRole,
    pub description: String,
}

/// Audit record of a human override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub id: String,
    pub submission_id: SubmissionId,
    pub field_path: String,
    pub field_label: String,
    pub original_value: FieldValue,
    pub original_confidence: u8,
    pub new_value: FieldValue,
    #[serde(rename = "feedbackComment")]
    pub comment: String,
    pub edited_by: String,
    pub edited_at: DateTime<Utc>,
    pub stage: Stage,
    pub substage: Substage,
    pub downstream_impact: Vec<String>,
}

/// The unit of work flowing through the lifecycle.
///
/// Placement, history, the review flag, and the revision counter are private so that
/// every change goes through the lifecycle, edit, and policy operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub scenario_id: String,
    pub source: IntakeChannel,
    #[serde(flatten)]
    position: Position,
    pub insured: Insured,
    pub controls: CyberControls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_profile: Option<RiskProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverages: Option<Vec<CoverageRecommendation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assigned_underwriter: Option<UnderwriterId>,
    pub created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    history: Vec<SubmissionEvent>,
    #[serde(default)]
    feedback_log: Vec<FeedbackEntry>,
    pub confidence: u8,
    #[serde(default)]
    requires_human_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    review_reason: Option<String>,
    #[serde(default)]
    revision: u64,
}

/// Model output for one inbound item, before it becomes a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub scenario_id: String,
    pub insured: Insured,
    pub controls: CyberControls,
    pub risk_profile: Option<RiskProfile>,
    pub coverages: Option<Vec<CoverageRecommendation>>,
    pub quote: Option<Quote>,
}

impl Submission {
    pub fn new(
        id: SubmissionId,
        source: IntakeChannel,
        record: ExtractedRecord,
        confidence: u8,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            scenario_id: record.scenario_id,
            source,
            position: Position::initial(),
            insured: record.insured,
            controls: record.controls,
            risk_profile: record.risk_profile,
            coverages: record.coverages,
            quote: record.quote,
            assigned_underwriter: None,
            created_at: at,
            updated_at: at,
            history: Vec::new(),
            feedback_log: Vec::new(),
            confidence: confidence.min(100),
            requires_human_review: false,
            review_reason: None,
            revision: 0,
        }
    }

    /// Place a pre-staged record, e.g. a seeded or restored submission.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn stage(&self) -> Stage {
        self.position.stage()
    }

    pub fn substage(&self) -> Substage {
        self.position.substage()
    }

    pub fn assigned_underwriter(&self) -> Option<&UnderwriterId> {
        self.assigned_underwriter.as_ref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn history(&self) -> &[SubmissionEvent] {
        &self.history
    }

    pub fn feedback_log(&self) -> &[FeedbackEntry] {
        &self.feedback_log
    }

    pub fn requires_human_review(&self) -> bool {
        self.requires_human_review
    }

    pub fn review_reason(&self) -> Option<&str> {
        self.review_reason.as_deref()
    }

    /// Bumped on every accepted mutation; pending automated advances compare against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn move_to(&mut self, position: Position, at: DateTime<Utc>) {
        self.position = position;
        self.touch(at);
    }

    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.revision += 1;
    }

    pub(crate) fn record_event(
        &mut self,
        kind: EventKind,
        actor: &Actor,
        description: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        let id = format!("evt-{}-{:04}", self.id, self.history.len() + 1);
        self.history.push(SubmissionEvent {
            id,
            timestamp: at,
            kind,
            actor: actor.name.clone(),
            actor_role: actor.role,
            description: description.into(),
        });
    }

    pub(crate) fn next_feedback_id(&self) -> String {
        format!("fb-{}-{:04}", self.id, self.feedback_log.len() + 1)
    }

    pub(crate) fn record_feedback(&mut self, entry: FeedbackEntry) {
        self.feedback_log.push(entry);
    }

    pub(crate) fn assign(
        &mut self,
        underwriter: UnderwriterId,
        underwriter_name: &str,
        actor: &Actor,
        at: DateTime<Utc>,
    ) {
        self.assigned_underwriter = Some(underwriter);
        self.record_event(
            EventKind::Assignment,
            actor,
            format!("Assigned to {underwriter_name}"),
            at,
        );
        self.touch(at);
    }

    /// Set the review flag. A blank reason is replaced so the flag never lacks one.
    pub(crate) fn flag_for_review(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            "Manual review requested".to_string()
        } else {
            reason
        };
        self.requires_human_review = true;
        self.review_reason = Some(reason);
        self.touch(at);
    }

    /// Why the review flag and reason disagree, if they do.
    pub(crate) fn review_inconsistency(&self) -> Option<&'static str> {
        let has_reason = self
            .review_reason
            .as_deref()
            .is_some_and(|reason| !reason.trim().is_empty());
        match (self.requires_human_review, has_reason) {
            (true, false) => Some("flagged for review without a reason"),
            (false, _) if self.review_reason.is_some() => {
                Some("review reason present on an unflagged submission")
            }
            _ => None,
        }
    }

    pub(crate) fn clear_review(&mut self) {
        self.requires_human_review = false;
        self.review_reason = None;
    }
}
