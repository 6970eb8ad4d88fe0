use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WorkbenchConfig;

use super::domain::{Actor, FieldValue, TeamRole, Underwriter, UnderwriterId};
use super::edits::{EditEngine, EditError, EditRequest};
use super::intake::{self, InboundItem};
use super::lifecycle::{self, Position, Stage, Transition, TransitionError};
use super::notifications::{Notification, NotificationKind, NotificationSink};
use super::progression::{AutoProgressionPolicy, Decision, PendingAdvance, PendingAdvances};
use super::report::{self, WorkbenchMetrics};
use super::submission::{ExtractedRecord, FeedbackEntry, Submission, SubmissionId};

const MAX_RECONCILE_PASSES: usize = 32;
const MAX_SETTLE_ROUNDS: usize = 64;

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("submission '{0}' not found")]
    SubmissionNotFound(SubmissionId),
    #[error("underwriter '{0}' not found")]
    UnderwriterNotFound(UnderwriterId),
    #[error("submission '{0}' already exists")]
    DuplicateSubmission(SubmissionId),
    #[error("submission '{0}' cannot leave assignment without an assigned underwriter")]
    UnassignedSubmission(SubmissionId),
    #[error("submission '{id}' is inconsistent: {reason}")]
    InconsistentSubmission { id: SubmissionId, reason: &'static str },
    #[error("the {role} team cannot {action} submissions in {stage}")]
    NotPermitted {
        role: TeamRole,
        action: &'static str,
        stage: Stage,
    },
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
}

/// Single in-memory store for submissions, the roster, and the simulated session.
///
/// Every accepted mutation cancels the submission's pending automated advance and
/// then re-runs the auto-progression policy across all submissions.
pub struct Workbench {
    submissions: BTreeMap<SubmissionId, Submission>,
    underwriters: Vec<Underwriter>,
    role: TeamRole,
    user: String,
    selected: Option<SubmissionId>,
    policy: AutoProgressionPolicy,
    edits: EditEngine,
    pending: PendingAdvances,
    advance_delay: Duration,
    notifications: Arc<dyn NotificationSink>,
    sequence: u64,
}

impl Workbench {
    pub fn new(
        config: &WorkbenchConfig,
        underwriters: Vec<Underwriter>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            submissions: BTreeMap::new(),
            underwriters,
            role: TeamRole::Intake,
            user: "Current User".to_string(),
            selected: None,
            policy: config.policy(),
            edits: EditEngine::default(),
            pending: PendingAdvances::default(),
            advance_delay: config.advance_delay(),
            notifications,
            sequence: 0,
        }
    }

    pub fn with_edit_engine(mut self, edits: EditEngine) -> Self {
        self.edits = edits;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn role(&self) -> TeamRole {
        self.role
    }

    pub fn set_role(&mut self, role: TeamRole) {
        info!(role = role.label(), "switched team role");
        self.role = role;
    }

    pub fn submission(&self, id: &SubmissionId) -> Option<&Submission> {
        self.submissions.get(id)
    }

    pub fn submissions(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.values()
    }

    /// Submissions the given team works, oldest first.
    pub fn queue_for_role(&self, role: TeamRole) -> Vec<&Submission> {
        let mut queue: Vec<&Submission> = self
            .submissions
            .values()
            .filter(|submission| role.can_view(submission.stage()))
            .collect();
        queue.sort_by_key(|submission| submission.created_at);
        queue
    }

    pub fn underwriters(&self) -> &[Underwriter] {
        &self.underwriters
    }

    pub fn selected(&self) -> Option<&Submission> {
        self.selected.as_ref().and_then(|id| self.submissions.get(id))
    }

    pub fn select_submission(&mut self, id: Option<SubmissionId>) -> Result<(), WorkbenchError> {
        if let Some(id) = &id {
            if !self.submissions.contains_key(id) {
                return Err(WorkbenchError::SubmissionNotFound(id.clone()));
            }
        }
        self.selected = id;
        Ok(())
    }

    /// Every feedback entry across submissions, in edit order.
    pub fn feedback_log(&self) -> Vec<&FeedbackEntry> {
        let mut entries: Vec<&FeedbackEntry> = self
            .submissions
            .values()
            .flat_map(|submission| submission.feedback_log())
            .collect();
        entries.sort_by(|left, right| {
            left.edited_at
                .cmp(&right.edited_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        entries
    }

    pub fn metrics(&self) -> WorkbenchMetrics {
        report::summarize(self.submissions.values(), self.pending.len())
    }

    pub fn pending_advances(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.pending.next_due()
    }

    /// Add a pre-built submission, e.g. a restored or pre-staged record.
    pub fn insert(&mut self, submission: Submission) -> Result<(), WorkbenchError> {
        if self.submissions.contains_key(&submission.id) {
            return Err(WorkbenchError::DuplicateSubmission(submission.id));
        }
        if let Some(reason) = submission.review_inconsistency() {
            return Err(WorkbenchError::InconsistentSubmission {
                id: submission.id,
                reason,
            });
        }
        debug!(submission = %submission.id, position = %submission.position(), "inserted submission");
        self.submissions.insert(submission.id.clone(), submission);
        self.reconcile(Utc::now());
        Ok(())
    }

    /// Turn an inbound item and its extracted record into a new submission.
    pub fn ingest(
        &mut self,
        item: &InboundItem,
        record: ExtractedRecord,
    ) -> Result<SubmissionId, WorkbenchError> {
        let now = Utc::now();
        let id = self.next_submission_id();
        let submission = intake::ingest(item, record, id.clone(), self.policy.evaluator(), now);

        let insured = submission.insured.name.value.clone();
        let review_reason = submission.review_reason().map(str::to_string);
        info!(submission = %id, channel = item.channel().label(), inbound = item.id(), "ingested submission");
        self.submissions.insert(id.clone(), submission);

        self.emit(
            &id,
            NotificationKind::Ingested,
            format!(
                "{insured}: submission created from {} ingestion",
                item.channel().label()
            ),
            now,
        );
        if let Some(reason) = review_reason {
            self.emit(
                &id,
                NotificationKind::ReviewRequired,
                format!("{insured} requires review: {reason}"),
                now,
            );
        }

        self.reconcile(now);
        Ok(id)
    }

    /// Apply a human override to one field of a submission.
    pub fn edit_field(
        &mut self,
        id: &SubmissionId,
        field_path: &str,
        value: FieldValue,
        comment: &str,
    ) -> Result<FeedbackEntry, WorkbenchError> {
        let now = Utc::now();
        let actor = self.actor();
        let submission = self
            .submissions
            .get_mut(id)
            .ok_or_else(|| WorkbenchError::SubmissionNotFound(id.clone()))?;
        ensure_permitted(self.role, "edit", submission.stage())?;

        let request = EditRequest {
            field_path: field_path.to_string(),
            value,
            comment: comment.to_string(),
        };
        let outcome = self.edits.apply_edit(submission, request, &actor, now)?;
        submission.confidence = self.policy.evaluator().stage_confidence(submission);

        let feedback = outcome.feedback;
        info!(
            submission = %id,
            field = %feedback.field_path,
            rules = outcome.rules_applied,
            "applied field override"
        );
        let message = format!(
            "{}: {} changed from {} to {}",
            submission.insured.name.value,
            feedback.field_label,
            feedback.original_value,
            feedback.new_value
        );

        self.pending.cancel(id);
        self.emit(id, NotificationKind::FieldEdited, message, now);
        self.reconcile(now);
        Ok(feedback)
    }

    /// Manually move a submission one step forward. A human advance also clears any
    /// pending review flag.
    pub fn advance_substage(&mut self, id: &SubmissionId) -> Result<Transition, WorkbenchError> {
        let now = Utc::now();
        let actor = self.actor();
        let submission = self
            .submissions
            .get_mut(id)
            .ok_or_else(|| WorkbenchError::SubmissionNotFound(id.clone()))?;
        ensure_permitted(self.role, "advance", submission.stage())?;
        if submission.position() == Position::end_of(Stage::Assignment)
            && submission.assigned_underwriter().is_none()
        {
            return Err(WorkbenchError::UnassignedSubmission(id.clone()));
        }

        let transition = lifecycle::advance(submission, &actor, now)?;
        submission.clear_review();
        submission.confidence = self.policy.evaluator().stage_confidence(submission);
        let insured = submission.insured.name.value.clone();

        self.pending.cancel(id);
        self.announce(id, &insured, &transition, now);
        self.reconcile(now);
        Ok(transition)
    }

    pub fn assign_underwriter(
        &mut self,
        id: &SubmissionId,
        underwriter_id: &UnderwriterId,
    ) -> Result<(), WorkbenchError> {
        let now = Utc::now();
        let actor = self.actor();
        let underwriter_name = self.underwriter_name(underwriter_id)?;
        let submission = self
            .submissions
            .get_mut(id)
            .ok_or_else(|| WorkbenchError::SubmissionNotFound(id.clone()))?;
        ensure_permitted(self.role, "assign", submission.stage())?;

        submission.assign(underwriter_id.clone(), &underwriter_name, &actor, now);
        let message = format!(
            "{}: assigned to {underwriter_name}",
            submission.insured.name.value
        );

        self.pending.cancel(id);
        self.emit(id, NotificationKind::Assigned, message, now);
        self.reconcile(now);
        Ok(())
    }

    /// Replace the roster. Roster changes can unblock auto-assignment.
    pub fn update_roster(&mut self, underwriters: Vec<Underwriter>) {
        self.underwriters = underwriters;
        self.reconcile(Utc::now());
    }

    /// Fire every pending advance due at or before `now`.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> usize {
        let due = self.pending.take_due(now);
        if due.is_empty() {
            return 0;
        }
        let fired = due.iter().filter(|entry| self.fire(entry, now)).count();
        self.reconcile(now);
        fired
    }

    /// Fire pending advances without waiting until nothing is left to do.
    pub fn settle(&mut self) -> usize {
        let mut fired = 0;
        for _ in 0..MAX_SETTLE_ROUNDS {
            let due = self.pending.drain();
            if due.is_empty() {
                return fired;
            }
            let now = Utc::now();
            fired += due.iter().filter(|entry| self.fire(entry, now)).count();
            self.reconcile(now);
        }
        warn!(pending = self.pending.len(), "auto-progression did not settle");
        fired
    }

    fn actor(&self) -> Actor {
        Actor::new(self.user.clone(), self.role)
    }

    fn next_submission_id(&mut self) -> SubmissionId {
        loop {
            self.sequence += 1;
            let id = SubmissionId(format!("sub-{:04}", self.sequence));
            if !self.submissions.contains_key(&id) {
                return id;
            }
        }
    }

    fn underwriter_name(&self, id: &UnderwriterId) -> Result<String, WorkbenchError> {
        self.underwriters
            .iter()
            .find(|underwriter| &underwriter.id == id)
            .map(|underwriter| underwriter.name.clone())
            .ok_or_else(|| WorkbenchError::UnderwriterNotFound(id.clone()))
    }

    fn emit(&self, id: &SubmissionId, kind: NotificationKind, message: String, at: DateTime<Utc>) {
        let notification = Notification {
            submission_id: id.clone(),
            kind,
            message,
            at,
        };
        if let Err(err) = self.notifications.notify(notification) {
            warn!(submission = %id, error = %err, "notification delivery failed");
        }
    }

    fn announce(&self, id: &SubmissionId, insured: &str, transition: &Transition, at: DateTime<Utc>) {
        let kind = if transition.is_stage_change() {
            NotificationKind::StageChanged
        } else {
            NotificationKind::SubstageChanged
        };
        self.emit(id, kind, format!("{insured}: {}", transition.describe()), at);
    }

    /// Re-run the policy until no submission changes state, skipping submissions that
    /// already have an advance in flight.
    fn reconcile(&mut self, now: DateTime<Utc>) {
        for _ in 0..MAX_RECONCILE_PASSES {
            let ids: Vec<SubmissionId> = self.submissions.keys().cloned().collect();
            let mut changed = false;
            for id in ids {
                if self.pending.is_in_flight(&id) {
                    continue;
                }
                match self.apply_policy(&id, now) {
                    Ok(applied) => changed |= applied,
                    Err(err) => {
                        warn!(submission = %id, error = %err, "auto-progression evaluation failed")
                    }
                }
            }
            if !changed {
                return;
            }
        }
        warn!("auto-progression evaluation did not converge");
    }

    fn apply_policy(&mut self, id: &SubmissionId, now: DateTime<Utc>) -> Result<bool, WorkbenchError> {
        let submission = self
            .submissions
            .get(id)
            .ok_or_else(|| WorkbenchError::SubmissionNotFound(id.clone()))?;

        match self.policy.evaluate(submission, &self.underwriters) {
            Decision::Hold => Ok(false),
            Decision::Advance => {
                let due_at = now + self.advance_delay;
                if self.pending.schedule(id.clone(), submission.revision(), due_at) {
                    debug!(submission = %id, position = %submission.position(), %due_at, "scheduled advance");
                }
                Ok(false)
            }
            Decision::AssignAndAdvance(underwriter_id) => {
                let underwriter_name = self.underwriter_name(&underwriter_id)?;
                let submission = self
                    .submissions
                    .get_mut(id)
                    .ok_or_else(|| WorkbenchError::SubmissionNotFound(id.clone()))?;
                let actor = Actor::new("Assignment Team", TeamRole::Assignment);
                submission.assign(underwriter_id, &underwriter_name, &actor, now);
                submission.confidence = self.policy.evaluator().stage_confidence(submission);
                let message = format!(
                    "{}: auto-assigned to {underwriter_name}",
                    submission.insured.name.value
                );
                info!(submission = %id, underwriter = %underwriter_name, "auto-assigned underwriter");
                self.emit(id, NotificationKind::AutoAssigned, message, now);
                Ok(true)
            }
            Decision::FlagForReview(reason) => {
                let submission = self
                    .submissions
                    .get_mut(id)
                    .ok_or_else(|| WorkbenchError::SubmissionNotFound(id.clone()))?;
                submission.flag_for_review(reason.clone(), now);
                let message = format!(
                    "{} requires review: {reason}",
                    submission.insured.name.value
                );
                info!(submission = %id, %reason, "flagged for human review");
                self.emit(id, NotificationKind::ReviewRequired, message, now);
                Ok(true)
            }
        }
    }

    /// Carry out one deferred advance if the submission is unchanged since scheduling.
    fn fire(&mut self, entry: &PendingAdvance, now: DateTime<Utc>) -> bool {
        let id = &entry.submission_id;
        let Some(submission) = self.submissions.get(id) else {
            debug!(submission = %id, "dropping advance for missing submission");
            return false;
        };
        if submission.revision() != entry.revision {
            debug!(submission = %id, "dropping stale advance");
            return false;
        }
        if self.policy.evaluate(submission, &self.underwriters) != Decision::Advance {
            debug!(submission = %id, "dropping advance no longer warranted");
            return false;
        }

        let actor = Actor::system(submission.stage());
        let Some(submission) = self.submissions.get_mut(id) else {
            return false;
        };
        match lifecycle::advance(submission, &actor, now) {
            Ok(transition) => {
                submission.confidence = self.policy.evaluator().stage_confidence(submission);
                let insured = submission.insured.name.value.clone();
                self.announce(id, &insured, &transition, now);
                true
            }
            Err(err) => {
                warn!(submission = %id, error = %err, "scheduled advance rejected");
                false
            }
        }
    }
}

fn ensure_permitted(role: TeamRole, action: &'static str, stage: Stage) -> Result<(), WorkbenchError> {
    if role.can_edit(stage) {
        Ok(())
    } else {
        Err(WorkbenchError::NotPermitted {
            role,
            action,
            stage,
        })
    }
}
