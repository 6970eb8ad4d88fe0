//! Human overrides of AI-derived fields and the recalculations they trigger.

mod dependencies;
mod path;

pub use dependencies::{DependencyTable, RecalcRule, FALLBACK_IMPACT};
pub use path::FieldPath;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::domain::{Actor, FieldValue};
use super::submission::{EventKind, FeedbackEntry, Submission};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("'{0}' is not a valid field path")]
    InvalidPath(String),
    #[error("field '{0}' not found on submission")]
    FieldNotFound(String),
    #[error("field '{path}' expects a {expected} value, got {found}")]
    InvalidFieldValue {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A requested override, as received from the UI surface.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub field_path: String,
    pub value: FieldValue,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub feedback: FeedbackEntry,
    pub rules_applied: usize,
}

/// Applies overrides and runs the dependency rules registered for the edited path.
#[derive(Debug, Clone)]
pub struct EditEngine {
    dependencies: DependencyTable,
}

impl Default for EditEngine {
    fn default() -> Self {
        Self::new(DependencyTable::standard())
    }
}

impl EditEngine {
    pub fn new(dependencies: DependencyTable) -> Self {
        Self { dependencies }
    }

    pub fn dependencies(&self) -> &DependencyTable {
        &self.dependencies
    }

    /// Override one field and record the audit trail.
    ///
    /// Path resolution and the value-kind check happen before anything is written, so an
    /// `Err` leaves the submission exactly as it was.
    pub fn apply_edit(
        &self,
        submission: &mut Submission,
        request: EditRequest,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<EditOutcome, EditError> {
        let field_path: FieldPath = request.field_path.parse()?;
        let feedback_id = submission.next_feedback_id();
        let submission_id = submission.id.clone();
        let (stage, substage) = (submission.stage(), submission.substage());

        let slot = path::resolve(submission, &field_path)
            .ok_or_else(|| EditError::FieldNotFound(field_path.to_string()))?;
        if !slot.accepts(&request.value) {
            return Err(EditError::InvalidFieldValue {
                path: field_path.to_string(),
                expected: slot.expected_kind(),
                found: request.value.kind(),
            });
        }

        let field_label = slot.label;
        let original_value = slot.value();
        let original_confidence = slot.confidence();
        slot.apply(request.value.clone(), &actor.name, at);

        let feedback = FeedbackEntry {
            id: feedback_id,
            submission_id,
            field_path: field_path.to_string(),
            field_label: field_label.to_string(),
            original_value: original_value.clone(),
            original_confidence,
            new_value: request.value.clone(),
            comment: request.comment.clone(),
            edited_by: actor.name.clone(),
            edited_at: at,
            stage,
            substage,
            downstream_impact: self.dependencies.impact_for(&field_path),
        };
        submission.record_feedback(feedback.clone());

        let mut description = format!(
            "Edited {field_label}: {original_value} -> {}",
            request.value
        );
        if !request.comment.trim().is_empty() {
            description.push_str(&format!(" ({})", request.comment.trim()));
        }
        submission.record_event(EventKind::FieldEdit, actor, description, at);

        let rules_applied = self.dependencies.recalculate(&field_path, submission);
        submission.touch(at);

        Ok(EditOutcome {
            feedback,
            rules_applied,
        })
    }
}
