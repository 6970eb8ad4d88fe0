//! Automated progression of submissions through the lifecycle.
//!
//! The policy is a pure function of a submission and the underwriter roster. The
//! workbench store applies its decisions, deferring plain advances through
//! [`PendingAdvances`] so that a later mutation can still cancel them.

mod matcher;
mod scheduler;

pub use matcher::SpecialtyMatch;
pub use scheduler::{PendingAdvance, PendingAdvances};

use serde::Serialize;

use super::confidence::ConfidenceEvaluator;
use super::domain::{Underwriter, UnderwriterId};
use super::lifecycle::Stage;
use super::submission::Submission;

pub const DEFAULT_AUTO_ASSIGN_THRESHOLD: u8 = 85;

/// What the policy wants to happen to a submission next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "detail", rename_all = "snake_case")]
pub enum Decision {
    Hold,
    Advance,
    AssignAndAdvance(UnderwriterId),
    FlagForReview(String),
}

#[derive(Debug, Clone, Copy)]
pub struct AutoProgressionPolicy {
    evaluator: ConfidenceEvaluator,
    auto_assign_threshold: u8,
    specialty_match: SpecialtyMatch,
}

impl Default for AutoProgressionPolicy {
    fn default() -> Self {
        Self::new(
            ConfidenceEvaluator::default(),
            DEFAULT_AUTO_ASSIGN_THRESHOLD,
            SpecialtyMatch::default(),
        )
    }
}

impl AutoProgressionPolicy {
    pub fn new(
        evaluator: ConfidenceEvaluator,
        auto_assign_threshold: u8,
        specialty_match: SpecialtyMatch,
    ) -> Self {
        Self {
            evaluator,
            auto_assign_threshold,
            specialty_match,
        }
    }

    pub fn evaluator(&self) -> &ConfidenceEvaluator {
        &self.evaluator
    }

    pub fn specialty_match(&self) -> SpecialtyMatch {
        self.specialty_match
    }

    pub fn evaluate(&self, submission: &Submission, roster: &[Underwriter]) -> Decision {
        let position = submission.position();
        if submission.requires_human_review() || position.is_terminal() {
            return Decision::Hold;
        }

        let unassigned =
            position.stage() == Stage::Assignment && submission.assigned_underwriter().is_none();
        if unassigned {
            if let Some(underwriter) = self.auto_assignee(submission, roster) {
                return Decision::AssignAndAdvance(underwriter.id.clone());
            }
        }

        let finding = self.evaluator.low_confidence_check(submission);

        if !position.is_stage_complete() {
            return if finding.is_none() {
                Decision::Advance
            } else {
                Decision::Hold
            };
        }

        if let Some(finding) = finding {
            return Decision::FlagForReview(finding.reason);
        }

        if unassigned {
            return Decision::FlagForReview(
                "No underwriter assigned - manual assignment required".to_string(),
            );
        }

        let stage_confidence = self.evaluator.stage_confidence(submission);
        if stage_confidence >= self.evaluator.threshold() {
            Decision::Advance
        } else {
            Decision::FlagForReview(format!(
                "Stage confidence {stage_confidence}% is below the {}% review threshold",
                self.evaluator.threshold()
            ))
        }
    }

    fn auto_assignee<'a>(
        &self,
        submission: &Submission,
        roster: &'a [Underwriter],
    ) -> Option<&'a Underwriter> {
        if submission.confidence < self.auto_assign_threshold {
            return None;
        }
        self.specialty_match
            .first_match(&submission.insured.industry.value, roster)
    }
}
