use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::workflows::underwriting::submission::SubmissionId;

/// A deferred automated advance for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdvance {
    pub submission_id: SubmissionId,
    /// Submission revision observed when the advance was scheduled.
    pub revision: u64,
    pub due_at: DateTime<Utc>,
}

/// Deferred advances keyed by submission. An entry doubles as the in-flight marker.
#[derive(Debug, Default)]
pub struct PendingAdvances {
    entries: BTreeMap<SubmissionId, PendingAdvance>,
}

impl PendingAdvances {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_in_flight(&self, submission_id: &SubmissionId) -> bool {
        self.entries.contains_key(submission_id)
    }

    /// Returns `false` without replacing anything when the submission is already in flight.
    pub fn schedule(
        &mut self,
        submission_id: SubmissionId,
        revision: u64,
        due_at: DateTime<Utc>,
    ) -> bool {
        if self.is_in_flight(&submission_id) {
            return false;
        }
        self.entries.insert(
            submission_id.clone(),
            PendingAdvance {
                submission_id,
                revision,
                due_at,
            },
        );
        true
    }

    pub fn cancel(&mut self, submission_id: &SubmissionId) -> Option<PendingAdvance> {
        self.entries.remove(submission_id)
    }

    /// Remove and return every entry due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<PendingAdvance> {
        let due_ids: Vec<SubmissionId> = self
            .entries
            .values()
            .filter(|entry| entry.due_at <= now)
            .map(|entry| entry.submission_id.clone())
            .collect();
        let mut due: Vec<PendingAdvance> = due_ids
            .iter()
            .filter_map(|id| self.entries.remove(id))
            .collect();
        due.sort_by(|left, right| left.due_at.cmp(&right.due_at));
        due
    }

    /// Remove and return every entry regardless of due time.
    pub fn drain(&mut self) -> Vec<PendingAdvance> {
        let mut all: Vec<PendingAdvance> = std::mem::take(&mut self.entries).into_values().collect();
        all.sort_by(|left, right| left.due_at.cmp(&right.due_at));
        all
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|entry| entry.due_at).min()
    }
}
