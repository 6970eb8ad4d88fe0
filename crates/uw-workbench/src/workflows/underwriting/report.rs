use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use super::lifecycle::Stage;
use super::submission::{FeedbackEntry, Submission};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub label: &'static str,
    pub submissions: usize,
    pub average_confidence: Option<u8>,
    pub awaiting_review: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideCount {
    pub field_label: String,
    pub overrides: usize,
}

/// Operations view across the whole workbench.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkbenchMetrics {
    pub total_submissions: usize,
    pub stages: Vec<StageSummary>,
    pub pending_review: usize,
    pub scheduled_advances: usize,
    pub feedback_entries: usize,
    pub overrides_by_field: Vec<OverrideCount>,
}

pub fn summarize<'a>(
    submissions: impl Iterator<Item = &'a Submission>,
    scheduled_advances: usize,
) -> WorkbenchMetrics {
    let submissions: Vec<&Submission> = submissions.collect();

    let stages = Stage::ordered()
        .into_iter()
        .map(|stage| {
            let in_stage: Vec<&&Submission> = submissions
                .iter()
                .filter(|submission| submission.stage() == stage)
                .collect();
            let average_confidence = if in_stage.is_empty() {
                None
            } else {
                let total: u32 = in_stage
                    .iter()
                    .map(|submission| u32::from(submission.confidence))
                    .sum();
                Some((f64::from(total) / in_stage.len() as f64).round() as u8)
            };
            StageSummary {
                stage,
                label: stage.label(),
                submissions: in_stage.len(),
                average_confidence,
                awaiting_review: in_stage
                    .iter()
                    .filter(|submission| submission.requires_human_review())
                    .count(),
            }
        })
        .collect();

    let mut overrides: BTreeMap<String, usize> = BTreeMap::new();
    let mut feedback_entries = 0;
    for entry in submissions.iter().flat_map(|submission| submission.feedback_log()) {
        feedback_entries += 1;
        *overrides.entry(entry.field_label.clone()).or_default() += 1;
    }
    let mut overrides_by_field: Vec<OverrideCount> = overrides
        .into_iter()
        .map(|(field_label, overrides)| OverrideCount {
            field_label,
            overrides,
        })
        .collect();
    overrides_by_field.sort_by(|left, right| {
        right
            .overrides
            .cmp(&left.overrides)
            .then_with(|| left.field_label.cmp(&right.field_label))
    });

    WorkbenchMetrics {
        total_submissions: submissions.len(),
        stages,
        pending_review: submissions
            .iter()
            .filter(|submission| submission.requires_human_review())
            .count(),
        scheduled_advances,
        feedback_entries,
        overrides_by_field,
    }
}

#[derive(Serialize)]
struct FeedbackRow<'a> {
    id: &'a str,
    submission_id: &'a str,
    stage: &'static str,
    substage: &'static str,
    field_path: &'a str,
    field_label: &'a str,
    original_value: String,
    original_confidence: u8,
    new_value: String,
    edited_by: &'a str,
    edited_at: String,
    comment: &'a str,
    downstream_impact: String,
}

/// Write the feedback log as CSV, one row per override.
pub fn write_feedback_csv<'a, W: Write>(
    entries: impl IntoIterator<Item = &'a FeedbackEntry>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in entries {
        csv_writer.serialize(FeedbackRow {
            id: &entry.id,
            submission_id: &entry.submission_id.0,
            stage: entry.stage.as_str(),
            substage: entry.substage.as_str(),
            field_path: &entry.field_path,
            field_label: &entry.field_label,
            original_value: entry.original_value.to_string(),
            original_confidence: entry.original_confidence,
            new_value: entry.new_value.to_string(),
            edited_by: &entry.edited_by,
            edited_at: entry.edited_at.to_rfc3339(),
            comment: &entry.comment,
            downstream_impact: entry.downstream_impact.join("; "),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
