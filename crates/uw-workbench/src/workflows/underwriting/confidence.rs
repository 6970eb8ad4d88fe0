use serde::Serialize;

use super::lifecycle::Stage;
use super::submission::Submission;

/// Fields below this confidence block automated progression.
pub const DEFAULT_REVIEW_THRESHOLD: u8 = 70;

/// A monitored field whose confidence fell under the review threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowConfidenceFinding {
    pub field_path: &'static str,
    pub label: &'static str,
    pub confidence: u8,
    pub reason: String,
}

/// Scores how trustworthy the model output is for a submission's current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceEvaluator {
    threshold: u8,
}

impl Default for ConfidenceEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_REVIEW_THRESHOLD)
    }
}

impl ConfidenceEvaluator {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Rounded mean confidence of the fields that matter to the submission's stage.
    ///
    /// Stages without a field subset, or whose subset is not populated yet, fall back
    /// to the stored submission confidence.
    pub fn stage_confidence(&self, submission: &Submission) -> u8 {
        match stage_field_confidences(submission) {
            Some(values) if !values.is_empty() => rounded_mean(&values),
            _ => submission.confidence,
        }
    }

    /// First monitored field under the threshold, checked in a fixed order.
    pub fn low_confidence_check(&self, submission: &Submission) -> Option<LowConfidenceFinding> {
        monitored_fields(submission)
            .into_iter()
            .find(|(_, _, confidence)| *confidence < self.threshold)
            .map(|(field_path, label, confidence)| LowConfidenceFinding {
                field_path,
                label,
                confidence,
                reason: format!(
                    "Low confidence on {label} ({confidence}%) - requires manual verification"
                ),
            })
    }
}

fn monitored_fields(submission: &Submission) -> Vec<(&'static str, &'static str, u8)> {
    let mut fields = vec![
        (
            "controls.hasEDR",
            "EDR status",
            submission.controls.has_edr.confidence,
        ),
        (
            "controls.hasMFA",
            "MFA status",
            submission.controls.has_mfa.confidence,
        ),
        (
            "insured.annualRevenue",
            "Annual revenue",
            submission.insured.annual_revenue.confidence,
        ),
    ];
    if let Some(profile) = &submission.risk_profile {
        fields.push((
            "riskProfile.overallScore",
            "Risk score",
            profile.overall_score.confidence,
        ));
    }
    fields
}

fn stage_field_confidences(submission: &Submission) -> Option<Vec<u8>> {
    let insured = &submission.insured;
    let controls = &submission.controls;
    match submission.stage() {
        Stage::Submission | Stage::DataCollection => Some(vec![
            insured.name.confidence,
            insured.industry.confidence,
            insured.annual_revenue.confidence,
            controls.has_edr.confidence,
            controls.has_mfa.confidence,
            controls.has_soc2.confidence,
        ]),
        Stage::RiskAssessment => submission.risk_profile.as_ref().map(|profile| {
            vec![
                profile.overall_score.confidence,
                profile.industry_risk.confidence,
                profile.controls_score.confidence,
                profile.threat_exposure.confidence,
            ]
        }),
        Stage::Pricing | Stage::Quotation => submission.quote.as_ref().map(|quote| {
            vec![
                quote.pricing.base_premium.confidence,
                quote.pricing.final_premium.confidence,
                quote.pricing.rate_per_million.confidence,
                quote.pricing.total_cost.confidence,
            ]
        }),
        Stage::Assignment | Stage::Binding => None,
    }
}

fn rounded_mean(values: &[u8]) -> u8 {
    let sum: u32 = values.iter().map(|value| u32::from(*value)).sum();
    let mean = f64::from(sum) / values.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}
