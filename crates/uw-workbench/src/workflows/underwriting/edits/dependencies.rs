use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::workflows::underwriting::domain::PriceAdjustment;
use crate::workflows::underwriting::submission::Submission;

use super::path::FieldPath;

pub const FALLBACK_IMPACT: &str = "Downstream calculations may be affected";

const EDR_LOADING_REASON: &str = "EDR not confirmed";
const EDR_LOADING_AMOUNT: i64 = 8_400;
const EDR_LOADING_PERCENTAGE: i32 = 20;
const EDR_CONTROLS_DELTA: i64 = 15;
const EDR_OVERALL_DELTA: i64 = 10;

/// Re-derives dependent values after a field edit.
pub type RecalcRule = Arc<dyn Fn(&mut Submission) + Send + Sync>;

/// Impact labels and recompute rules keyed by field path.
#[derive(Clone, Default)]
pub struct DependencyTable {
    impacts: BTreeMap<String, Vec<String>>,
    rules: BTreeMap<String, Vec<RecalcRule>>,
}

impl fmt::Debug for DependencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule_counts: BTreeMap<&str, usize> = self
            .rules
            .iter()
            .map(|(path, rules)| (path.as_str(), rules.len()))
            .collect();
        f.debug_struct("DependencyTable")
            .field("impacts", &self.impacts)
            .field("rules", &rule_counts)
            .finish()
    }
}

impl DependencyTable {
    /// The impact catalogue shown to reviewers and the EDR recalculation.
    pub fn standard() -> Self {
        let mut table = Self::default();
        let impacts: [(&str, &[&str]); 9] = [
            (
                "controls.hasEDR",
                &[
                    "Risk Score",
                    "Controls Score",
                    "Pricing Loadings",
                    "Coverage Conditions",
                ],
            ),
            ("controls.hasMFA", &["Controls Score", "Risk Score"]),
            ("controls.hasSOC2", &["Controls Score", "Pricing Credits"]),
            ("insured.annualRevenue", &["Base Premium", "Rate per Million"]),
            ("insured.employeeCount", &["Base Premium", "Risk Score"]),
            (
                "riskProfile.overallScore",
                &["Pricing", "Coverage Recommendations"],
            ),
            (
                "riskProfile.controlsScore",
                &["Overall Risk Score", "Pricing Loadings"],
            ),
            ("quote.pricing.basePremium", &["Final Premium", "Total Cost"]),
            ("quote.pricing.finalPremium", &["Total Cost"]),
        ];
        for (path, labels) in impacts {
            table.declare_impact(path, labels.iter().map(|label| label.to_string()).collect());
        }
        table.register("controls.hasEDR", Arc::new(recalculate_edr));
        table
    }

    pub fn declare_impact(&mut self, path: &str, labels: Vec<String>) {
        self.impacts.insert(path.to_string(), labels);
    }

    /// Add a recompute rule triggered by edits to `path`. Rules run in registration order.
    pub fn register(&mut self, path: &str, rule: RecalcRule) {
        self.rules.entry(path.to_string()).or_default().push(rule);
    }

    pub fn impact_for(&self, path: &FieldPath) -> Vec<String> {
        self.impacts
            .get(path.as_str())
            .cloned()
            .unwrap_or_else(|| vec![FALLBACK_IMPACT.to_string()])
    }

    /// Run every rule registered for `path`, returning how many ran.
    pub fn recalculate(&self, path: &FieldPath, submission: &mut Submission) -> usize {
        match self.rules.get(path.as_str()) {
            Some(rules) => {
                for rule in rules {
                    rule(submission);
                }
                rules.len()
            }
            None => 0,
        }
    }
}

fn is_edr_loading(adjustment: &PriceAdjustment) -> bool {
    adjustment.reason.to_lowercase().contains("edr")
}

/// Confirmed EDR improves the controls score and lowers overall risk; an unconfirmed
/// EDR reverses both and carries a premium loading.
fn recalculate_edr(submission: &mut Submission) {
    let has_edr = submission.controls.has_edr.value;

    if let Some(profile) = submission.risk_profile.as_mut() {
        let (controls_delta, overall_delta) = if has_edr {
            (EDR_CONTROLS_DELTA, -EDR_OVERALL_DELTA)
        } else {
            (-EDR_CONTROLS_DELTA, EDR_OVERALL_DELTA)
        };
        let controls = (profile.controls_score.value + controls_delta).clamp(0, 100);
        let overall = (profile.overall_score.value + overall_delta).clamp(0, 100);
        profile.controls_score.recompute(controls);
        profile.overall_score.recompute(overall);
    }

    if let Some(quote) = submission.quote.as_mut() {
        let pricing = &mut quote.pricing;
        if has_edr {
            pricing.risk_loadings.retain(|loading| !is_edr_loading(loading));
        } else if !pricing.risk_loadings.iter().any(is_edr_loading) {
            pricing.risk_loadings.push(PriceAdjustment::new(
                EDR_LOADING_REASON,
                EDR_LOADING_AMOUNT,
                EDR_LOADING_PERCENTAGE,
            ));
        }
        pricing.refresh_totals();
    }
}
