use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::Stage;

/// Source reference backing an AI-derived value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source_file: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl Citation {
    pub fn new(source_file: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            snippet: snippet.into(),
            line_number: None,
            guideline_id: None,
            rule_id: None,
        }
    }
}

/// A value extracted by the model together with its confidence and audit trail.
///
/// `original_value` is captured the first time the value changes and is never
/// overwritten afterwards, so `is_edited` and `original_value.is_some()` move together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field<T> {
    pub value: T,
    pub confidence: u8,
    pub rationale: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_value: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl<T> Field<T> {
    pub fn new(value: T, confidence: u8, rationale: impl Into<String>) -> Self {
        Self {
            value,
            confidence: confidence.min(100),
            rationale: rationale.into(),
            citations: Vec::new(),
            is_edited: false,
            original_value: None,
            edited_by: None,
            edited_at: None,
        }
    }

    pub fn cited(mut self, source_file: &str, snippet: &str) -> Self {
        self.citations.push(Citation::new(source_file, snippet));
        self
    }

    /// Replace the value with a human-supplied override.
    pub fn override_with(&mut self, value: T, editor: &str, at: DateTime<Utc>) {
        self.replace_value(value);
        self.confidence = 100;
        self.edited_by = Some(editor.to_string());
        self.edited_at = Some(at);
    }

    /// Replace the value as the result of a downstream recalculation. An unchanged
    /// value leaves the edit bookkeeping alone.
    pub fn recompute(&mut self, value: T)
    where
        T: PartialEq,
    {
        if self.value == value {
            return;
        }
        self.replace_value(value);
    }

    fn replace_value(&mut self, value: T) {
        let previous = std::mem::replace(&mut self.value, value);
        if self.original_value.is_none() {
            self.original_value = Some(previous);
        }
        self.is_edited = true;
    }
}

/// Dynamically typed field value used at the edit boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl FieldValue {
    pub const fn kind(&self) -> &'static str {
        match self {
            FieldValue::Flag(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(value) => write!(f, "{value}"),
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insured {
    pub name: Field<String>,
    pub dba: Field<String>,
    pub address: Field<String>,
    pub city: Field<String>,
    pub state: Field<String>,
    pub zip: Field<String>,
    pub website: Field<String>,
    pub industry: Field<String>,
    pub sic_code: Field<String>,
    pub naics_code: Field<String>,
    pub employee_count: Field<i64>,
    pub annual_revenue: Field<i64>,
    pub year_established: Field<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CyberControls {
    #[serde(rename = "hasMFA")]
    pub has_mfa: Field<bool>,
    #[serde(rename = "hasEDR")]
    pub has_edr: Field<bool>,
    pub has_backups: Field<bool>,
    pub backup_frequency: Field<String>,
    #[serde(rename = "hasSOC2")]
    pub has_soc2: Field<bool>,
    pub soc2_expiry_date: Field<String>,
    pub has_incident_response_plan: Field<bool>,
    pub has_security_training: Field<bool>,
    pub training_frequency: Field<String>,
    pub has_encryption: Field<bool>,
    pub patch_management: Field<String>,
    pub vendor_risk_management: Field<bool>,
    pub cloud_provider: Field<String>,
    pub pii_record_count: Field<i64>,
    pub phi_record_count: Field<i64>,
    pub pci_record_count: Field<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatSignal {
    pub source: String,
    pub severity: ThreatSeverity,
    pub finding: String,
    pub details: String,
    pub date_found: NaiveDate,
    pub is_resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub overall_score: Field<i64>,
    pub industry_risk: Field<i64>,
    pub controls_score: Field<i64>,
    pub threat_exposure: Field<i64>,
    pub historical_loss: Field<i64>,
    #[serde(default)]
    pub threat_signals: Vec<ThreatSignal>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRecommendation {
    pub coverage_type: String,
    pub recommended_limit: i64,
    pub recommended_deductible: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sublimits: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    pub confidence: u8,
    pub rationale: String,
}

/// A loading (positive) or credit (negative) applied to the base premium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub reason: String,
    pub amount: i64,
    pub percentage: i32,
}

impl PriceAdjustment {
    pub fn new(reason: impl Into<String>, amount: i64, percentage: i32) -> Self {
        Self {
            reason: reason.into(),
            amount,
            percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDetails {
    pub base_premium: Field<i64>,
    pub risk_loadings: Vec<PriceAdjustment>,
    pub credits: Vec<PriceAdjustment>,
    pub final_premium: Field<i64>,
    pub minimum_premium: i64,
    pub rate_per_million: Field<i64>,
    pub taxes_and_fees: i64,
    pub total_cost: Field<i64>,
}

impl PricingDetails {
    pub fn loadings_total(&self) -> i64 {
        self.risk_loadings.iter().map(|loading| loading.amount).sum()
    }

    pub fn credits_total(&self) -> i64 {
        self.credits.iter().map(|credit| credit.amount).sum()
    }

    /// Re-derive `finalPremium` and `totalCost` from the base premium and adjustments.
    pub fn refresh_totals(&mut self) {
        let final_premium = self.base_premium.value + self.loadings_total() + self.credits_total();
        self.final_premium.recompute(final_premium);
        self.total_cost.recompute(final_premium + self.taxes_and_fees);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    PendingReview,
    Approved,
    Declined,
    Bound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote_number: String,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub coverages: Vec<CoverageRecommendation>,
    pub pricing: PricingDetails,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    pub status: QuoteStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnderwriterId(pub String);

impl fmt::Display for UnderwriterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderwriterTier {
    Senior,
    Standard,
    Junior,
}

/// Roster entry. Submissions hold only the id; the roster owns the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Underwriter {
    pub id: UnderwriterId,
    pub name: String,
    pub email: String,
    pub specialty: Vec<String>,
    pub workload: u32,
    pub max_workload: u32,
    pub tier: UnderwriterTier,
    pub avg_turnaround: f32,
    pub bind_ratio: f32,
}

/// Team the simulated user is acting as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Intake,
    Assignment,
    Underwriting,
    Ops,
}

impl TeamRole {
    pub const fn label(self) -> &'static str {
        match self {
            TeamRole::Intake => "intake",
            TeamRole::Assignment => "assignment",
            TeamRole::Underwriting => "underwriting",
            TeamRole::Ops => "ops",
        }
    }

    /// Team that works submissions sitting in `stage`.
    pub const fn owner_of(stage: Stage) -> Self {
        match stage {
            Stage::Submission | Stage::DataCollection => TeamRole::Intake,
            Stage::Assignment => TeamRole::Assignment,
            Stage::RiskAssessment | Stage::Pricing | Stage::Quotation | Stage::Binding => {
                TeamRole::Underwriting
            }
        }
    }

    pub fn can_edit(self, stage: Stage) -> bool {
        match self {
            TeamRole::Intake => matches!(stage, Stage::Submission | Stage::DataCollection),
            TeamRole::Assignment => stage == Stage::Assignment,
            TeamRole::Underwriting => matches!(
                stage,
                Stage::RiskAssessment | Stage::Pricing | Stage::Quotation
            ),
            TeamRole::Ops => false,
        }
    }

    /// Queue visibility per team. Assignment keeps finished work visible for reference.
    pub fn can_view(self, stage: Stage) -> bool {
        match self {
            TeamRole::Intake => matches!(stage, Stage::Submission | Stage::DataCollection),
            TeamRole::Assignment => !matches!(stage, Stage::Submission | Stage::DataCollection),
            TeamRole::Underwriting => matches!(
                stage,
                Stage::RiskAssessment | Stage::Pricing | Stage::Quotation | Stage::Binding
            ),
            TeamRole::Ops => true,
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TeamRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "intake" => Ok(TeamRole::Intake),
            "assignment" => Ok(TeamRole::Assignment),
            "underwriting" => Ok(TeamRole::Underwriting),
            "ops" | "operations" => Ok(TeamRole::Ops),
            other => Err(format!("unknown team role '{other}'")),
        }
    }
}

/// Who performed an action recorded in a submission's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: TeamRole,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: TeamRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Automated actor acting on behalf of the team that owns `stage`.
    pub fn system(stage: Stage) -> Self {
        Self::new("System", TeamRole::owner_of(stage))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeChannel {
    Email,
    Portal,
    Edi,
}

impl IntakeChannel {
    pub const fn label(self) -> &'static str {
        match self {
            IntakeChannel::Email => "email",
            IntakeChannel::Portal => "portal",
            IntakeChannel::Edi => "EDI/API",
        }
    }
}
