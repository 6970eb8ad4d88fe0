use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::workflows::underwriting::domain::{
    CyberControls, Field, FieldValue, Insured, PricingDetails, RiskProfile,
};
use crate::workflows::underwriting::submission::Submission;

use super::EditError;

/// Dot-delimited location of a field inside a submission, e.g. `controls.hasEDR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl FromStr for FieldPath {
    type Err = EditError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.split('.').any(|segment| segment.is_empty()) {
            return Err(EditError::InvalidPath(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed mutable handle on a resolved field.
pub(crate) enum SlotRef<'a> {
    Text(&'a mut Field<String>),
    Number(&'a mut Field<i64>),
    Flag(&'a mut Field<bool>),
}

pub(crate) struct FieldSlot<'a> {
    pub label: &'static str,
    slot: SlotRef<'a>,
}

impl<'a> FieldSlot<'a> {
    fn new(label: &'static str, slot: SlotRef<'a>) -> Self {
        Self { label, slot }
    }

    pub fn value(&self) -> FieldValue {
        match &self.slot {
            SlotRef::Text(field) => FieldValue::Text(field.value.clone()),
            SlotRef::Number(field) => FieldValue::Number(field.value),
            SlotRef::Flag(field) => FieldValue::Flag(field.value),
        }
    }

    pub fn confidence(&self) -> u8 {
        match &self.slot {
            SlotRef::Text(field) => field.confidence,
            SlotRef::Number(field) => field.confidence,
            SlotRef::Flag(field) => field.confidence,
        }
    }

    pub fn expected_kind(&self) -> &'static str {
        match &self.slot {
            SlotRef::Text(_) => "text",
            SlotRef::Number(_) => "number",
            SlotRef::Flag(_) => "boolean",
        }
    }

    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (&self.slot, value),
            (SlotRef::Text(_), FieldValue::Text(_))
                | (SlotRef::Number(_), FieldValue::Number(_))
                | (SlotRef::Flag(_), FieldValue::Flag(_))
        )
    }

    /// Apply a human override. The value kind must already have been checked with
    /// [`FieldSlot::accepts`]; a mismatched value leaves the field untouched.
    pub fn apply(self, value: FieldValue, editor: &str, at: DateTime<Utc>) -> bool {
        match (self.slot, value) {
            (SlotRef::Text(field), FieldValue::Text(value)) => field.override_with(value, editor, at),
            (SlotRef::Number(field), FieldValue::Number(value)) => {
                field.override_with(value, editor, at)
            }
            (SlotRef::Flag(field), FieldValue::Flag(value)) => field.override_with(value, editor, at),
            _ => return false,
        }
        true
    }
}

/// Resolve `path` to a typed handle, or `None` when it names no field.
pub(crate) fn resolve<'a>(submission: &'a mut Submission, path: &FieldPath) -> Option<FieldSlot<'a>> {
    let segments: Vec<&str> = path.segments().collect();
    match segments.as_slice() {
        ["insured", name] => insured_slot(&mut submission.insured, name),
        ["controls", name] => controls_slot(&mut submission.controls, name),
        ["riskProfile", name] => submission
            .risk_profile
            .as_mut()
            .and_then(|profile| risk_slot(profile, name)),
        ["quote", "pricing", name] => submission
            .quote
            .as_mut()
            .and_then(|quote| pricing_slot(&mut quote.pricing, name)),
        _ => None,
    }
}

fn insured_slot<'a>(insured: &'a mut Insured, name: &str) -> Option<FieldSlot<'a>> {
    let slot = match name {
        "name" => FieldSlot::new("Company Name", SlotRef::Text(&mut insured.name)),
        "dba" => FieldSlot::new("DBA", SlotRef::Text(&mut insured.dba)),
        "address" => FieldSlot::new("Address", SlotRef::Text(&mut insured.address)),
        "city" => FieldSlot::new("City", SlotRef::Text(&mut insured.city)),
        "state" => FieldSlot::new("State", SlotRef::Text(&mut insured.state)),
        "zip" => FieldSlot::new("ZIP", SlotRef::Text(&mut insured.zip)),
        "website" => FieldSlot::new("Website", SlotRef::Text(&mut insured.website)),
        "industry" => FieldSlot::new("Industry", SlotRef::Text(&mut insured.industry)),
        "sicCode" => FieldSlot::new("SIC Code", SlotRef::Text(&mut insured.sic_code)),
        "naicsCode" => FieldSlot::new("NAICS Code", SlotRef::Text(&mut insured.naics_code)),
        "employeeCount" => {
            FieldSlot::new("Employee Count", SlotRef::Number(&mut insured.employee_count))
        }
        "annualRevenue" => {
            FieldSlot::new("Annual Revenue", SlotRef::Number(&mut insured.annual_revenue))
        }
        "yearEstablished" => FieldSlot::new(
            "Year Established",
            SlotRef::Number(&mut insured.year_established),
        ),
        _ => return None,
    };
    Some(slot)
}

fn controls_slot<'a>(controls: &'a mut CyberControls, name: &str) -> Option<FieldSlot<'a>> {
    let slot = match name {
        "hasMFA" => FieldSlot::new("MFA", SlotRef::Flag(&mut controls.has_mfa)),
        "hasEDR" => FieldSlot::new("EDR", SlotRef::Flag(&mut controls.has_edr)),
        "hasBackups" => FieldSlot::new("Backups", SlotRef::Flag(&mut controls.has_backups)),
        "backupFrequency" => FieldSlot::new(
            "Backup Frequency",
            SlotRef::Text(&mut controls.backup_frequency),
        ),
        "hasSOC2" => FieldSlot::new("SOC 2", SlotRef::Flag(&mut controls.has_soc2)),
        "soc2ExpiryDate" => FieldSlot::new(
            "SOC 2 Expiry Date",
            SlotRef::Text(&mut controls.soc2_expiry_date),
        ),
        "hasIncidentResponsePlan" => FieldSlot::new(
            "Incident Response Plan",
            SlotRef::Flag(&mut controls.has_incident_response_plan),
        ),
        "hasSecurityTraining" => FieldSlot::new(
            "Security Training",
            SlotRef::Flag(&mut controls.has_security_training),
        ),
        "trainingFrequency" => FieldSlot::new(
            "Training Frequency",
            SlotRef::Text(&mut controls.training_frequency),
        ),
        "hasEncryption" => FieldSlot::new("Encryption", SlotRef::Flag(&mut controls.has_encryption)),
        "patchManagement" => FieldSlot::new(
            "Patch Management",
            SlotRef::Text(&mut controls.patch_management),
        ),
        "vendorRiskManagement" => FieldSlot::new(
            "Vendor Risk Management",
            SlotRef::Flag(&mut controls.vendor_risk_management),
        ),
        "cloudProvider" => {
            FieldSlot::new("Cloud Provider", SlotRef::Text(&mut controls.cloud_provider))
        }
        "piiRecordCount" => FieldSlot::new(
            "PII Record Count",
            SlotRef::Number(&mut controls.pii_record_count),
        ),
        "phiRecordCount" => FieldSlot::new(
            "PHI Record Count",
            SlotRef::Number(&mut controls.phi_record_count),
        ),
        "pciRecordCount" => FieldSlot::new(
            "PCI Record Count",
            SlotRef::Number(&mut controls.pci_record_count),
        ),
        _ => return None,
    };
    Some(slot)
}

fn risk_slot<'a>(profile: &'a mut RiskProfile, name: &str) -> Option<FieldSlot<'a>> {
    let slot = match name {
        "overallScore" => {
            FieldSlot::new("Overall Risk Score", SlotRef::Number(&mut profile.overall_score))
        }
        "industryRisk" => FieldSlot::new("Industry Risk", SlotRef::Number(&mut profile.industry_risk)),
        "controlsScore" => {
            FieldSlot::new("Controls Score", SlotRef::Number(&mut profile.controls_score))
        }
        "threatExposure" => FieldSlot::new(
            "Threat Exposure",
            SlotRef::Number(&mut profile.threat_exposure),
        ),
        "historicalLoss" => FieldSlot::new(
            "Historical Loss",
            SlotRef::Number(&mut profile.historical_loss),
        ),
        _ => return None,
    };
    Some(slot)
}

fn pricing_slot<'a>(pricing: &'a mut PricingDetails, name: &str) -> Option<FieldSlot<'a>> {
    let slot = match name {
        "basePremium" => FieldSlot::new("Base Premium", SlotRef::Number(&mut pricing.base_premium)),
        "finalPremium" => {
            FieldSlot::new("Final Premium", SlotRef::Number(&mut pricing.final_premium))
        }
        "ratePerMillion" => FieldSlot::new(
            "Rate per Million",
            SlotRef::Number(&mut pricing.rate_per_million),
        ),
        "totalCost" => FieldSlot::new("Total Cost", SlotRef::Number(&mut pricing.total_cost)),
        _ => return None,
    };
    Some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_segments() {
        assert!("controls..hasEDR".parse::<FieldPath>().is_err());
        assert!("".parse::<FieldPath>().is_err());
        assert!(".insured".parse::<FieldPath>().is_err());
    }

    #[test]
    fn keeps_segments_in_order() {
        let path: FieldPath = "quote.pricing.basePremium".parse().expect("valid path");
        let segments: Vec<&str> = path.segments().collect();
        assert_eq!(segments, vec!["quote", "pricing", "basePremium"]);
    }
}
