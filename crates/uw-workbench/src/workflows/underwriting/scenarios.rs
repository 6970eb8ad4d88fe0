//! Seeded demo records: three insureds with their model output, the underwriter roster,
//! and the inbound items that introduce them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::domain::{
    CoverageRecommendation, CyberControls, Field, Insured, PriceAdjustment, PricingDetails, Quote,
    QuoteStatus, RiskProfile, ThreatSeverity, ThreatSignal, Underwriter, UnderwriterId,
    UnderwriterTier,
};
use super::intake::{EdiSubmission, InboundEmail, InboundItem, InsuredOverrides, PortalSubmission};
use super::submission::ExtractedRecord;

pub const ACME: &str = "acme";
pub const ZENITH: &str = "zenith";
pub const EDGE_CASE: &str = "edgecase";

pub const SCENARIOS: [&str; 3] = [ACME, ZENITH, EDGE_CASE];

/// Extracted record for a scenario id, or `None` when the id is unknown.
pub fn record_for(scenario: &str) -> Option<ExtractedRecord> {
    match scenario {
        ACME => Some(acme()),
        ZENITH => Some(zenith()),
        EDGE_CASE => Some(edge_case()),
        _ => None,
    }
}

fn text(value: &str, confidence: u8, rationale: &str) -> Field<String> {
    Field::new(value.to_string(), confidence, rationale)
}

fn number(value: i64, confidence: u8, rationale: &str) -> Field<i64> {
    Field::new(value, confidence, rationale)
}

fn flag(value: bool, confidence: u8, rationale: &str) -> Field<bool> {
    Field::new(value, confidence, rationale)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn adjustment(reason: &str, amount: i64, percentage: i32) -> PriceAdjustment {
    PriceAdjustment::new(reason, amount, percentage)
}

fn coverage(
    coverage_type: &str,
    limit: i64,
    deductible: i64,
    confidence: u8,
    rationale: &str,
) -> CoverageRecommendation {
    CoverageRecommendation {
        coverage_type: coverage_type.to_string(),
        recommended_limit: limit,
        recommended_deductible: deductible,
        sublimits: BTreeMap::new(),
        exclusions: Vec::new(),
        conditions: Vec::new(),
        confidence,
        rationale: rationale.to_string(),
    }
}

pub fn acme() -> ExtractedRecord {
    let insured = Insured {
        name: text("ACME Medical Solutions, Inc.", 98, "Extracted from application form header")
            .cited("ACME_Application.pdf", "Named Insured: ACME Medical Solutions, Inc."),
        dba: text("ACME Health", 90, "Trade name listed on application"),
        address: text("1200 Harbor Blvd, Suite 400", 95, "Mailing address on application"),
        city: text("San Diego", 97, "Mailing address on application"),
        state: text("CA", 99, "Mailing address on application"),
        zip: text("92101", 96, "Mailing address on application"),
        website: text("https://acmemedical.example", 92, "Broker email signature"),
        industry: text("Healthcare Technology", 94, "SIC code and business description")
            .cited("ACME_Application.pdf", "Nature of business: healthcare software"),
        sic_code: text("7372", 88, "Mapped from business description"),
        naics_code: text("541511", 86, "Mapped from business description"),
        employee_count: number(340, 90, "Stated on application"),
        annual_revenue: number(45_000_000, 96, "Audited financials attached")
            .cited("ACME_Financials_2023.pdf", "Total revenue: $45,000,000"),
        year_established: number(2009, 93, "Stated on application"),
    };
    let controls = CyberControls {
        has_mfa: flag(true, 92, "Security questionnaire answer Q4"),
        has_edr: flag(false, 45, "Questionnaire answer ambiguous; vendor not named")
            .cited("ACME_Security_Questionnaire.pdf", "Endpoint protection: antivirus (TBD)"),
        has_backups: flag(true, 90, "Questionnaire answer Q9"),
        backup_frequency: text("Daily", 85, "Questionnaire answer Q10"),
        has_soc2: flag(true, 95, "SOC 2 Type II report attached"),
        soc2_expiry_date: text("2025-03-31", 90, "SOC 2 report period"),
        has_incident_response_plan: flag(true, 88, "Questionnaire answer Q14"),
        has_security_training: flag(true, 87, "Questionnaire answer Q15"),
        training_frequency: text("Annual", 80, "Questionnaire answer Q16"),
        has_encryption: flag(true, 91, "Questionnaire answer Q7"),
        patch_management: text("Monthly", 78, "Questionnaire answer Q12"),
        vendor_risk_management: flag(true, 75, "Questionnaire answer Q18"),
        cloud_provider: text("AWS", 93, "Architecture overview"),
        pii_record_count: number(250_000, 82, "Data inventory summary"),
        phi_record_count: number(1_200_000, 84, "Data inventory summary"),
        pci_record_count: number(0, 90, "No card processing disclosed"),
    };
    let risk_profile = RiskProfile {
        overall_score: number(68, 72, "Weighted blend of industry, controls, and threat signals"),
        industry_risk: number(75, 88, "Healthcare technology loss experience"),
        controls_score: number(62, 70, "EDR not confirmed lowers the controls score"),
        threat_exposure: number(72, 85, "Open external findings"),
        historical_loss: number(0, 95, "No prior claims reported"),
        threat_signals: vec![ThreatSignal {
            source: "External scan".to_string(),
            severity: ThreatSeverity::High,
            finding: "RDP exposed on public IP".to_string(),
            details: "Port 3389 reachable on one perimeter host".to_string(),
            date_found: date(2024, 1, 8),
            is_resolved: false,
        }],
        recommendations: vec![
            "Confirm EDR deployment across all endpoints".to_string(),
            "Close exposed RDP before binding".to_string(),
        ],
    };
    let coverages = vec![
        coverage("First Party Breach Response", 5_000_000, 50_000, 88, "PHI volume"),
        coverage("Third Party Liability", 5_000_000, 50_000, 85, "Revenue band"),
    ];
    let pricing = PricingDetails {
        base_premium: number(42_000, 85, "Rate per million on revenue band"),
        risk_loadings: vec![
            adjustment("EDR not confirmed", 8_400, 20),
            adjustment("Open threat signals", 6_300, 15),
            adjustment("PHI exposure > 1M records", 4_200, 10),
        ],
        credits: vec![
            adjustment("SOC2 Type II certified", -4_200, -10),
            adjustment("No prior claims", -2_100, -5),
        ],
        final_premium: number(54_600, 78, "Base plus loadings and credits"),
        minimum_premium: 35_000,
        rate_per_million: number(10_920, 82, "Final premium over revenue"),
        taxes_and_fees: 2_730,
        total_cost: number(57_330, 78, "Final premium plus taxes and fees"),
    };
    let quote = Quote {
        quote_number: "CYB-2024-ACME-001".to_string(),
        effective_date: date(2024, 2, 1),
        expiration_date: date(2025, 2, 1),
        coverages: coverages.clone(),
        pricing,
        terms: vec!["12 month policy period".to_string()],
        conditions: vec!["EDR deployment confirmed within 30 days".to_string()],
        exclusions: vec!["Unpatched critical vulnerabilities older than 90 days".to_string()],
        status: QuoteStatus::PendingReview,
    };

    ExtractedRecord {
        scenario_id: ACME.to_string(),
        insured,
        controls,
        risk_profile: Some(risk_profile),
        coverages: Some(coverages),
        quote: Some(quote),
    }
}

pub fn zenith() -> ExtractedRecord {
    let insured = Insured {
        name: text("Zenith Financial Technologies, LLC", 99, "Application header"),
        dba: text("Zenith Pay", 95, "Trade name listed on application"),
        address: text("88 Market Street", 98, "Mailing address on application"),
        city: text("New York", 99, "Mailing address on application"),
        state: text("NY", 99, "Mailing address on application"),
        zip: text("10005", 98, "Mailing address on application"),
        website: text("https://zenithpay.example", 97, "Broker email signature"),
        industry: text("Financial Technology", 97, "Business description"),
        sic_code: text("6099", 94, "Mapped from business description"),
        naics_code: text("522320", 94, "Mapped from business description"),
        employee_count: number(620, 96, "Stated on application"),
        annual_revenue: number(120_000_000, 97, "Audited financials attached"),
        year_established: number(2014, 98, "Stated on application"),
    };
    let controls = CyberControls {
        has_mfa: flag(true, 98, "Security questionnaire answer Q4"),
        has_edr: flag(true, 99, "CrowdStrike deployment evidence attached"),
        has_backups: flag(true, 97, "Questionnaire answer Q9"),
        backup_frequency: text("Hourly", 95, "Questionnaire answer Q10"),
        has_soc2: flag(true, 99, "SOC 2 Type II report attached"),
        soc2_expiry_date: text("2025-09-30", 97, "SOC 2 report period"),
        has_incident_response_plan: flag(true, 96, "IR plan attached"),
        has_security_training: flag(true, 95, "Questionnaire answer Q15"),
        training_frequency: text("Quarterly", 93, "Questionnaire answer Q16"),
        has_encryption: flag(true, 98, "Questionnaire answer Q7"),
        patch_management: text("Weekly", 94, "Questionnaire answer Q12"),
        vendor_risk_management: flag(true, 92, "Questionnaire answer Q18"),
        cloud_provider: text("GCP", 97, "Architecture overview"),
        pii_record_count: number(2_400_000, 90, "Data inventory summary"),
        phi_record_count: number(0, 95, "No health data disclosed"),
        pci_record_count: number(8_000_000, 93, "PCI DSS attestation"),
    };
    let risk_profile = RiskProfile {
        overall_score: number(28, 92, "Strong controls offset payment exposure"),
        industry_risk: number(65, 90, "Payments sector loss experience"),
        controls_score: number(92, 95, "Full control set evidenced"),
        threat_exposure: number(15, 94, "No open external findings"),
        historical_loss: number(0, 97, "No prior claims reported"),
        threat_signals: Vec::new(),
        recommendations: vec!["Maintain quarterly tabletop exercises".to_string()],
    };
    let coverages = vec![
        coverage("First Party Breach Response", 10_000_000, 100_000, 94, "PCI volume"),
        coverage("Third Party Liability", 10_000_000, 100_000, 93, "Revenue band"),
    ];
    let pricing = PricingDetails {
        base_premium: number(96_000, 92, "Rate per million on revenue band"),
        risk_loadings: vec![adjustment("PCI data volume", 9_600, 10)],
        credits: vec![
            adjustment("Advanced EDR with 24/7 SOC", -19_200, -20),
            adjustment("SOC2 Type II certified", -9_600, -10),
            adjustment("Quarterly security training", -4_800, -5),
            adjustment("No prior claims", -4_800, -5),
        ],
        final_premium: number(67_200, 94, "Base plus loadings and credits"),
        minimum_premium: 50_000,
        rate_per_million: number(6_720, 93, "Final premium over revenue"),
        taxes_and_fees: 3_360,
        total_cost: number(70_560, 94, "Final premium plus taxes and fees"),
    };
    let quote = Quote {
        quote_number: "CYB-2024-ZEN-001".to_string(),
        effective_date: date(2024, 3, 1),
        expiration_date: date(2025, 3, 1),
        coverages: coverages.clone(),
        pricing,
        terms: vec!["12 month policy period".to_string()],
        conditions: Vec::new(),
        exclusions: Vec::new(),
        status: QuoteStatus::Draft,
    };

    ExtractedRecord {
        scenario_id: ZENITH.to_string(),
        insured,
        controls,
        risk_profile: Some(risk_profile),
        coverages: Some(coverages),
        quote: Some(quote),
    }
}

pub fn edge_case() -> ExtractedRecord {
    let insured = Insured {
        name: text("EdgeCase Vendor Services Corp.", 96, "Application header"),
        dba: text("EdgeCase", 88, "Trade name listed on application"),
        address: text("410 Commerce Way", 92, "Mailing address on application"),
        city: text("Austin", 95, "Mailing address on application"),
        state: text("TX", 97, "Mailing address on application"),
        zip: text("78701", 94, "Mailing address on application"),
        website: text("https://edgecase.example", 90, "Broker email signature"),
        industry: text("Vendor Risk Management Services", 92, "Business description"),
        sic_code: text("8742", 80, "Mapped from business description"),
        naics_code: text("541611", 78, "Mapped from business description"),
        employee_count: number(410, 88, "Stated on application"),
        annual_revenue: number(75_000_000, 93, "Financial summary"),
        year_established: number(2011, 90, "Stated on application"),
    };
    let controls = CyberControls {
        has_mfa: flag(true, 90, "Security questionnaire answer Q4"),
        has_edr: flag(true, 85, "Vendor named in questionnaire"),
        has_backups: flag(true, 86, "Questionnaire answer Q9"),
        backup_frequency: text("Daily", 82, "Questionnaire answer Q10"),
        has_soc2: flag(true, 92, "SOC 2 Type I report attached"),
        soc2_expiry_date: text("2024-12-31", 85, "SOC 2 report period"),
        has_incident_response_plan: flag(true, 80, "Questionnaire answer Q14"),
        has_security_training: flag(true, 84, "Questionnaire answer Q15"),
        training_frequency: text("Annual", 78, "Questionnaire answer Q16"),
        has_encryption: flag(true, 88, "Questionnaire answer Q7"),
        patch_management: text("Monthly", 76, "Questionnaire answer Q12"),
        vendor_risk_management: flag(true, 94, "Core business offering"),
        cloud_provider: text("Azure", 90, "Architecture overview"),
        pii_record_count: number(900_000, 75, "Data inventory summary"),
        phi_record_count: number(50_000, 72, "Data inventory summary"),
        pci_record_count: number(0, 88, "No card processing disclosed"),
    };
    let risk_profile = RiskProfile {
        overall_score: number(55, 78, "Aggregation risk from client data"),
        industry_risk: number(70, 85, "Third-party service provider exposure"),
        controls_score: number(78, 82, "Controls evidenced with gaps"),
        threat_exposure: number(45, 80, "One resolved finding"),
        historical_loss: number(450_000, 95, "One prior ransomware claim"),
        threat_signals: vec![ThreatSignal {
            source: "Claims history".to_string(),
            severity: ThreatSeverity::Medium,
            finding: "Prior ransomware incident".to_string(),
            details: "2021 claim closed at $450,000".to_string(),
            date_found: date(2021, 6, 14),
            is_resolved: true,
        }],
        recommendations: vec!["Review supply-chain aggregation limits".to_string()],
    };

    ExtractedRecord {
        scenario_id: EDGE_CASE.to_string(),
        insured,
        controls,
        risk_profile: Some(risk_profile),
        coverages: None,
        quote: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn underwriter(
    id: &str,
    name: &str,
    email: &str,
    specialty: &[&str],
    workload: (u32, u32),
    tier: UnderwriterTier,
    avg_turnaround: f32,
    bind_ratio: f32,
) -> Underwriter {
    Underwriter {
        id: UnderwriterId(id.to_string()),
        name: name.to_string(),
        email: email.to_string(),
        specialty: specialty.iter().map(|value| value.to_string()).collect(),
        workload: workload.0,
        max_workload: workload.1,
        tier,
        avg_turnaround,
        bind_ratio,
    }
}

pub fn underwriters() -> Vec<Underwriter> {
    vec![
        underwriter(
            "uw-001",
            "David Martinez",
            "david.martinez@carrier.example",
            &["healthcare", "technology", "fintech"],
            (12, 20),
            UnderwriterTier::Senior,
            2.3,
            0.72,
        ),
        underwriter(
            "uw-002",
            "Lisa Park",
            "lisa.park@carrier.example",
            &["fintech", "e-commerce", "retail"],
            (15, 20),
            UnderwriterTier::Senior,
            1.8,
            0.68,
        ),
        underwriter(
            "uw-003",
            "James Wilson",
            "james.wilson@carrier.example",
            &["manufacturing", "technology", "professional-services"],
            (8, 15),
            UnderwriterTier::Standard,
            3.1,
            0.61,
        ),
        underwriter(
            "uw-004",
            "Amanda Foster",
            "amanda.foster@carrier.example",
            &["healthcare", "vendor-risk", "critical-infrastructure"],
            (6, 12),
            UnderwriterTier::Senior,
            2.8,
            0.75,
        ),
    ]
}

fn received(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0)
        .single()
        .unwrap_or_default()
}

/// One inbound email per scenario.
pub fn inbound_emails() -> Vec<InboundItem> {
    vec![
        InboundItem::Email(InboundEmail {
            id: "email-001".to_string(),
            scenario: ACME.to_string(),
            from: "sarah.chen@marshbroker.example".to_string(),
            subject: "New Cyber Submission - ACME Medical Solutions".to_string(),
            received_at: received(9),
        }),
        InboundItem::Email(InboundEmail {
            id: "email-002".to_string(),
            scenario: ZENITH.to_string(),
            from: "michael.torres@aonbroker.example".to_string(),
            subject: "Cyber Renewal - Zenith Financial Technologies".to_string(),
            received_at: received(10),
        }),
        InboundItem::Email(InboundEmail {
            id: "email-003".to_string(),
            scenario: EDGE_CASE.to_string(),
            from: "jennifer.walsh@wtwbroker.example".to_string(),
            subject: "Cyber Quote Request - EdgeCase Vendor Services".to_string(),
            received_at: received(11),
        }),
    ]
}

/// A portal upload whose metadata is incomplete.
pub fn incomplete_portal_upload() -> InboundItem {
    InboundItem::Portal(PortalSubmission {
        id: "portal-001".to_string(),
        scenario: EDGE_CASE.to_string(),
        broker: "Gallagher".to_string(),
        metadata_completeness: 72,
        insured: InsuredOverrides {
            name: "EdgeCase Vendor Services Corp.".to_string(),
            industry: "Vendor Risk Management Services".to_string(),
            annual_revenue: 75_000_000,
            employee_count: 410,
            state: "TX".to_string(),
        },
    })
}

/// A clean EDI feed for the Zenith renewal.
pub fn edi_feed() -> InboundItem {
    InboundItem::Edi(EdiSubmission {
        id: "edi-001".to_string(),
        scenario: ZENITH.to_string(),
        sender: "ACORD gateway".to_string(),
        structured_confidence: 96,
        validation_errors: Vec::new(),
        insured: InsuredOverrides {
            name: "Zenith Financial Technologies, LLC".to_string(),
            industry: "Financial Technology".to_string(),
            annual_revenue: 120_000_000,
            employee_count: 620,
            state: "NY".to_string(),
        },
    })
}
