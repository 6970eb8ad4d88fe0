use std::sync::Arc;

use super::common::*;

use crate::workflows::underwriting::domain::FieldValue;
use crate::workflows::underwriting::edits::{
    DependencyTable, EditEngine, EditError, EditRequest, FALLBACK_IMPACT,
};
use crate::workflows::underwriting::lifecycle::{Stage, Substage};
use crate::workflows::underwriting::scenarios;
use crate::workflows::underwriting::submission::{EventKind, Submission};

fn request(field_path: &str, value: FieldValue, comment: &str) -> EditRequest {
    EditRequest {
        field_path: field_path.to_string(),
        value,
        comment: comment.to_string(),
    }
}

fn edr_loading(submission: &Submission) -> bool {
    submission
        .quote
        .as_ref()
        .map(|quote| {
            quote
                .pricing
                .risk_loadings
                .iter()
                .any(|loading| loading.reason == "EDR not confirmed")
        })
        .unwrap_or(false)
}

#[test]
fn confirming_edr_recalculates_risk_and_pricing() {
    let engine = EditEngine::default();
    let mut submission = acme_at(Stage::DataCollection, Substage::IntakeComplete);

    let outcome = engine
        .apply_edit(
            &mut submission,
            request("controls.hasEDR", FieldValue::Flag(true), "Confirmed CrowdStrike"),
            &reviewer(),
            at(3),
        )
        .expect("edit applied");

    assert_eq!(outcome.rules_applied, 1);
    let edr = &submission.controls.has_edr;
    assert!(edr.value);
    assert_eq!(edr.confidence, 100);
    assert!(edr.is_edited);
    assert_eq!(edr.original_value, Some(false));
    assert_eq!(edr.edited_by.as_deref(), Some("Priya Shah"));
    assert_eq!(edr.edited_at, Some(at(3)));

    let profile = submission.risk_profile.as_ref().expect("risk profile");
    assert_eq!(profile.controls_score.value, 77);
    assert_eq!(profile.controls_score.original_value, Some(62));
    assert_eq!(profile.controls_score.confidence, 70);
    assert_eq!(profile.overall_score.value, 58);
    assert_eq!(profile.overall_score.original_value, Some(68));

    assert!(!edr_loading(&submission));
    let pricing = &submission.quote.as_ref().expect("quote").pricing;
    assert_eq!(pricing.final_premium.value, 46_200);
    assert_eq!(pricing.total_cost.value, 48_930);
    assert_eq!(pricing.total_cost.original_value, Some(57_330));
}

#[test]
fn withdrawing_edr_restores_loading_and_keeps_first_original() {
    let engine = EditEngine::default();
    let mut submission = acme_at(Stage::DataCollection, Substage::IntakeComplete);

    engine
        .apply_edit(
            &mut submission,
            request("controls.hasEDR", FieldValue::Flag(true), ""),
            &reviewer(),
            at(3),
        )
        .expect("first edit");
    engine
        .apply_edit(
            &mut submission,
            request("controls.hasEDR", FieldValue::Flag(false), "Vendor contract lapsed"),
            &reviewer(),
            at(4),
        )
        .expect("second edit");

    assert_eq!(submission.controls.has_edr.original_value, Some(false));
    assert_eq!(submission.feedback_log().len(), 2);
    let second = &submission.feedback_log()[1];
    assert_eq!(second.original_value, FieldValue::Flag(true));
    assert_eq!(second.original_confidence, 100);
    assert_eq!(second.id, "fb-sub-test-0002");

    let profile = submission.risk_profile.as_ref().expect("risk profile");
    assert_eq!(profile.controls_score.value, 62);
    assert_eq!(profile.overall_score.value, 68);
    assert_eq!(profile.controls_score.original_value, Some(62));

    assert!(edr_loading(&submission));
    let pricing = &submission.quote.as_ref().expect("quote").pricing;
    assert_eq!(pricing.final_premium.value, 54_600);
    assert_eq!(pricing.total_cost.value, 57_330);
}

#[test]
fn every_edit_leaves_feedback_and_history() {
    let engine = EditEngine::default();
    let mut submission = acme_at(Stage::DataCollection, Substage::InitialValidation);
    let revision = submission.revision();

    let outcome = engine
        .apply_edit(
            &mut submission,
            request("insured.annualRevenue", FieldValue::Number(47_500_000), "Updated financials"),
            &reviewer(),
            at(6),
        )
        .expect("edit applied");

    let feedback = &outcome.feedback;
    assert_eq!(submission.feedback_log(), &[feedback.clone()]);
    assert_eq!(feedback.field_path, "insured.annualRevenue");
    assert_eq!(feedback.field_label, "Annual Revenue");
    assert_eq!(feedback.original_value, FieldValue::Number(45_000_000));
    assert_eq!(feedback.original_confidence, 96);
    assert_eq!(feedback.new_value, FieldValue::Number(47_500_000));
    assert_eq!(feedback.comment, "Updated financials");
    assert_eq!(feedback.edited_by, "Priya Shah");
    assert_eq!(feedback.stage, Stage::DataCollection);
    assert_eq!(feedback.substage, Substage::InitialValidation);
    assert_eq!(
        feedback.downstream_impact,
        vec!["Base Premium".to_string(), "Rate per Million".to_string()]
    );
    assert_eq!(outcome.rules_applied, 0);

    let event = submission.history().last().expect("event recorded");
    assert_eq!(event.kind, EventKind::FieldEdit);
    assert_eq!(
        event.description,
        "Edited Annual Revenue: 45000000 -> 47500000 (Updated financials)"
    );
    assert_eq!(submission.revision(), revision + 1);
    assert_eq!(submission.updated_at(), at(6));
}

#[test]
fn unmapped_paths_fall_back_to_generic_impact() {
    let engine = EditEngine::default();
    let mut submission = acme_at(Stage::DataCollection, Substage::InitialValidation);

    let outcome = engine
        .apply_edit(
            &mut submission,
            request("insured.city", FieldValue::Text("La Jolla".to_string()), ""),
            &reviewer(),
            at(7),
        )
        .expect("edit applied");

    assert_eq!(outcome.feedback.downstream_impact, vec![FALLBACK_IMPACT.to_string()]);
    let event = submission.history().last().expect("event recorded");
    assert_eq!(event.description, "Edited City: San Diego -> La Jolla");
}

#[test]
fn unknown_field_leaves_submission_unchanged() {
    let engine = EditEngine::default();
    let mut submission = acme_at(Stage::DataCollection, Substage::IntakeComplete);
    let before = submission.clone();

    let err = engine
        .apply_edit(
            &mut submission,
            request("controls.hasXDR", FieldValue::Flag(true), ""),
            &reviewer(),
            at(3),
        )
        .expect_err("unknown field");

    assert_eq!(err, EditError::FieldNotFound("controls.hasXDR".to_string()));
    assert_eq!(submission, before);
}

#[test]
fn wrong_value_kind_leaves_submission_unchanged() {
    let engine = EditEngine::default();
    let mut submission = acme_at(Stage::DataCollection, Substage::IntakeComplete);
    let before = submission.clone();

    let err = engine
        .apply_edit(
            &mut submission,
            request("insured.annualRevenue", FieldValue::Text("lots".to_string()), ""),
            &reviewer(),
            at(3),
        )
        .expect_err("kind mismatch");

    assert_eq!(
        err,
        EditError::InvalidFieldValue {
            path: "insured.annualRevenue".to_string(),
            expected: "number",
            found: "text",
        }
    );
    assert_eq!(submission, before);
}

#[test]
fn malformed_path_is_rejected() {
    let engine = EditEngine::default();
    let mut submission = acme_at(Stage::DataCollection, Substage::IntakeComplete);

    let err = engine
        .apply_edit(
            &mut submission,
            request("controls..hasEDR", FieldValue::Flag(true), ""),
            &reviewer(),
            at(3),
        )
        .expect_err("empty segment");

    assert!(matches!(err, EditError::InvalidPath(_)));
    assert!(submission.feedback_log().is_empty());
}

#[test]
fn quote_fields_are_missing_when_no_quote_exists() {
    let engine = EditEngine::default();
    let mut submission = staged(scenarios::edge_case(), Stage::Pricing, Substage::Pricing);

    let err = engine
        .apply_edit(
            &mut submission,
            request("quote.pricing.basePremium", FieldValue::Number(50_000), ""),
            &reviewer(),
            at(3),
        )
        .expect_err("no quote");

    assert!(matches!(err, EditError::FieldNotFound(_)));
}

#[test]
fn edr_rule_without_quote_only_touches_risk_profile() {
    let engine = EditEngine::default();
    let mut submission = staged(scenarios::edge_case(), Stage::DataCollection, Substage::IntakeComplete);

    engine
        .apply_edit(
            &mut submission,
            request("controls.hasEDR", FieldValue::Flag(false), "No EDR on servers"),
            &reviewer(),
            at(3),
        )
        .expect("edit applied");

    let profile = submission.risk_profile.as_ref().expect("risk profile");
    assert_eq!(profile.controls_score.value, 63);
    assert_eq!(profile.overall_score.value, 65);
    assert!(submission.quote.is_none());
}

#[test]
fn recalculated_scores_stay_within_bounds() {
    let engine = EditEngine::default();
    let mut submission = zenith_at(Stage::DataCollection, Substage::IntakeComplete);
    if let Some(profile) = submission.risk_profile.as_mut() {
        profile.controls_score.value = 95;
        profile.overall_score.value = 4;
    }
    submission.controls.has_edr.value = false;

    engine
        .apply_edit(
            &mut submission,
            request("controls.hasEDR", FieldValue::Flag(true), ""),
            &reviewer(),
            at(3),
        )
        .expect("edit applied");

    let profile = submission.risk_profile.as_ref().expect("risk profile");
    assert_eq!(profile.controls_score.value, 100);
    assert_eq!(profile.overall_score.value, 0);
}

#[test]
fn registered_rules_run_for_their_path() {
    let mut dependencies = DependencyTable::standard();
    dependencies.register(
        "insured.annualRevenue",
        Arc::new(|submission: &mut Submission| {
            let revenue = submission.insured.annual_revenue.value;
            if let Some(quote) = submission.quote.as_mut() {
                let millions = (revenue / 1_000_000).max(1);
                let rate = quote.pricing.final_premium.value / millions;
                quote.pricing.rate_per_million.recompute(rate);
            }
        }),
    );
    let engine = EditEngine::new(dependencies);
    let mut submission = acme_at(Stage::DataCollection, Substage::IntakeComplete);

    let outcome = engine
        .apply_edit(
            &mut submission,
            request("insured.annualRevenue", FieldValue::Number(60_000_000), ""),
            &reviewer(),
            at(3),
        )
        .expect("edit applied");

    assert_eq!(outcome.rules_applied, 1);
    let pricing = &submission.quote.as_ref().expect("quote").pricing;
    assert_eq!(pricing.rate_per_million.value, 910);
    assert_eq!(pricing.rate_per_million.original_value, Some(10_920));
}

#[test]
fn recalculation_that_changes_nothing_is_not_an_edit() {
    let engine = EditEngine::default();
    let mut submission = zenith_at(Stage::DataCollection, Substage::IntakeComplete);
    if let Some(profile) = submission.risk_profile.as_mut() {
        profile.controls_score.value = 100;
    }
    submission.controls.has_edr.value = false;

    engine
        .apply_edit(
            &mut submission,
            request("controls.hasEDR", FieldValue::Flag(true), ""),
            &reviewer(),
            at(3),
        )
        .expect("edit applied");

    let profile = submission.risk_profile.as_ref().expect("risk profile");
    assert_eq!(profile.controls_score.value, 100);
    assert!(!profile.controls_score.is_edited);
    assert_eq!(profile.controls_score.original_value, None);
    assert!(profile.overall_score.is_edited);
    assert_eq!(profile.overall_score.original_value, Some(28));

    let pricing = &submission.quote.as_ref().expect("quote").pricing;
    assert_eq!(pricing.final_premium.value, 67_200);
    assert!(!pricing.final_premium.is_edited);
    assert!(!pricing.total_cost.is_edited);
    assert_eq!(pricing.total_cost.original_value, None);
}
