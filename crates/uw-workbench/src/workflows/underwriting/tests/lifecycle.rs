use super::common::*;
use serde_json::json;

use crate::workflows::underwriting::lifecycle::{
    advance, translate_legacy, Position, Stage, Substage, TransitionError,
};
use crate::workflows::underwriting::submission::EventKind;

#[test]
fn walks_every_substage_once_in_order() {
    let mut current = Position::initial();
    let mut visited = vec![current];
    loop {
        match current.next() {
            Ok(next) => {
                assert!(next > current, "{next} should follow {current}");
                assert_eq!(next.ordinal(), current.ordinal() + 1);
                visited.push(next);
                current = next;
            }
            Err(err) => {
                assert_eq!(
                    err,
                    TransitionError::Terminal {
                        stage: Stage::Binding,
                        substage: Substage::Binding,
                    }
                );
                break;
            }
        }
    }

    let total: usize = Stage::ordered()
        .iter()
        .map(|stage| stage.substages().len())
        .sum();
    assert_eq!(visited.len(), total);
    assert_eq!(visited.last().copied(), Some(Position::end_of(Stage::Binding)));
    assert!(current.is_terminal());
}

#[test]
fn stage_completion_moves_to_next_stage_entry() {
    let complete = position(Stage::DataCollection, Substage::IntakeComplete);
    assert!(complete.is_stage_complete());
    assert_eq!(
        complete.next().expect("not terminal"),
        position(Stage::Assignment, Substage::WorkloadBalance)
    );

    let mid_stage = position(Stage::Assignment, Substage::WorkloadBalance);
    assert!(!mid_stage.is_stage_complete());
    assert_eq!(
        mid_stage.next().expect("not terminal"),
        position(Stage::Assignment, Substage::SpecialistMatch)
    );
}

#[test]
fn advance_records_stage_change_in_history() {
    let mut submission = acme_at(Stage::DataCollection, Substage::IntakeComplete);
    let revision = submission.revision();

    let transition = advance(&mut submission, &reviewer(), at(5)).expect("advanced");

    assert!(transition.is_stage_change());
    assert_eq!(submission.stage(), Stage::Assignment);
    assert_eq!(submission.substage(), Substage::WorkloadBalance);
    assert_eq!(submission.updated_at(), at(5));
    assert_eq!(submission.revision(), revision + 1);

    let event = submission.history().last().expect("event recorded");
    assert_eq!(event.kind, EventKind::StageChange);
    assert_eq!(
        event.description,
        "Stage changed from data_collection to assignment"
    );
    assert_eq!(event.actor, "Priya Shah");
    assert_eq!(event.id, "evt-sub-test-0001");
}

#[test]
fn advance_within_stage_records_substage_change() {
    let mut submission = acme_at(Stage::Pricing, Substage::Pricing);

    advance(&mut submission, &reviewer(), at(5)).expect("advanced");

    let event = submission.history().last().expect("event recorded");
    assert_eq!(event.kind, EventKind::SubstageChange);
    assert_eq!(event.description, "Substage changed from pricing to quote_draft");
}

#[test]
fn advance_at_binding_leaves_submission_untouched() {
    let mut submission = acme_at(Stage::Binding, Substage::Binding);
    let before = submission.clone();

    let err = advance(&mut submission, &reviewer(), at(5)).expect_err("terminal");

    assert!(matches!(err, TransitionError::Terminal { .. }));
    assert_eq!(submission, before);
}

#[test]
fn rejects_substage_from_another_stage() {
    let err = Position::new(Stage::Pricing, Substage::IntakeComplete).expect_err("mismatch");
    assert_eq!(
        err,
        TransitionError::SubstageOutsideStage {
            stage: Stage::Pricing,
            substage: Substage::IntakeComplete,
        }
    );

    let decoded = serde_json::from_value::<Position>(json!({
        "stage": "pricing",
        "substage": "binding"
    }));
    assert!(decoded.is_err());

    let decoded: Position = serde_json::from_value(json!({
        "stage": "quotation",
        "substage": "quote_review"
    }))
    .expect("valid pair");
    assert_eq!(decoded, position(Stage::Quotation, Substage::QuoteReview));
}

#[test]
fn translates_legacy_stage_names() {
    assert_eq!(
        translate_legacy("intake", "intake_complete").expect("legacy intake"),
        position(Stage::DataCollection, Substage::IntakeComplete)
    );
    assert_eq!(
        translate_legacy("underwriting", "quote_draft").expect("legacy underwriting"),
        position(Stage::Pricing, Substage::QuoteDraft)
    );
    assert_eq!(
        translate_legacy("underwriting", "rules_check").expect("legacy underwriting"),
        position(Stage::RiskAssessment, Substage::RulesCheck)
    );
    assert_eq!(
        translate_legacy("quoted", "binding").expect("legacy quoted"),
        position(Stage::Binding, Substage::Binding)
    );
    assert_eq!(
        translate_legacy("pricing", "pricing").expect("canonical pair"),
        position(Stage::Pricing, Substage::Pricing)
    );
}

#[test]
fn legacy_translation_rejects_unknown_pairs() {
    assert_eq!(
        translate_legacy("declined", "binding"),
        Err(TransitionError::UnknownStage("declined".to_string()))
    );
    assert_eq!(
        translate_legacy("intake", "underwriting_review"),
        Err(TransitionError::UnknownSubstage(
            "underwriting_review".to_string()
        ))
    );
    assert!(matches!(
        translate_legacy("underwriting", "intake_complete"),
        Err(TransitionError::SubstageOutsideStage { .. })
    ));
}
