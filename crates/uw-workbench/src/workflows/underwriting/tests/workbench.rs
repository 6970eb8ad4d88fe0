use std::sync::Arc;

use chrono::{Duration, Utc};

use super::common::*;

use crate::config::WorkbenchConfig;
use crate::workflows::underwriting::domain::{FieldValue, TeamRole, UnderwriterId};
use crate::workflows::underwriting::lifecycle::{Position, Stage, Substage};
use crate::workflows::underwriting::notifications::NotificationKind;
use crate::workflows::underwriting::progression::SpecialtyMatch;
use crate::workflows::underwriting::report::write_feedback_csv;
use crate::workflows::underwriting::scenarios;
use crate::workflows::underwriting::submission::{EventKind, Submission, SubmissionId};
use crate::workflows::underwriting::{Workbench, WorkbenchError};

fn count_events(workbench: &Workbench, id: &SubmissionId, kind: EventKind) -> usize {
    workbench
        .submission(id)
        .expect("submission exists")
        .history()
        .iter()
        .filter(|event| event.kind == kind)
        .count()
}

#[test]
fn low_edr_confidence_stops_acme_at_submission() {
    let (mut workbench, notifications) = build_workbench(&instant_config());
    let id = ingest_scenario(&mut workbench, scenarios::ACME);

    assert_eq!(workbench.settle(), 0);

    let submission = workbench.submission(&id).expect("ingested");
    assert_eq!(submission.position(), Position::initial());
    assert!(submission.requires_human_review());
    let reason = submission.review_reason().expect("reason recorded");
    assert!(reason.contains("EDR"), "{reason}");
    assert_eq!(workbench.pending_advances(), 0);
    assert_eq!(
        kinds(&notifications.events()),
        vec![NotificationKind::Ingested, NotificationKind::ReviewRequired]
    );
}

#[test]
fn reviewed_acme_progresses_to_binding() {
    let (mut workbench, notifications) = build_workbench(&instant_config());
    let id = ingest_scenario(&mut workbench, scenarios::ACME);

    let feedback = workbench
        .edit_field(&id, "controls.hasEDR", FieldValue::Flag(true), "Confirmed CrowdStrike")
        .expect("intake may edit");
    assert_eq!(feedback.original_value, FieldValue::Flag(false));
    assert_eq!(feedback.original_confidence, 45);

    let submission = workbench.submission(&id).expect("exists");
    assert!(submission.requires_human_review());
    assert_eq!(submission.confidence, 96);

    let transition = workbench.advance_substage(&id).expect("manual advance");
    assert_eq!(
        transition.to,
        position(Stage::DataCollection, Substage::DocumentParsing)
    );
    assert!(!workbench
        .submission(&id)
        .expect("exists")
        .requires_human_review());

    assert_eq!(workbench.settle(), 13);

    let submission = workbench.submission(&id).expect("exists");
    assert_eq!(submission.position(), Position::end_of(Stage::Binding));
    assert_eq!(
        submission.assigned_underwriter(),
        Some(&UnderwriterId("uw-001".to_string()))
    );
    assert!(!submission.requires_human_review());
    let pricing = &submission.quote.as_ref().expect("quote").pricing;
    assert_eq!(pricing.final_premium.value, 46_200);
    assert_eq!(pricing.total_cost.value, 48_930);

    assert_eq!(count_events(&workbench, &id, EventKind::StageChange), 7);
    assert_eq!(count_events(&workbench, &id, EventKind::SubstageChange), 8);
    assert_eq!(count_events(&workbench, &id, EventKind::FieldEdit), 1);
    assert_eq!(count_events(&workbench, &id, EventKind::Assignment), 1);
    assert_eq!(workbench.pending_advances(), 0);

    let kinds = kinds(&notifications.events());
    assert!(kinds.contains(&NotificationKind::FieldEdited));
    assert!(kinds.contains(&NotificationKind::AutoAssigned));
    assert!(kinds.contains(&NotificationKind::StageChanged));
}

#[test]
fn confident_submission_is_auto_assigned_and_bound() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    let id = ingest_scenario(&mut workbench, scenarios::ZENITH);

    workbench.settle();

    let submission = workbench.submission(&id).expect("exists");
    assert!(submission.position().is_terminal());
    assert!(!submission.requires_human_review());
    assert_eq!(
        submission.assigned_underwriter(),
        Some(&UnderwriterId("uw-001".to_string()))
    );
    let assignment = submission
        .history()
        .iter()
        .find(|event| event.kind == EventKind::Assignment)
        .expect("assignment recorded");
    assert_eq!(assignment.description, "Assigned to David Martinez");
    assert_eq!(assignment.actor, "Assignment Team");

    let positions: Vec<String> = submission
        .history()
        .iter()
        .filter(|event| event.actor == "System")
        .map(|event| event.description.clone())
        .collect();
    assert_eq!(positions.first().map(String::as_str), Some("Submission created from email ingestion"));
    assert_eq!(
        positions.last().map(String::as_str),
        Some("Stage changed from quotation to binding")
    );
}

#[test]
fn edit_reschedules_the_pending_advance() {
    let (mut workbench, _notifications) = build_workbench(&WorkbenchConfig::default());
    let id = ingest_scenario(&mut workbench, scenarios::ZENITH);
    assert_eq!(workbench.pending_advances(), 1);
    let first_due = workbench.next_due().expect("advance scheduled");

    workbench
        .edit_field(
            &id,
            "insured.website",
            FieldValue::Text("https://zenith.example".to_string()),
            "",
        )
        .expect("intake may edit");

    assert_eq!(workbench.pending_advances(), 1);
    let second_due = workbench.next_due().expect("advance rescheduled");
    assert!(second_due >= first_due);

    let fired = workbench.fire_due(Utc::now() + Duration::seconds(5));
    assert_eq!(fired, 1);
    assert_eq!(
        workbench.submission(&id).expect("exists").position(),
        position(Stage::DataCollection, Substage::DocumentParsing)
    );
    assert_eq!(workbench.pending_advances(), 1);
}

#[test]
fn advances_are_not_fired_before_they_are_due() {
    let config = WorkbenchConfig {
        advance_delay_ms: 60_000,
        ..WorkbenchConfig::default()
    };
    let (mut workbench, _notifications) = build_workbench(&config);
    let id = ingest_scenario(&mut workbench, scenarios::ZENITH);

    assert_eq!(workbench.fire_due(Utc::now()), 0);
    assert_eq!(
        workbench.submission(&id).expect("exists").position(),
        Position::initial()
    );
}

#[test]
fn ops_cannot_edit_submissions() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    let id = ingest_scenario(&mut workbench, scenarios::ACME);
    let before = workbench.submission(&id).cloned().expect("exists");
    workbench.set_role(TeamRole::Ops);

    let err = workbench
        .edit_field(&id, "controls.hasEDR", FieldValue::Flag(true), "")
        .expect_err("ops is read-only");

    assert!(matches!(
        err,
        WorkbenchError::NotPermitted {
            role: TeamRole::Ops,
            action: "edit",
            stage: Stage::Submission,
        }
    ));
    assert_eq!(workbench.submission(&id), Some(&before));
    assert!(workbench.feedback_log().is_empty());
}

#[test]
fn teams_only_advance_their_own_stages() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    let id = ingest_scenario(&mut workbench, scenarios::ACME);
    workbench.set_role(TeamRole::Underwriting);

    let err = workbench.advance_substage(&id).expect_err("not underwriting's stage");
    assert!(matches!(
        err,
        WorkbenchError::NotPermitted {
            action: "advance",
            ..
        }
    ));
    assert!(workbench.submission(&id).expect("exists").requires_human_review());
}

#[test]
fn rejected_edit_leaves_store_unchanged() {
    let (mut workbench, notifications) = build_workbench(&instant_config());
    let id = ingest_scenario(&mut workbench, scenarios::ACME);
    let before = workbench.submission(&id).cloned().expect("exists");
    let notices = notifications.events().len();

    let err = workbench
        .edit_field(&id, "insured.annualRevenue", FieldValue::Flag(true), "")
        .expect_err("wrong kind");

    assert!(matches!(err, WorkbenchError::Edit(_)));
    assert_eq!(workbench.submission(&id), Some(&before));
    assert_eq!(notifications.events().len(), notices);
}

#[test]
fn unknown_ids_are_reported() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    let id = ingest_scenario(&mut workbench, scenarios::ACME);
    let missing = SubmissionId("sub-9999".to_string());

    assert!(matches!(
        workbench.advance_substage(&missing),
        Err(WorkbenchError::SubmissionNotFound(_))
    ));
    assert!(matches!(
        workbench.assign_underwriter(&id, &UnderwriterId("uw-999".to_string())),
        Err(WorkbenchError::UnderwriterNotFound(_))
    ));
    assert!(workbench.select_submission(Some(missing)).is_err());
    assert!(workbench.selected().is_none());

    workbench
        .select_submission(Some(id.clone()))
        .expect("known submission");
    assert_eq!(workbench.selected().map(|submission| &submission.id), Some(&id));
}

#[test]
fn inserting_duplicate_submission_fails() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    workbench
        .insert(acme_at(Stage::DataCollection, Substage::IntakeComplete))
        .expect("first insert");

    let err = workbench
        .insert(acme_at(Stage::DataCollection, Substage::IntakeComplete))
        .expect_err("duplicate");
    assert!(matches!(err, WorkbenchError::DuplicateSubmission(_)));

    let staged = workbench
        .submission(&SubmissionId("sub-test".to_string()))
        .expect("inserted");
    assert!(staged.requires_human_review());
    assert_eq!(staged.substage(), Substage::IntakeComplete);
}

#[test]
fn insert_rejects_review_flag_without_reason() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    let mut record = serde_json::to_value(acme_at(Stage::Submission, Substage::DocumentParsing))
        .expect("serializable");
    record["requiresHumanReview"] = serde_json::Value::Bool(true);
    let restored: Submission = serde_json::from_value(record).expect("deserializes");

    let err = workbench.insert(restored).expect_err("inconsistent record");
    assert!(matches!(err, WorkbenchError::InconsistentSubmission { .. }));
    assert!(workbench
        .submission(&SubmissionId("sub-test".to_string()))
        .is_none());
    assert_eq!(workbench.submissions().count(), 0);
}

#[test]
fn strict_matching_requires_manual_assignment() {
    let config = WorkbenchConfig {
        specialty_match: SpecialtyMatch::Strict,
        ..instant_config()
    };
    let (mut workbench, notifications) = build_workbench(&config);
    let id = ingest_scenario(&mut workbench, scenarios::EDGE_CASE);
    workbench.settle();

    let submission = workbench.submission(&id).expect("exists");
    assert_eq!(
        submission.position(),
        position(Stage::Assignment, Substage::AssignmentComplete)
    );
    assert_eq!(
        submission.review_reason(),
        Some("No underwriter assigned - manual assignment required")
    );

    workbench.set_role(TeamRole::Assignment);
    workbench
        .assign_underwriter(&id, &UnderwriterId("uw-004".to_string()))
        .expect("assignment team may assign");
    workbench.advance_substage(&id).expect("manual advance");
    workbench.settle();

    let submission = workbench.submission(&id).expect("exists");
    assert!(submission.position().is_terminal());
    assert_eq!(
        submission.assigned_underwriter(),
        Some(&UnderwriterId("uw-004".to_string()))
    );
    assert!(kinds(&notifications.events()).contains(&NotificationKind::Assigned));
}

#[test]
fn unassigned_submission_cannot_be_pushed_out_of_assignment() {
    let config = WorkbenchConfig {
        specialty_match: SpecialtyMatch::Strict,
        ..instant_config()
    };
    let (mut workbench, _notifications) = build_workbench(&config);
    let id = ingest_scenario(&mut workbench, scenarios::EDGE_CASE);
    workbench.settle();
    let before = workbench.submission(&id).expect("exists").clone();

    workbench.set_role(TeamRole::Assignment);
    let err = workbench
        .advance_substage(&id)
        .expect_err("advance refused without an underwriter");
    assert!(matches!(err, WorkbenchError::UnassignedSubmission(ref refused) if refused == &id));
    workbench.settle();

    let after = workbench.submission(&id).expect("exists");
    assert_eq!(after, &before);
    assert_eq!(
        after.position(),
        position(Stage::Assignment, Substage::AssignmentComplete)
    );
    assert!(after.requires_human_review());
    assert!(after.assigned_underwriter().is_none());
}

#[test]
fn notification_failures_do_not_block_progression() {
    let mut workbench = Workbench::new(
        &instant_config(),
        scenarios::underwriters(),
        Arc::new(FailingSink),
    );
    let id = ingest_scenario(&mut workbench, scenarios::ZENITH);

    workbench.settle();

    assert!(workbench
        .submission(&id)
        .expect("exists")
        .position()
        .is_terminal());
}

#[test]
fn queues_follow_team_visibility() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    let acme = ingest_scenario(&mut workbench, scenarios::ACME);
    let zenith = ingest_scenario(&mut workbench, scenarios::ZENITH);
    workbench.settle();

    let ids = |role| -> Vec<SubmissionId> {
        workbench
            .queue_for_role(role)
            .into_iter()
            .map(|submission| submission.id.clone())
            .collect()
    };
    assert_eq!(ids(TeamRole::Intake), vec![acme.clone()]);
    assert_eq!(ids(TeamRole::Underwriting), vec![zenith.clone()]);
    assert_eq!(ids(TeamRole::Assignment), vec![zenith.clone()]);
    assert_eq!(ids(TeamRole::Ops), vec![acme, zenith]);
}

#[test]
fn metrics_and_feedback_export_cover_the_review() {
    let (mut workbench, _notifications) = build_workbench(&instant_config());
    let acme = ingest_scenario(&mut workbench, scenarios::ACME);
    ingest_scenario(&mut workbench, scenarios::ZENITH);
    workbench
        .edit_field(&acme, "controls.hasEDR", FieldValue::Flag(true), "Confirmed CrowdStrike")
        .expect("intake may edit");
    workbench.settle();

    let metrics = workbench.metrics();
    assert_eq!(metrics.total_submissions, 2);
    assert_eq!(metrics.pending_review, 1);
    assert_eq!(metrics.scheduled_advances, 0);
    assert_eq!(metrics.feedback_entries, 1);
    assert_eq!(metrics.overrides_by_field[0].field_label, "EDR");
    let submission_stage = &metrics.stages[0];
    assert_eq!(submission_stage.stage, Stage::Submission);
    assert_eq!(submission_stage.submissions, 1);
    assert_eq!(submission_stage.awaiting_review, 1);
    assert_eq!(submission_stage.average_confidence, Some(96));
    let binding = metrics.stages.last().expect("binding summary");
    assert_eq!(binding.submissions, 1);

    let mut buffer = Vec::new();
    write_feedback_csv(workbench.feedback_log(), &mut buffer).expect("csv written");
    let csv = String::from_utf8(buffer).expect("utf8");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,submission_id,stage,substage,field_path,field_label,original_value,original_confidence,new_value,edited_by,edited_at,comment,downstream_impact")
    );
    let row = lines.next().expect("feedback row");
    assert!(row.starts_with("fb-sub-0001-0001,sub-0001,submission,document_parsing,controls.hasEDR,EDR,false,45,true,Priya Shah,"));
    assert!(row.ends_with("Confirmed CrowdStrike,Risk Score; Controls Score; Pricing Loadings; Coverage Conditions"));
    assert!(lines.next().is_none());
}
