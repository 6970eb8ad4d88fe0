use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::warn;
use uw_workbench::config::WorkbenchConfig;
use uw_workbench::error::AppError;
use uw_workbench::workflows::underwriting::{
    scenarios, FieldValue, NotificationSink, SubmissionId, TeamRole, Workbench,
};

pub(crate) const ALL_SCENARIOS: &str = "all";
pub(crate) const SESSION_USER: &str = "Sarah Chen";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_workbench(
    config: &WorkbenchConfig,
    sink: Arc<dyn NotificationSink>,
) -> Workbench {
    Workbench::new(config, scenarios::underwriters(), sink).with_user(SESSION_USER)
}

/// Ingest the seeded inbox, limited to `scenario` unless it is `all`.
pub(crate) fn seed_inbox(
    workbench: &mut Workbench,
    scenario: &str,
) -> Result<Vec<SubmissionId>, AppError> {
    let mut ingested = Vec::new();
    for item in scenarios::inbound_emails() {
        if scenario != ALL_SCENARIOS && item.scenario() != scenario {
            continue;
        }
        let Some(record) = scenarios::record_for(item.scenario()) else {
            warn!(scenario = item.scenario(), "no extracted record for inbound item");
            continue;
        };
        ingested.push(workbench.ingest(&item, record)?);
    }
    Ok(ingested)
}

/// Intake confirms the EDR deployment on ACME, releases it, and lets auto-progression run.
pub(crate) fn replay_acme_review(workbench: &mut Workbench) -> Result<SubmissionId, AppError> {
    let existing = workbench
        .submissions()
        .find(|submission| submission.scenario_id == scenarios::ACME)
        .map(|submission| submission.id.clone());
    let id = match existing {
        Some(id) => id,
        None => seed_inbox(workbench, scenarios::ACME)?
            .into_iter()
            .next()
            .ok_or(AppError::StateUnavailable)?,
    };

    let previous_role = workbench.role();
    workbench.set_role(TeamRole::Intake);
    let reviewed = confirm_edr_and_release(workbench, &id);
    workbench.set_role(previous_role);
    reviewed?;
    workbench.settle();
    Ok(id)
}

fn confirm_edr_and_release(workbench: &mut Workbench, id: &SubmissionId) -> Result<(), AppError> {
    workbench.edit_field(
        id,
        "controls.hasEDR",
        FieldValue::Flag(true),
        "Broker confirmed CrowdStrike Falcon on all endpoints",
    )?;
    workbench.advance_substage(id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uw_workbench::workflows::underwriting::MemoryNotifications;

    fn instant() -> Workbench {
        let config = WorkbenchConfig {
            advance_delay_ms: 0,
            ..WorkbenchConfig::default()
        };
        build_workbench(&config, Arc::new(MemoryNotifications::default()))
    }

    #[test]
    fn seeds_selected_scenario_only() {
        let mut workbench = instant();
        let ids = seed_inbox(&mut workbench, scenarios::ZENITH).expect("seeded");
        assert_eq!(ids.len(), 1);
        let submission = workbench.submission(&ids[0]).expect("exists");
        assert_eq!(submission.scenario_id, scenarios::ZENITH);
    }

    #[test]
    fn seeds_whole_inbox() {
        let mut workbench = instant();
        let ids = seed_inbox(&mut workbench, ALL_SCENARIOS).expect("seeded");
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn acme_review_reaches_binding() {
        let mut workbench = instant();
        seed_inbox(&mut workbench, ALL_SCENARIOS).expect("seeded");
        workbench.settle();

        let id = replay_acme_review(&mut workbench).expect("review replayed");

        let submission = workbench.submission(&id).expect("exists");
        assert!(submission.position().is_terminal());
        assert!(!submission.requires_human_review());
        assert_eq!(workbench.feedback_log().len(), 1);
        assert_eq!(workbench.role(), TeamRole::Intake);
    }

    #[test]
    fn failed_review_restores_session_role() {
        let mut workbench = instant();
        seed_inbox(&mut workbench, ALL_SCENARIOS).expect("seeded");
        workbench.settle();
        replay_acme_review(&mut workbench).expect("first review");
        workbench.set_role(TeamRole::Ops);

        let err = replay_acme_review(&mut workbench).expect_err("binding cannot advance");
        assert!(matches!(err, AppError::Workbench(_)));
        assert_eq!(workbench.role(), TeamRole::Ops);
    }
}
