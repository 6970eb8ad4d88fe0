use crate::infra::{build_workbench, replay_acme_review, seed_inbox, ALL_SCENARIOS};
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use uw_workbench::config::AppConfig;
use uw_workbench::error::AppError;
use uw_workbench::workflows::underwriting::{
    write_feedback_csv, BroadcastNotifications, MemoryNotifications, Notification, Workbench,
};

const NOTIFICATION_CAPACITY: usize = 256;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Scenario to ingest: acme, zenith, edgecase, or all.
    #[arg(long, default_value = ALL_SCENARIOS, value_parser = ["acme", "zenith", "edgecase", "all"])]
    pub(crate) scenario: String,
    /// Replay the scripted intake review of ACME after auto-progression settles.
    #[arg(long)]
    pub(crate) review: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct FeedbackExportArgs {
    /// Write the CSV to this path instead of stdout.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let broadcast = BroadcastNotifications::new(NOTIFICATION_CAPACITY);
    let mut receiver = broadcast.subscribe();
    let mut workbench = build_workbench(&config.workbench, Arc::new(broadcast));

    println!("Cyber underwriting workbench demo");
    let ingested = seed_inbox(&mut workbench, &args.scenario)?;
    let advanced = workbench.settle();
    println!(
        "Ingested {} submission(s); auto-progression applied {} advance(s)",
        ingested.len(),
        advanced
    );

    println!("\nNotifications");
    drain_notifications(&mut receiver);
    render_positions(&workbench);

    if args.review {
        println!("\nScripted ACME review (intake confirms EDR)");
        replay_acme_review(&mut workbench)?;
        drain_notifications(&mut receiver);
        render_positions(&workbench);
    }

    render_metrics(&workbench);
    Ok(())
}

pub(crate) fn run_feedback_export(args: FeedbackExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let mut workbench =
        build_workbench(&config.workbench, Arc::new(MemoryNotifications::default()));
    seed_inbox(&mut workbench, ALL_SCENARIOS)?;
    workbench.settle();
    replay_acme_review(&mut workbench)?;

    match args.output {
        Some(path) => {
            let file = File::create(&path)?;
            write_feedback_csv(workbench.feedback_log(), BufWriter::new(file))?;
            println!("Feedback log written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_feedback_csv(workbench.feedback_log(), &mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}

fn drain_notifications(receiver: &mut broadcast::Receiver<Notification>) {
    loop {
        match receiver.try_recv() {
            Ok(notification) => println!("  {}", format_notification(&notification)),
            Err(TryRecvError::Lagged(skipped)) => {
                println!("  ... {skipped} notification(s) dropped")
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

fn format_notification(notification: &Notification) -> String {
    format!(
        "[{}] {}: {}",
        notification.kind.label(),
        notification.submission_id,
        notification.message
    )
}

fn render_positions(workbench: &Workbench) {
    println!("\nSubmissions");
    for submission in workbench.submissions() {
        let assigned = submission
            .assigned_underwriter()
            .and_then(|id| {
                workbench
                    .underwriters()
                    .iter()
                    .find(|underwriter| &underwriter.id == id)
            })
            .map(|underwriter| underwriter.name.as_str())
            .unwrap_or("unassigned");
        println!(
            "  {} {} -> {} (confidence {}%, underwriter: {})",
            submission.id,
            submission.insured.name.value,
            submission.position(),
            submission.confidence,
            assigned
        );
        if let Some(reason) = submission.review_reason() {
            println!("    Review required: {reason}");
        }
    }
}

fn render_metrics(workbench: &Workbench) {
    let metrics = workbench.metrics();
    println!("\nWorkbench metrics");
    println!(
        "  Total: {} | Awaiting review: {} | Scheduled advances: {} | Feedback entries: {}",
        metrics.total_submissions,
        metrics.pending_review,
        metrics.scheduled_advances,
        metrics.feedback_entries
    );
    for stage in metrics.stages.iter().filter(|stage| stage.submissions > 0) {
        let confidence = stage
            .average_confidence
            .map(|value| format!("{value}%"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {:<16} {} submission(s), avg confidence {}",
            stage.label, stage.submissions, confidence
        );
    }
    for count in &metrics.overrides_by_field {
        println!("  Overrides on {}: {}", count.field_label, count.overrides);
    }
}
