//! Cyber submissions moving from intake to binding.
//!
//! A [`Workbench`] owns every submission and re-runs the [`AutoProgressionPolicy`]
//! after each accepted mutation. Plain advances are deferred through
//! [`PendingAdvances`]; assignments and review flags apply immediately.

pub mod confidence;
pub mod domain;
pub mod edits;
pub mod intake;
pub mod lifecycle;
pub mod notifications;
pub mod progression;
pub mod report;
pub mod router;
pub mod scenarios;
pub mod submission;
mod workbench;

#[cfg(test)]
mod tests;

pub use confidence::{ConfidenceEvaluator, LowConfidenceFinding};
pub use domain::{
    Actor, Citation, CoverageRecommendation, CyberControls, Field, FieldValue, IntakeChannel,
    Insured, PriceAdjustment, PricingDetails, Quote, QuoteStatus, RiskProfile, TeamRole,
    ThreatSeverity, ThreatSignal, Underwriter, UnderwriterId, UnderwriterTier,
};
pub use edits::{DependencyTable, EditEngine, EditError, EditRequest, FieldPath};
pub use intake::InboundItem;
pub use lifecycle::{advance, translate_legacy, Position, Stage, Substage, Transition, TransitionError};
pub use notifications::{
    BroadcastNotifications, MemoryNotifications, Notification, NotificationFanout,
    NotificationKind, NotificationSink, NotifyError, TracingNotifications,
};
pub use progression::{AutoProgressionPolicy, Decision, PendingAdvances, SpecialtyMatch};
pub use report::{write_feedback_csv, WorkbenchMetrics};
pub use router::{workbench_router, SubmissionSummary, WorkbenchState};
pub use submission::{
    EventKind, ExtractedRecord, FeedbackEntry, Submission, SubmissionEvent, SubmissionId,
};
pub use workbench::{Workbench, WorkbenchError};
