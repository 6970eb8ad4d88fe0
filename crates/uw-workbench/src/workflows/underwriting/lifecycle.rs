use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::domain::Actor;
use super::submission::{EventKind, Submission};

/// Coarse lifecycle phase of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Submission,
    DataCollection,
    Assignment,
    RiskAssessment,
    Pricing,
    Quotation,
    Binding,
}

impl Stage {
    pub const fn ordered() -> [Self; 7] {
        [
            Stage::Submission,
            Stage::DataCollection,
            Stage::Assignment,
            Stage::RiskAssessment,
            Stage::Pricing,
            Stage::Quotation,
            Stage::Binding,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Submission => "submission",
            Stage::DataCollection => "data_collection",
            Stage::Assignment => "assignment",
            Stage::RiskAssessment => "risk_assessment",
            Stage::Pricing => "pricing",
            Stage::Quotation => "quotation",
            Stage::Binding => "binding",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Stage::Submission => "Submission",
            Stage::DataCollection => "Data Collection",
            Stage::Assignment => "Assignment",
            Stage::RiskAssessment => "Risk Assessment",
            Stage::Pricing => "Pricing",
            Stage::Quotation => "Quotation",
            Stage::Binding => "Binding",
        }
    }

    /// Substages in the order a submission walks them.
    pub const fn substages(self) -> &'static [Substage] {
        match self {
            Stage::Submission => &[Substage::DocumentParsing],
            Stage::DataCollection => &[
                Substage::DocumentParsing,
                Substage::ProducerVerification,
                Substage::InitialValidation,
                Substage::IntakeComplete,
            ],
            Stage::Assignment => &[
                Substage::WorkloadBalance,
                Substage::SpecialistMatch,
                Substage::AssignmentComplete,
            ],
            Stage::RiskAssessment => &[
                Substage::RiskProfiling,
                Substage::RulesCheck,
                Substage::CoverageDetermination,
            ],
            Stage::Pricing => &[Substage::Pricing, Substage::QuoteDraft],
            Stage::Quotation => &[Substage::QuoteReview],
            Stage::Binding => &[Substage::Binding],
        }
    }

    pub fn first_substage(self) -> Substage {
        self.substages()[0]
    }

    /// The last substage of the stage; reaching it marks the stage complete.
    pub fn completion_substage(self) -> Substage {
        let substages = self.substages();
        substages[substages.len() - 1]
    }

    pub fn next(self) -> Option<Stage> {
        let ordered = Self::ordered();
        let index = ordered.iter().position(|stage| *stage == self)?;
        ordered.get(index + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = TransitionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Stage::ordered()
            .into_iter()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| TransitionError::UnknownStage(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Substage {
    DocumentParsing,
    ProducerVerification,
    InitialValidation,
    IntakeComplete,
    WorkloadBalance,
    SpecialistMatch,
    AssignmentComplete,
    RiskProfiling,
    RulesCheck,
    CoverageDetermination,
    Pricing,
    QuoteDraft,
    QuoteReview,
    Binding,
}

impl Substage {
    pub const fn all() -> [Self; 14] {
        [
            Substage::DocumentParsing,
            Substage::ProducerVerification,
            Substage::InitialValidation,
            Substage::IntakeComplete,
            Substage::WorkloadBalance,
            Substage::SpecialistMatch,
            Substage::AssignmentComplete,
            Substage::RiskProfiling,
            Substage::RulesCheck,
            Substage::CoverageDetermination,
            Substage::Pricing,
            Substage::QuoteDraft,
            Substage::QuoteReview,
            Substage::Binding,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Substage::DocumentParsing => "document_parsing",
            Substage::ProducerVerification => "producer_verification",
            Substage::InitialValidation => "initial_validation",
            Substage::IntakeComplete => "intake_complete",
            Substage::WorkloadBalance => "workload_balance",
            Substage::SpecialistMatch => "specialist_match",
            Substage::AssignmentComplete => "assignment_complete",
            Substage::RiskProfiling => "risk_profiling",
            Substage::RulesCheck => "rules_check",
            Substage::CoverageDetermination => "coverage_determination",
            Substage::Pricing => "pricing",
            Substage::QuoteDraft => "quote_draft",
            Substage::QuoteReview => "quote_review",
            Substage::Binding => "binding",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Substage::DocumentParsing => "Document Parsing",
            Substage::ProducerVerification => "Producer Verification",
            Substage::InitialValidation => "Initial Validation",
            Substage::IntakeComplete => "Intake Complete",
            Substage::WorkloadBalance => "Workload Balance",
            Substage::SpecialistMatch => "Specialist Match",
            Substage::AssignmentComplete => "Assignment Complete",
            Substage::RiskProfiling => "Risk Profiling",
            Substage::RulesCheck => "Rules Check",
            Substage::CoverageDetermination => "Coverage Determination",
            Substage::Pricing => "Pricing",
            Substage::QuoteDraft => "Quote Draft",
            Substage::QuoteReview => "Quote Review",
            Substage::Binding => "Binding",
        }
    }
}

impl fmt::Display for Substage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Substage {
    type Err = TransitionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Substage::all()
            .into_iter()
            .find(|substage| substage.as_str() == value)
            .ok_or_else(|| TransitionError::UnknownSubstage(value.to_string()))
    }
}

/// A (stage, substage) pair where the substage is guaranteed to belong to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    stage: Stage,
    substage: Substage,
}

#[derive(Deserialize)]
struct RawPosition {
    stage: Stage,
    substage: Substage,
}

impl TryFrom<RawPosition> for Position {
    type Error = TransitionError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::new(raw.stage, raw.substage)
    }
}

impl Position {
    pub fn new(stage: Stage, substage: Substage) -> Result<Self, TransitionError> {
        if stage.substages().contains(&substage) {
            Ok(Self { stage, substage })
        } else {
            Err(TransitionError::SubstageOutsideStage { stage, substage })
        }
    }

    /// Where every newly ingested submission starts.
    pub fn initial() -> Self {
        Self {
            stage: Stage::Submission,
            substage: Stage::Submission.first_substage(),
        }
    }

    /// Entry point of `stage`.
    pub fn start_of(stage: Stage) -> Self {
        Self {
            stage,
            substage: stage.first_substage(),
        }
    }

    /// Completion marker of `stage`.
    pub fn end_of(stage: Stage) -> Self {
        Self {
            stage,
            substage: stage.completion_substage(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn substage(&self) -> Substage {
        self.substage
    }

    fn substage_index(&self) -> usize {
        self.stage
            .substages()
            .iter()
            .position(|substage| *substage == self.substage)
            .unwrap_or_default()
    }

    pub fn is_stage_complete(&self) -> bool {
        self.substage == self.stage.completion_substage()
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal() && self.is_stage_complete()
    }

    /// Global position along the canonical chain, starting at zero.
    pub fn ordinal(&self) -> usize {
        let preceding: usize = Stage::ordered()[..self.stage.index()]
            .iter()
            .map(|stage| stage.substages().len())
            .sum();
        preceding + self.substage_index()
    }

    /// The position reached by a single forward step.
    pub fn next(&self) -> Result<Position, TransitionError> {
        let substages = self.stage.substages();
        let index = self.substage_index();
        if let Some(substage) = substages.get(index + 1) {
            return Ok(Position {
                stage: self.stage,
                substage: *substage,
            });
        }

        match self.stage.next() {
            Some(stage) => Ok(Position::start_of(stage)),
            None => Err(TransitionError::Terminal {
                stage: self.stage,
                substage: self.substage,
            }),
        }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stage, self.substage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("unknown stage '{0}'")]
    UnknownStage(String),
    #[error("unknown substage '{0}'")]
    UnknownSubstage(String),
    #[error("substage {substage} does not belong to stage {stage}")]
    SubstageOutsideStage { stage: Stage, substage: Substage },
    #[error("{stage}/{substage} is the end of the lifecycle; no further transition exists")]
    Terminal { stage: Stage, substage: Substage },
}

/// Outcome of a successful forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Position,
    pub to: Position,
}

impl Transition {
    pub fn is_stage_change(&self) -> bool {
        self.from.stage() != self.to.stage()
    }

    pub fn describe(&self) -> String {
        if self.is_stage_change() {
            format!(
                "Stage changed from {} to {}",
                self.from.stage(),
                self.to.stage()
            )
        } else {
            format!(
                "Substage changed from {} to {}",
                self.from.substage(),
                self.to.substage()
            )
        }
    }
}

/// Move `submission` one step forward, recording the change in its history.
///
/// A terminal submission is left untouched and the call returns
/// [`TransitionError::Terminal`].
pub fn advance(
    submission: &mut Submission,
    actor: &Actor,
    at: DateTime<Utc>,
) -> Result<Transition, TransitionError> {
    let from = submission.position();
    let to = from.next()?;
    let transition = Transition { from, to };

    submission.move_to(to, at);
    let kind = if transition.is_stage_change() {
        EventKind::StageChange
    } else {
        EventKind::SubstageChange
    };
    submission.record_event(kind, actor, transition.describe(), at);

    Ok(transition)
}

/// Stage names used by records produced before the lifecycle was split into seven stages.
const LEGACY_STAGES: &[(&str, &[Stage])] = &[
    ("inbox", &[Stage::Submission]),
    ("intake", &[Stage::DataCollection]),
    (
        "underwriting",
        &[
            Stage::RiskAssessment,
            Stage::Pricing,
            Stage::Quotation,
            Stage::Binding,
        ],
    ),
    ("quoted", &[Stage::Quotation, Stage::Binding]),
    ("bound", &[Stage::Binding]),
];

/// Map a stored stage/substage pair, canonical or legacy, onto the canonical chain.
pub fn translate_legacy(stage: &str, substage: &str) -> Result<Position, TransitionError> {
    let substage: Substage = substage.parse()?;

    if let Ok(stage) = stage.parse::<Stage>() {
        return Position::new(stage, substage);
    }

    let (_, candidates) = LEGACY_STAGES
        .iter()
        .find(|(name, _)| *name == stage)
        .ok_or_else(|| TransitionError::UnknownStage(stage.to_string()))?;

    candidates
        .iter()
        .find(|candidate| candidate.substages().contains(&substage))
        .map(|candidate| Position {
            stage: *candidate,
            substage,
        })
        .ok_or(TransitionError::SubstageOutsideStage {
            stage: candidates[0],
            substage,
        })
}
