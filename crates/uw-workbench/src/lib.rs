//! Underwriting workbench core: submission lifecycle, confidence gating, automated
//! progression, and field overrides with downstream recalculation.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
