//! Ladderbot Runner — cycle orchestration on top of `ladderbot-core`.
//!
//! This crate provides:
//! - Environment settings with `.env` support and policy overrides
//! - One decision cycle end to end (positions, decision, orders, broadcast)
//! - Order execution against any `BrokerGateway`, including a dry-run one
//! - Cycle statistics and structured analysis reports
//! - The supervised polling loop

pub mod config;
pub mod dry_run;
pub mod execution;
pub mod report;
pub mod runner;
pub mod stats;

pub use config::{ConfigError, Settings};
pub use dry_run::DryRunGateway;
pub use execution::{OrderExecutor, TakeProfitSummary};
pub use report::{AnalysisReport, DecisionSummary};
pub use runner::{CycleError, CycleOutcome, CycleReport, CycleRunner};
pub use stats::CycleStats;
