//! Decision components — the composition model.
//!
//! A strategy is composed of independent, policy-selected components:
//! - Trend classifier: one vote per timeframe
//! - Signal aggregator: votes + RSI into a single verdict
//! - Filter pipeline: sequential vetoes and confidence adjustments
//! - Sizer: lot multiplier for an accepted verdict
//!
//! Plus the emergency RSI override, which sits after sizing and before any
//! order is built.

pub mod aggregator;
pub mod analysis;
pub mod composition;
pub mod factory;
pub mod filter;
pub mod trend;

pub use aggregator::{AggregatorInput, RsiBands, SignalAggregator};
pub use analysis::{
    Alignment, AnalysisResult, Confidence, RsiInterpretation, TimeframeVotes,
};
pub use composition::{AbstainReason, Analysis, EntryDecision, Strategy};
pub use factory::{create_aggregator, create_emergency, create_pipeline, create_sizer};
pub use filter::{
    AnalysisFilter, FilterEvaluation, FilterOutcome, FilterPipeline, FilterVerdict, MarketContext,
    PipelineOutcome,
};
pub use trend::{classify_trend, TrendVote, TrendWindows};
