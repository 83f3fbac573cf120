//! Analysis result — the verdict that flows from the aggregator through the
//! filter pipeline into sizing.
//!
//! A closed struct: filters return a modified copy, never an open-ended map.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::trend::TrendVote;
use crate::domain::Side;

/// Confidence in the overall trend. Ordered: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiInterpretation {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiInterpretation {
    /// Strictly below `oversold` or strictly above `overbought`; neutral otherwise.
    pub fn classify(rsi: f64, oversold: f64, overbought: f64) -> Self {
        if rsi < oversold {
            RsiInterpretation::Oversold
        } else if rsi > overbought {
            RsiInterpretation::Overbought
        } else {
            RsiInterpretation::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RsiInterpretation::Oversold => "oversold",
            RsiInterpretation::Neutral => "neutral",
            RsiInterpretation::Overbought => "overbought",
        }
    }
}

impl fmt::Display for RsiInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the three timeframe votes line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    AllUptrend,
    AllDowntrend,
    MajorityUptrend,
    MajorityDowntrend,
    Conflicting,
}

impl Alignment {
    pub fn is_unanimous(&self) -> bool {
        matches!(self, Alignment::AllUptrend | Alignment::AllDowntrend)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::AllUptrend => "all_uptrend",
            Alignment::AllDowntrend => "all_downtrend",
            Alignment::MajorityUptrend => "majority_uptrend",
            Alignment::MajorityDowntrend => "majority_downtrend",
            Alignment::Conflicting => "conflicting",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend votes of the three analysis timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframeVotes {
    pub m5: TrendVote,
    pub m15: TrendVote,
    pub h1: TrendVote,
}

impl TimeframeVotes {
    pub fn new(m5: TrendVote, m15: TrendVote, h1: TrendVote) -> Self {
        Self { m5, m15, h1 }
    }

    pub fn uniform(vote: TrendVote) -> Self {
        Self::new(vote, vote, vote)
    }

    pub fn iter(&self) -> impl Iterator<Item = TrendVote> {
        [self.m5, self.m15, self.h1].into_iter()
    }

    pub fn count(&self, vote: TrendVote) -> usize {
        self.iter().filter(|v| *v == vote).count()
    }

    pub fn alignment(&self) -> Alignment {
        let up = self.count(TrendVote::Uptrend);
        let down = self.count(TrendVote::Downtrend);
        if up == 3 {
            Alignment::AllUptrend
        } else if down == 3 {
            Alignment::AllDowntrend
        } else if up >= 2 {
            Alignment::MajorityUptrend
        } else if down >= 2 {
            Alignment::MajorityDowntrend
        } else {
            Alignment::Conflicting
        }
    }
}

/// Output of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub trend: TrendVote,
    pub confidence: Confidence,
    pub confidence_reason: String,
    /// RSI of the 5m closes, 0..=100.
    pub rsi: f64,
    pub rsi_interpretation: RsiInterpretation,
    pub votes: TimeframeVotes,
    pub alignment: Alignment,
    /// Last 5m close.
    pub current_price: f64,
    pub daily_high: Option<f64>,
    pub daily_low: Option<f64>,
    /// Set when the consolidation filter fired but was waived for a unanimous trend.
    pub consolidation_bypassed: bool,
}

impl AnalysisResult {
    pub fn is_directional(&self) -> bool {
        self.trend.is_directional()
    }

    pub fn side(&self) -> Option<Side> {
        self.trend.side()
    }

    /// Overwrite the verdict with sideways/low and the given reason.
    pub fn vetoed(self, reason: impl Into<String>) -> Self {
        Self {
            trend: TrendVote::Sideways,
            confidence: Confidence::Low,
            confidence_reason: reason.into(),
            ..self
        }
    }
}
