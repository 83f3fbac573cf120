//! Ladderbot Core — indicators, trend votes, aggregation, filters, sizing, ladder.
//!
//! This crate contains every decision the bot makes, with no I/O of its own
//! beyond the REST adapter behind the collaborator traits:
//! - Domain types (candles, positions, instruments, trade intents)
//! - Indicators (RSI, ATR, Bollinger width, SMA)
//! - Per-timeframe trend classification
//! - Strict and graduated signal aggregation
//! - Sequential filter pipeline
//! - Fixed and graduated sizing with an emergency RSI override
//! - Martingale ladder planning
//! - Policy configuration and fingerprinting

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod policy;
pub mod position_management;
pub mod sizers;
