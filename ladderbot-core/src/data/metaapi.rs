//! MetaApi-style REST adapter.
//!
//! Implements all three collaborator traits over one blocking HTTP client.
//! GETs (candles, positions) retry with exponential backoff; trade POSTs are
//! sent exactly once so an order is never duplicated. A shared circuit
//! breaker fails every call fast after repeated failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::canonicalize::canonicalize_candles;
use super::circuit_breaker::CircuitBreaker;
use super::provider::{
    BrokerError, BrokerGateway, DataError, MarketDataProvider, OrderConfirmation, OrderRequest,
    PositionStore,
};
use crate::domain::{Candle, OrderId, Position, PositionId, Side, Timeframe};

const RELATIVE_PIPS: &str = "RELATIVE_PIPS";

/// Broker return codes that mean the request went through.
const SUCCESS_CODES: [&str; 4] = [
    "ERR_NO_ERROR",
    "TRADE_RETCODE_DONE",
    "TRADE_RETCODE_DONE_PARTIAL",
    "TRADE_RETCODE_PLACED",
];

// ─── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireCandle {
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePosition {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    symbol: String,
    time: DateTime<Utc>,
    open_price: f64,
    current_price: f64,
    volume: f64,
    #[serde(default)]
    take_profit: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct TradeRequest<'a> {
    action_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<f64>,
    take_profit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    take_profit_units: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeResponse {
    #[serde(default)]
    numeric_code: i64,
    #[serde(default)]
    string_code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    position_id: Option<String>,
}

fn parse_candles(body: &str) -> Result<Vec<Candle>, DataError> {
    let wire: Vec<WireCandle> = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("candles: {e}")))?;
    let raw = wire
        .into_iter()
        .map(|c| Candle {
            open_time: c.time,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
        })
        .collect();
    let canonical = canonicalize_candles(raw);
    if canonical.dropped_invalid > 0 || canonical.dropped_duplicates > 0 {
        debug!(
            dropped_invalid = canonical.dropped_invalid,
            dropped_duplicates = canonical.dropped_duplicates,
            "canonicalized candles"
        );
    }
    Ok(canonical.candles)
}

fn parse_side(kind: &str) -> Option<Side> {
    match kind {
        "POSITION_TYPE_BUY" => Some(Side::Long),
        "POSITION_TYPE_SELL" => Some(Side::Short),
        _ => None,
    }
}

fn parse_positions(body: &str, symbol: &str) -> Result<Vec<Position>, DataError> {
    let wire: Vec<WirePosition> = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("positions: {e}")))?;

    let mut positions = Vec::with_capacity(wire.len());
    for p in wire.into_iter().filter(|p| p.symbol == symbol) {
        let side = parse_side(&p.kind).ok_or_else(|| {
            DataError::ResponseFormatChanged(format!("unknown position type {} for {}", p.kind, p.id))
        })?;
        positions.push(Position {
            id: PositionId::new(p.id),
            symbol: p.symbol,
            side,
            entry_price: p.open_price,
            current_price: p.current_price,
            volume: p.volume,
            opened_at: p.time,
            take_profit: p.take_profit,
        });
    }
    positions.sort_by_key(|p| p.opened_at);
    Ok(positions)
}

fn order_action(side: Side) -> &'static str {
    match side {
        Side::Long => "ORDER_TYPE_BUY",
        Side::Short => "ORDER_TYPE_SELL",
    }
}

fn order_body(request: &OrderRequest) -> TradeRequest<'_> {
    TradeRequest {
        action_type: order_action(request.side),
        symbol: Some(&request.symbol),
        volume: Some(request.volume),
        take_profit: request.take_profit,
        comment: Some(&request.comment),
        take_profit_units: request.take_profit_is_relative.then_some(RELATIVE_PIPS),
        position_id: None,
    }
}

fn modify_body(position_id: &PositionId, take_profit: f64) -> TradeRequest<'_> {
    TradeRequest {
        action_type: "POSITION_MODIFY",
        symbol: None,
        volume: None,
        take_profit,
        comment: None,
        take_profit_units: None,
        position_id: Some(position_id.as_str()),
    }
}

fn confirmation(body: &str) -> Result<OrderConfirmation, BrokerError> {
    let response: TradeResponse = serde_json::from_str(body)
        .map_err(|e| BrokerError::ResponseFormatChanged(format!("trade response: {e}")))?;
    if !SUCCESS_CODES.contains(&response.string_code.as_str()) {
        return Err(BrokerError::Rejected {
            code: response.string_code,
            message: response.message,
        });
    }
    Ok(OrderConfirmation {
        numeric_code: response.numeric_code,
        string_code: response.string_code,
        message: response.message,
        order_id: response.order_id.map(OrderId::new),
        position_id: response.position_id.map(PositionId::new),
    })
}

// ─── Client ──────────────────────────────────────────────────────────

/// Result of one HTTP attempt inside a retried request.
enum Attempt<T> {
    Done(T),
    /// Transient: back off and try again.
    Retry(DataError),
    /// Permanent: give up now.
    Fail(DataError),
}

/// Connection settings for the REST adapter.
#[derive(Debug, Clone)]
pub struct MetaApiConfig {
    pub api_key: String,
    pub account_id: String,
    /// Trading API base (positions, trade).
    pub base_url: String,
    /// Market data API base (candles).
    pub market_base_url: String,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl MetaApiConfig {
    pub fn new(
        api_key: impl Into<String>,
        account_id: impl Into<String>,
        base_url: impl Into<String>,
        market_base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            account_id: account_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            market_base_url: market_base_url.into().trim_end_matches('/').to_string(),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn candles_url(&self, symbol: &str, timeframe: Timeframe) -> String {
        format!(
            "{}/users/current/accounts/{}/historical-market-data/symbols/{}/timeframes/{}/candles",
            self.market_base_url, self.account_id, symbol, timeframe
        )
    }

    pub fn positions_url(&self) -> String {
        format!("{}/users/current/accounts/{}/positions", self.base_url, self.account_id)
    }

    pub fn trade_url(&self) -> String {
        format!("{}/users/current/accounts/{}/trade", self.base_url, self.account_id)
    }
}

pub struct MetaApiClient {
    client: reqwest::blocking::Client,
    config: MetaApiConfig,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl MetaApiClient {
    pub fn new(config: MetaApiConfig, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            circuit_breaker,
        })
    }

    pub fn config(&self) -> &MetaApiConfig {
        &self.config
    }

    /// GET with retry, backoff and the circuit breaker. Returns the body text.
    fn get_with_retry(&self, url: &str, context: &str) -> Result<String, DataError> {
        self.with_retry(context, || {
            let response = match self
                .client
                .get(url)
                .header("auth-token", &self.config.api_key)
                .send()
            {
                Ok(resp) => resp,
                Err(e) => return Attempt::Retry(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Attempt::Fail(DataError::AuthenticationRequired(format!(
                    "HTTP {status} from {context}"
                )));
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                return Attempt::Retry(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
            }

            if !status.is_success() {
                return Attempt::Retry(DataError::Http {
                    status: status.as_u16(),
                    context: context.to_string(),
                });
            }

            match response.text() {
                Ok(body) => Attempt::Done(body),
                Err(e) => Attempt::Fail(DataError::ResponseFormatChanged(format!("{context}: {e}"))),
            }
        })
    }

    /// Run `attempt` up to `max_retries + 1` times with exponential backoff.
    ///
    /// The breaker sees one outcome per call, not one per attempt.
    fn with_retry<T>(
        &self,
        context: &str,
        mut attempt: impl FnMut() -> Attempt<T>,
    ) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        for n in 0..=self.config.max_retries {
            if n > 0 {
                let delay = self.config.base_delay * 2u32.pow(n - 1);
                debug!(context, attempt = n, ?delay, "retrying request");
                std::thread::sleep(delay);
            }

            match attempt() {
                Attempt::Done(value) => {
                    self.circuit_breaker.record_success();
                    return Ok(value);
                }
                Attempt::Retry(e) => {
                    debug!(context, attempt = n, error = %e, "request attempt failed");
                    last_error = Some(e);
                }
                Attempt::Fail(e) => return Err(e),
            }
        }

        self.circuit_breaker.record_failure();
        let error = last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into()));
        warn!(context, retries = self.config.max_retries, error = %error, "request failed after retries");
        Err(error)
    }

    /// POST a trade request exactly once.
    fn post_trade(&self, body: &TradeRequest<'_>) -> Result<OrderConfirmation, BrokerError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(BrokerError::CircuitBreakerTripped);
        }

        let response = self
            .client
            .post(self.config.trade_url())
            .header("auth-token", &self.config.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                self.circuit_breaker.record_failure();
                BrokerError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(BrokerError::AuthenticationRequired(format!("HTTP {status} from trade")));
        }

        let text = response
            .text()
            .map_err(|e| BrokerError::Transport(e.to_string()))?;
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(BrokerError::Rejected {
                code: format!("HTTP {}", status.as_u16()),
                message: text,
            });
        }

        self.circuit_breaker.record_success();
        confirmation(&text)
    }
}

impl MarketDataProvider for MetaApiClient {
    fn name(&self) -> &str {
        "metaapi"
    }

    fn get_candles(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>, DataError> {
        let url = self.config.candles_url(symbol, timeframe);
        let context = format!("{timeframe} candles");
        let body = self.get_with_retry(&url, &context)?;
        let candles = parse_candles(&body)?;
        debug!(%timeframe, count = candles.len(), "fetched candles");
        Ok(candles)
    }
}

impl PositionStore for MetaApiClient {
    fn get_positions(&self, symbol: &str) -> Result<Vec<Position>, DataError> {
        let body = self.get_with_retry(&self.config.positions_url(), "positions")?;
        parse_positions(&body, symbol)
    }
}

impl BrokerGateway for MetaApiClient {
    fn name(&self) -> &str {
        "metaapi"
    }

    fn place_order(&self, request: &OrderRequest) -> Result<OrderConfirmation, BrokerError> {
        if !(request.volume.is_finite() && request.volume > 0.0) {
            return Err(BrokerError::InvalidOrder(format!("volume {}", request.volume)));
        }
        let body = order_body(request);
        match self.post_trade(&body) {
            Ok(confirmation) => {
                info!(
                    side = %request.side,
                    volume = request.volume,
                    take_profit = request.take_profit,
                    relative = request.take_profit_is_relative,
                    code = %confirmation.string_code,
                    "order placed"
                );
                Ok(confirmation)
            }
            Err(e) => {
                warn!(side = %request.side, volume = request.volume, error = %e, "order failed");
                Err(e)
            }
        }
    }

    fn modify_position(
        &self,
        position_id: &PositionId,
        take_profit: f64,
    ) -> Result<OrderConfirmation, BrokerError> {
        let body = modify_body(position_id, take_profit);
        match self.post_trade(&body) {
            Ok(confirmation) => {
                info!(position = %position_id, take_profit, "position take-profit updated");
                Ok(confirmation)
            }
            Err(e) => {
                warn!(position = %position_id, take_profit, error = %e, "position update failed");
                Err(e)
            }
        }
    }
}
