//! Binance REST client for klines and market orders
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use crossover_trader::binance::BinanceClient;
//! use crossover_trader::exchange::MarketDataSource;
//! use crossover_trader::Symbol;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BinanceClient::new("https://api.binance.com", Duration::from_secs(10))?;
//!     let series = client.fetch_closes(&Symbol::new("BTCUSDT"), "15m", 100).await?;
//!     println!("Fetched {} closes", series.len());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::auth::{Credentials, SignedRequest};
use super::types::{ApiErrorBody, Kline, OrderAck};
use crate::config::ExchangeConfig;
use crate::error::{TradeError, TradeResult};
use crate::exchange::{MarketDataSource, OrderExecutor};
use crate::types::{PriceSeries, Symbol};

/// Base URL for Binance API
pub const BINANCE_API_BASE: &str = "https://api.binance.com";

/// Header carrying the API key on authenticated requests
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Maximum klines per request (Binance limit)
pub const MAX_KLINES_PER_REQUEST: u32 = 1000;

/// Binance API client
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

impl BinanceClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(BinanceClient { client, base_url })
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch raw klines, capped at [`MAX_KLINES_PER_REQUEST`]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> TradeResult<Vec<Kline>> {
        if symbol.trim().is_empty() {
            return Err(TradeError::data_unavailable(symbol, "empty symbol"));
        }

        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.clamp(1, MAX_KLINES_PER_REQUEST);

        debug!(
            "Fetching klines: symbol={}, interval={}, limit={}",
            symbol, interval, limit
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", interval.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| TradeError::data_unavailable(symbol, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TradeError::data_unavailable(symbol, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(TradeError::data_unavailable(
                symbol,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let raw_data: Vec<Vec<serde_json::Value>> = serde_json::from_str(&body)
            .map_err(|e| TradeError::data_unavailable(symbol, format!("malformed response: {e}")))?;

        if raw_data.is_empty() {
            return Err(TradeError::data_unavailable(symbol, "empty response"));
        }

        let klines = raw_data
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Kline::from_raw(row).ok_or_else(|| {
                    TradeError::data_unavailable(symbol, format!("malformed kline at row {i}"))
                })
            })
            .collect::<TradeResult<Vec<Kline>>>()?;

        if klines.windows(2).any(|w| w[0].open_time >= w[1].open_time) {
            return Err(TradeError::data_unavailable(
                symbol,
                "klines are not in chronological order",
            ));
        }

        Ok(klines)
    }

    /// POST a signed market order; the API key travels only in the header
    pub async fn place_order(
        &self,
        request: &SignedRequest,
        credentials: &Credentials,
    ) -> TradeResult<OrderAck> {
        let url = format!("{}/api/v3/order?{}", self.base_url, request.to_query_string());

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, credentials.api_key())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(body) => (Some(body.code), body.msg),
                Err(_) => (None, text),
            };
            return Err(TradeError::OrderRejected {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let ack = OrderAck::from_body(&text);
        info!("Order acknowledged: {}", ack.raw);
        Ok(ack)
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    async fn fetch_closes(
        &self,
        symbol: &Symbol,
        interval: &str,
        limit: u32,
    ) -> TradeResult<PriceSeries> {
        let klines = self.get_klines(symbol.as_str(), interval, limit).await?;
        let closes = klines.into_iter().map(|k| k.close).collect();
        Ok(PriceSeries::new(symbol.clone(), closes))
    }
}

#[async_trait]
impl OrderExecutor for BinanceClient {
    async fn submit(
        &self,
        request: &SignedRequest,
        credentials: &Credentials,
    ) -> TradeResult<OrderAck> {
        self.place_order(request, credentials).await
    }
}
