//! Exchange seams used by the trader
//!
//! The scheduler only talks to these traits; [`crate::binance::BinanceClient`]
//! implements both against the live REST API.

use async_trait::async_trait;

use crate::binance::auth::{Credentials, SignedRequest};
use crate::binance::OrderAck;
use crate::error::TradeResult;
use crate::types::{PriceSeries, Symbol};

/// Source of recent closing prices
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` closes for `symbol` at `interval`, oldest first
    ///
    /// Any transport, status or payload problem is reported as
    /// [`crate::TradeError::DataUnavailable`].
    async fn fetch_closes(
        &self,
        symbol: &Symbol,
        interval: &str,
        limit: u32,
    ) -> TradeResult<PriceSeries>;
}

/// Sink for signed market orders
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    async fn submit(
        &self,
        request: &SignedRequest,
        credentials: &Credentials,
    ) -> TradeResult<OrderAck>;
}
