//! Error types for the trading pipeline
//!
//! Every per-symbol failure is a [`TradeError`]. The scheduler catches these at
//! the symbol boundary, so none of them is fatal to the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradeError {
    /// Candle endpoint failed or returned something we could not use
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Not enough closes to compute an indicator
    #[error("insufficient data: need at least {required} prices, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Transport-level failure while talking to the order endpoint
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Order endpoint answered with an error status
    #[error("order rejected (HTTP {status}{}): {message}", code_suffix(.code))]
    OrderRejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(", code {c}")).unwrap_or_default()
}

impl TradeError {
    pub(crate) fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        TradeError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            TradeError::DataUnavailable { .. } => "data_unavailable",
            TradeError::InsufficientData { .. } => "insufficient_data",
            TradeError::Network(_) => "network_error",
            TradeError::OrderRejected { .. } => "order_rejected",
        }
    }
}

pub type TradeResult<T> = Result<T, TradeError>;
