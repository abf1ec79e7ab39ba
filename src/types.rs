//! Core data types used across the trading pipeline

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Trading pair symbol using Arc<str> for cheap cloning
///
/// Names are trimmed and uppercased on construction, so `" ethusdt"` from a
/// config file and `ETHUSDT` from the command line are the same symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(s: impl AsRef<str>) -> Self {
        Symbol(Arc::from(s.as_ref().trim().to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exchange symbols are plain `[A-Z0-9]+`; anything else would not survive
    /// the signed query string unchanged
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Symbol::new(raw))
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire representation used by the exchange
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the crossover rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl SignalAction {
    /// Order side for actionable signals, `None` for HOLD
    pub fn side(&self) -> Option<Side> {
        match self {
            SignalAction::Buy => Some(Side::Buy),
            SignalAction::Sell => Some(Side::Sell),
            SignalAction::Hold => None,
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// A decision for one symbol, with the price that triggered it
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub symbol: Symbol,
    pub action: SignalAction,
    pub price: f64,
}

/// Closing prices for one symbol, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, closes: Vec<f64>) -> Self {
        PriceSeries { symbol, closes }
    }

    /// Most recent close
    pub fn latest(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// RSI and EMA computed from one price series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indicators {
    pub rsi: f64,
    pub ema: f64,
}

/// Market order to be signed and submitted
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Optional `recvWindow` in milliseconds; the exchange default applies when unset
    pub recv_window: Option<u64>,
}

impl OrderRequest {
    pub fn market(symbol: Symbol, side: Side, quantity: f64, timestamp: i64) -> Self {
        OrderRequest {
            symbol,
            side,
            quantity,
            timestamp,
            recv_window: None,
        }
    }

    pub fn with_recv_window(mut self, recv_window: Option<u64>) -> Self {
        self.recv_window = recv_window;
        self
    }

    /// Request parameters as sent to the order endpoint, keyed by wire name
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("symbol".to_string(), self.symbol.to_string());
        params.insert("side".to_string(), self.side.as_str().to_string());
        params.insert("type".to_string(), "MARKET".to_string());
        params.insert("quantity".to_string(), self.quantity.to_string());
        params.insert("timestamp".to_string(), self.timestamp.to_string());
        if let Some(window) = self.recv_window {
            params.insert("recvWindow".to_string(), window.to_string());
        }
        params
    }
}
