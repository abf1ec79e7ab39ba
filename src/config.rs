//! Configuration management
//!
//! Handles loading and parsing of the JSON configuration file, environment
//! overrides, and startup validation. Credentials are not part of the file;
//! they come from the environment only (see [`crate::binance::Credentials`]).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::binance::{is_valid_interval, Credentials, BINANCE_API_BASE, MAX_KLINES_PER_REQUEST};
use crate::indicators::{IndicatorEngine, DEFAULT_EMA_PERIOD, DEFAULT_RSI_PERIOD};
use crate::Symbol;

/// Comma-separated symbol list override
pub const SYMBOLS_ENV: &str = "TRADER_SYMBOLS";
/// Candle interval override
pub const INTERVAL_ENV: &str = "TRADER_INTERVAL";
/// Poll interval override, in seconds
pub const POLL_INTERVAL_ENV: &str = "TRADER_POLL_INTERVAL_SECS";

/// Startup failures; all of them are fatal
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub trading: TradingConfig,
    pub strategy: StrategyConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an optional file and apply environment overrides
    ///
    /// Not validated yet: callers layer any remaining overrides on top and then
    /// call [`Config::validate`] once.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `TRADER_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(symbols) = lookup(SYMBOLS_ENV) {
            self.trading.symbols = parse_symbol_list(&symbols);
        }
        if let Some(interval) = lookup(INTERVAL_ENV) {
            self.trading.interval = interval.trim().to_string();
        }
        if let Some(secs) = lookup(POLL_INTERVAL_ENV) {
            self.trading.poll_interval_secs = secs.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{POLL_INTERVAL_ENV} must be a whole number of seconds, got {secs:?}"
                ))
            })?;
        }
        Ok(())
    }

    /// Check every invariant the trading loop relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !self.exchange.base_url.starts_with("http://")
            && !self.exchange.base_url.starts_with("https://")
        {
            return invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.exchange.base_url
            ));
        }
        if self.exchange.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be at least 1".to_string());
        }

        if self.trading.symbols.is_empty() {
            return invalid("at least one symbol is required".to_string());
        }
        if let Some(symbol) = self.trading.symbols.iter().find(|s| !s.is_well_formed()) {
            return invalid(format!(
                "symbol {:?} must be non-empty and contain only A-Z and 0-9",
                symbol.as_str()
            ));
        }
        if !is_valid_interval(&self.trading.interval) {
            return invalid(format!("unknown candle interval {:?}", self.trading.interval));
        }
        if self.trading.poll_interval_secs == 0 {
            return invalid("poll_interval_secs must be at least 1".to_string());
        }
        if !(self.trading.quantity.is_finite() && self.trading.quantity > 0.0) {
            return invalid(format!("quantity must be positive, got {}", self.trading.quantity));
        }
        if let Some((symbol, qty)) = self
            .trading
            .quantities
            .iter()
            .find(|(_, q)| !(q.is_finite() && **q > 0.0))
        {
            return invalid(format!("quantity for {symbol} must be positive, got {qty}"));
        }
        if let Some(symbol) = self
            .trading
            .quantities
            .keys()
            .find(|s| !self.trading.symbols.contains(*s))
        {
            return invalid(format!(
                "quantity override for {symbol}, which is not in the symbol list"
            ));
        }

        if self.strategy.rsi_period == 0 || self.strategy.ema_period == 0 {
            return invalid("indicator periods must be at least 1".to_string());
        }
        let longest = self.strategy.rsi_period.max(self.strategy.ema_period);
        let limit = self.trading.candle_limit as usize;
        if limit <= longest {
            return invalid(format!(
                "candle_limit ({limit}) must exceed the longest indicator period ({longest})"
            ));
        }
        if self.trading.candle_limit > MAX_KLINES_PER_REQUEST {
            return invalid(format!(
                "candle_limit ({limit}) exceeds the exchange maximum of {MAX_KLINES_PER_REQUEST}"
            ));
        }

        Ok(())
    }

    pub fn indicator_engine(&self) -> IndicatorEngine {
        IndicatorEngine::new(self.strategy.rsi_period, self.strategy.ema_period)
    }
}

/// Read API credentials from the environment; absence is fatal at startup
pub fn load_credentials() -> Result<Credentials, ConfigError> {
    Credentials::from_env().map_err(ConfigError::MissingCredential)
}

/// Split a comma-separated list, dropping blanks
pub fn parse_symbol_list(list: &str) -> Vec<Symbol> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(Symbol::new)
        .collect()
}

/// Exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Upper bound for every HTTP request
    pub request_timeout_secs: u64,
    /// Sent as `recvWindow` on orders when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recv_window_ms: Option<u64>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            base_url: BINANCE_API_BASE.to_string(),
            request_timeout_secs: 10,
            recv_window_ms: None,
        }
    }
}

impl ExchangeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Trading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub symbols: Vec<Symbol>,
    /// Binance candle interval code, e.g. "15m"
    pub interval: String,
    /// Candles fetched per poll
    pub candle_limit: u32,
    /// Fixed order quantity used when a symbol has no override
    pub quantity: f64,
    /// Per-symbol fixed quantities
    pub quantities: HashMap<Symbol, f64>,
    pub poll_interval_secs: u64,
    /// Log signals without signing or submitting orders
    pub dry_run: bool,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            symbols: vec![Symbol::new("BTCUSDT"), Symbol::new("ETHUSDT")],
            interval: "15m".to_string(),
            candle_limit: 100,
            quantity: 0.001,
            quantities: HashMap::new(),
            poll_interval_secs: 15 * 60,
            dry_run: false,
        }
    }
}

impl TradingConfig {
    /// Fixed order quantity for `symbol`
    pub fn quantity_for(&self, symbol: &Symbol) -> f64 {
        self.quantities
            .get(symbol)
            .copied()
            .unwrap_or(self.quantity)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Indicator periods
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub rsi_period: usize,
    pub ema_period: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            rsi_period: DEFAULT_RSI_PERIOD,
            ema_period: DEFAULT_EMA_PERIOD,
        }
    }
}
