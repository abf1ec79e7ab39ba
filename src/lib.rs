//! RSI/EMA Crossover Trader
//!
//! Polls recent Binance candles for a fixed set of symbols, computes an RSI
//! and an EMA over the closes, and submits a signed market order whenever the
//! crossover rule fires:
//!
//! - BUY when RSI < 30 and the last close is above the EMA
//! - SELL when RSI > 70 and the last close is below the EMA
//!
//! # Example
//! ```no_run
//! use crossover_trader::binance::{BinanceClient, Credentials};
//! use crossover_trader::{Config, Trader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     config.validate()?;
//!     let client = BinanceClient::from_config(&config.exchange)?;
//!     let credentials = Credentials::new("api_key", "api_secret");
//!
//!     let mut trader = Trader::new(config, credentials, client.clone(), client);
//!     let report = trader.run_cycle().await;
//!     println!("{} failures", report.failures().count());
//!     Ok(())
//! }
//! ```

pub mod binance;
pub mod config;
pub mod error;
pub mod exchange;
pub mod indicators;
pub mod signal;
pub mod trader;
pub mod types;

pub use config::{Config, ConfigError};
pub use error::{TradeError, TradeResult};
pub use indicators::IndicatorEngine;
pub use trader::{CycleReport, Decision, InstrumentOutcome, Trader};
pub use types::*;
