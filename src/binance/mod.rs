//! Binance spot REST API: public klines and signed market orders

pub mod auth;
mod client;
mod types;

pub use auth::{sign, Credentials, SignedRequest};
pub use client::{BinanceClient, API_KEY_HEADER, BINANCE_API_BASE, MAX_KLINES_PER_REQUEST};
pub use types::*;
