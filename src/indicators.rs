//! Technical indicators
//!
//! RSI over a simple (non-Wilder) average of the most recent gains and losses,
//! and an EMA seeded with the oldest price. Both deliberately differ from the
//! textbook variants; results must stay bit-for-bit stable across releases.

use crate::error::{TradeError, TradeResult};
use crate::types::{Indicators, PriceSeries};

/// Default RSI lookback
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Default EMA lookback
pub const DEFAULT_EMA_PERIOD: usize = 9;

/// Calculate the Relative Strength Index of a close series
///
/// Gains and losses are split per adjacent pair, then the last `period` of
/// each are averaged with a plain mean. When the average loss is zero the
/// result is 100, including for a perfectly flat window.
///
/// Returns `None` when `period` is zero or fewer than `period + 1` prices are given.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|pair| {
            let delta = pair[1] - pair[0];
            if delta >= 0.0 {
                (delta, 0.0)
            } else {
                (0.0, -delta)
            }
        })
        .unzip();

    let start = gains.len() - period;
    let avg_gain = gains[start..].iter().sum::<f64>() / period as f64;
    let avg_loss = losses[start..].iter().sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Calculate the Exponential Moving Average of a close series
///
/// Seeded with the first (oldest) price, then folded forward with
/// `k = 2 / (period + 1)`.
pub fn ema(prices: &[f64], period: usize) -> Option<f64> {
    let (&first, rest) = prices.split_first()?;
    if period == 0 {
        return None;
    }

    let k = 2.0 / (period as f64 + 1.0);
    Some(
        rest.iter()
            .fold(first, |ema, &price| price * k + ema * (1.0 - k)),
    )
}

/// Computes both indicators with fixed, validated periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorEngine {
    rsi_period: usize,
    ema_period: usize,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        IndicatorEngine::new(DEFAULT_RSI_PERIOD, DEFAULT_EMA_PERIOD)
    }
}

impl IndicatorEngine {
    /// Both periods must be at least 1 ([`crate::Config::validate`] checks this).
    /// With a zero period every compute fails with `InsufficientData`.
    pub fn new(rsi_period: usize, ema_period: usize) -> Self {
        IndicatorEngine {
            rsi_period,
            ema_period,
        }
    }

    pub fn rsi_period(&self) -> usize {
        self.rsi_period
    }

    pub fn ema_period(&self) -> usize {
        self.ema_period
    }

    /// Minimum number of closes needed for [`IndicatorEngine::compute`]
    ///
    /// Only RSI has a lookback requirement; EMA is defined from one close.
    pub fn min_prices(&self) -> usize {
        self.rsi_period + 1
    }

    pub fn compute_rsi(&self, prices: &[f64]) -> TradeResult<f64> {
        rsi(prices, self.rsi_period).ok_or(TradeError::InsufficientData {
            required: self.rsi_period + 1,
            actual: prices.len(),
        })
    }

    pub fn compute_ema(&self, prices: &[f64]) -> TradeResult<f64> {
        ema(prices, self.ema_period).ok_or(TradeError::InsufficientData {
            required: 1,
            actual: prices.len(),
        })
    }

    pub fn compute(&self, series: &PriceSeries) -> TradeResult<Indicators> {
        let rsi = self.compute_rsi(&series.closes)?;
        let ema = self.compute_ema(&series.closes)?;
        Ok(Indicators { rsi, ema })
    }
}
