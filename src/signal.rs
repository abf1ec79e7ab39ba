//! RSI/EMA crossover rule
//!
//! Stateless: each call looks only at its inputs, never at earlier signals or
//! open positions.

use crate::types::{Signal, SignalAction, Symbol};

/// RSI below this is oversold
pub const RSI_OVERSOLD: f64 = 30.0;

/// RSI above this is overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Decide BUY / SELL / HOLD for one symbol
///
/// - BUY when RSI < 30 and the latest price is above the EMA
/// - SELL when RSI > 70 and the latest price is below the EMA
/// - HOLD otherwise
pub fn evaluate(symbol: &Symbol, latest_price: f64, rsi: f64, ema: f64) -> Signal {
    let action = if rsi < RSI_OVERSOLD && latest_price > ema {
        SignalAction::Buy
    } else if rsi > RSI_OVERBOUGHT && latest_price < ema {
        SignalAction::Sell
    } else {
        SignalAction::Hold
    };

    Signal {
        symbol: symbol.clone(),
        action,
        price: latest_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(price: f64, rsi: f64, ema: f64) -> SignalAction {
        evaluate(&Symbol::new("BTCUSDT"), price, rsi, ema).action
    }

    #[test]
    fn test_buy_when_oversold_above_ema() {
        assert_eq!(action(101.0, 25.0, 100.0), SignalAction::Buy);
    }

    #[test]
    fn test_sell_when_overbought_below_ema() {
        assert_eq!(action(99.0, 75.0, 100.0), SignalAction::Sell);
    }

    #[test]
    fn test_hold_when_oversold_below_ema() {
        assert_eq!(action(99.0, 25.0, 100.0), SignalAction::Hold);
    }

    #[test]
    fn test_hold_when_overbought_above_ema() {
        assert_eq!(action(101.0, 75.0, 100.0), SignalAction::Hold);
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(action(101.0, 30.0, 100.0), SignalAction::Hold);
        assert_eq!(action(99.0, 70.0, 100.0), SignalAction::Hold);
        assert_eq!(action(100.0, 10.0, 100.0), SignalAction::Hold);
        assert_eq!(action(100.0, 90.0, 100.0), SignalAction::Hold);
    }

    #[test]
    fn test_signal_carries_symbol_and_price() {
        let signal = evaluate(&Symbol::new("ETHUSDT"), 1850.5, 20.0, 1800.0);
        assert_eq!(signal.symbol.as_str(), "ETHUSDT");
        assert_eq!(signal.price, 1850.5);
        assert_eq!(signal.action, SignalAction::Buy);
    }

    #[test]
    fn test_buy_and_sell_mutually_exclusive() {
        let rsis = [0.0, 15.0, 29.99, 30.0, 50.0, 70.0, 70.01, 85.0, 100.0];
        let prices = [90.0, 99.99, 100.0, 100.01, 110.0];

        for &rsi in &rsis {
            for &price in &prices {
                let a = action(price, rsi, 100.0);
                let buy = rsi < 30.0 && price > 100.0;
                let sell = rsi > 70.0 && price < 100.0;
                assert!(!(buy && sell));
                match a {
                    SignalAction::Buy => assert!(buy),
                    SignalAction::Sell => assert!(sell),
                    SignalAction::Hold => assert!(!buy && !sell),
                }
            }
        }
    }
}
