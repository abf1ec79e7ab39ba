//! Binance API types for klines and order acknowledgments

use serde::Deserialize;

/// Minimal view of a kline row
///
/// API returns an array: [open_time, open, high, low, close, volume, close_time, ...].
/// Only the open time (for ordering checks) and the close are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kline {
    pub open_time: i64,
    pub close: f64,
}

/// Index of the close price within a kline row
pub const CLOSE_INDEX: usize = 4;

impl Kline {
    /// Parse from a raw JSON row; prices may be strings or numbers
    pub fn from_raw(raw: &[serde_json::Value]) -> Option<Self> {
        if raw.len() <= CLOSE_INDEX {
            return None;
        }

        let close = match &raw[CLOSE_INDEX] {
            serde_json::Value::String(s) => s.parse().ok()?,
            v => v.as_f64()?,
        };
        if !close.is_finite() {
            return None;
        }

        Some(Kline {
            open_time: raw[0].as_i64()?,
            close,
        })
    }
}

/// Error body returned by Binance on rejected requests
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Acknowledgment for a submitted order
///
/// The raw JSON is kept verbatim; the typed fields are conveniences for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub order_id: Option<u64>,
    pub status: Option<String>,
    pub executed_qty: Option<String>,
    pub raw: serde_json::Value,
}

impl OrderAck {
    pub fn from_json(raw: serde_json::Value) -> Self {
        OrderAck {
            order_id: raw.get("orderId").and_then(|v| v.as_u64()),
            status: raw
                .get("status")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            executed_qty: raw
                .get("executedQty")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            raw,
        }
    }

    /// Build from a response body; non-JSON text is kept as a JSON string
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => Self::from_json(value),
            Err(_) => Self::from_json(serde_json::Value::String(body.to_string())),
        }
    }
}

/// Valid Binance intervals
pub const BINANCE_INTERVALS: &[&str] = &[
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

/// Check if interval is valid for Binance
pub fn is_valid_interval(interval: &str) -> bool {
    BINANCE_INTERVALS.contains(&interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kline_from_raw_strings() {
        let row = json!([
            1499040000000i64,
            "0.01634790",
            "0.80000000",
            "0.01575800",
            "0.01577100",
            "148976.11427815",
            1499644799999i64,
            "2434.19055334",
            308,
            "1756.87402397",
            "28.46694368",
            "0"
        ]);
        let kline = Kline::from_raw(row.as_array().unwrap()).unwrap();
        assert_eq!(kline.open_time, 1499040000000);
        assert_eq!(kline.close, 0.015771);
    }

    #[test]
    fn test_kline_from_raw_numeric_close() {
        let row = json!([1, 1.0, 2.0, 0.5, 1.5]);
        assert_eq!(Kline::from_raw(row.as_array().unwrap()).unwrap().close, 1.5);
    }

    #[test]
    fn test_kline_rejects_short_or_bad_rows() {
        assert!(Kline::from_raw(json!([1, "1", "2", "0"]).as_array().unwrap()).is_none());
        assert!(Kline::from_raw(json!([1, "1", "2", "0", "abc"]).as_array().unwrap()).is_none());
        assert!(Kline::from_raw(json!([1, "1", "2", "0", null]).as_array().unwrap()).is_none());
        assert!(Kline::from_raw(json!(["x", "1", "2", "0", "1"]).as_array().unwrap()).is_none());
        assert!(Kline::from_raw(json!([1, "1", "2", "0", "NaN"]).as_array().unwrap()).is_none());
    }

    #[test]
    fn test_order_ack_from_json() {
        let ack = OrderAck::from_json(json!({
            "symbol": "BTCUSDT",
            "orderId": 28,
            "status": "FILLED",
            "executedQty": "0.00100000"
        }));
        assert_eq!(ack.order_id, Some(28));
        assert_eq!(ack.status.as_deref(), Some("FILLED"));
        assert_eq!(ack.executed_qty.as_deref(), Some("0.00100000"));
        assert_eq!(ack.raw["symbol"], "BTCUSDT");
    }

    #[test]
    fn test_order_ack_from_non_json_body() {
        let ack = OrderAck::from_body("OK");
        assert_eq!(ack.order_id, None);
        assert_eq!(ack.raw, json!("OK"));
    }

    #[test]
    fn test_valid_intervals() {
        assert!(is_valid_interval("15m"));
        assert!(is_valid_interval("1h"));
        assert!(is_valid_interval("1d"));
        assert!(!is_valid_interval("2d"));
        assert!(!is_valid_interval(""));
    }
}
