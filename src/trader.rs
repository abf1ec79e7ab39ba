//! Polling trader
//!
//! One cycle walks the configured symbols in order: fetch closes, compute
//! RSI and EMA, evaluate the crossover rule, and submit a signed market order
//! for BUY/SELL. A failure for one symbol is logged and recorded in the cycle
//! report; the remaining symbols are still processed. Cycles are separated by
//! a plain sleep, so the schedule drifts by however long a cycle takes.

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::binance::{Credentials, OrderAck};
use crate::config::Config;
use crate::error::{TradeError, TradeResult};
use crate::exchange::{MarketDataSource, OrderExecutor};
use crate::indicators::IndicatorEngine;
use crate::signal::evaluate;
use crate::types::{Indicators, OrderRequest, Signal, Symbol};

/// What happened for one symbol in a cycle
#[derive(Debug, Clone)]
pub enum Decision {
    /// Rule said HOLD; nothing was sent
    Hold {
        signal: Signal,
        indicators: Indicators,
    },
    /// BUY/SELL signal while orders are disabled
    DryRun {
        signal: Signal,
        indicators: Indicators,
    },
    /// BUY/SELL signal and the exchange acknowledged the order
    Submitted {
        signal: Signal,
        indicators: Indicators,
        ack: OrderAck,
    },
}

impl Decision {
    pub fn signal(&self) -> &Signal {
        match self {
            Decision::Hold { signal, .. }
            | Decision::DryRun { signal, .. }
            | Decision::Submitted { signal, .. } => signal,
        }
    }

    pub fn indicators(&self) -> Indicators {
        match self {
            Decision::Hold { indicators, .. }
            | Decision::DryRun { indicators, .. }
            | Decision::Submitted { indicators, .. } => *indicators,
        }
    }
}

#[derive(Debug)]
pub struct InstrumentOutcome {
    pub symbol: Symbol,
    pub result: TradeResult<Decision>,
}

/// Per-symbol outcomes of one pass, in processing order
#[derive(Debug)]
pub struct CycleReport {
    pub cycle: u64,
    pub outcomes: Vec<InstrumentOutcome>,
}

impl CycleReport {
    pub fn outcome(&self, symbol: &str) -> Option<&InstrumentOutcome> {
        self.outcomes.iter().find(|o| o.symbol.as_str() == symbol)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Symbol, &TradeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.symbol, e)))
    }

    pub fn orders_submitted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(Decision::Submitted { .. })))
            .count()
    }

    /// Symbols whose rule fired BUY or SELL, submitted or not
    pub fn actionable_signals(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(d) if d.signal().action.side().is_some()))
            .count()
    }
}

/// Runs the fetch → indicators → signal → order pipeline on a fixed cadence
pub struct Trader<M, E> {
    config: Config,
    credentials: Credentials,
    engine: IndicatorEngine,
    symbols: Vec<Symbol>,
    market_data: M,
    executor: E,
    cycle_count: u64,
}

impl<M, E> Trader<M, E>
where
    M: MarketDataSource,
    E: OrderExecutor,
{
    /// `config` is expected to have passed [`Config::validate`]
    pub fn new(config: Config, credentials: Credentials, market_data: M, executor: E) -> Self {
        let engine = config.indicator_engine();
        let symbols = config.trading.symbols.clone();

        Trader {
            config,
            credentials,
            engine,
            symbols,
            market_data,
            executor,
            cycle_count: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Run cycles until `max_cycles` is reached, or forever when `None`
    pub async fn run(&mut self, max_cycles: Option<u64>) {
        let poll_interval = self.config.trading.poll_interval();
        info!(
            "Starting trader: symbols={:?}, interval={}, poll every {}s, dry_run={}",
            self.symbols.iter().map(Symbol::as_str).collect::<Vec<_>>(),
            self.config.trading.interval,
            poll_interval.as_secs(),
            self.config.trading.dry_run
        );

        loop {
            self.run_cycle().await;

            if max_cycles.is_some_and(|max| self.cycle_count >= max) {
                info!("Reached {} cycle(s), stopping", self.cycle_count);
                break;
            }

            debug!("Sleeping {}s until next cycle", poll_interval.as_secs());
            sleep(poll_interval).await;
        }
    }

    /// Process every configured symbol once, sequentially
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle_count += 1;
        info!("━━━ Trading cycle {} ━━━", self.cycle_count);

        let mut outcomes = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            let result = self.process_symbol(symbol).await;
            if let Err(e) = &result {
                error!(symbol = %symbol, kind = e.kind(), "Error for {}: {}", symbol, e);
            }
            outcomes.push(InstrumentOutcome {
                symbol: symbol.clone(),
                result,
            });
        }

        let report = CycleReport {
            cycle: self.cycle_count,
            outcomes,
        };
        info!(
            "Cycle {} complete: symbols={}, signals={}, orders={}, failures={}",
            report.cycle,
            report.outcomes.len(),
            report.actionable_signals(),
            report.orders_submitted(),
            report.failures().count()
        );
        report
    }

    async fn process_symbol(&self, symbol: &Symbol) -> TradeResult<Decision> {
        let trading = &self.config.trading;

        let series = self
            .market_data
            .fetch_closes(symbol, &trading.interval, trading.candle_limit)
            .await?;
        let indicators = self.engine.compute(&series)?;
        let price = series.latest().ok_or(TradeError::InsufficientData {
            required: self.engine.min_prices(),
            actual: 0,
        })?;

        info!(
            "[{}] {}: Price={}, RSI={:.2}, EMA={:.2}",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            symbol,
            price,
            indicators.rsi,
            indicators.ema
        );

        let signal = evaluate(symbol, price, indicators.rsi, indicators.ema);
        let Some(side) = signal.action.side() else {
            return Ok(Decision::Hold { signal, indicators });
        };

        info!("{} signal for {}", signal.action, symbol);

        if trading.dry_run {
            info!("[DRY RUN] Skipping {} order for {}", side, symbol);
            return Ok(Decision::DryRun { signal, indicators });
        }

        let order = OrderRequest::market(
            symbol.clone(),
            side,
            trading.quantity_for(symbol),
            Utc::now().timestamp_millis(),
        )
        .with_recv_window(self.config.exchange.recv_window_ms);

        let signed = self.credentials.sign(&order.to_params());
        let ack = self.executor.submit(&signed, &self.credentials).await?;

        info!(
            "{} order placed for {}: qty={} order_id={:?} status={:?} executed={:?}",
            side,
            symbol,
            order.quantity,
            ack.order_id,
            ack.status,
            ack.executed_qty
        );

        Ok(Decision::Submitted {
            signal,
            indicators,
            ack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binance::SignedRequest;
    use crate::types::{PriceSeries, SignalAction};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned closes per symbol; missing symbols fail
    struct FakeMarket {
        closes: HashMap<String, Vec<f64>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeMarket {
        fn new(entries: &[(&str, Vec<f64>)]) -> Self {
            FakeMarket {
                closes: entries
                    .iter()
                    .map(|(s, c)| (s.to_string(), c.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeMarket {
        async fn fetch_closes(
            &self,
            symbol: &Symbol,
            _interval: &str,
            _limit: u32,
        ) -> TradeResult<PriceSeries> {
            self.calls.lock().unwrap().push(symbol.to_string());
            match self.closes.get(symbol.as_str()) {
                Some(c) => Ok(PriceSeries::new(symbol.clone(), c.clone())),
                None => Err(TradeError::data_unavailable(symbol.as_str(), "HTTP 500")),
            }
        }
    }

    #[derive(Default)]
    struct RecordingExecutor {
        submitted: Mutex<Vec<String>>,
        reject: bool,
    }

    #[async_trait]
    impl OrderExecutor for RecordingExecutor {
        async fn submit(
            &self,
            request: &SignedRequest,
            _credentials: &Credentials,
        ) -> TradeResult<OrderAck> {
            self.submitted.lock().unwrap().push(request.to_query_string());
            if self.reject {
                return Err(TradeError::OrderRejected {
                    status: 400,
                    code: Some(-2010),
                    message: "insufficient balance".to_string(),
                });
            }
            Ok(OrderAck::from_json(serde_json::json!({"orderId": 1, "status": "FILLED"})))
        }
    }

    /// Steady decline then a bounce: RSI ~27.8, last close 230 above EMA ~226
    fn oversold_closes() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..40).map(|i| 400.0 - 5.0 * i as f64).collect();
        closes.push(230.0);
        closes
    }

    fn config(symbols: &[&str]) -> Config {
        let mut config = Config::default();
        config.trading.symbols = symbols.iter().map(Symbol::new).collect();
        config
    }

    #[tokio::test]
    async fn test_hold_sends_nothing() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let market = FakeMarket::new(&[("BTCUSDT", closes)]);
        let mut trader = Trader::new(
            config(&["BTCUSDT"]),
            Credentials::new("k", "s"),
            market,
            RecordingExecutor::default(),
        );

        let report = trader.run_cycle().await;
        let decision = report.outcome("BTCUSDT").unwrap().result.as_ref().unwrap();
        assert_eq!(decision.signal().action, SignalAction::Hold);
        assert_eq!(report.orders_submitted(), 0);
        assert!(trader.executor.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_buy_submits_signed_order() {
        let closes = oversold_closes();
        let rsi = crate::indicators::rsi(&closes, 14).unwrap();
        let ema = crate::indicators::ema(&closes, 9).unwrap();
        assert!(rsi < 30.0 && 230.0 > ema, "fixture: rsi={rsi} ema={ema}");

        let market = FakeMarket::new(&[("BTCUSDT", closes)]);
        let mut trader = Trader::new(
            config(&["BTCUSDT"]),
            Credentials::new("k", "secret"),
            market,
            RecordingExecutor::default(),
        );

        let report = trader.run_cycle().await;
        assert_eq!(report.orders_submitted(), 1);

        let sent = trader.executor.submitted.lock().unwrap();
        let query = &sent[0];
        assert!(query.starts_with("quantity=0.001&side=BUY&symbol=BTCUSDT&timestamp="));
        let (payload, signature) = query.rsplit_once("&signature=").unwrap();
        assert!(payload.ends_with("&type=MARKET"));
        assert!(crate::binance::auth::verify_signature(payload, "secret", signature));
    }

    #[tokio::test]
    async fn test_dry_run_skips_submission() {
        let market = FakeMarket::new(&[("BTCUSDT", oversold_closes())]);
        let mut cfg = config(&["BTCUSDT"]);
        cfg.trading.dry_run = true;
        let mut trader = Trader::new(
            cfg,
            Credentials::new("k", "s"),
            market,
            RecordingExecutor::default(),
        );

        let report = trader.run_cycle().await;
        assert!(matches!(
            report.outcome("BTCUSDT").unwrap().result,
            Ok(Decision::DryRun { .. })
        ));
        assert_eq!(report.actionable_signals(), 1);
        assert!(trader.executor.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_symbol() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let market = FakeMarket::new(&[("BTCUSDT", closes.clone()), ("SOLUSDT", closes)]);
        let mut trader = Trader::new(
            config(&["BTCUSDT", "ETHUSDT", "SOLUSDT"]),
            Credentials::new("k", "s"),
            market,
            RecordingExecutor::default(),
        );

        let report = trader.run_cycle().await;
        assert_eq!(
            *trader.market_data.calls.lock().unwrap(),
            vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]
        );
        assert!(report.outcome("BTCUSDT").unwrap().result.is_ok());
        assert!(matches!(
            report.outcome("ETHUSDT").unwrap().result,
            Err(TradeError::DataUnavailable { .. })
        ));
        assert!(report.outcome("SOLUSDT").unwrap().result.is_ok());
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn test_short_series_is_insufficient_data() {
        let market = FakeMarket::new(&[("BTCUSDT", vec![1.0, 2.0, 3.0])]);
        let mut trader = Trader::new(
            config(&["BTCUSDT"]),
            Credentials::new("k", "s"),
            market,
            RecordingExecutor::default(),
        );

        let report = trader.run_cycle().await;
        assert!(matches!(
            report.outcome("BTCUSDT").unwrap().result,
            Err(TradeError::InsufficientData { required: 15, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_rejection_is_reported_and_loop_continues() {
        let market = FakeMarket::new(&[("BTCUSDT", oversold_closes())]);
        let executor = RecordingExecutor {
            reject: true,
            ..Default::default()
        };
        let mut cfg = config(&["BTCUSDT"]);
        cfg.trading.poll_interval_secs = 1;
        let mut trader = Trader::new(cfg, Credentials::new("k", "s"), market, executor);

        tokio::time::pause();
        trader.run(Some(2)).await;

        assert_eq!(trader.cycle_count(), 2);
        assert_eq!(trader.executor.submitted.lock().unwrap().len(), 2);
    }
}
