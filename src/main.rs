//! RSI/EMA crossover trader - main entry point
//!
//! Loads configuration and credentials once, then polls the configured symbols
//! forever (or for a single cycle with `--once`).
//!
//! Exit codes: 0 success, 1 runtime failure, 2 invalid configuration,
//! 3 missing credentials.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crossover_trader::binance::BinanceClient;
use crossover_trader::config::{load_credentials, parse_symbol_list};
use crossover_trader::{Config, ConfigError, Trader};

const EXIT_RUNTIME: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_CREDENTIALS: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "crossover-trader")]
#[command(about = "Polls Binance candles and trades an RSI/EMA crossover with market orders", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to JSON configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Symbols to trade (comma-separated), overrides config. E.g., "BTCUSDT,ETHUSDT"
    #[arg(long)]
    symbols: Option<String>,

    /// Seconds between cycles, overrides config
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Log signals without submitting orders
    #[arg(long)]
    dry_run: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool, log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_filename = format!(
        "trader_{}.log",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );

    // Set log level - filter out noisy external crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never(log_dir, &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    info!("Logging initialized");
    info!("Log file: {}", log_dir.join(&log_filename).display());

    Ok(())
}

/// File and env first, then CLI flags, then a single validation pass
fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(symbols) = &cli.symbols {
        config.trading.symbols = parse_symbol_list(symbols);
    }
    if let Some(secs) = cli.interval_secs {
        config.trading.poll_interval_secs = secs;
    }
    if cli.dry_run {
        config.trading.dry_run = true;
    }

    config.validate()?;
    Ok(config)
}

fn exit_status(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingCredential(_) => EXIT_CREDENTIALS,
        _ => EXIT_CONFIG,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose, &cli.log_dir) {
        eprintln!("Error: {e:#}");
        return ExitCode::from(EXIT_RUNTIME);
    }

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(exit_status(&e));
        }
    };

    let credentials = match load_credentials() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(exit_status(&e));
        }
    };

    let client = match BinanceClient::from_config(&config.exchange) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::from(EXIT_RUNTIME);
        }
    };

    let max_cycles = cli.once.then_some(1);
    let mut trader = Trader::new(config, credentials, client.clone(), client);
    trader.run(max_cycles).await;

    ExitCode::SUCCESS
}
