//! CLI entrypoint for the graduation monitor
//! Loads configuration, connects the Discord sink and runs the poll loop
//! until Ctrl-C.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;

use gradwatch::config::Config;
use gradwatch::monitor::Monitor;
use gradwatch::sink::DiscordSink;
use gradwatch::utils::init_logging;

#[derive(Debug, Parser)]
#[command(name = "gradwatch", author, version, about = "pump.fun graduation monitor", long_about = None)]
struct Args {
    /// Path to the configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Print the default configuration to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Seconds between poll cycles
    #[arg(long)]
    interval: Option<u64>,

    /// Path to the token watch-list JSON file
    #[arg(long)]
    tokens_file: Option<String>,

    /// Solana RPC endpoint URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// RPC requests per second
    #[arg(long)]
    rpc_rate_limit: Option<u32>,

    /// Maximum attempts for a failed RPC request
    #[arg(long)]
    max_retries: Option<usize>,

    /// Base backoff delay in seconds
    #[arg(long)]
    base_delay: Option<f64>,

    /// Maximum backoff delay in seconds
    #[arg(long)]
    max_delay: Option<f64>,
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(interval) = args.interval {
        config.monitor.interval_secs = interval;
    }
    if let Some(tokens_file) = &args.tokens_file {
        config.monitor.tokens_file = tokens_file.clone();
    }
    if let Some(rpc_url) = &args.rpc_url {
        config.solana.rpc_url = rpc_url.clone();
    }
    if let Some(rate_limit) = args.rpc_rate_limit {
        config.solana.rate_limit_rps = rate_limit;
    }
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
    if let Some(base_delay) = args.base_delay {
        config.retry.base_delay_secs = base_delay;
    }
    if let Some(max_delay) = args.max_delay {
        config.retry.max_delay_secs = max_delay;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_logging("info");

    let args = Args::parse();

    if args.print_default_config {
        println!("{}", Config::default_toml());
        return Ok(());
    }

    // Try to load an existing configuration, otherwise fall back to defaults.
    let mut config = if Path::new(&args.config).exists() {
        Config::from_file(&args.config).context("Failed to load configuration")?
    } else {
        log::warn!("Configuration file '{}' not found, using defaults", args.config);
        let mut config = Config::default();
        config.merge_env().context("Failed to read environment")?;
        config
    };
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    let sink = Arc::new(DiscordSink::new(&config.discord).context("Failed to build Discord sink")?);
    let mut monitor = Monitor::new(config, sink).context("Failed to build monitor")?;
    let shutdown = monitor.shutdown_handle();

    let mut handle = tokio::spawn(async move { monitor.run().await });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            log::info!("Shutdown signal received. Stopping...");
            shutdown.notify_one();
            handle.await.context("Monitor task failed")??;
        }
        result = &mut handle => {
            result.context("Monitor task failed")??;
        }
    }

    Ok(())
}
