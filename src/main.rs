use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use log_generator::config::{Config, parse_run_duration};
use log_generator::logging;
use log_generator::roles::dispatcher::{log_summary, run_dispatcher};
use log_generator::transport::HttpSink;

#[derive(Parser)]
#[command(name = "log-generator")]
#[command(about = "Generate fake structured logs at a fixed rate and POST them to an HTTP log input")]
struct Cli {
    /// HTTP log input URL (e.g. a Fluent Bit http input)
    #[arg(long, default_value = "http://fluent-bit:9880")]
    url: String,

    /// Messages per second to generate
    #[arg(long, default_value = "1000", allow_hyphen_values = true)]
    rate: i64,

    /// Test duration (e.g. 60s, 5m, 1m 30s)
    #[arg(long, default_value = "60s", value_parser = parse_run_duration, allow_hyphen_values = true)]
    duration: Duration,

    /// Number of concurrent sender workers
    #[arg(long, default_value = "10", allow_hyphen_values = true)]
    workers: i64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seconds between progress lines; 0 disables them
    #[arg(long, default_value = "10")]
    snapshot_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logging::init(&cli.log_level)?;

    let config = Config::new(cli.url, cli.rate, cli.duration, cli.workers)
        .context("invalid configuration")?
        .with_snapshot_interval(Some(Duration::from_secs(cli.snapshot_interval)));

    let sink = HttpSink::new(config.url.clone()).context("failed to build HTTP client")?;
    let summary = run_dispatcher(&config, Arc::new(sink)).await?;
    log_summary(&summary);

    Ok(())
}
