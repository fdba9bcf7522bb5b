mod aggregate;
mod cli;
mod config;
mod cost;
mod input;
mod optimize;
mod output;
mod period;
mod pricing;
mod range;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = config::load_config(cli.config.as_deref())?;
    let settings = cli.settings(&config)?;

    let records = input::load_usage_csv(&cli.csv)?;
    info!(rows = records.len(), period = %settings.period.label(), "evaluating commitments");

    let result = optimize::optimize(&records, &settings);

    if result.scale.is_partial() {
        info!(
            days_elapsed = result.scale.days_elapsed,
            days_in_month = result.scale.days_in_month,
            extrapolate = settings.extrapolate,
            "partial month"
        );
    }

    match cli.format {
        cli::OutputFormat::Json => output::print_json(&result)?,
        cli::OutputFormat::Table => output::print_table(&result, cli.colors(&config)),
    }

    Ok(())
}
