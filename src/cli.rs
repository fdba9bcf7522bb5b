use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::optimize::Settings;
use crate::period::{parse_month, Period};
use crate::pricing::PricingTable;
use crate::types::Resource;

#[derive(Parser, Debug)]
#[command(
    name = "ddcommit",
    version,
    about = "Find the cheapest commitment for each billable resource in a usage export"
)]
pub struct Cli {
    /// Usage export (CSV)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub csv: PathBuf,

    /// Target month (YYYY-MM), defaults to the current month
    #[arg(long, short = 't', value_name = "YYYY-MM", value_parser = parse_month)]
    pub yyyymm: Option<String>,

    /// Start of an explicit date range (YYYY-MM-DD), use with --to
    #[arg(long, requires = "to", conflicts_with = "yyyymm")]
    pub from: Option<NaiveDate>,

    /// End of an explicit date range (YYYY-MM-DD), use with --from
    #[arg(long, requires = "from", conflicts_with = "yyyymm")]
    pub to: Option<NaiveDate>,

    /// Commitment range for agent hosts, e.g. "10-40" or "10,20,30"
    #[arg(long = "commit-infrahost", value_name = "RANGE")]
    pub commit_infra_host: Option<String>,

    /// Commitment range for APM hosts
    #[arg(long = "commit-apmhost", value_name = "RANGE")]
    pub commit_apm_host: Option<String>,

    /// Commitment range for indexed logs (millions of events)
    #[arg(long = "commit-indexed-logs", value_name = "RANGE")]
    pub commit_indexed_logs: Option<String>,

    /// Commitment range for analyzed logs (GB)
    #[arg(long = "commit-analyzed-logs", value_name = "RANGE")]
    pub commit_analyzed_logs: Option<String>,

    /// Commitment range for Synthetics API test runs (10K runs)
    #[arg(long = "commit-synthetics-apitest", value_name = "RANGE")]
    pub commit_synthetics_api_test: Option<String>,

    /// Commitment range for Fargate tasks
    #[arg(long = "commit-fargate-task", value_name = "RANGE")]
    pub commit_fargate_task: Option<String>,

    /// Commitment range for Lambda functions
    #[arg(long = "commit-lambda-function", value_name = "RANGE")]
    pub commit_lambda_function: Option<String>,

    /// Derive commitment ranges from observed usage instead of --commit-* flags
    #[arg(long)]
    pub recommend: bool,

    /// Project log and Synthetics volume of a partial month to the full month
    #[arg(long)]
    pub full_month: bool,

    /// Output format: table (default), json
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_colors: bool,

    /// Config file (default: <config dir>/ddcommit/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" (default: $RUST_LOG, else "warn")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    fn commit_flag(&self, resource: Resource) -> Option<&String> {
        match resource {
            Resource::InfraHost => self.commit_infra_host.as_ref(),
            Resource::ApmHost => self.commit_apm_host.as_ref(),
            Resource::IndexedLogs => self.commit_indexed_logs.as_ref(),
            Resource::AnalyzedLogs => self.commit_analyzed_logs.as_ref(),
            Resource::SyntheticsApiTest => self.commit_synthetics_api_test.as_ref(),
            Resource::FargateTask => self.commit_fargate_task.as_ref(),
            Resource::LambdaFunction => self.commit_lambda_function.as_ref(),
        }
    }

    pub fn period(&self) -> Result<Period> {
        match (self.from, self.to) {
            (Some(start), Some(end)) => {
                if start > end {
                    bail!("--from {start} is after --to {end}");
                }
                Ok(Period::Range { start, end })
            }
            (None, None) => Ok(self
                .yyyymm
                .clone()
                .map_or_else(Period::current_month, Period::Month)),
            _ => bail!("--from and --to must be given together"),
        }
    }

    pub fn colors(&self, config: &Config) -> bool {
        !self.no_colors && config.colors.unwrap_or(true)
    }

    /// Merge flags over the config file into run settings.
    pub fn settings(&self, config: &Config) -> Result<Settings> {
        let ranges: BTreeMap<Resource, String> = Resource::ALL
            .iter()
            .filter_map(|&resource| {
                self.commit_flag(resource)
                    .or_else(|| config.commit_spec(resource))
                    .map(|spec| (resource, spec.clone()))
            })
            .collect();

        Ok(Settings {
            period: self.period()?,
            ranges,
            pricing: PricingTable::with_overrides(&config.pricing_overrides()),
            extrapolate: self.full_month || config.full_month.unwrap_or(false),
            recommend: self.recommend || config.recommend.unwrap_or(false),
        })
    }
}
