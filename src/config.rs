use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use tracing::warn;

use crate::types::Resource;

/// Optional settings from `config.toml`. Command-line flags win over these.
///
/// ```toml
/// full_month = true
///
/// [commit]
/// infra_host = "10-40"
///
/// [pricing.indexed_logs]
/// committed_rate = 1.70
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub full_month: Option<bool>,
    pub recommend: Option<bool>,
    pub colors: Option<bool>,
    /// Default commitment range spec, keyed by resource key.
    pub commit: BTreeMap<String, String>,
    /// Rate overrides, keyed by resource key.
    pub pricing: BTreeMap<String, PricingOverride>,
}

impl Config {
    pub fn commit_spec(&self, resource: Resource) -> Option<&String> {
        self.commit.get(resource.key())
    }

    pub fn pricing_overrides(&self) -> BTreeMap<Resource, PricingOverride> {
        self.pricing
            .iter()
            .filter_map(|(key, o)| Resource::from_key(key).map(|r| (r, *o)))
            .collect()
    }

    /// Table keys that don't name a resource.
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.commit
            .keys()
            .chain(self.pricing.keys())
            .filter(|k| Resource::from_key(k).is_none())
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct PricingOverride {
    pub committed_rate: Option<f64>,
    pub overage_rate: Option<f64>,
}

/// Load the config file.
///
/// An explicit path must load; the default location is optional and a broken
/// file there only warns.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        return parse_config(&data)
            .with_context(|| format!("Invalid config {}", path.display()));
    }

    let Some(dirs) = ProjectDirs::from("", "", "ddcommit") else {
        return Ok(Config::default());
    };

    let path = dirs.config_dir().join("config.toml");
    let Ok(data) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };

    match parse_config(&data) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("invalid config at {}: {}", path.display(), e);
            Ok(Config::default())
        }
    }
}

fn parse_config(data: &str) -> Result<Config> {
    let config: Config = toml::from_str(data)?;
    for key in config.unknown_keys() {
        warn!(key, "unknown resource in config, ignored");
    }
    Ok(config)
}
