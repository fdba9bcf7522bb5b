use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::{self, UsageAggregate, UsageAggregator};
use crate::cost::{min_index, PricingMap};
use crate::period::{self, Period, PeriodScale};
use crate::pricing::PricingTable;
use crate::range;
use crate::types::{Resource, UsageRecord};

/// Range spec used for resources nobody configured: price the usage with no
/// commitment at all.
pub const DEFAULT_RANGE: &str = "0";

/// Everything a run needs, resolved once from flags and config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub period: Period,
    /// Commitment range spec per resource; missing entries use [`DEFAULT_RANGE`].
    pub ranges: BTreeMap<Resource, String>,
    pub pricing: PricingTable,
    /// Project monthly-volume resources to a full month.
    pub extrapolate: bool,
    /// Derive ranges from observed usage instead of `ranges`.
    pub recommend: bool,
}

impl Settings {
    pub fn range_spec(&self, resource: Resource) -> &str {
        self.ranges
            .get(&resource)
            .map(String::as_str)
            .unwrap_or(DEFAULT_RANGE)
    }
}

/// Every candidate evaluated for one resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub resource: Resource,
    pub label: &'static str,
    pub candidates: Vec<f64>,
    pub costs: Vec<f64>,
    pub min_index: usize,
}

/// The cheapest commitment for a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub resource: Resource,
    pub label: &'static str,
    pub commitment: f64,
    pub total_cost: f64,
}

impl ResourceReport {
    pub fn recommendation(&self) -> Recommendation {
        Recommendation {
            resource: self.resource,
            label: self.label,
            commitment: self.candidates[self.min_index],
            total_cost: self.costs[self.min_index],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Optimization {
    pub period: String,
    pub records: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    pub scale: PeriodScale,
    pub reports: Vec<ResourceReport>,
}

impl Optimization {
    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.reports.iter().map(ResourceReport::recommendation).collect()
    }
}

/// Filter, aggregate and price `records`, picking the cheapest commitment per
/// resource.
pub fn optimize(records: &[UsageRecord], settings: &Settings) -> Optimization {
    let window = period::filter(records, &settings.period);
    let scale = PeriodScale::from_latest(window.latest);
    debug!(
        period = %settings.period.label(),
        matched = window.records.len(),
        total = records.len(),
        days_elapsed = scale.days_elapsed,
        days_in_month = scale.days_in_month,
        "filtered usage records"
    );

    if window.records.is_empty() {
        match settings.period {
            Period::Month(_) => warn!(
                period = %settings.period.label(),
                "no usage records in period"
            ),
            Period::Range { .. } => warn!(
                period = %settings.period.label(),
                "no usage records in range; range filtering expects newest rows first"
            ),
        }
    }

    if settings.period.spans_months() {
        warn!(
            period = %settings.period.label(),
            days_elapsed = scale.days_elapsed,
            days_in_month = scale.days_in_month,
            "range spans months; host commitments are prorated by the last month only"
        );
    }

    let candidates = candidate_ranges(&window.records, &scale, settings);

    let mut aggregator = UsageAggregator::new(&candidates);
    for record in &window.records {
        aggregator.observe(record);
    }
    debug!(observed = aggregator.observed(), "aggregated usage");
    let aggregates = aggregator.finish();

    let reports = Resource::ALL
        .as_slice()
        .par_iter()
        .filter_map(|&resource| {
            evaluate(
                resource,
                &candidates[&resource],
                &aggregates[&resource],
                &scale,
                settings,
            )
        })
        .collect();

    Optimization {
        period: settings.period.label(),
        records: window.records.len(),
        first_timestamp: window.first_timestamp.map(str::to_string),
        last_timestamp: window.last_timestamp.map(str::to_string),
        scale,
        reports,
    }
}

fn candidate_ranges(
    records: &[&UsageRecord],
    scale: &PeriodScale,
    settings: &Settings,
) -> BTreeMap<Resource, Vec<f64>> {
    let stats = settings
        .recommend
        .then(|| aggregate::summarize(records.iter().copied()));

    Resource::ALL
        .iter()
        .map(|&resource| {
            let spec = match &stats {
                Some(stats) => {
                    range::recommended_spec(resource, &stats[&resource], scale, settings.extrapolate)
                }
                None => settings.range_spec(resource).to_string(),
            };
            let candidates = range::expand(&spec);
            debug!(
                resource = resource.key(),
                spec = %spec,
                candidates = candidates.len(),
                "expanded commitment range"
            );
            (resource, candidates)
        })
        .collect()
}

fn evaluate(
    resource: Resource,
    candidates: &[f64],
    aggregate: &UsageAggregate,
    scale: &PeriodScale,
    settings: &Settings,
) -> Option<ResourceReport> {
    if candidates.is_empty() {
        warn!(
            resource = resource.key(),
            spec = settings.range_spec(resource),
            "no commitment candidates, skipping"
        );
        return None;
    }

    let costs = settings.pricing.cost_vector(
        resource,
        candidates,
        aggregate,
        scale,
        settings.extrapolate,
    )?;
    let min_index = min_index(&costs)?;

    Some(ResourceReport {
        resource,
        label: resource.label(),
        candidates: candidates.to_vec(),
        costs,
        min_index,
    })
}
