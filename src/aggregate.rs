use std::collections::BTreeMap;

use crate::types::{BillingRule, Resource, UsageRecord};

/// Usage statistics for one resource over the filtered period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageAggregate {
    pub total: f64,
    pub peak: f64,
    /// Host-hours resources only: summed `max(0, value - candidate)`, aligned
    /// with that resource's candidates.
    pub excess: Vec<f64>,
}

impl UsageAggregate {
    fn accumulate(&mut self, value: f64, candidates: &[f64]) {
        self.total += value;
        if value > self.peak {
            self.peak = value;
        }
        for (excess, commit) in self.excess.iter_mut().zip(candidates) {
            let over = value - commit;
            if over > 0.0 {
                *excess += over;
            }
        }
    }
}

/// Single-pass accumulator over in-period records.
pub struct UsageAggregator<'c> {
    candidates: &'c BTreeMap<Resource, Vec<f64>>,
    aggregates: BTreeMap<Resource, UsageAggregate>,
    observed: usize,
}

impl<'c> UsageAggregator<'c> {
    /// Per-candidate excess is tracked for host-hours resources that have an
    /// entry in `candidates`; every resource gets totals and peaks.
    pub fn new(candidates: &'c BTreeMap<Resource, Vec<f64>>) -> Self {
        let aggregates = Resource::ALL
            .iter()
            .map(|&resource| {
                let excess_len = match resource.rule() {
                    BillingRule::HostHours => candidates.get(&resource).map_or(0, Vec::len),
                    BillingRule::HourlyAverage | BillingRule::MonthlyVolume => 0,
                };
                let aggregate = UsageAggregate {
                    excess: vec![0.0; excess_len],
                    ..Default::default()
                };
                (resource, aggregate)
            })
            .collect();

        Self {
            candidates,
            aggregates,
            observed: 0,
        }
    }

    pub fn observe(&mut self, record: &UsageRecord) {
        for (resource, aggregate) in self.aggregates.iter_mut() {
            let candidates = self
                .candidates
                .get(resource)
                .map(Vec::as_slice)
                .unwrap_or_default();
            aggregate.accumulate(record.value(*resource), candidates);
        }
        self.observed += 1;
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    pub fn finish(self) -> BTreeMap<Resource, UsageAggregate> {
        self.aggregates
    }
}

/// Totals and peaks only, without any candidate sweep.
pub fn summarize<'r>(
    records: impl IntoIterator<Item = &'r UsageRecord>,
) -> BTreeMap<Resource, UsageAggregate> {
    let none = BTreeMap::new();
    let mut aggregator = UsageAggregator::new(&none);
    for record in records {
        aggregator.observe(record);
    }
    aggregator.finish()
}
