use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::PricingOverride;
use crate::cost::{PricingMap, ResourcePricing};
use crate::types::Resource;

/// Per-resource prices: list prices, with any configured overrides applied.
#[derive(Debug, Clone)]
pub struct PricingTable {
    map: BTreeMap<Resource, ResourcePricing>,
}

impl PricingMap for PricingTable {
    fn get(&self, resource: Resource) -> Option<&ResourcePricing> {
        self.map.get(&resource)
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        let map = Resource::ALL
            .iter()
            .map(|resource| {
                let spec = resource.spec();
                let pricing = ResourcePricing {
                    committed_rate: spec.committed_rate,
                    overage_rate: spec.overage_rate,
                };
                (spec.resource, pricing)
            })
            .collect();
        Self { map }
    }
}

impl PricingTable {
    pub fn with_overrides(overrides: &BTreeMap<Resource, PricingOverride>) -> Self {
        let mut table = Self::default();

        for (resource, o) in overrides {
            let Some(pricing) = table.map.get_mut(resource) else {
                continue;
            };
            if let Some(rate) = o.committed_rate {
                match valid_rate(rate) {
                    Some(rate) => pricing.committed_rate = rate,
                    None => warn!(resource = resource.key(), rate, "ignoring invalid committed_rate"),
                }
            }
            if let Some(rate) = o.overage_rate {
                match valid_rate(rate) {
                    Some(rate) => pricing.overage_rate = rate,
                    None => warn!(resource = resource.key(), rate, "ignoring invalid overage_rate"),
                }
            }
            debug!(
                resource = resource.key(),
                committed_rate = pricing.committed_rate,
                overage_rate = pricing.overage_rate,
                "pricing override applied"
            );
        }

        table
    }
}

/// Prices must be finite and non-negative.
fn valid_rate(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate >= 0.0).then_some(rate)
}
