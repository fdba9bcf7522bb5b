use crate::aggregate::UsageAggregate;
use crate::period::PeriodScale;
use crate::types::{BillingRule, Resource};

/// Two-tier price for a resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourcePricing {
    /// Price per committed unit.
    pub committed_rate: f64,
    /// Price per unit of usage beyond the commitment.
    pub overage_rate: f64,
}

/// Quantity a commitment is sized against: the hourly peak for host-hours
/// resources, otherwise the period's usage in billing units.
pub fn billed_quantity(
    resource: Resource,
    aggregate: &UsageAggregate,
    scale: &PeriodScale,
    extrapolate: bool,
) -> f64 {
    let units = aggregate.total / resource.spec().unit_divisor;
    match resource.rule() {
        // Averaging ignores the extrapolation flag.
        BillingRule::HourlyAverage => units / 24.0 / scale.days_elapsed.max(1) as f64,
        BillingRule::MonthlyVolume if extrapolate => units * scale.projection_factor(),
        BillingRule::MonthlyVolume => units,
        BillingRule::HostHours => aggregate.peak,
    }
}

/// Trait for looking up pricing by resource.
pub trait PricingMap {
    fn get(&self, resource: Resource) -> Option<&ResourcePricing>;

    /// Total price for each candidate commitment, aligned with `candidates`.
    fn cost_vector(
        &self,
        resource: Resource,
        candidates: &[f64],
        aggregate: &UsageAggregate,
        scale: &PeriodScale,
        extrapolate: bool,
    ) -> Option<Vec<f64>> {
        let p = self.get(resource)?;

        let costs = match resource.rule() {
            BillingRule::HostHours => {
                let factor = scale.commit_factor();
                candidates
                    .iter()
                    .enumerate()
                    .map(|(i, commit)| {
                        let excess = aggregate.excess.get(i).copied().unwrap_or(0.0);
                        p.committed_rate * commit * factor + p.overage_rate * excess
                    })
                    .collect()
            }
            BillingRule::HourlyAverage | BillingRule::MonthlyVolume => {
                let quantity = billed_quantity(resource, aggregate, scale, extrapolate);
                candidates
                    .iter()
                    .map(|commit| {
                        let excess = (quantity - commit).max(0.0);
                        p.committed_rate * commit + p.overage_rate * excess
                    })
                    .collect()
            }
        };

        Some(costs)
    }
}

/// Index of the smallest cost; the first one wins on ties.
pub fn min_index(costs: &[f64]) -> Option<usize> {
    let (first, rest) = costs.split_first()?;
    let mut min = *first;
    let mut index = 0;
    for (i, &cost) in rest.iter().enumerate() {
        if cost < min {
            min = cost;
            index = i + 1;
        }
    }
    Some(index)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::aggregate::UsageAggregator;
    use crate::types::UsageRecord;

    struct Fixed(ResourcePricing);

    impl PricingMap for Fixed {
        fn get(&self, _resource: Resource) -> Option<&ResourcePricing> {
            Some(&self.0)
        }
    }

    struct Empty;

    impl PricingMap for Empty {
        fn get(&self, _resource: Resource) -> Option<&ResourcePricing> {
            None
        }
    }

    fn full_month() -> PeriodScale {
        PeriodScale {
            days_elapsed: 30,
            days_in_month: 30,
        }
    }

    fn host_aggregate(values: &[f64], candidates: &[f64]) -> UsageAggregate {
        let map = BTreeMap::from([(Resource::InfraHost, candidates.to_vec())]);
        let mut aggregator = UsageAggregator::new(&map);
        for v in values {
            let mut values = [0.0; Resource::COUNT];
            values[Resource::InfraHost.index()] = *v;
            aggregator.observe(&UsageRecord {
                timestamp: String::new(),
                date: None,
                values,
            });
        }
        aggregator.finish().remove(&Resource::InfraHost).unwrap()
    }

    fn host_pricing() -> Fixed {
        Fixed(ResourcePricing {
            committed_rate: 18.0,
            overage_rate: 0.03,
        })
    }

    #[test]
    fn min_index_first_occurrence() {
        assert_eq!(min_index(&[5.0, 2.0, 2.0, 9.0]), Some(1));
        assert_eq!(min_index(&[3.0]), Some(0));
        assert_eq!(min_index(&[4.0, 4.0]), Some(0));
        assert_eq!(min_index(&[9.0, 8.0, 1.0]), Some(2));
        assert_eq!(min_index(&[]), None);
    }

    #[test]
    fn min_index_is_a_minimum() {
        let costs = [7.5, 3.25, 8.0, 3.25, 3.5, 10.0];
        let i = min_index(&costs).unwrap();
        assert!(costs.iter().all(|c| costs[i] <= *c));
        assert!(costs[..i].iter().all(|c| *c > costs[i]));
    }

    #[test]
    fn host_hours_scenario() {
        let candidates = [5.0, 8.0];
        let aggregate = host_aggregate(&[5.0, 8.0, 6.0], &candidates);
        let costs = host_pricing()
            .cost_vector(Resource::InfraHost, &candidates, &aggregate, &full_month(), false)
            .unwrap();
        assert!((costs[0] - 90.12).abs() < 1e-9);
        assert!((costs[1] - 144.0).abs() < 1e-9);
        assert_eq!(min_index(&costs), Some(0));
    }

    #[test]
    fn host_commitment_is_prorated() {
        let candidates = [10.0];
        let aggregate = host_aggregate(&[], &candidates);
        let scale = PeriodScale {
            days_elapsed: 10,
            days_in_month: 30,
        };
        let costs = host_pricing()
            .cost_vector(Resource::InfraHost, &candidates, &aggregate, &scale, false)
            .unwrap();
        assert!((costs[0] - 60.0).abs() < 1e-9);
    }

    #[test]
    fn raising_commitment_costs_at_most_its_flat_price() {
        let candidates: Vec<f64> = (0..=12).map(f64::from).collect();
        let usage = [3.0, 11.0, 7.0, 9.0, 0.0, 12.0, 4.0];
        let aggregate = host_aggregate(&usage, &candidates);
        let pricing = host_pricing();
        let costs = pricing
            .cost_vector(Resource::InfraHost, &candidates, &aggregate, &full_month(), false)
            .unwrap();
        assert_eq!(costs.len(), candidates.len());
        for i in 1..costs.len() {
            let delta = candidates[i] - candidates[i - 1];
            assert!(costs[i] - costs[i - 1] <= pricing.0.committed_rate * delta + 1e-9);
            assert!(costs[i] >= 0.0);
        }
    }

    #[test]
    fn monthly_volume_projection() {
        let aggregate = UsageAggregate {
            total: 10_000_000.0,
            peak: 0.0,
            excess: Vec::new(),
        };
        let scale = PeriodScale {
            days_elapsed: 10,
            days_in_month: 30,
        };
        assert_eq!(billed_quantity(Resource::IndexedLogs, &aggregate, &scale, false), 10.0);
        assert_eq!(billed_quantity(Resource::IndexedLogs, &aggregate, &scale, true), 30.0);

        let pricing = Fixed(ResourcePricing {
            committed_rate: 2.04,
            overage_rate: 2.55,
        });
        let costs = pricing
            .cost_vector(Resource::IndexedLogs, &[0.0, 30.0, 40.0], &aggregate, &scale, true)
            .unwrap();
        assert!((costs[0] - 76.5).abs() < 1e-9);
        assert!((costs[1] - 61.2).abs() < 1e-9);
        assert!((costs[2] - 81.6).abs() < 1e-9);
        assert_eq!(min_index(&costs), Some(1));
    }

    #[test]
    fn hourly_average_divides_by_observed_hours() {
        let aggregate = UsageAggregate {
            total: 480.0,
            peak: 0.0,
            excess: Vec::new(),
        };
        let scale = PeriodScale {
            days_elapsed: 10,
            days_in_month: 31,
        };
        assert_eq!(billed_quantity(Resource::FargateTask, &aggregate, &scale, true), 2.0);
        assert_eq!(
            billed_quantity(Resource::FargateTask, &aggregate, &PeriodScale::from_latest(None), false),
            20.0
        );
    }

    #[test]
    fn excess_never_negative() {
        let aggregate = UsageAggregate {
            total: 20_000.0,
            peak: 0.0,
            excess: Vec::new(),
        };
        let pricing = Fixed(ResourcePricing {
            committed_rate: 6.0,
            overage_rate: 7.2,
        });
        let costs = pricing
            .cost_vector(Resource::SyntheticsApiTest, &[5.0], &aggregate, &full_month(), false)
            .unwrap();
        assert_eq!(costs, vec![30.0]);
    }

    #[test]
    fn unpriced_resource() {
        let aggregate = UsageAggregate::default();
        assert!(Empty
            .cost_vector(Resource::ApmHost, &[1.0], &aggregate, &full_month(), false)
            .is_none());
    }
}
