use crate::aggregate::UsageAggregate;
use crate::cost::billed_quantity;
use crate::period::PeriodScale;
use crate::types::Resource;

/// Expand a commitment range spec into candidate quantities.
///
/// Tokens are comma-separated; each is a single number (`"5"`) or an
/// inclusive pair (`"1-10"`) walked in steps of exactly 1.0. A pair whose low
/// bound exceeds its high bound is skipped, and numbers that don't parse
/// (empty tokens included) count as 0.
///
/// "1-3,7" → [1, 2, 3, 7]
/// "1,,2"  → [1, 0, 2]
/// "5-2"   → []
/// "1.5-4" → [1.5, 2.5, 3.5]
pub fn expand(spec: &str) -> Vec<f64> {
    let mut candidates = Vec::new();

    for token in spec.split(',') {
        let token = token.trim();
        let Some((low, high)) = token.split_once('-') else {
            candidates.push(parse_or_zero(token));
            continue;
        };

        // Anything after a second '-' is ignored.
        let high = high.split('-').next().unwrap_or_default();
        let (low, high) = (parse_or_zero(low), parse_or_zero(high));
        if low > high {
            continue;
        }

        let mut value = low;
        loop {
            candidates.push(value);
            if value == high {
                break;
            }
            let next = value + 1.0;
            // Non-integral bounds never land on `high` exactly; stop before
            // passing it. Also stops once f64 can no longer advance.
            if next > high || next == value {
                break;
            }
            value = next;
        }
    }

    candidates
}

fn parse_or_zero(s: &str) -> f64 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Synthesize a `"0-max"` spec from observed usage, for auto-recommend mode.
///
/// Host resources search up to their hourly peak; everything else up to the
/// quantity that would be billed against the commitment.
pub fn recommended_spec(
    resource: Resource,
    aggregate: &UsageAggregate,
    scale: &PeriodScale,
    extrapolate: bool,
) -> String {
    let max = billed_quantity(resource, aggregate, scale, extrapolate);
    format!("0-{}", max.max(0.0).ceil())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value() {
        assert_eq!(expand("3"), vec![3.0]);
    }

    #[test]
    fn inclusive_pair() {
        assert_eq!(expand("1-3"), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn descending_pair_is_dropped() {
        assert!(expand("5-2").is_empty());
        assert_eq!(expand("5-2,4"), vec![4.0]);
    }

    #[test]
    fn pairs_and_values_keep_token_order() {
        assert_eq!(expand("1-3,7"), vec![1.0, 2.0, 3.0, 7.0]);
        assert_eq!(expand("7,1-2"), vec![7.0, 1.0, 2.0]);
    }

    #[test]
    fn duplicates_are_kept() {
        assert_eq!(expand("2,1-2"), vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn unparseable_tokens_become_zero() {
        assert_eq!(expand("abc"), vec![0.0]);
        assert_eq!(expand("x-2"), vec![0.0, 1.0, 2.0]);
        assert_eq!(expand("nan"), vec![0.0]);
    }

    #[test]
    fn empty_tokens_become_zero() {
        assert_eq!(expand(""), vec![0.0]);
        assert_eq!(expand("1,,2"), vec![1.0, 0.0, 2.0]);
        assert_eq!(expand("3,"), vec![3.0, 0.0]);
    }

    #[test]
    fn whitespace_around_tokens() {
        assert_eq!(expand(" 1 - 2 , 4 "), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn non_integral_bounds_landing_on_high() {
        assert_eq!(expand("1.5-4.5"), vec![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn non_integral_bounds_never_reach_high() {
        // 4 is skipped over; the walk stops instead of running past it.
        assert_eq!(expand("1.5-4"), vec![1.5, 2.5, 3.5]);
        assert_eq!(expand("1-2.5"), vec![1.0, 2.0]);
    }

    #[test]
    fn equal_bounds() {
        assert_eq!(expand("4-4"), vec![4.0]);
    }

    #[test]
    fn recommended_host_range_uses_peak() {
        let aggregate = UsageAggregate {
            total: 19.0,
            peak: 8.0,
            excess: Vec::new(),
        };
        let spec = recommended_spec(
            Resource::InfraHost,
            &aggregate,
            &PeriodScale::from_latest(None),
            false,
        );
        assert_eq!(spec, "0-8");
        assert_eq!(expand(&spec).len(), 9);
    }

    #[test]
    fn recommended_volume_range_rounds_up() {
        let aggregate = UsageAggregate {
            total: 2_500_000.0,
            peak: 1_000_000.0,
            excess: Vec::new(),
        };
        let spec = recommended_spec(
            Resource::IndexedLogs,
            &aggregate,
            &PeriodScale::from_latest(None),
            false,
        );
        assert_eq!(spec, "0-3");
    }

    #[test]
    fn recommended_range_for_no_usage() {
        let spec = recommended_spec(
            Resource::FargateTask,
            &UsageAggregate::default(),
            &PeriodScale::from_latest(None),
            true,
        );
        assert_eq!(expand(&spec), vec![0.0]);
    }
}
