use chrono::NaiveDate;
use serde::Serialize;

/// A billable resource tracked in the usage export.
///
/// Variant order is the order resources are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    InfraHost,
    ApmHost,
    FargateTask,
    LambdaFunction,
    IndexedLogs,
    AnalyzedLogs,
    SyntheticsApiTest,
}

/// How usage of a resource turns into a billed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingRule {
    /// Hourly host counts; overage is summed per record above the commitment
    /// and the commitment itself is prorated to the observed part of the month.
    HostHours,
    /// Summed usage averaged over the hours of the observed days.
    HourlyAverage,
    /// Summed usage over the period, optionally projected to a full month.
    MonthlyVolume,
}

/// Static description of a resource: where it lives in the export, how it is
/// billed, and its list prices.
#[derive(Debug)]
pub struct ResourceSpec {
    pub resource: Resource,
    pub key: &'static str,
    pub label: &'static str,
    pub column: usize,
    pub rule: BillingRule,
    pub unit_divisor: f64,
    pub committed_rate: f64,
    pub overage_rate: f64,
}

/// Column 1 of every export row.
pub const TIMESTAMP_COLUMN: usize = 1;

static RESOURCE_TABLE: [ResourceSpec; 7] = [
    ResourceSpec {
        resource: Resource::InfraHost,
        key: "infra_host",
        label: "Infra Host",
        column: 2,
        rule: BillingRule::HostHours,
        unit_divisor: 1.0,
        committed_rate: 18.0,
        overage_rate: 0.03,
    },
    ResourceSpec {
        resource: Resource::ApmHost,
        key: "apm_host",
        label: "APM Host",
        column: 3,
        rule: BillingRule::HostHours,
        unit_divisor: 1.0,
        committed_rate: 36.0,
        overage_rate: 0.06,
    },
    ResourceSpec {
        resource: Resource::FargateTask,
        key: "fargate_task",
        label: "Fargate Task",
        column: 15,
        rule: BillingRule::HourlyAverage,
        unit_divisor: 1.0,
        committed_rate: 1.2,
        overage_rate: 1.4,
    },
    ResourceSpec {
        resource: Resource::LambdaFunction,
        key: "lambda_function",
        label: "Lambda Function",
        column: 16,
        rule: BillingRule::HourlyAverage,
        unit_divisor: 1.0,
        committed_rate: 6.0,
        overage_rate: 7.2,
    },
    // Indexed logs (15 day retention) are billed per million events.
    ResourceSpec {
        resource: Resource::IndexedLogs,
        key: "indexed_logs",
        label: "Indexed Logs",
        column: 11,
        rule: BillingRule::MonthlyVolume,
        unit_divisor: 1_000_000.0,
        committed_rate: 2.04,
        overage_rate: 2.55,
    },
    // Analyzed logs are billed per GB of ingested bytes.
    ResourceSpec {
        resource: Resource::AnalyzedLogs,
        key: "analyzed_logs",
        label: "Analyzed Logs",
        column: 22,
        rule: BillingRule::MonthlyVolume,
        unit_divisor: 1_000_000_000.0,
        committed_rate: 0.24,
        overage_rate: 0.30,
    },
    // Synthetics API test runs are billed per 10K.
    ResourceSpec {
        resource: Resource::SyntheticsApiTest,
        key: "synthetics_api_test",
        label: "Synthetics API Test",
        column: 14,
        rule: BillingRule::MonthlyVolume,
        unit_divisor: 10_000.0,
        committed_rate: 6.0,
        overage_rate: 7.2,
    },
];

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::InfraHost,
        Resource::ApmHost,
        Resource::FargateTask,
        Resource::LambdaFunction,
        Resource::IndexedLogs,
        Resource::AnalyzedLogs,
        Resource::SyntheticsApiTest,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static ResourceSpec {
        &RESOURCE_TABLE[self.index()]
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Look up a resource by its config key, e.g. `"infra_host"`.
    pub fn from_key(key: &str) -> Option<Resource> {
        Self::ALL.into_iter().find(|r| r.key() == key)
    }

    pub fn rule(self) -> BillingRule {
        self.spec().rule
    }

    /// Highest CSV column any resource reads from.
    pub fn max_column() -> usize {
        RESOURCE_TABLE.iter().map(|s| s.column).max().unwrap_or(0)
    }
}

/// One row of the usage export.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    /// Timestamp exactly as exported; month filtering matches on its prefix.
    pub timestamp: String,
    pub date: Option<NaiveDate>,
    pub values: [f64; Resource::COUNT],
}

impl UsageRecord {
    pub fn value(&self, resource: Resource) -> f64 {
        self.values[resource.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_enum() {
        for (i, resource) in Resource::ALL.iter().enumerate() {
            assert_eq!(resource.index(), i);
            assert_eq!(resource.spec().resource, *resource);
        }
    }

    #[test]
    fn volume_overage_costs_more_than_commitment() {
        for resource in Resource::ALL {
            let spec = resource.spec();
            if spec.rule != BillingRule::HostHours {
                assert!(spec.overage_rate >= spec.committed_rate, "{}", spec.label);
            }
        }
    }

    #[test]
    fn serialized_name_matches_config_key() {
        for resource in Resource::ALL {
            let json = serde_json::to_string(&resource).unwrap();
            assert_eq!(json, format!("\"{}\"", resource.key()));
        }
    }

    #[test]
    fn lookup_by_key() {
        assert_eq!(Resource::from_key("apm_host"), Some(Resource::ApmHost));
        assert_eq!(Resource::from_key("synthetics_api_test"), Some(Resource::SyntheticsApiTest));
        assert_eq!(Resource::from_key("apm"), None);
    }

    #[test]
    fn max_column_covers_analyzed_logs() {
        assert_eq!(Resource::max_column(), 22);
    }
}
