use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::types::UsageRecord;

/// The billing window usage is aggregated over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    /// A calendar month as `YYYY-MM`.
    Month(String),
    /// An explicit inclusive date range.
    Range { start: NaiveDate, end: NaiveDate },
}

impl Period {
    pub fn current_month() -> Self {
        Period::Month(chrono::Local::now().format("%Y-%m").to_string())
    }

    pub fn label(&self) -> String {
        match self {
            Period::Month(month) => month.clone(),
            Period::Range { start, end } => format!("{start} .. {end}"),
        }
    }

    /// An explicit range whose ends fall in different calendar months. Host
    /// commitments are still prorated against the month of the latest date.
    pub fn spans_months(&self) -> bool {
        match self {
            Period::Month(_) => false,
            Period::Range { start, end } => {
                (start.year(), start.month()) != (end.year(), end.month())
            }
        }
    }
}

/// Parse a `YYYY-MM` month key.
pub fn parse_month(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| format!("expected YYYY-MM, got '{s}'"))
}

/// Parse the date part of an export timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Records that fell inside the target period.
#[derive(Debug, Default)]
pub struct PeriodWindow<'a> {
    /// In-period records, in input order.
    pub records: Vec<&'a UsageRecord>,
    pub first_timestamp: Option<&'a str>,
    pub last_timestamp: Option<&'a str>,
    /// Most recent in-period date; drives extrapolation.
    pub latest: Option<NaiveDate>,
}

impl<'a> PeriodWindow<'a> {
    fn push(&mut self, record: &'a UsageRecord) {
        if self.first_timestamp.is_none() {
            self.first_timestamp = Some(&record.timestamp);
        }
        self.last_timestamp = Some(&record.timestamp);
        if let Some(date) = record.date {
            self.latest = Some(self.latest.map_or(date, |l| l.max(date)));
        }
        self.records.push(record);
    }
}

/// Select the records belonging to `period`.
///
/// Month mode keeps every record whose timestamp starts with the month key,
/// wherever that block sits in the stream.
///
/// Range mode expects reverse-chronological exports: the window opens at the
/// first record dated `end` and closes at the first record dated the day
/// before `start`.
pub fn filter<'a>(records: &'a [UsageRecord], period: &Period) -> PeriodWindow<'a> {
    let mut window = PeriodWindow::default();

    match period {
        Period::Month(month) => {
            for record in records {
                let in_period = record.timestamp.starts_with(month.as_str());
                if in_period {
                    window.push(record);
                }
            }
        }
        Period::Range { start, end } => {
            let before_start = start.pred_opt();
            let mut in_period = false;
            for record in records {
                if record.date.is_some() && record.date == before_start {
                    in_period = false;
                } else if record.date == Some(*end) {
                    in_period = true;
                }
                if in_period {
                    window.push(record);
                }
            }
        }
    }

    window
}

/// Days observed in the period's month versus days in that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodScale {
    pub days_elapsed: u32,
    pub days_in_month: u32,
}

impl PeriodScale {
    pub fn from_latest(latest: Option<NaiveDate>) -> Self {
        match latest {
            Some(date) => Self {
                days_elapsed: date.day(),
                days_in_month: days_in_month(date),
            },
            None => Self {
                days_elapsed: 0,
                days_in_month: 0,
            },
        }
    }

    pub fn is_partial(&self) -> bool {
        self.days_elapsed > 0 && self.days_elapsed < self.days_in_month
    }

    /// Share of the month a commitment is billed for.
    pub fn commit_factor(&self) -> f64 {
        if self.days_elapsed == 0 || self.days_in_month == 0 {
            return 1.0;
        }
        self.days_elapsed as f64 / self.days_in_month as f64
    }

    /// Multiplier projecting observed volume to a full month.
    pub fn projection_factor(&self) -> f64 {
        if self.days_elapsed == 0 || self.days_in_month == 0 {
            return 1.0;
        }
        self.days_in_month as f64 / self.days_elapsed as f64
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}
