use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::period::parse_date;
use crate::types::{Resource, UsageRecord, TIMESTAMP_COLUMN};

/// Read a usage export from disk.
pub fn load_usage_csv(path: &Path) -> Result<Vec<UsageRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records =
        read_usage(file).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), rows = records.len(), "loaded usage export");
    Ok(records)
}

/// Parse a usage export. The first row is a header; every row must have as
/// many columns as the header. Numeric cells that don't parse count as 0.
///
/// Cells are read as raw bytes, so stray non-UTF-8 text in a row never fails
/// the load.
pub fn read_usage<R: Read>(reader: R) -> Result<Vec<UsageRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let width = rdr.byte_headers()?.len();
    let required = Resource::max_column().max(TIMESTAMP_COLUMN) + 1;
    if width < required {
        bail!("expected at least {required} columns, header has {width}");
    }

    let mut records = Vec::new();
    let mut degraded = 0usize;

    for row in rdr.byte_records() {
        let row = row?;
        let timestamp = String::from_utf8_lossy(row.get(TIMESTAMP_COLUMN).unwrap_or_default())
            .trim()
            .to_string();

        let mut values = [0.0; Resource::COUNT];
        for resource in Resource::ALL {
            let raw = row.get(resource.spec().column).unwrap_or_default();
            let parsed = std::str::from_utf8(raw)
                .ok()
                .map(str::trim)
                .and_then(|cell| cell.parse::<f64>().ok())
                .filter(|v| v.is_finite());
            values[resource.index()] = match parsed {
                Some(v) => v,
                None => {
                    if !raw.trim_ascii().is_empty() {
                        degraded += 1;
                    }
                    0.0
                }
            };
        }

        records.push(UsageRecord {
            date: parse_date(&timestamp),
            timestamp,
            values,
        });
    }

    if degraded > 0 {
        warn!(cells = degraded, "non-numeric usage cells counted as 0");
    }

    Ok(records)
}
