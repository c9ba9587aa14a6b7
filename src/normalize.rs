//! Turns raw table rows into typed records.
//!
//! Coercion never fails: a cell that is not a number becomes `NaN` (or `None`
//! for identifiers) and is counted in the [`NormalizeReport`].

use crate::config::{DensityColumns, UnemploymentColumns};
use crate::types::{DensityRecord, RawRow, UnemploymentRecord};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub rows: usize,
    pub malformed_fields: usize,
}

/// Best-effort numeric coercion. Blank or non-numeric text yields `NaN`.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Integer identifier coercion. Accepts `"17"` and `"17.0"`, rejects anything non-integral.
pub fn coerce_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Some(id);
    }
    let n = coerce_number(trimmed);
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn cell<'a>(row: &'a RawRow, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

pub fn normalize_density(rows: &[RawRow], columns: &DensityColumns) -> (Vec<DensityRecord>, NormalizeReport) {
    let mut report = NormalizeReport { rows: rows.len(), ..Default::default() };

    let records = rows
        .iter()
        .map(|row| {
            let density = coerce_number(cell(row, &columns.density));
            let id2 = coerce_id(cell(row, &columns.id2));
            if density.is_nan() {
                report.malformed_fields += 1;
            }
            if id2.is_none() {
                report.malformed_fields += 1;
            }
            DensityRecord { id: cell(row, &columns.id).trim().to_string(), id2, density }
        })
        .collect();

    log_report("density", &report);
    (records, report)
}

pub fn normalize_unemployment(
    rows: &[RawRow],
    columns: &UnemploymentColumns,
) -> (Vec<UnemploymentRecord>, NormalizeReport) {
    let mut report = NormalizeReport { rows: rows.len(), ..Default::default() };

    let records = rows
        .iter()
        .map(|row| {
            let id = coerce_id(cell(row, &columns.id));
            let rate = coerce_number(cell(row, &columns.rate));
            report.malformed_fields += usize::from(id.is_none()) + usize::from(rate.is_nan());
            UnemploymentRecord { id, rate }
        })
        .collect();

    log_report("unemployment", &report);
    (records, report)
}

fn log_report(table: &str, report: &NormalizeReport) {
    if report.malformed_fields > 0 {
        warn!(table, rows = report.rows, malformed = report.malformed_fields, "non-numeric cells coerced to NaN");
    } else {
        debug!(table, rows = report.rows, "normalized rows");
    }
}
