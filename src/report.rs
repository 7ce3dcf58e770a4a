//! Report derivation.
//!
//! Turns the raw weekly-report payload into display-ready records: per-row
//! weekly totals summed over the detected weekly columns, profit and margin
//! computed from those totals, and an aggregate totals block. Everything in
//! this module is pure; rows stay untyped [`RawRow`] maps right up to
//! [`ReportRecord::from_raw`], which is the single point where upstream
//! shape assumptions are applied.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::coerce;
use crate::columns::{detect_weekly_columns, WeeklyColumns};

/// One raw upstream row: column name to cell value, shape unknown until
/// runtime.
pub type RawRow = Map<String, Value>;

/// The report-bearing portion of an upstream response: ordered column
/// names plus raw rows. Missing or oddly typed pieces degrade to empty.
#[derive(Debug, Clone, Default)]
pub struct ReportSource {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ReportSource {
    /// Extract columns and rows from a parsed upstream body.
    ///
    /// A row that is not a JSON object is kept as an empty row rather than
    /// dropped, so output row count and order always mirror the input.
    pub fn from_value(upstream: &Value) -> Self {
        let columns = upstream
            .get("columns")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let rows = upstream
            .get("rows")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| row.as_object().cloned().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();
        Self { columns, rows }
    }
}

/// One normalized report row.
///
/// Serializes with the camelCase field names the dashboard table binds to.
/// `profit` and `margin` are always derived here and never read from
/// upstream, even if upstream ships columns with those names.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub subscriber_id: String,
    pub iccid: String,
    pub last_usage_date: String,
    pub template_name: String,
    pub activation_date: String,
    pub expiry_date: String,
    pub used_data_byte: f64,
    pub pck_data_byte: f64,
    pub used_data_weekly_total_bytes: f64,
    pub subscriber_cost: f64,
    pub reseller_cost: f64,
    pub reseller_cost_weekly_total: f64,
    /// `subscriber_cost - reseller_cost_weekly_total`. Negative means the
    /// package was sold at a loss; the sign is preserved.
    pub profit: f64,
    /// Percentage of subscriber cost kept as profit; 0 when subscriber
    /// cost is not positive (no meaningful base for a percentage).
    pub margin: f64,
}

impl ReportRecord {
    /// Build one record from one raw row.
    pub fn from_raw(row: &RawRow, weekly: &WeeklyColumns) -> Self {
        let reseller_cost_weekly_total = sum_columns(row, &weekly.cost);
        let used_data_weekly_total_bytes = sum_columns(row, &weekly.usage);
        let subscriber_cost = coerce::num(row.get("subscriberCost"));
        let profit = subscriber_cost - reseller_cost_weekly_total;
        let margin = if subscriber_cost > 0.0 {
            profit / subscriber_cost * 100.0
        } else {
            0.0
        };

        Self {
            subscriber_id: coerce::text(row.get("subscriberId")),
            iccid: coerce::text(row.get("iccid")),
            last_usage_date: coerce::text(row.get("lastUsageDate")),
            template_name: coerce::text(row.get("templateName")),
            activation_date: text_or(row, "activationDate", "tstartactivationutc"),
            expiry_date: text_or(row, "expiryDate", "tsexpirationutc"),
            used_data_byte: coerce::num(row.get("usedDataByte")),
            pck_data_byte: coerce::num(row.get("pckDataByte")),
            used_data_weekly_total_bytes,
            subscriber_cost,
            reseller_cost: coerce::num(row.get("resellerCost")),
            reseller_cost_weekly_total,
            profit,
            margin,
        }
    }
}

/// Sum the named columns of a row, coercing each cell.
fn sum_columns(row: &RawRow, columns: &[String]) -> f64 {
    columns.iter().map(|name| coerce::num(row.get(name))).sum()
}

/// Primary field, falling back to the legacy UTC field when the primary is
/// missing or empty.
fn text_or(row: &RawRow, primary: &str, fallback: &str) -> String {
    let value = coerce::text(row.get(primary));
    if value.is_empty() {
        coerce::text(row.get(fallback))
    } else {
        value
    }
}

/// Derive all records for a report, preserving row order.
pub fn build_report(rows: &[RawRow], weekly: &WeeklyColumns) -> Vec<ReportRecord> {
    rows.iter()
        .map(|row| ReportRecord::from_raw(row, weekly))
        .collect()
}

/// Aggregate totals over a derived report.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub subscriber_cost: f64,
    pub reseller_cost_weekly_total: f64,
    pub profit: f64,
    /// Unweighted mean of the per-row margins, not profit over cost. A row
    /// with a tiny cost counts as much as a large one; 0 for an empty
    /// report.
    pub avg_margin: f64,
}

/// Sum costs and profit over all records and average their margins.
pub fn totals(records: &[ReportRecord]) -> ReportTotals {
    if records.is_empty() {
        return ReportTotals::default();
    }
    let mut sums = ReportTotals::default();
    for record in records {
        sums.subscriber_cost += record.subscriber_cost;
        sums.reseller_cost_weekly_total += record.reseller_cost_weekly_total;
        sums.profit += record.profit;
        sums.avg_margin += record.margin;
    }
    sums.avg_margin /= records.len() as f64;
    sums
}

/// The full derived report served to consumers: the original column list,
/// the normalized rows, and the totals block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRecord>,
    pub totals: ReportTotals,
}

/// Run the whole derivation over a parsed upstream body.
pub fn derive_report(upstream: &Value) -> ReportResponse {
    let source = ReportSource::from_value(upstream);
    let weekly = detect_weekly_columns(&source.columns);
    let rows = build_report(&source.rows, &weekly);
    let totals = totals(&rows);
    ReportResponse {
        columns: source.columns,
        rows,
        totals,
    }
}
