//! Weekly column detection.
//!
//! The weekly report encodes its per-week series in the column names of a
//! flat `columns` array: `resellerCost_<week>` carries that week's reseller
//! cost and `usedData_<week>` that week's usage. Which weeks exist depends
//! on the requested window, so the two sets are detected per response and
//! never hard-coded.

/// Weekly series prefixes. Case-sensitive, fixed by the upstream schema.
pub const RESELLER_COST_PREFIX: &str = "resellerCost_";
pub const USED_DATA_PREFIX: &str = "usedData_";

/// The weekly column subsets of one report response, in response order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyColumns {
    /// Columns named `resellerCost_<week>`.
    pub cost: Vec<String>,
    /// Columns named `usedData_<week>`.
    pub usage: Vec<String>,
}

/// Classify column names into the weekly cost and usage series.
///
/// Order within each set follows the input order. Names matching neither
/// prefix are ignored; the prefixes are disjoint so no name can land in
/// both sets.
pub fn detect_weekly_columns(columns: &[String]) -> WeeklyColumns {
    let mut weekly = WeeklyColumns::default();
    for name in columns {
        if name.starts_with(RESELLER_COST_PREFIX) {
            weekly.cost.push(name.clone());
        } else if name.starts_with(USED_DATA_PREFIX) {
            weekly.usage.push(name.clone());
        }
    }
    weekly
}
