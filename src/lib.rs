//! OCS Dashboard Backend
//!
//! Backend for the OCS billing/telemetry dashboard. It fronts the
//! third-party OCS API (account-scoped query endpoint, token in the query
//! string) and turns the weekly per-package report into display-ready
//! records: weekly series detected by column-name prefix, per-row weekly
//! totals, profit and margin, and an aggregate totals row.
//!
//! Layering, bottom to top:
//! - [`coerce`] / [`columns`] / [`report`] / [`subscribers`]: pure
//!   derivation logic, no IO
//! - [`client`]: async upstream client with a uniform bounded timeout
//! - [`server`]: axum routes exposing the derived report and subscriber
//!   KPIs to the dashboard UI

pub mod client;
pub mod coerce;
pub mod columns;
pub mod config;
pub mod error;
pub mod report;
pub mod server;
pub mod subscribers;

pub use client::{parse_account_id, OcsClient, UpstreamBody};
pub use columns::{detect_weekly_columns, WeeklyColumns};
pub use config::OcsConfig;
pub use error::OcsError;
pub use report::{derive_report, RawRow, ReportRecord, ReportResponse, ReportTotals};
pub use subscribers::SubscriberKpis;
