//! Terminal weekly report.
//!
//! Fetches the weekly package report for one account and prints the same
//! derived numbers the dashboard table shows: per-row weekly totals,
//! profit, margin, and a trailing TOTALS row. `--json` emits the derived
//! payload instead of a table, for piping into other tools.

use chrono::NaiveDate;
use clap::Parser;
use tabled::{settings::Style, Table, Tabled};

use ocs_dashboard::client::{OcsClient, UpstreamBody};
use ocs_dashboard::columns::detect_weekly_columns;
use ocs_dashboard::config::OcsConfig;
use ocs_dashboard::error::OcsError;
use ocs_dashboard::report::{derive_report, ReportRecord, ReportResponse, ReportTotals};

// Exit codes are part of the shell contract: scripts tell a timed-out
// upstream (4) from other upstream failures (1) and from usage or
// configuration errors (2, also what clap uses for bad flags).
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_TIMEOUT: i32 = 4;

#[derive(Debug, Parser)]
#[command(name = "ocs-report", about = "Weekly package report for one OCS account")]
struct Args {
    /// Account to report on.
    #[arg(long, env = "OCS_ACCOUNT_ID")]
    account_id: i64,

    /// Report window start (YYYY-MM-DD). Defaults to the configured
    /// OCS_DEFAULT_START_DATE.
    #[arg(long)]
    start_date: Option<String>,

    /// Print the derived report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = match OcsConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(EXIT_USAGE);
        }
    };
    std::process::exit(run(args, config).await);
}

/// Everything between argument parsing and the exit code. The environment
/// is read only in `main`; `run` works from the resolved configuration.
async fn run(args: Args, config: OcsConfig) -> i32 {
    let start_date = args
        .start_date
        .unwrap_or_else(|| config.default_start_date.clone());
    if !valid_start_date(&start_date) {
        eprintln!("error: start date {start_date:?} is not a YYYY-MM-DD date");
        return EXIT_USAGE;
    }

    let client = match OcsClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("error: {err}");
            return EXIT_ERROR;
        }
    };

    match client.fetch_report(args.account_id, &start_date).await {
        Ok(UpstreamBody::Json(value)) => {
            let report = derive_report(&value);
            if args.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(payload) => println!("{payload}"),
                    Err(err) => {
                        eprintln!("error: {err}");
                        return EXIT_ERROR;
                    }
                }
            } else {
                print_table(&report, args.account_id, &start_date);
            }
            0
        }
        Ok(UpstreamBody::Raw(text)) => {
            eprintln!("error: upstream returned a non-JSON body, shown below");
            println!("{text}");
            EXIT_ERROR
        }
        Err(err @ OcsError::Timeout { .. }) => {
            eprintln!("error: {err}");
            EXIT_TIMEOUT
        }
        Err(err) => {
            eprintln!("error: {err}");
            EXIT_ERROR
        }
    }
}

fn valid_start_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

fn print_table(report: &ReportResponse, account_id: i64, start_date: &str) {
    let weekly = detect_weekly_columns(&report.columns);
    println!(
        "Weekly package report for account {} since {} ({} rows, {} weekly cost columns)",
        account_id,
        start_date,
        report.rows.len(),
        weekly.cost.len(),
    );
    if report.rows.is_empty() {
        println!("report contains no rows");
        return;
    }

    let mut rows: Vec<DisplayRow> = report.rows.iter().map(DisplayRow::from_record).collect();
    rows.push(DisplayRow::totals(&report.totals));

    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
}

/// One rendered table row; every cell preformatted.
#[derive(Tabled)]
struct DisplayRow {
    #[tabled(rename = "Subscriber")]
    subscriber: String,
    #[tabled(rename = "ICCID")]
    iccid: String,
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "Activated")]
    activated: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Used (Pkg)")]
    used_pkg: String,
    #[tabled(rename = "Pkg Size")]
    pkg_size: String,
    #[tabled(rename = "Used (Weekly)")]
    used_weekly: String,
    #[tabled(rename = "Subscriber Cost")]
    subscriber_cost: String,
    #[tabled(rename = "Reseller (Weekly)")]
    reseller_weekly: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Margin")]
    margin: String,
    #[tabled(rename = "")]
    flag: String,
}

impl DisplayRow {
    fn from_record(record: &ReportRecord) -> Self {
        Self {
            subscriber: record.subscriber_id.clone(),
            iccid: record.iccid.clone(),
            template: record.template_name.clone(),
            activated: record.activation_date.clone(),
            expires: record.expiry_date.clone(),
            used_pkg: gb(record.used_data_byte),
            pkg_size: gb(record.pck_data_byte),
            used_weekly: gb(record.used_data_weekly_total_bytes),
            subscriber_cost: euro(record.subscriber_cost),
            reseller_weekly: euro(record.reseller_cost_weekly_total),
            profit: euro(record.profit),
            margin: pct(record.margin),
            flag: loss_flag(record.profit),
        }
    }

    fn totals(totals: &ReportTotals) -> Self {
        Self {
            subscriber: "TOTALS".to_string(),
            iccid: String::new(),
            template: String::new(),
            activated: String::new(),
            expires: String::new(),
            used_pkg: String::new(),
            pkg_size: String::new(),
            used_weekly: String::new(),
            subscriber_cost: euro(totals.subscriber_cost),
            reseller_weekly: euro(totals.reseller_cost_weekly_total),
            profit: euro(totals.profit),
            margin: pct(totals.avg_margin),
            flag: loss_flag(totals.profit),
        }
    }
}

fn euro(value: f64) -> String {
    format!("€{value:.2}")
}

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

fn gb(bytes: f64) -> String {
    format!("{:.2} GB", bytes / 1024_f64.powi(3))
}

fn loss_flag(profit: f64) -> String {
    if profit < 0.0 {
        "LOSS".to_string()
    } else {
        String::new()
    }
}
