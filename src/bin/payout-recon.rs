//! payout-recon CLI - monthly payout report generation
//!
//! Discovers report CSVs in a local directory, reconciles the earnings and
//! sales feeds, resolves historical FX rates from a local rates directory,
//! and prints (or exports) the monthly digest, VAT rollup, pivot table and
//! day rate sheet.
//!
//! ## Example Usage
//!
//! ```bash
//! # Full text report from ./reports, rates alongside the feeds
//! payout-recon --reports-dir reports
//!
//! # Skip sales/VAT processing, export the pivot as CSV
//! payout-recon --reports-dir reports --no-vat --format csv --output pivot.csv
//! ```

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use payout_recon::config::ReportConfig;
use payout_recon::ledger::{
    precision_by_currency, AmountPrecision, Ledger, LedgerDigest, Reconciler, VatRollup,
};
use payout_recon::pivot::{MonthlyPivot, Summary};
use payout_recon::rates::RateTimeline;
use payout_recon::reports::{discover_reports, DirTableSource};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process;

/// payout-recon: monthly payout ledger reconciliation and pivot reporting
#[derive(Parser)]
#[command(name = "payout-recon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Monthly payout report reconciliation", long_about = None)]
struct Cli {
    /// Enable verbose debug messages
    #[arg(short, long)]
    verbose: bool,

    /// Directory containing the earnings/sales report CSVs
    #[arg(short = 'L', long, value_name = "DIR")]
    reports_dir: PathBuf,

    /// Directory containing dir.txt and the rate-table documents
    /// (defaults to the reports directory)
    #[arg(long, value_name = "DIR")]
    rates_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'C', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable VAT data processing (sales reports will not be used)
    #[arg(long)]
    no_vat: bool,

    /// Disable FX rate resolution and enrichment
    #[arg(long)]
    no_rates: bool,

    /// Omit the per-currency VAT rollup from the output
    #[arg(long)]
    no_vat_rollup: bool,

    /// Omit the monthly digest from the output
    #[arg(long)]
    no_summary: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable report
    Text,
    /// Pivot table as CSV
    Csv,
    /// Whole report as JSON
    Json,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();
    if let Err(err) = run(&cli) {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    let reports = discover_reports(&cli.reports_dir)
        .with_context(|| format!("discovering reports in {}", cli.reports_dir.display()))?;
    let mut ledger = Reconciler::new(config.process_vat)
        .reconcile(&reports.earnings, &reports.sales)
        .context("reconciling report feeds")?;

    let timeline = if config.apply_rates {
        let (from, to) = ledger
            .date_span()
            .ok_or_else(|| anyhow::anyhow!("report contains no transactions"))?;
        let rates_dir = cli.rates_dir.as_ref().unwrap_or(&cli.reports_dir);
        let source = DirTableSource::new(rates_dir);
        let timeline =
            RateTimeline::from_directory(&source.directory_text()?, from, to, &source)
                .context("building rate timeline")?;
        ledger.apply_rates(&timeline).context("enriching ledger")?;
        Some(timeline)
    } else {
        None
    };

    let pivot = MonthlyPivot::new(ledger.transactions()).context("building pivot")?;
    let eu_currencies = config.eu_currency_set();
    let digest = LedgerDigest::compute(&ledger, &eu_currencies, config.process_vat);
    let rollup = VatRollup::compute(&ledger, &eu_currencies);

    let rendered = match cli.format {
        Format::Text => render_text(&config, &ledger, &pivot, &digest, &rollup, timeline.as_ref()),
        Format::Csv => render_pivot_csv(&pivot)?,
        Format::Json => render_json(&pivot, &digest, &rollup)?,
    };
    match &cli.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing output file {}", path.display()))?,
        None => print!("{}", rendered),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ReportConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading configuration {}", path.display()))?;
            ReportConfig::from_toml(&text)?
        }
        None => match fs::read_to_string("payout-recon.toml") {
            Ok(text) => ReportConfig::from_toml(&text)?,
            Err(_) => ReportConfig::default(),
        },
    };
    // CLI switches override file values
    if cli.no_vat {
        config.process_vat = false;
    }
    if cli.no_rates {
        config.apply_rates = false;
    }
    if cli.no_vat_rollup {
        config.vat_rollup = false;
    }
    if cli.no_summary {
        config.summary = false;
    }
    Ok(config)
}

fn render_text(
    config: &ReportConfig,
    ledger: &Ledger,
    pivot: &MonthlyPivot,
    digest: &LedgerDigest,
    rollup: &VatRollup,
    timeline: Option<&RateTimeline>,
) -> String {
    let mut out = String::new();
    let title = format!("Payout report {}-{:02}", pivot.year(), pivot.month());
    out.push_str(&format!("{}\n\n", title.bold()));

    if config.summary {
        out.push_str(&format!("{}\n", "Summary".bold().underline()));
        out.push_str(&format!("  Total payout:          {}\n", digest.total_payout));
        out.push_str(&format!("  Payout from EU:        {}\n", digest.eu_payout));
        if config.process_vat {
            out.push_str(&format!("  Collected VAT:         {}\n", digest.vat_converted));
        }
        out.push_str(&format!("  FX difference:         {}\n", digest.fx_difference));
        out.push_str(&format!(
            "  International taxes:   {}\n\n",
            digest.international_taxes()
        ));
    }

    if config.process_vat && config.vat_rollup {
        out.push_str(&format!("{}\n", "VAT by currency".bold().underline()));
        for (currency, entry) in rollup.entries() {
            out.push_str(&format!(
                "  {}  collected {:>12}  converted {:>12}\n",
                currency, entry.collected, entry.converted
            ));
        }
        out.push_str(&format!(
            "  total converted: {}\n\n",
            rollup.total_converted()
        ));
    }

    let precision = precision_by_currency(ledger);
    out.push_str(&format!("{}\n", "Pivot".bold().underline()));
    out.push_str("date        currency        total       payout    converted\n");
    for day in pivot.days() {
        for currency in pivot.currencies() {
            // lookups cannot fail for the pivot's own days and currencies
            if let Ok(cell) = pivot.day_currency_summary(day, currency) {
                if *cell == Summary::default() {
                    continue;
                }
                let total = match precision.get(currency).copied() {
                    Some(AmountPrecision::Whole) => cell.total.round_dp(0).to_string(),
                    _ => cell.total.to_string(),
                };
                out.push_str(&format!(
                    "{}  {:<8} {:>12} {:>12} {:>12}\n",
                    day, currency, total, cell.total_payout, cell.total_converted
                ));
            }
        }
    }
    let grand = pivot.grand_summary();
    out.push_str(&format!(
        "{:<22} {:>12} {:>12} {:>12}\n\n",
        "grand total".bold(),
        grand.total,
        grand.total_payout,
        grand.total_converted
    ));

    if let Some(timeline) = timeline {
        out.push_str(&format!("{}\n", "Rates".bold().underline()));
        for currency in pivot.currencies() {
            for day in pivot.days() {
                if let Ok(quote) = timeline.quote(day, currency) {
                    out.push_str(&format!(
                        "{}  {:<8} {:>6} units = {}\n",
                        day,
                        currency,
                        quote.base_units(),
                        quote.rate()
                    ));
                    break; // first resolvable day is enough for the sheet
                }
            }
        }
        out.push('\n');
    }

    for (sku, activity) in ledger.sku_activity() {
        log::debug!("{}: {} sells, {} refunds", sku, activity.sells, activity.refunds);
    }
    out
}

fn render_pivot_csv(pivot: &MonthlyPivot) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["date".to_string()];
    for currency in pivot.currencies() {
        header.push(currency.clone());
    }
    header.push("payout".to_string());
    header.push("converted".to_string());
    writer.write_record(&header)?;
    for day in pivot.days() {
        let mut record = vec![day.to_string()];
        for currency in pivot.currencies() {
            let cell = pivot
                .day_currency_summary(day, currency)
                .map(|c| c.total.to_string())
                .unwrap_or_default();
            record.push(cell);
        }
        let summary = pivot.day_summary(day)?;
        record.push(summary.total_payout.to_string());
        record.push(summary.total_converted.to_string());
        writer.write_record(&record)?;
    }
    let mut totals = vec!["total".to_string()];
    for currency in pivot.currencies() {
        let summary = pivot.currency_summary(currency)?;
        totals.push(summary.total.to_string());
    }
    let grand = pivot.grand_summary();
    totals.push(grand.total_payout.to_string());
    totals.push(grand.total_converted.to_string());
    writer.write_record(&totals)?;
    let bytes = writer.into_inner().context("flushing pivot CSV")?;
    String::from_utf8(bytes).context("pivot CSV is not valid UTF-8")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    year: i32,
    month: u32,
    digest: &'a LedgerDigest,
    vat: &'a VatRollup,
    days: Vec<JsonDay<'a>>,
    currencies: Vec<JsonCurrency<'a>>,
    grand: &'a Summary,
}

#[derive(Serialize)]
struct JsonDay<'a> {
    date: NaiveDate,
    summary: &'a Summary,
}

#[derive(Serialize)]
struct JsonCurrency<'a> {
    currency: &'a str,
    summary: &'a Summary,
}

fn render_json(
    pivot: &MonthlyPivot,
    digest: &LedgerDigest,
    rollup: &VatRollup,
) -> anyhow::Result<String> {
    let mut days = Vec::new();
    for date in pivot.days() {
        days.push(JsonDay {
            date,
            summary: pivot.day_summary(date)?,
        });
    }
    let mut currencies = Vec::new();
    for currency in pivot.currencies() {
        currencies.push(JsonCurrency {
            currency,
            summary: pivot.currency_summary(currency)?,
        });
    }
    let report = JsonReport {
        year: pivot.year(),
        month: pivot.month(),
        digest,
        vat: rollup,
        days,
        currencies,
        grand: pivot.grand_summary(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
