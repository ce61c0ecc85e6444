//! Two-feed reconciliation
//!
//! Earnings rows become the ledger; sales rows are merged in by transaction
//! id through a one-time removal map. Any unexplained residue on either side
//! aborts the run: a consistency mismatch is fatal immediately, and ids left
//! unclaimed after all sales rows are consumed fail the closure check.

use crate::error::{ReportError, Result};
use crate::ledger::sale::SaleRecord;
use crate::ledger::schema::Row;
use crate::ledger::transaction::{Category, Transaction};
use crate::rates::RateTimeline;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use hashbrown::HashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Diagnostic sell/refund counters for one SKU
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkuActivity {
    pub sells: u32,
    pub refunds: u32,
}

/// The reconciled, date-sorted transaction collection for one period
#[derive(Debug, Clone)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    sku_activity: BTreeMap<String, SkuActivity>,
    tax_deduction: Decimal,
    total_payout: Decimal,
}

impl Ledger {
    /// Transactions sorted by date ascending (ties keep input order)
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Per-SKU sell/refund counts, informational only
    pub fn sku_activity(&self) -> &BTreeMap<String, SkuActivity> {
        &self.sku_activity
    }

    /// Sum of payout over id-less tax-deduction rows
    pub fn tax_deduction(&self) -> Decimal {
        self.tax_deduction
    }

    /// Sum of payout over every row
    pub fn total_payout(&self) -> Decimal {
        self.total_payout
    }

    /// First and last transaction dates; `None` for an empty ledger
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.transactions.first(), self.transactions.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    /// Enrich cross-currency transactions with the daily quote for their
    /// buyer currency
    ///
    /// Same-currency rows are left untouched; their conversion never
    /// consults the rate.
    pub fn apply_rates(&mut self, timeline: &RateTimeline) -> Result<()> {
        let mut enriched = 0usize;
        for transaction in &mut self.transactions {
            if transaction.is_cross_currency() {
                let quote = timeline.quote(transaction.date, &transaction.buyer_currency)?;
                transaction.apply_quote(&quote);
                enriched += 1;
            }
        }
        log::info!("enriched {} cross-currency transactions", enriched);
        Ok(())
    }
}

/// Merges earnings and sales feeds into a [`Ledger`]
#[derive(Debug, Clone)]
pub struct Reconciler {
    process_vat: bool,
}

impl Reconciler {
    /// `process_vat = false` disables sales-feed processing entirely
    pub fn new(process_vat: bool) -> Self {
        Self { process_vat }
    }

    /// Run the full reconciliation over already-loaded feed texts
    pub fn reconcile(&self, earnings_feeds: &[String], sales_feeds: &[String]) -> Result<Ledger> {
        let mut ledger = self.parse_earnings(earnings_feeds)?;
        // stable sort keeps input order inside a day
        ledger.transactions.sort_by_key(|t| t.date);
        if self.process_vat {
            self.merge_sales(&mut ledger, sales_feeds)?;
        }
        Ok(ledger)
    }

    fn parse_earnings(&self, feeds: &[String]) -> Result<Ledger> {
        let mut ledger = Ledger {
            transactions: Vec::new(),
            sku_activity: BTreeMap::new(),
            tax_deduction: Decimal::ZERO,
            total_payout: Decimal::ZERO,
        };
        let mut dropped = 0usize;
        for feed in feeds {
            let mut reader = ReaderBuilder::new()
                .flexible(true)
                .has_headers(true)
                .from_reader(feed.as_bytes());
            for (index, record) in reader.records().enumerate() {
                let record = record
                    .map_err(|e| ReportError::ParseError(format!("earnings feed: {}", e)))?;
                // +2 accounts for the header row and 1-based numbering
                let row = Row::new(&record, index as u64 + 2);
                let transaction = match Transaction::from_row(&row)? {
                    Some(transaction) => transaction,
                    None => {
                        dropped += 1;
                        continue;
                    }
                };
                ledger.total_payout += transaction.payout;
                if transaction.id.is_none() {
                    ledger.tax_deduction += transaction.payout;
                } else if let Some(sku) = &transaction.sku_id {
                    let activity = ledger.sku_activity.entry(sku.clone()).or_default();
                    match transaction.category {
                        Category::Charge => activity.sells += 1,
                        Category::Refund => activity.refunds += 1,
                        _ => {}
                    }
                }
                ledger.transactions.push(transaction);
            }
        }
        log::info!(
            "parsed {} transactions from {} earnings feed(s) ({} zero-payout rows dropped)",
            ledger.transactions.len(),
            feeds.len(),
            dropped
        );
        for (sku, activity) in &ledger.sku_activity {
            log::debug!(
                "sku {}: {} sells, {} refunds",
                sku,
                activity.sells,
                activity.refunds
            );
        }
        log::debug!(
            "total payout {}, international tax deduction {}",
            ledger.total_payout,
            -ledger.tax_deduction
        );
        Ok(ledger)
    }

    fn merge_sales(&self, ledger: &mut Ledger, feeds: &[String]) -> Result<()> {
        // one-time removal map: every id-bearing, non-tax transaction must be
        // claimed exactly once
        let mut pending: HashMap<String, usize> = HashMap::new();
        for (index, transaction) in ledger.transactions.iter().enumerate() {
            if transaction.category != Category::Tax {
                if let Some(id) = &transaction.id {
                    pending.insert(id.clone(), index);
                }
            }
        }
        let mut skipped = 0usize;
        for feed in feeds {
            let mut reader = ReaderBuilder::new()
                .flexible(true)
                .has_headers(true)
                .from_reader(feed.as_bytes());
            for (index, record) in reader.records().enumerate() {
                let record =
                    record.map_err(|e| ReportError::ParseError(format!("sales feed: {}", e)))?;
                let sale = SaleRecord::from_row(&Row::new(&record, index as u64 + 2))?;
                let slot = match pending.remove(&sale.id) {
                    Some(slot) => slot,
                    None => {
                        // sales are reported by charge date, so a sale can
                        // belong to the adjacent month's earnings feed
                        skipped += 1;
                        continue;
                    }
                };
                let transaction = &mut ledger.transactions[slot];
                check_sale(transaction, &sale)?;
                transaction.tax_amount = Some(sale.tax_collected);
            }
        }
        log::info!(
            "sales merge complete: {} rows skipped as adjacent-month sales",
            skipped
        );
        if !pending.is_empty() {
            let mut ids: Vec<&String> = pending.keys().collect();
            ids.sort();
            let sample: Vec<&str> = ids.iter().take(5).map(|id| id.as_str()).collect();
            return Err(ReportError::Unreconciled(format!(
                "{} transaction(s) not matched by any sales row, e.g. {}",
                pending.len(),
                sample.join(", ")
            )));
        }
        Ok(())
    }
}

fn check_sale(transaction: &Transaction, sale: &SaleRecord) -> Result<()> {
    if transaction.amount != sale.price {
        return Err(ReportError::Consistency(format!(
            "order {}: amount differs between feeds, earnings {} sales {}",
            sale.id, transaction.amount, sale.price
        )));
    }
    let currencies_match = transaction.buyer_currency == sale.buyer_currency;
    if !currencies_match {
        return Err(ReportError::Consistency(format!(
            "order {}: currency differs between feeds, earnings {} sales {}",
            sale.id, transaction.buyer_currency, sale.buyer_currency
        )));
    }
    if let (Some(earnings_country), Some(sales_country)) =
        (&transaction.buyer_country, &sale.buyer_country)
    {
        if earnings_country != sales_country {
            // tolerated while currencies agree, fatal once they diverge too
            if !currencies_match {
                return Err(ReportError::Consistency(format!(
                    "order {}: country and currency both differ between feeds, earnings {}/{} sales {}/{}",
                    sale.id,
                    earnings_country,
                    transaction.buyer_currency,
                    sales_country,
                    sale.buyer_currency
                )));
            }
            log::warn!(
                "order {}: country differs between feeds ({} vs {}), currencies agree",
                sale.id,
                earnings_country,
                sales_country
            );
        }
    }
    Ok(())
}
