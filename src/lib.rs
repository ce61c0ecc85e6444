//! # payout-recon
//!
//! Reconciles a per-transaction earnings feed with a per-sale tax feed into a
//! single monthly ledger, enriches cross-currency entries with historical FX
//! rates resolved by effective date, and aggregates the result into a
//! day × currency pivot with exact-decimal running totals.
//!
//! ## Example
//!
//! ```rust,no_run
//! use payout_recon::prelude::*;
//!
//! # fn run(earnings: Vec<String>, sales: Vec<String>, directory: String,
//! #        source: InMemoryTableSource) -> payout_recon::error::Result<()> {
//! let mut ledger = Reconciler::new(true).reconcile(&earnings, &sales)?;
//! if let Some((from, to)) = ledger.date_span() {
//!     let timeline = RateTimeline::from_directory(&directory, from, to, &source)?;
//!     ledger.apply_rates(&timeline)?;
//! }
//! let pivot = MonthlyPivot::new(ledger.transactions())?;
//! println!("grand total payout: {}", pivot.grand_summary().total_payout);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod pivot;
pub mod rates;
pub mod reports;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::ReportConfig;
    pub use crate::error::{ReportError, Result};
    pub use crate::ledger::{
        AmountPrecision, Category, Ledger, LedgerDigest, Reconciler, SaleRecord, Transaction,
        VatRollup,
    };
    pub use crate::pivot::{MonthlyPivot, Summary};
    pub use crate::rates::{
        InMemoryTableSource, Quote, RateTimeline, TableFamily, TablePublication, TableSource,
    };
    pub use crate::reports::{discover_reports, DirTableSource, ReportSet};
}
