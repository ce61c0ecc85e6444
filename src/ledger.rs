//! Ledger reconciliation
//!
//! Parses the earnings feed into transactions, merges sales-feed VAT data in
//! by transaction id, enriches cross-currency rows from the rate timeline,
//! and exposes the digest/rollup post-passes the report pages consume.
//!
//! # Components
//!
//! - **schema**: declarative CSV column specs and pure field parsers
//! - **transaction**: the ledger record and its derived values
//! - **sale**: the sales-feed record
//! - **reconcile**: the two-feed merge and its consistency checks
//! - **digest**: monthly roll-up, VAT rollup, and display-precision post-passes

pub mod digest;
pub mod reconcile;
pub mod sale;
pub mod schema;
pub mod transaction;

pub use digest::{precision_by_currency, AmountPrecision, LedgerDigest, VatRollup};
pub use reconcile::{Ledger, Reconciler, SkuActivity};
pub use sale::SaleRecord;
pub use transaction::{Category, Transaction};
