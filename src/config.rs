//! Report run configuration
//!
//! Loaded from a TOML file by the CLI and threaded into the pipeline; every
//! key is optional and falls back to the defaults below.

use crate::error::{ReportError, Result};
use crate::ledger::digest::EU_CURRENCIES;
use serde::{Deserialize, Serialize};

/// Settings for one report-generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Merge sales-feed VAT data into the ledger
    #[serde(default = "default_true")]
    pub process_vat: bool,

    /// Resolve historical FX rates and enrich cross-currency transactions
    #[serde(default = "default_true")]
    pub apply_rates: bool,

    /// Include the per-currency VAT rollup in the rendered report
    #[serde(default = "default_true")]
    pub vat_rollup: bool,

    /// Include the monthly digest in the rendered report
    #[serde(default = "default_true")]
    pub summary: bool,

    /// Override for the EU currency set used by the digest
    #[serde(default)]
    pub eu_currencies: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            process_vat: true,
            apply_rates: true,
            vat_rollup: true,
            summary: true,
            eu_currencies: None,
        }
    }
}

impl ReportConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| ReportError::ConfigError(format!("invalid configuration: {}", e)))
    }

    /// EU currency set in effect: the configured override, uppercased, or the
    /// built-in default
    pub fn eu_currency_set(&self) -> Vec<String> {
        match &self.eu_currencies {
            Some(list) => list.iter().map(|c| c.trim().to_uppercase()).collect(),
            None => EU_CURRENCIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}
