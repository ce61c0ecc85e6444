//! Rate timeline construction and lookup
//!
//! Materializes one rate-table snapshot per calendar day of a range. Days
//! between publications share the same `Arc<RateTable>` instance; a new map
//! is only allocated on a day where a family's next publication becomes
//! effective, so consumers never observe a partial cross-family update.

use crate::error::{ReportError, Result};
use crate::rates::directory::{parse_directory, DirectoryPlan, TableFamily, TablePublication};
use crate::rates::quote::{Quote, RateRecord, RateTable};
use chrono::NaiveDate;
use hashbrown::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Resolves a publication to its rate-table document
///
/// The timeline itself never performs IO; callers supply an implementation
/// (in-memory below, file-backed in the reports collaborator).
pub trait TableSource {
    fn fetch(&self, publication: &TablePublication) -> Result<Vec<RateRecord>>;
}

/// Table source backed by a map of pre-loaded documents, keyed by
/// publication id
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableSource {
    documents: HashMap<String, Vec<RateRecord>>,
}

impl InMemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under a publication id
    pub fn insert(&mut self, id: &str, records: Vec<RateRecord>) {
        self.documents.insert(id.to_string(), records);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl TableSource for InMemoryTableSource {
    fn fetch(&self, publication: &TablePublication) -> Result<Vec<RateRecord>> {
        self.documents
            .get(&publication.id)
            .cloned()
            .ok_or_else(|| {
                ReportError::NotFound(format!("rate-table document {} not loaded", publication.id))
            })
    }
}

/// Per-day currency→quote tables for an inclusive date range
#[derive(Debug, Clone)]
pub struct RateTimeline {
    from: NaiveDate,
    to: NaiveDate,
    days: Vec<Arc<RateTable>>,
}

impl RateTimeline {
    /// Build the timeline from an already-parsed publication list
    ///
    /// At most one pending publication per family is applied per day, even
    /// when several are due; this mirrors the publication cadence the feed
    /// guarantees in practice.
    pub fn build(
        publications: &[TablePublication],
        from: NaiveDate,
        to: NaiveDate,
        source: &dyn TableSource,
    ) -> Result<Self> {
        if from > to {
            return Err(ReportError::InvalidRange(format!(
                "timeline range {} - {} is inverted",
                from, to
            )));
        }
        let day_count = (to - from).num_days() as usize + 1;
        log::info!("building rate timeline for {} - {} ({} days)", from, to, day_count);
        let mut plan = DirectoryPlan::for_range(publications, from, to)?;

        // initial table: one publication per family, in effect at `from`
        let mut current = RateTable::new();
        for family in [TableFamily::A, TableFamily::B] {
            let publication = plan.family(family).pop_front().ok_or_else(|| {
                ReportError::NotFound(format!(
                    "no table-{} publication effective at or before {}",
                    family, from
                ))
            })?;
            apply_publication(&mut current, &publication, source)?;
        }
        let mut current = Arc::new(current);

        let mut days = Vec::with_capacity(day_count);
        days.push(Arc::clone(&current));
        let mut day = from;
        while day < to {
            day = day.succ_opt().ok_or_else(|| {
                ReportError::InvalidRange(format!("timeline range end {} out of bounds", to))
            })?;
            if pending_for(&plan.table_a, day) || pending_for(&plan.table_b, day) {
                let mut next = (*current).clone();
                for family in [TableFamily::A, TableFamily::B] {
                    let queue = plan.family(family);
                    if pending_for(queue, day) {
                        if let Some(publication) = queue.pop_front() {
                            apply_publication(&mut next, &publication, source)?;
                        }
                    }
                }
                current = Arc::new(next);
            }
            days.push(Arc::clone(&current));
        }
        Ok(Self { from, to, days })
    }

    /// Build from raw directory text
    pub fn from_directory(
        directory: &str,
        from: NaiveDate,
        to: NaiveDate,
        source: &dyn TableSource,
    ) -> Result<Self> {
        let publications = parse_directory(directory);
        Self::build(&publications, from, to, source)
    }

    /// First day of the range
    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the range (inclusive)
    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    /// The quote for a currency on a day
    pub fn quote(&self, date: NaiveDate, currency: &str) -> Result<Quote> {
        let code = currency.trim().to_uppercase();
        self.table(date)?.get(&code).cloned().ok_or_else(|| {
            ReportError::NotFound(format!("no quote for {} on {}", code, date))
        })
    }

    /// The whole-day table snapshot, shared across days it is valid for
    pub fn table(&self, date: NaiveDate) -> Result<&Arc<RateTable>> {
        if date < self.from || date > self.to {
            return Err(ReportError::NotFound(format!(
                "date {} outside timeline range {} - {}",
                date, self.from, self.to
            )));
        }
        let index = (date - self.from).num_days() as usize;
        Ok(&self.days[index])
    }
}

fn pending_for(queue: &VecDeque<TablePublication>, day: NaiveDate) -> bool {
    queue
        .front()
        .map(|p| p.effective_date <= day)
        .unwrap_or(false)
}

fn apply_publication(
    table: &mut RateTable,
    publication: &TablePublication,
    source: &dyn TableSource,
) -> Result<()> {
    let records = source.fetch(publication)?;
    log::debug!(
        "applying table-{} publication {} ({} records)",
        publication.family,
        publication.id,
        records.len()
    );
    for record in &records {
        let quote = Quote::from_record(record)?;
        table.insert(quote.currency().to_string(), quote);
    }
    Ok(())
}
