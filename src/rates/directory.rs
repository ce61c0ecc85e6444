//! Table-publication directory parsing and range filtering
//!
//! The directory feed is a list of publication identifiers, one per line.
//! A valid line starts with the family letter (`a` or `b`) and carries the
//! effective date as a 6-digit `yyMMdd` suffix after a `z` separator, e.g.
//! `a012z240115`. Anything else is ignored.

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One of the two independent rate-publication schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableFamily {
    A,
    B,
}

impl TableFamily {
    /// Map a directory-line prefix to a family; unknown letters are not a
    /// family (the line is ignored by the directory parser)
    pub fn from_prefix(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(TableFamily::A),
            'b' => Some(TableFamily::B),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableFamily::A => "A",
            TableFamily::B => "B",
        }
    }
}

impl std::fmt::Display for TableFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dated rate-table publication, ordered by effective date within its family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePublication {
    pub family: TableFamily,
    pub effective_date: NaiveDate,
    /// Opaque identifier used to fetch the publication's document
    pub id: String,
}

/// Parse a directory feed into publications, in input order
///
/// Lines that do not match the `<family>...z<yyMMdd>` shape are skipped.
pub fn parse_directory(text: &str) -> Vec<TablePublication> {
    let mut publications = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let family = match line.chars().next().and_then(TableFamily::from_prefix) {
            Some(family) => family,
            None => continue,
        };
        let date_text = match line.find('z') {
            Some(pos) => &line[pos + 1..],
            None => continue,
        };
        let effective_date = match NaiveDate::parse_from_str(date_text, "%y%m%d") {
            Ok(date) => date,
            Err(_) => continue,
        };
        publications.push(TablePublication {
            family,
            effective_date,
            id: line.to_string(),
        });
    }
    publications
}

/// Per-family publication queues relevant to one target range
#[derive(Debug, Clone)]
pub struct DirectoryPlan {
    pub table_a: VecDeque<TablePublication>,
    pub table_b: VecDeque<TablePublication>,
}

impl DirectoryPlan {
    /// Filter a parsed directory down to the publications a range needs
    ///
    /// For each family independently: publications effective after `to` are
    /// dropped; among those strictly before `from` only the most recent
    /// survives (the table in effect when the range opens); everything
    /// effective inside `[from, to]` is kept in order.
    pub fn for_range(
        publications: &[TablePublication],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Self> {
        let mut table_a = VecDeque::new();
        let mut table_b = VecDeque::new();
        for publication in publications {
            let queue = match publication.family {
                TableFamily::A => &mut table_a,
                TableFamily::B => &mut table_b,
            };
            if publication.effective_date < from {
                // only the latest pre-range publication matters
                if !queue.is_empty() {
                    queue.pop_front();
                }
                queue.push_front(publication.clone());
            } else if publication.effective_date <= to {
                queue.push_back(publication.clone());
            }
        }
        log::debug!(
            "directory filtered for {}..{}: {} A publications, {} B publications",
            from,
            to,
            table_a.len(),
            table_b.len()
        );
        Ok(Self { table_a, table_b })
    }

    /// Queue for one family
    pub fn family(&mut self, family: TableFamily) -> &mut VecDeque<TablePublication> {
        match family {
            TableFamily::A => &mut self.table_a,
            TableFamily::B => &mut self.table_b,
        }
    }
}
