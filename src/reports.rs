//! Local report discovery and file-backed rate tables
//!
//! The only module that touches the file system. It hands the core
//! already-materialized strings: earnings/sales feed texts grouped by their
//! embedded period token, and rate-table documents resolved by publication
//! id from a rates directory.

use crate::error::{ReportError, Result};
use crate::rates::quote::RateRecord;
use crate::rates::timeline::TableSource;
use crate::rates::TablePublication;
use std::fs;
use std::path::{Path, PathBuf};

/// The feed files discovered for one reporting period
#[derive(Debug, Clone, Default)]
pub struct ReportSet {
    /// `yyyyMM` period token extracted from the earnings file names
    pub period: String,
    /// Earnings feed texts, in file-name order
    pub earnings: Vec<String>,
    /// Sales feed texts, in file-name order
    pub sales: Vec<String>,
}

/// Scan a directory for report CSVs and load them
///
/// Earnings files are named `earnings_<yyyyMM>*.csv` or
/// `playapps_<yyyyMM>*.csv`; sales files `sales*<yyyyMM>*.csv` (the
/// `salesreport_` export name also matches). Other files are ignored, so the
/// rates directory can share the folder. Fails with `NotFound` when no
/// earnings file is present.
pub fn discover_reports(dir: &Path) -> Result<ReportSet> {
    let mut earnings_paths = Vec::new();
    let mut sales_paths = Vec::new();
    let mut period: Option<String> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_lowercase(),
            None => continue,
        };
        if !name.ends_with(".csv") {
            continue;
        }
        if name.starts_with("earnings") || name.starts_with("playapps") {
            if let Some(token) = period_token(&name) {
                match &period {
                    Some(existing) if *existing != token => {
                        log::warn!(
                            "report file {} carries period {} but {} was already seen",
                            name,
                            token,
                            existing
                        );
                    }
                    Some(_) => {}
                    None => period = Some(token),
                }
            }
            earnings_paths.push(path);
        } else if name.starts_with("sales") {
            sales_paths.push(path);
        } else {
            log::debug!("ignoring unrecognized file {}", name);
        }
    }
    if earnings_paths.is_empty() {
        return Err(ReportError::NotFound(format!(
            "no earnings report found in {}",
            dir.display()
        )));
    }
    earnings_paths.sort();
    sales_paths.sort();
    log::info!(
        "discovered {} earnings and {} sales report(s) in {}",
        earnings_paths.len(),
        sales_paths.len(),
        dir.display()
    );
    Ok(ReportSet {
        period: period.unwrap_or_default(),
        earnings: read_all(&earnings_paths)?,
        sales: read_all(&sales_paths)?,
    })
}

fn read_all(paths: &[PathBuf]) -> Result<Vec<String>> {
    paths.iter().map(|p| Ok(fs::read_to_string(p)?)).collect()
}

/// First run of exactly six digits in a file name, the `yyyyMM` period
fn period_token(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut start = None;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            if i - s == 6 {
                return Some(name[s..i].to_string());
            }
        }
    }
    match start {
        Some(s) if bytes.len() - s == 6 => Some(name[s..].to_string()),
        _ => None,
    }
}

/// Rate tables stored as files: a `dir.txt` directory listing plus one
/// `<publication id>.csv` document per publication
#[derive(Debug, Clone)]
pub struct DirTableSource {
    dir: PathBuf,
}

impl DirTableSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Raw text of the directory listing
    pub fn directory_text(&self) -> Result<String> {
        let path = self.dir.join("dir.txt");
        fs::read_to_string(&path).map_err(|e| {
            ReportError::NotFound(format!(
                "rate-table directory {} not readable: {}",
                path.display(),
                e
            ))
        })
    }
}

impl TableSource for DirTableSource {
    fn fetch(&self, publication: &TablePublication) -> Result<Vec<RateRecord>> {
        let path = self.dir.join(format!("{}.csv", publication.id));
        let text = fs::read_to_string(&path).map_err(|e| {
            ReportError::NotFound(format!(
                "rate-table document {} not readable: {}",
                path.display(),
                e
            ))
        })?;
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(RateRecord::parse_line)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{RateTimeline, TableFamily};
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_period_token() {
        assert_eq!(period_token("earnings_202401.csv").as_deref(), Some("202401"));
        assert_eq!(
            period_token("earnings_202401_1234567890123456-1.csv").as_deref(),
            Some("202401")
        );
        assert_eq!(period_token("playapps_202402.csv").as_deref(), Some("202402"));
        assert_eq!(period_token("earnings.csv"), None);
        // seven digits is not a period token
        assert_eq!(period_token("earnings_2024011.csv"), None);
    }

    #[test]
    fn test_discover_reports() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "earnings_202401.csv", "header\n");
        write_file(dir.path(), "salesreport_202401.csv", "header\n");
        write_file(dir.path(), "dir.txt", "a001z240102\n");
        write_file(dir.path(), "notes.txt", "ignore me\n");
        let reports = discover_reports(dir.path()).unwrap();
        assert_eq!(reports.period, "202401");
        assert_eq!(reports.earnings.len(), 1);
        assert_eq!(reports.sales.len(), 1);
    }

    #[test]
    fn test_discover_requires_earnings() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "salesreport_202401.csv", "header\n");
        let err = discover_reports(dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }

    #[test]
    fn test_dir_table_source() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "dir.txt", "a001z240102\nb001z240102\n");
        write_file(dir.path(), "a001z240102.csv", "EUR;1;4,30\nJPY;100;2,90\n");
        write_file(dir.path(), "b001z240102.csv", "XDR;1;5,40\n");
        let source = DirTableSource::new(dir.path());
        let publication = TablePublication {
            family: TableFamily::A,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            id: "a001z240102".to_string(),
        };
        let records = source.fetch(&publication).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].currency, "EUR");

        // end to end through the timeline
        let timeline = RateTimeline::from_directory(
            &source.directory_text().unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            &source,
        )
        .unwrap();
        let quote = timeline
            .quote(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(), "JPY")
            .unwrap();
        assert_eq!(quote.base_units(), 100);
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = DirTableSource::new(dir.path());
        let publication = TablePublication {
            family: TableFamily::B,
            effective_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            id: "b001z240102".to_string(),
        };
        assert!(matches!(
            source.fetch(&publication),
            Err(ReportError::NotFound(_))
        ));
    }
}
