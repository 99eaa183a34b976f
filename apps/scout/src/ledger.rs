//! Dedup ledger: the master CSV of every job ever recorded, plus the latest-run CSV.
//!
//! The master file is append-only across runs and is the source of truth for
//! "already seen". The latest-run file is truncated at startup. Both are opened,
//! appended and closed on every write; no handle outlives a single call.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::models::{JobRecord, LEDGER_HEADERS};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LedgerError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        LedgerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        LedgerError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LedgerIdRow {
    #[serde(rename = "Job ID")]
    job_id: String,
}

/// In-memory view of every job id seen so far, backed by the two CSV logs.
#[derive(Debug)]
pub struct Ledger {
    master_path: PathBuf,
    latest_path: PathBuf,
    seen: HashSet<String>,
}

impl Ledger {
    /// Loads prior ids from the master log (creating it if absent) and resets the
    /// latest-run log.
    pub fn open(
        master_path: impl Into<PathBuf>,
        latest_path: impl Into<PathBuf>,
    ) -> Result<Self, LedgerError> {
        let master_path = master_path.into();
        let latest_path = latest_path.into();

        let seen = if master_path.exists() {
            read_ids(&master_path)?
        } else {
            write_header(&master_path)?;
            HashSet::new()
        };
        write_header(&latest_path)?;

        info!(
            "Ledger loaded {} known job ids from {}",
            seen.len(),
            master_path.display()
        );

        Ok(Self {
            master_path,
            latest_path,
            seen,
        })
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.seen.contains(job_id)
    }

    /// Marks an id as seen. Adding an id twice is a no-op.
    pub fn add(&mut self, job_id: &str) {
        if !self.seen.contains(job_id) {
            self.seen.insert(job_id.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Appends one row to the master log and one to the latest-run log.
    pub fn append_record(&self, record: &JobRecord) -> Result<(), LedgerError> {
        append_row(&self.master_path, record)?;
        append_row(&self.latest_path, record)
    }

    pub fn master_path(&self) -> &Path {
        &self.master_path
    }

    pub fn latest_path(&self) -> &Path {
        &self.latest_path
    }
}

fn read_ids(path: &Path) -> Result<HashSet<String>, LedgerError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LedgerError::csv(path, e))?;

    let mut ids = HashSet::new();
    for row in reader.deserialize::<LedgerIdRow>() {
        let row = row.map_err(|e| LedgerError::csv(path, e))?;
        if !row.job_id.is_empty() {
            ids.insert(row.job_id);
        }
    }
    Ok(ids)
}

/// Creates (or truncates) `path` with just the header row.
fn write_header(path: &Path) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| LedgerError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(LEDGER_HEADERS)
        .map_err(|e| LedgerError::csv(path, e))?;
    writer.flush().map_err(|e| LedgerError::io(path, e))
}

fn append_row(path: &Path, record: &JobRecord) -> Result<(), LedgerError> {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| LedgerError::io(path, e))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer
        .serialize(record)
        .map_err(|e| LedgerError::csv(path, e))?;
    writer.flush().map_err(|e| LedgerError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(job_id: &str) -> JobRecord {
        JobRecord {
            title: "Rust Engineer".to_string(),
            company: "Ferris Inc".to_string(),
            location: "Remote".to_string(),
            description: "Build things,\nwith \"quotes\"".to_string(),
            posting_date: "2024-06-07".to_string(),
            apply_link: "https://board.test/apply".to_string(),
            listing_url: format!("https://board.test/viewjob?jk={job_id}"),
            job_id: job_id.to_string(),
            date_recorded: "2024-06-10 09:30:00".to_string(),
            internal_apply: true,
            resume_path: None,
            suitability: "No".to_string(),
        }
    }

    fn rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_open_creates_both_logs_with_headers() {
        let dir = TempDir::new().unwrap();
        let master = dir.path().join("master.csv");
        let latest = dir.path().join("latest.csv");

        let ledger = Ledger::open(&master, &latest).unwrap();
        assert!(ledger.is_empty());

        for path in [&master, &latest] {
            let mut reader = csv::Reader::from_path(path).unwrap();
            let headers = reader.headers().unwrap().clone();
            assert_eq!(headers.iter().collect::<Vec<_>>(), LEDGER_HEADERS.to_vec());
            assert!(rows(path).is_empty());
        }
    }

    #[test]
    fn test_reopen_loads_prior_ids_and_truncates_latest() {
        let dir = TempDir::new().unwrap();
        let master = dir.path().join("master.csv");
        let latest = dir.path().join("latest.csv");

        let mut first = Ledger::open(&master, &latest).unwrap();
        first.append_record(&record("a1")).unwrap();
        first.add("a1");
        first.append_record(&record("b2")).unwrap();
        first.add("b2");

        let second = Ledger::open(&master, &latest).unwrap();
        assert!(second.contains("a1"));
        assert!(second.contains("b2"));
        assert!(!second.contains("c3"));
        assert_eq!(second.len(), 2);
        assert_eq!(rows(&master).len(), 2);
        assert!(rows(&latest).is_empty());
    }

    #[test]
    fn test_append_writes_identical_rows_to_both_logs() {
        let dir = TempDir::new().unwrap();
        let master = dir.path().join("master.csv");
        let latest = dir.path().join("latest.csv");
        let ledger = Ledger::open(&master, &latest).unwrap();

        let mut suitable = record("z9");
        suitable.suitability = "Yes".to_string();
        suitable.internal_apply = false;
        suitable.resume_path = Some("resumes/Rust Engineer - z9.docx".to_string());
        ledger.append_record(&suitable).unwrap();

        let master_rows = rows(&master);
        let latest_rows = rows(&latest);
        assert_eq!(master_rows, latest_rows);
        assert_eq!(master_rows.len(), 1);

        let row = &master_rows[0];
        assert_eq!(&row[3], "Build things,\nwith \"quotes\"");
        assert_eq!(&row[7], "z9");
        assert_eq!(&row[9], "No");
        assert_eq!(&row[10], "resumes/Rust Engineer - z9.docx");
        assert_eq!(&row[11], "Yes");
    }

    #[test]
    fn test_missing_resume_path_is_empty_cell() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(dir.path().join("m.csv"), dir.path().join("l.csv")).unwrap();
        ledger.append_record(&record("q1")).unwrap();

        let row = &rows(ledger.master_path())[0];
        assert_eq!(&row[9], "Yes");
        assert_eq!(&row[10], "");
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut ledger =
            Ledger::open(dir.path().join("m.csv"), dir.path().join("l.csv")).unwrap();
        ledger.add("x");
        ledger.add("x");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_unwritable_master_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory where a file is expected cannot be opened for writing.
        let master = dir.path().join("taken");
        std::fs::create_dir(&master).unwrap();
        let err = Ledger::open(&master, dir.path().join("l.csv")).unwrap_err();
        assert!(matches!(err, LedgerError::Csv { .. } | LedgerError::Io { .. }));
    }
}
