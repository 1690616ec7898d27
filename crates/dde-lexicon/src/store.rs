//! Append-only JSONL record store keyed by URL.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dde_types::StoredRecord;
use tracing::{info, warn};

/// One record per line. URLs already present are never written again, so a
/// re-run over the same keys leaves the file unchanged.
pub struct Store {
    path: PathBuf,
    writer: BufWriter<File>,
    urls: HashSet<String>,
}

impl Store {
    /// Open (or create) the store and load the URLs it already holds.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let urls: HashSet<String> = read_records(&path)?
            .into_iter()
            .map(|record| record.url)
            .collect();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open store {}", path.display()))?;
        info!("store {} holds {} records", path.display(), urls.len());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            urls,
        })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Append `record` unless its URL is already stored. Returns whether it was written.
    pub fn append(&mut self, record: &StoredRecord) -> Result<bool> {
        if self.urls.contains(&record.url) {
            return Ok(false);
        }
        let line = serde_json::to_string(record)
            .with_context(|| format!("encode record {}", record.url))?;
        writeln!(self.writer, "{line}")
            .and_then(|_| self.writer.flush())
            .with_context(|| format!("write {}", self.path.display()))?;
        self.urls.insert(record.url.clone());
        Ok(true)
    }
}

/// Read every decodable record. A missing file is an empty store.
///
/// Lines that are not JSON are skipped with a warning.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<StoredRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredRecord>(&line) {
            Ok(record) => records.push(record),
            Err(err) => warn!("{}:{}: skipping undecodable record: {err}", path.display(), idx + 1),
        }
    }
    Ok(records)
}
