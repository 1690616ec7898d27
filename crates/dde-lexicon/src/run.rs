//! The extraction run: keys in, stored records and tag reports out.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use dde_scrape::{Extraction, TagRegistry, extract, parse_document};
use dde_types::{StoredRecord, TagKind, expression_url};
use tracing::{info, warn};

use crate::keys::SkipList;
use crate::source::{PageSource, fetch_with_retries};
use crate::store::Store;
use crate::throttle::Throttle;

pub const DEFAULT_BASE_URL: &str = "https://rae.es/diccionario-estudiante/";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub base_url: String,
    pub max_retries: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub keys: usize,
    pub skipped: usize,
    pub already_stored: usize,
    pub entries: usize,
    pub expressions: usize,
    pub unresolved: usize,
}

/// Everything one run reads from and writes to.
pub struct Pipeline<'a> {
    pub source: &'a mut dyn PageSource,
    pub throttle: Throttle,
    pub store: Store,
    pub skip: SkipList,
    pub registry: TagRegistry,
    pub options: RunOptions,
}

impl Pipeline<'_> {
    /// Process `keys` in order. Keys on the skip list are not attempted and
    /// keys whose page URL is already stored are not fetched again.
    pub fn run(&mut self, keys: &[String]) -> Result<RunSummary> {
        let mut summary = RunSummary {
            keys: keys.len(),
            ..RunSummary::default()
        };
        for key in keys {
            if self.skip.contains(key) {
                summary.skipped += 1;
                continue;
            }
            let url = page_url(&self.options.base_url, key);
            if self.store.contains(&url) {
                summary.already_stored += 1;
                continue;
            }

            match self.process(key, &url) {
                Some(extraction) => {
                    let (entries, expressions) = self.persist(&url, extraction)?;
                    summary.entries += entries;
                    summary.expressions += expressions;
                }
                None => {
                    self.skip.insert(key.as_str());
                    summary.unresolved += 1;
                }
            }
        }
        info!(
            "{} keys: {} entries and {} expressions stored, \
             {} unresolved, {} skipped, {} already stored",
            summary.keys,
            summary.entries,
            summary.expressions,
            summary.unresolved,
            summary.skipped,
            summary.already_stored
        );
        Ok(summary)
    }

    /// Fetch and extract one page. `None` means the key cannot be processed.
    fn process(&mut self, key: &str, url: &str) -> Option<Extraction> {
        let markup = match fetch_with_retries(
            self.source,
            &mut self.throttle,
            key,
            url,
            self.options.max_retries,
        ) {
            Ok(markup) => markup,
            Err(err) => {
                warn!("skipping \"{key}\" @ {url}: {err}");
                return None;
            }
        };
        let extracted =
            parse_document(&markup).and_then(|doc| extract(&doc, key, &mut self.registry));
        match extracted {
            Ok(extraction) => Some(extraction),
            Err(err) => {
                warn!("skipping \"{key}\" @ {url}: {err}");
                None
            }
        }
    }

    fn persist(&mut self, url: &str, extraction: Extraction) -> Result<(usize, usize)> {
        if extraction.is_empty() {
            info!("nothing to store for {url}");
        }
        let timestamp = Local::now().to_rfc3339();
        let mut entries = 0;
        let mut expressions = 0;
        if let Some(entry) = extraction.entry {
            let record = StoredRecord::entry(url, entry, timestamp.as_str());
            if self.store.append(&record)? {
                info!("{} \"{}\" @ {url} stored", record.kind, record.word);
                entries += 1;
            }
        }
        for (position, expression) in (1..).zip(extraction.expressions) {
            if expression.id.as_deref().is_none_or(str::is_empty) {
                warn!(
                    "\"{}\" @ {url} has no anchor, using position {position}",
                    expression.headword
                );
            }
            let expr_url = expression_url(url, &expression.anchor(position));
            let record = StoredRecord::expression(expr_url, expression, timestamp.as_str());
            if self.store.append(&record)? {
                info!("{} \"{}\" @ {} stored", record.kind, record.word, record.url);
                expressions += 1;
            }
        }
        Ok((entries, expressions))
    }

    /// Rewrite the skip list and write one CSV per tag kind into `dir`.
    pub fn finish(&self, tags_dir: &Path) -> Result<()> {
        self.skip.save()?;
        write_tag_reports(&self.registry, tags_dir)
    }
}

/// Page URL for `key` under `base_url`.
pub fn page_url(base_url: &str, key: &str) -> String {
    format!("{}/{key}", base_url.trim_end_matches('/'))
}

pub fn write_tag_reports(registry: &TagRegistry, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    for kind in TagKind::ALL {
        let path = dir.join(format!("{}.csv", kind.report_stem()));
        let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
        registry
            .write_csv(kind, BufWriter::new(file))
            .with_context(|| format!("write {}", path.display()))?;
        info!("{} {kind} tags written to {}", registry.len(kind), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_urls_have_one_separator() {
        assert_eq!(
            page_url(DEFAULT_BASE_URL, "ir"),
            "https://rae.es/diccionario-estudiante/ir"
        );
        assert_eq!(page_url("https://example/diccionario", "ir"), "https://example/diccionario/ir");
    }
}
