//! Where page markup comes from, and the sequential retry loop around it.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

use crate::throttle::Throttle;

/// Supplies the markup for one lookup key. An empty string means the
/// source returned nothing this time and the attempt may be retried.
pub trait PageSource {
    fn fetch(&mut self, key: &str, url: &str) -> Result<String>;
}

/// Saved pages on disk, one `<key>.html` per lookup key.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PageSource for DirectorySource {
    fn fetch(&mut self, key: &str, _url: &str) -> Result<String> {
        let path = self.dir.join(format!("{key}.html"));
        match fs::read_to_string(&path) {
            Ok(markup) => Ok(markup),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no saved page at {}", path.display());
                Ok(String::new())
            }
            Err(err) => Err(err).with_context(|| format!("read page {}", path.display())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("no content after {attempts} attempts")]
    Empty { attempts: u32 },
}

/// Fetch `url`, retrying empty responses up to `max_retries` attempts.
///
/// Each attempt waits for the throttle first. Source errors are logged and
/// count as an empty attempt.
pub fn fetch_with_retries(
    source: &mut dyn PageSource,
    throttle: &mut Throttle,
    key: &str,
    url: &str,
    max_retries: u32,
) -> Result<String, FetchError> {
    let attempts = max_retries.max(1);
    for attempt in 1..=attempts {
        throttle.acquire();
        debug!("fetching {url} (attempt {attempt}/{attempts})");
        match source.fetch(key, url) {
            Ok(markup) if !markup.trim().is_empty() => return Ok(markup),
            Ok(_) => warn!("empty document for \"{key}\" @ {url}"),
            Err(err) => warn!("fetch failed for \"{key}\" @ {url}: {err:#}"),
        }
    }
    Err(FetchError::Empty { attempts })
}
