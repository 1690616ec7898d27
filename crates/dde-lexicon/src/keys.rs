//! Key list and unresolved-key skip list.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Normalize a key list: trim, drop trailing `.`s, keep the part before
/// the first `,`. Blank lines are ignored.
pub fn parse_key_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.trim_end_matches('.');
            line.split(',').next().unwrap_or_default().trim().to_string()
        })
        .filter(|key| !key.is_empty())
        .collect()
}

pub fn read_key_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("read key list {}", path.display()))?;
    Ok(parse_key_list(&text))
}

/// Keys that could not be processed. Loaded at start, rewritten sorted at the end.
pub struct SkipList {
    path: PathBuf,
    keys: BTreeSet<String>,
}

impl SkipList {
    /// A missing file starts an empty list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let keys = if path.exists() {
            fs::read_to_string(&path)
                .with_context(|| format!("read skip list {}", path.display()))?
                .lines()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            BTreeSet::new()
        };
        Ok(Self { path, keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        let mut text = String::new();
        for key in &self.keys {
            text.push_str(key);
            text.push('\n');
        }
        fs::write(&self.path, text)
            .with_context(|| format!("write skip list {}", self.path.display()))
    }
}
