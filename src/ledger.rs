//! Price ledger: the lowest price ever seen per tracked URL, one JSON file each.
//!
//! Records live at `<data_dir>/<slug>.json` and hold `{"lowest_price": 199.9}`.
//! Files written by older versions with the `menor_preco` key are still read.

use crate::product::models::Price;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Maximum length of the readable part of a slug.
const SLUG_PREFIX_MAX: usize = 64;

/// Hex digits of the URL digest appended to every slug.
const SLUG_HASH_LEN: usize = 12;

const RECORD_EXT: &str = "json";

/// Derives the filesystem-safe ledger key for a URL.
///
/// Runs of non-alphanumeric characters collapse to `_`, the readable part is
/// capped, and a digest of the full URL is appended so distinct URLs that
/// normalize to the same text still get distinct keys.
pub fn slug(url: &str) -> String {
    let mut readable = String::with_capacity(url.len());
    for c in url.chars() {
        if c.is_ascii_alphanumeric() {
            readable.push(c.to_ascii_lowercase());
        } else if !readable.ends_with('_') {
            readable.push('_');
        }
    }

    let mut readable = readable.trim_matches('_').to_string();
    readable.truncate(SLUG_PREFIX_MAX);
    let readable = readable.trim_end_matches('_');
    let readable = if readable.is_empty() { "item" } else { readable };

    let digest = format!("{:x}", md5::compute(url.as_bytes()));
    format!("{}-{}", readable, &digest[..SLUG_HASH_LEN])
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    #[serde(alias = "menor_preco")]
    lowest_price: Price,
}

/// Durable store of lowest prices, keyed by URL slug.
#[derive(Debug, Clone)]
pub struct Ledger {
    dir: PathBuf,
}

impl Ledger {
    /// Opens (creating if needed) the ledger directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for a URL.
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", slug(url), RECORD_EXT))
    }

    /// Returns the recorded lowest price, or `None` when there is no usable record.
    pub fn read(&self, url: &str) -> Option<Price> {
        read_record(&self.path_for(url))
    }

    /// Replaces the recorded lowest price.
    ///
    /// The record is written to a temporary sibling and renamed into place, so
    /// an interrupted write leaves the previous value intact.
    pub fn write(&self, url: &str, price: Price) -> Result<()> {
        let path = self.path_for(url);
        let tmp = path.with_extension("json.tmp");

        let body = serde_json::to_string(&Record { lowest_price: price })?;
        fs::write(&tmp, body)
            .with_context(|| format!("Failed to write ledger record: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace ledger record: {}", path.display()))?;

        debug!("Recorded lowest price {} for {}", price, url);
        Ok(())
    }

    /// Lists every record in the ledger as `(slug, price)`, sorted by slug.
    /// Unreadable records are listed with `None`.
    pub fn entries(&self) -> Result<Vec<(String, Option<Price>)>> {
        let mut entries = Vec::new();

        let dir = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list data directory: {}", self.dir.display()))?;

        for entry in dir {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push((stem.to_string(), read_record(&path)));
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

fn read_record(path: &Path) -> Option<Price> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No ledger record at {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<Record>(&content) {
        Ok(record) => Some(record.lowest_price),
        Err(e) => {
            warn!("Ignoring malformed ledger record {}: {}", path.display(), e);
            None
        }
    }
}
