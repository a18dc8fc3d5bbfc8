//! Results Cache Module
//!
//! Avoids re-parsing a report by keeping its parsed results next to it and
//! validating them against a fingerprint of the report: size, modification
//! time to the nanosecond and a blake3 hash of the contents.
//!
//! Cache structure:
//! - `<report>.bin` - the bincode-encoded results
//! - `<report>.bin.meta` - JSON metadata for cache validation

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::results::Results;
use crate::error::{Error, Result};
use crate::infrastructure::results_store::{ResultsStore, CACHE_EXTENSION};

/// Identity of a report's contents at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFingerprint {
    pub len: u64,
    pub mtime_secs: u64,
    pub mtime_nanos: u32,
    /// blake3 of the report bytes, hex
    pub hash: String,
}

impl ReportFingerprint {
    /// Fingerprint the report at `path` as it is now.
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        let mtime = metadata
            .modified()?
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);

        let mut hasher = blake3::Hasher::new();
        io::copy(&mut File::open(path)?, &mut hasher)?;

        Ok(Self {
            len: metadata.len(),
            mtime_secs: mtime.as_secs(),
            mtime_nanos: mtime.subsec_nanos(),
            hash: hasher.finalize().to_hex().to_string(),
        })
    }
}

/// Cache metadata stored alongside the encoded results.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Version of the cache layout
    pub version: u32,
    /// Timestamp of when the cache was created (unix seconds)
    pub created_at: u64,
    /// The report the cached results were parsed from
    pub report: ReportFingerprint,
}

impl CacheMetadata {
    pub const CURRENT_VERSION: u32 = 2;
}

/// Report-keyed results cache.
pub struct ResultsCache {
    report_path: PathBuf,
    cache_path: PathBuf,
    meta_path: PathBuf,
}

impl ResultsCache {
    /// Cache living next to `report_path`.
    pub fn for_report(report_path: &Path) -> Self {
        let mut cache = report_path.as_os_str().to_owned();
        cache.push(".");
        cache.push(CACHE_EXTENSION);
        Self::with_cache_path(report_path, Path::new(&cache))
    }

    pub fn with_cache_path(report_path: &Path, cache_path: &Path) -> Self {
        let mut meta = cache_path.as_os_str().to_owned();
        meta.push(".meta");

        Self {
            report_path: report_path.to_path_buf(),
            cache_path: cache_path.to_path_buf(),
            meta_path: PathBuf::from(meta),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Fingerprint the report this cache belongs to.
    ///
    /// Must be taken before the report is parsed.
    pub fn fingerprint(&self) -> Result<ReportFingerprint> {
        ReportFingerprint::of(&self.report_path)
    }

    /// Path of the cached results if they are present and up to date.
    pub fn get_valid_cache(&self) -> Option<&Path> {
        if !self.cache_path.exists() || !self.meta_path.exists() {
            info!("[Cache] No cache found for {}", self.report_path.display());
            return None;
        }

        let meta = match self.load_metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!("[Cache] Failed to load metadata: {}", e);
                return None;
            }
        };

        if meta.version != CacheMetadata::CURRENT_VERSION {
            info!("[Cache] Cache version mismatch");
            return None;
        }

        match self.fingerprint() {
            Ok(current) if current == meta.report => {
                info!("[Cache] Cache is valid, skipping parse");
                Some(&self.cache_path)
            }
            Ok(_) => {
                info!("[Cache] Report has changed");
                None
            }
            Err(e) => {
                warn!("[Cache] Cannot fingerprint report: {}", e);
                None
            }
        }
    }

    pub fn load(&self) -> Result<Results> {
        ResultsStore::load_path(&self.cache_path)
    }

    /// Write `results` with the fingerprint of the report they came from.
    pub fn store(&self, results: &Results, report: ReportFingerprint) -> Result<()> {
        ResultsStore::save_path(results, &self.cache_path)?;

        let meta = CacheMetadata {
            version: CacheMetadata::CURRENT_VERSION,
            created_at: unix_seconds(SystemTime::now()),
            report,
        };

        let json = serde_json::to_string_pretty(&meta).map_err(Error::encode_json)?;
        let mut file = File::create(&self.meta_path)?;
        file.write_all(json.as_bytes())?;

        info!("[Cache] Stored results in {}", self.cache_path.display());
        Ok(())
    }

    /// Clear the cache.
    pub fn invalidate(&self) -> Result<()> {
        if self.cache_path.exists() {
            fs::remove_file(&self.cache_path)?;
        }
        if self.meta_path.exists() {
            fs::remove_file(&self.meta_path)?;
        }
        Ok(())
    }

    fn load_metadata(&self) -> Result<CacheMetadata> {
        let contents = fs::read_to_string(&self.meta_path)?;
        serde_json::from_str(&contents).map_err(|e| Error::Decode(e.to_string()))
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
