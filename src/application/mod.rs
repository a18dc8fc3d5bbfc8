// Use cases wiring the parser, store, extractor and exporters together.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::analysis::{extract_all, Analysis};
use crate::domain::results::Results;
use crate::error::Result;
use crate::infrastructure::report_parser::parse_report_logged;
use crate::infrastructure::results_cache::ResultsCache;
use crate::infrastructure::results_store::{is_cache_path, ResultsStore, CACHE_EXTENSION};
use crate::ports::OutputExporter;

/// Input path meaning "read the report from stdin".
pub const STDIN: &str = "-";

/// Load results from a report or a binary cache.
///
/// `input` ending in the cache extension is decoded directly. Otherwise the
/// report is parsed; with `use_cache` a fresh cache next to the report is
/// preferred and a stale or unreadable one is rebuilt.
pub fn load_results(input: &Path, use_cache: bool) -> Result<Results> {
    if input == Path::new(STDIN) {
        return parse_report_logged(io::stdin().lock());
    }

    if is_cache_path(input) {
        info!("[Load] Decoding cached results from {}", input.display());
        return ResultsStore::load_path(input);
    }

    if !use_cache {
        return parse_report_logged(File::open(input)?);
    }

    let cache = ResultsCache::for_report(input);
    if cache.get_valid_cache().is_some() {
        match cache.load() {
            Ok(results) => return Ok(results),
            Err(e) => warn!("[Load] Cache unreadable ({}), re-parsing report", e),
        }
    }

    let report = cache.fingerprint()?;
    let results = parse_report_logged(File::open(input)?)?;
    if let Err(e) = cache.store(&results, report) {
        warn!("[Load] Could not write cache: {}", e);
    }
    Ok(results)
}

/// Default cache file for `input`: `<input>.bin`. Stdin has no default.
pub fn default_cache_path(input: &Path) -> Option<PathBuf> {
    if input == Path::new(STDIN) {
        return None;
    }
    let mut path = input.as_os_str().to_owned();
    path.push(".");
    path.push(CACHE_EXTENSION);
    Some(PathBuf::from(path))
}

/// Parse a report and write its binary cache to `output`.
pub fn convert_report(input: &Path, output: &Path) -> Result<Results> {
    let results = if input == Path::new(STDIN) {
        parse_report_logged(io::stdin().lock())?
    } else {
        parse_report_logged(File::open(input)?)?
    };
    ResultsStore::save_path(&results, output)?;
    Ok(results)
}

/// Size of an exported graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub calls: usize,
}

pub struct GraphUsecase<'a> {
    pub exporter: &'a dyn OutputExporter,
}

impl<'a> GraphUsecase<'a> {
    /// Extract every requested analysis, merge the graphs and export the result.
    pub fn run(
        &self,
        results: &Results,
        analyses: &[Analysis],
        out: &mut dyn Write,
    ) -> Result<GraphSummary> {
        let cg = extract_all(results, analyses)?;
        info!(
            "[Graph] {} analyses merged: {} nodes, {} calls",
            analyses.len(),
            cg.node_count(),
            cg.call_count()
        );
        self.exporter.export(&cg, out)?;
        Ok(GraphSummary {
            nodes: cg.node_count(),
            calls: cg.call_count(),
        })
    }
}
