use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use bincode::Options;
use memmap2::Mmap;
use tracing::debug;

use crate::domain::results::Results;
use crate::error::{Error, Result};

/// File extension marking a binary results cache.
pub const CACHE_EXTENSION: &str = "bin";

/// Whether `path` names a binary cache rather than a textual report.
pub fn is_cache_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CACHE_EXTENSION)
}

/// Compact binary encoding of [`Results`].
pub struct ResultsStore;

impl ResultsStore {
    fn options() -> impl Options {
        bincode::DefaultOptions::new()
    }

    pub fn save<W: Write>(results: &Results, sink: W) -> Result<()> {
        Self::options()
            .serialize_into(sink, results)
            .map_err(encode_error)
    }

    /// Decode results from `source`.
    ///
    /// The source is read to the end first; decoding from a slice bounds every
    /// declared length by the bytes actually present.
    pub fn load<R: Read>(mut source: R) -> Result<Results> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(results: &Results) -> Result<Vec<u8>> {
        Self::options().serialize(results).map_err(encode_error)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Results> {
        Self::options()
            .reject_trailing_bytes()
            .deserialize(bytes)
            .map_err(|e| Error::Decode(e.to_string()))
    }

    pub fn save_path(results: &Results, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        Self::save(results, &mut writer)?;
        writer.flush()?;
        debug!("[Store] Wrote {}", path.display());
        Ok(())
    }

    /// Load a cache file through a read-only memory map.
    pub fn load_path(path: &Path) -> Result<Results> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(Error::Decode(format!("{} is empty", path.display())));
        }
        // The file is only read, and only for the duration of this call.
        let mmap = unsafe { Mmap::map(&file)? };
        let results = Self::from_bytes(&mmap)?;
        debug!("[Store] Loaded {} ({} bytes)", path.display(), mmap.len());
        Ok(results)
    }
}

fn encode_error(err: bincode::Error) -> Error {
    match *err {
        bincode::ErrorKind::Io(io) => Error::Io(io),
        other => Error::Encode(other.to_string()),
    }
}
