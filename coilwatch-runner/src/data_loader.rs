//! Bar loading for the runner.
//!
//! Reads a CSV of daily bars (`symbol,date,open,high,low,close,volume`, one
//! header row, any symbol order), canonicalizes it and wraps the result in a
//! `MemoryBarSource`. Malformed rows are rejected one at a time; the
//! `BadBarPolicy` decides whether any rejection fails the load.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use coilwatch_core::data::{canonicalize, MemoryBarSource, RejectedBar};
use coilwatch_core::domain::{Bar, DatasetHash, RawBar};

use crate::config::BadBarPolicy;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open bars file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("no valid bars loaded")]
    Empty,

    #[error("{count} bar(s) rejected, first: {first}")]
    Rejected { count: usize, first: String },
}

/// Loaded, validated bars plus provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub source: MemoryBarSource,
    pub rejected: Vec<RejectedBar>,
    /// BLAKE3 over all accepted bars, in symbol then date order.
    pub dataset_hash: DatasetHash,
    pub bar_count: usize,
}

pub fn load_csv(path: &Path, policy: BadBarPolicy) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = load_csv_reader(file, policy)?;
    info!(
        path = %path.display(),
        bars = loaded.bar_count,
        rejected = loaded.rejected.len(),
        dataset = %loaded.dataset_hash,
        "bars loaded"
    );
    Ok(loaded)
}

pub fn load_csv_reader<R: Read>(reader: R, policy: BadBarPolicy) -> Result<LoadedData, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let raw = rdr
        .deserialize::<RawBar>()
        .collect::<Result<Vec<_>, _>>()?;

    let canonical = canonicalize(raw);
    for r in &canonical.rejected {
        warn!(symbol = %r.raw.symbol, date = %r.raw.date, reason = %r.reason, "bar rejected");
    }
    if policy == BadBarPolicy::Fail {
        if let Some(first) = canonical.rejected.first() {
            return Err(LoadError::Rejected {
                count: canonical.rejected.len(),
                first: format!("{} {}: {}", first.raw.symbol, first.raw.date, first.reason),
            });
        }
    }
    if canonical.by_symbol.is_empty() {
        return Err(LoadError::Empty);
    }

    let bar_count = canonical.bar_count();
    let dataset_hash = compute_dataset_hash(&canonical.by_symbol);
    Ok(LoadedData {
        source: MemoryBarSource::new(canonical.by_symbol),
        rejected: canonical.rejected,
        dataset_hash,
        bar_count,
    })
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// The map is ordered by symbol, so the hash does not depend on row order in
/// the input file.
pub fn compute_dataset_hash(bars: &BTreeMap<String, Vec<Bar>>) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for (symbol, series) in bars {
        hasher.update(symbol.as_bytes());
        for bar in series {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    DatasetHash::from_hash(&hasher.finalize().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coilwatch_core::data::BarSource;

    const CSV: &str = "\
symbol,date,open,high,low,close,volume
MSFT,2024-01-03,370.0,372.0,368.0,371.0,1000
AAPL,2024-01-02,185.0,186.0,184.0,185.5,2000
MSFT,2024-01-02,369.0,371.0,367.0,370.0,1100
AAPL,2024-01-03,185.5,184.0,186.0,185.0,2100
";

    #[test]
    fn loads_and_groups_by_symbol() {
        let loaded = load_csv_reader(CSV.as_bytes(), BadBarPolicy::Skip).unwrap();
        assert_eq!(loaded.source.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(loaded.bar_count, 3);
        assert_eq!(loaded.rejected.len(), 1);
        let msft = loaded.source.series("MSFT").unwrap();
        assert!(msft[0].date < msft[1].date);
    }

    #[test]
    fn fail_policy_rejects_whole_file() {
        let err = load_csv_reader(CSV.as_bytes(), BadBarPolicy::Fail).unwrap_err();
        match err {
            LoadError::Rejected { count, first } => {
                assert_eq!(count, 1);
                assert!(first.starts_with("AAPL 2024-01-03"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_is_empty() {
        let csv = "symbol,date,open,high,low,close,volume\n";
        assert!(matches!(
            load_csv_reader(csv.as_bytes(), BadBarPolicy::Skip),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn unparsable_row_is_a_csv_error() {
        let csv = "symbol,date,open,high,low,close,volume\nAAPL,not-a-date,1,2,1,1,10\n";
        assert!(matches!(
            load_csv_reader(csv.as_bytes(), BadBarPolicy::Skip),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn dataset_hash_ignores_row_order() {
        let reordered = "\
symbol,date,open,high,low,close,volume
MSFT,2024-01-02,369.0,371.0,367.0,370.0,1100
AAPL,2024-01-02,185.0,186.0,184.0,185.5,2000
MSFT,2024-01-03,370.0,372.0,368.0,371.0,1000
";
        let a = load_csv_reader(CSV.as_bytes(), BadBarPolicy::Skip).unwrap();
        let b = load_csv_reader(reordered.as_bytes(), BadBarPolicy::Skip).unwrap();
        assert_eq!(a.dataset_hash, b.dataset_hash);
        assert_eq!(a.dataset_hash.0.len(), 64);
    }
}
