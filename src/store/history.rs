//! Durable per-pool history files and the sampling interval gate.
//!
//! Each pool owns one CSV file at `{data_dir}/{name}.csv`. Writes rebuild
//! the whole file into a temp path and rename it into place, so a reader
//! never observes a half-written trailing row. Histories are small (one
//! row per interval), so the full rewrite stays cheap.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::errors::PersistenceError;
use crate::store::models::{History, Snapshot};

pub struct HistoryStore {
    data_dir: PathBuf,
}

impl HistoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn file_path(&self, pool_name: &str) -> PathBuf {
        self.data_dir.join(format!("{pool_name}.csv"))
    }

    /// Read a pool's saved history.
    ///
    /// A missing, unreadable or unparsable file is a fresh start, not an
    /// error: it logs WARN and yields an empty history.
    pub fn load_history(&self, pool_name: &str) -> History {
        let path = self.file_path(pool_name);

        match read_snapshots(&path) {
            Ok(snapshots) => {
                info!(
                    "Loaded previous history file={} rows={}",
                    path.display(),
                    snapshots.len()
                );
                History::from_snapshots(snapshots)
            },
            Err(e) => {
                warn!(
                    "No usable previous history, starting fresh file={} reason={:#}",
                    path.display(),
                    e
                );
                History::new()
            },
        }
    }

    /// Seconds the caller must still wait before sampling this pool again.
    ///
    /// Zero or negative means sampling is allowed now. An empty history
    /// never gates.
    pub fn seconds_until_next_allowed(history: &History, now: i64, interval_secs: i64) -> i64 {
        match history.last() {
            None => 0,
            Some(last) => interval_secs - (now - last.timestamp),
        }
    }

    /// Append `snapshot` to `history` and rewrite the pool's file with the
    /// full updated sequence, atomically.
    pub fn append_and_persist(
        &self,
        pool_name: &str,
        history: &mut History,
        snapshot: Snapshot,
    ) -> Result<(), PersistenceError> {
        history.push(snapshot);

        let path = self.file_path(pool_name);
        let tmp = self.data_dir.join(format!("{pool_name}.csv.tmp"));

        if let Err(e) = write_snapshots(&tmp, history) {
            let _ = fs::remove_file(&tmp);
            return Err(PersistenceError(format!("{e:#}")));
        }

        fs::rename(&tmp, &path)
            .map_err(|e| PersistenceError(format!("rename into {}: {e}", path.display())))
    }
}

fn read_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    let mut rdr =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;

    let mut snapshots = Vec::new();
    for row in rdr.deserialize() {
        let snapshot: Snapshot = row.context("Malformed history row")?;
        snapshots.push(snapshot);
    }

    Ok(snapshots)
}

fn write_snapshots(path: &Path, history: &History) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create data directory {}", parent.display()))?;
    }

    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("open {}", path.display()))?;

    for snapshot in history.iter() {
        wtr.serialize(snapshot).context("Serialize history row")?;
    }

    wtr.flush().context("Flush history file")?;
    Ok(())
}
