#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use filegate_contracts::{AccessKey, KeyRecord, Validate};
use filegate_core::Ledger;

#[derive(Debug)]
pub enum SnapshotError {
    /// The snapshot exists but cannot be trusted. Fatal at startup.
    CorruptState { path: PathBuf, detail: String },
    Io { path: PathBuf, detail: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::CorruptState { path, detail } => {
                write!(f, "corrupt snapshot '{}': {}", path.display(), detail)
            }
            SnapshotError::Io { path, detail } => {
                write!(f, "snapshot io failure '{}': {}", path.display(), detail)
            }
        }
    }
}

/// Owns the snapshot file; no other component touches it. The snapshot is a
/// single JSON object mapping key to counters, fully rewritten per flush.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the persisted ledger. A missing file is the first-run case and
    /// yields an empty, clean ledger.
    pub fn load(&self) -> Result<Ledger, SnapshotError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Ledger::new()),
            Err(err) => return Err(self.io_failure(err)),
        };
        let records: BTreeMap<AccessKey, KeyRecord> =
            serde_json::from_str(&raw).map_err(|err| SnapshotError::CorruptState {
                path: self.path.clone(),
                detail: err.to_string(),
            })?;
        // Map keys bypass constructor validation during deserialization.
        for key in records.keys() {
            key.validate().map_err(|violation| SnapshotError::CorruptState {
                path: self.path.clone(),
                detail: format!("invalid access key in snapshot: {violation:?}"),
            })?;
        }
        Ok(Ledger::from_records(records))
    }

    /// Serializes the full ledger when dirty; no-op otherwise. Returns
    /// whether a write happened.
    pub fn flush_if_dirty(&self, ledger: &mut Ledger) -> Result<bool, SnapshotError> {
        if !ledger.is_dirty() {
            return Ok(false);
        }
        self.write_snapshot(ledger)?;
        ledger.clear_dirty();
        Ok(true)
    }

    /// Unconditional flush; the shutdown safety net.
    pub fn flush(&self, ledger: &mut Ledger) -> Result<(), SnapshotError> {
        self.write_snapshot(ledger)?;
        ledger.clear_dirty();
        Ok(())
    }

    // Full rewrite through a sibling tmp file; the rename keeps the
    // published snapshot a single consistent image.
    fn write_snapshot(&self, ledger: &Ledger) -> Result<(), SnapshotError> {
        let json = serde_json::to_string(ledger.records()).map_err(|err| SnapshotError::Io {
            path: self.path.clone(),
            detail: format!("failed to encode snapshot: {err}"),
        })?;
        let tmp_path = self.tmp_path();
        let mut file = File::create(&tmp_path).map_err(|err| self.io_failure(err))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|err| self.io_failure(err))?;
        fs::rename(&tmp_path, &self.path).map_err(|err| self.io_failure(err))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }

    fn io_failure(&self, err: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            detail: err.to_string(),
        }
    }
}
