//! Replays the append-only log into the latest status per resource.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::catalog::ResourceId;
use crate::storage::{self, OutputLayout};

use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::status::OutcomeStatus;

/// In-memory view of the ledger: last row per resource wins.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    records: BTreeMap<ResourceId, LedgerEntry>,
    rows: usize,
}

impl Ledger {
    /// Folds ledger text. A final row without a newline is a torn write and is ignored.
    pub fn from_text(text: &str, path: &Path) -> Result<Self, LedgerError> {
        let mut ledger = Ledger::default();
        for (index, chunk) in text.split_inclusive('\n').enumerate() {
            let line_no = index + 1;
            let Some(row) = chunk.strip_suffix('\n') else {
                tracing::warn!(
                    path = %path.display(),
                    line = line_no,
                    "ignoring partial trailing ledger row"
                );
                break;
            };
            let row = row.strip_suffix('\r').unwrap_or(row);
            if row.trim().is_empty() {
                continue;
            }
            let entry = LedgerEntry::parse_line(row).ok_or_else(|| LedgerError::Corrupt {
                path: path.to_path_buf(),
                line: line_no,
                content: row.to_string(),
            })?;
            ledger.apply(entry);
        }
        Ok(ledger)
    }

    /// Reads the ledger at `path`; `Ok(None)` when it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>, LedgerError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LedgerError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        Self::from_text(&text, path).map(Some)
    }

    /// Records `entry`, superseding any earlier status for the same ID.
    pub fn apply(&mut self, entry: LedgerEntry) {
        self.rows += 1;
        self.records.insert(entry.id, entry);
    }

    pub fn status(&self, id: ResourceId) -> Option<OutcomeStatus> {
        self.records.get(&id).map(|e| e.status)
    }

    pub fn get(&self, id: ResourceId) -> Option<&LedgerEntry> {
        self.records.get(&id)
    }

    /// Latest entry per resource, ascending by ID.
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.records.values()
    }

    pub fn statuses(&self) -> BTreeMap<ResourceId, OutcomeStatus> {
        self.records.iter().map(|(id, e)| (*id, e.status)).collect()
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.records.values().filter(|e| e.status == status).count()
    }

    /// Distinct resources with at least one row.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows replayed, duplicates included.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Loads the ledger for `layout`.
///
/// With `force_fresh` the ledger and every derived report are deleted first
/// and the result is `None`, as it is when no ledger exists yet.
pub fn load(layout: &OutputLayout, force_fresh: bool) -> Result<Option<Ledger>, LedgerError> {
    if force_fresh {
        let removed = storage::clear_run_files(layout).map_err(|source| LedgerError::Io {
            path: layout.log_dir().to_path_buf(),
            source,
        })?;
        tracing::info!(removed, "force new download: previous ledger and reports discarded");
        return Ok(None);
    }
    let ledger = Ledger::read(&layout.ledger_path())?;
    if let Some(ref l) = ledger {
        tracing::info!(
            resources = l.len(),
            rows = l.rows(),
            success = l.count(OutcomeStatus::Success),
            "ledger loaded"
        );
    }
    Ok(ledger)
}
