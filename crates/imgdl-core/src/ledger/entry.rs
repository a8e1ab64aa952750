//! One tab-separated ledger row: `ID<TAB>Status<TAB>URL<TAB>Path`.

use std::path::PathBuf;

use crate::catalog::ResourceId;

use super::status::OutcomeStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: ResourceId,
    pub status: OutcomeStatus,
    pub url: String,
    /// Informational; readers recompute paths from the catalog.
    pub path: PathBuf,
}

impl LedgerEntry {
    pub fn new(
        id: ResourceId,
        status: OutcomeStatus,
        url: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            status,
            url: url.into(),
            path: path.into(),
        }
    }

    /// Row text including the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            self.id,
            self.status,
            self.url,
            self.path.display()
        )
    }

    /// Parses a row without its line terminator. The path column is optional.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split('\t');
        let id = fields.next()?.trim().parse::<ResourceId>().ok()?;
        let status = OutcomeStatus::parse(fields.next()?.trim())?;
        let url = fields.next()?.trim();
        if url.is_empty() {
            return None;
        }
        let path = fields.next().map(str::trim).unwrap_or_default();
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(id, status, url, path))
    }
}
