//! Immutable ID ⇄ URL catalog built once from the URL list.
//!
//! Dedup rules:
//! - a repeated URL keeps its first occurrence; later copies are dropped and counted;
//! - a repeated ID can no longer serve as a stable key, so every URL that
//!   carried it (the earlier one included) is discarded and the ID is never reused.

mod error;
mod parse;
mod range;

pub use error::CatalogError;
pub use range::{IdRange, InvalidRange};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Primary key of one catalog resource.
pub type ResourceId = u64;

/// Counts gathered while building the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Data lines seen (comments and blanks excluded).
    pub data_lines: usize,
    /// Blank and `;` comment lines.
    pub skipped_lines: usize,
    pub duplicate_urls: usize,
    /// Lines dropped because their ID was already taken (or poisoned).
    pub duplicate_ids: usize,
    /// Earlier entries evicted because a later line reused their ID.
    pub evicted_by_id: usize,
}

/// Outcome of offering one `(id, url)` pair to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Accepted,
    DuplicateUrl,
    DuplicateId,
}

/// Read-only bidirectional map between resource IDs and source URLs.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    by_id: BTreeMap<ResourceId, String>,
    by_url: HashMap<String, ResourceId>,
    stats: CatalogStats,
}

/// Mutable state used only while the catalog is being built.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
    seen_urls: HashSet<String>,
    poisoned_ids: HashSet<ResourceId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers one entry. URL duplicates are checked first, then ID duplicates.
    pub fn insert(&mut self, id: ResourceId, url: &str) -> Insert {
        self.catalog.stats.data_lines += 1;
        if !self.seen_urls.insert(url.to_string()) {
            self.catalog.stats.duplicate_urls += 1;
            tracing::debug!(id, url, "dropping duplicate url");
            return Insert::DuplicateUrl;
        }
        if self.poisoned_ids.contains(&id) {
            self.catalog.stats.duplicate_ids += 1;
            tracing::debug!(id, url, "dropping url with already-poisoned id");
            return Insert::DuplicateId;
        }
        if let Some(previous) = self.catalog.by_id.remove(&id) {
            self.catalog.by_url.remove(&previous);
            self.poisoned_ids.insert(id);
            self.catalog.stats.duplicate_ids += 1;
            self.catalog.stats.evicted_by_id += 1;
            tracing::warn!(id, url, previous = %previous, "duplicate id; discarding both urls");
            return Insert::DuplicateId;
        }
        self.catalog.by_id.insert(id, url.to_string());
        self.catalog.by_url.insert(url.to_string(), id);
        Insert::Accepted
    }

    fn skip_line(&mut self) {
        self.catalog.stats.skipped_lines += 1;
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}

impl Catalog {
    /// Reads the URL list at `path`.
    pub fn load(path: &Path, ids_in_list: bool) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_reader(BufReader::new(file), ids_in_list)?;
        let s = catalog.stats();
        tracing::info!(
            path = %path.display(),
            accepted = catalog.len(),
            duplicate_urls = s.duplicate_urls,
            duplicate_ids = s.duplicate_ids,
            evicted = s.evicted_by_id,
            "catalog built"
        );
        Ok(catalog)
    }

    /// Builds a catalog from `URL` or `URL<TAB>ID` lines. Without explicit IDs,
    /// each data line gets its 0-based position among data lines.
    pub fn from_reader<R: BufRead>(reader: R, ids_in_list: bool) -> Result<Self, CatalogError> {
        let mut builder = CatalogBuilder::new();
        let mut position: ResourceId = 0;
        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let raw = line.map_err(|source| CatalogError::Read {
                line: line_no,
                source,
            })?;
            match parse::parse_line(&raw, line_no, ids_in_list)? {
                Some(parsed) => {
                    let id = parsed.id.unwrap_or(position);
                    position += 1;
                    builder.insert(id, &parsed.url);
                }
                None => builder.skip_line(),
            }
        }
        Ok(builder.build())
    }

    /// Builds a catalog from in-memory pairs, applying the same dedup rules.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ResourceId, &'a str)>,
    {
        let mut builder = CatalogBuilder::new();
        for (id, url) in pairs {
            builder.insert(id, url);
        }
        builder.build()
    }

    pub fn url(&self, id: ResourceId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn id_of(&self, url: &str) -> Option<ResourceId> {
        self.by_url.get(url).copied()
    }

    /// IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.by_id.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &str)> + '_ {
        self.by_id.iter().map(|(id, url)| (*id, url.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn repeated_url_keeps_first_occurrence() {
        let c = Catalog::from_pairs([
            (1, "http://x/a.jpg"),
            (2, "http://x/b.png"),
            (3, "http://x/a.jpg"),
        ]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.url(1), Some("http://x/a.jpg"));
        assert_eq!(c.url(2), Some("http://x/b.png"));
        assert_eq!(c.url(3), None);
        assert_eq!(c.id_of("http://x/a.jpg"), Some(1));
        assert_eq!(c.stats().duplicate_urls, 1);
    }

    #[test]
    fn repeated_id_discards_urls_instead_of_renumbering() {
        let c = Catalog::from_pairs([
            (1, "http://x/a.jpg"),
            (5, "http://x/b.png"),
            (5, "http://x/c.png"),
            (5, "http://x/d.png"),
        ]);
        assert_eq!(c.ids().collect::<Vec<_>>(), vec![1]);
        assert_eq!(c.id_of("http://x/b.png"), None);
        assert_eq!(c.id_of("http://x/c.png"), None);
        assert_eq!(c.id_of("http://x/d.png"), None);
        assert_eq!(c.stats().duplicate_ids, 2);
        assert_eq!(c.stats().evicted_by_id, 1);
    }

    #[test]
    fn sequential_ids_count_data_lines_only() {
        let text = "; comment\nhttp://x/a.jpg\n\nhttp://x/b.png\nhttp://x/a.jpg\nhttp://x/c.gif\n";
        let c = Catalog::from_reader(Cursor::new(text), false).unwrap();
        assert_eq!(c.url(0), Some("http://x/a.jpg"));
        assert_eq!(c.url(1), Some("http://x/b.png"));
        assert_eq!(c.url(2), None, "position 2 was the duplicate url");
        assert_eq!(c.url(3), Some("http://x/c.gif"));
        assert_eq!(c.stats().skipped_lines, 2);
        assert_eq!(c.stats().data_lines, 4);
    }

    #[test]
    fn explicit_ids_from_second_column() {
        let text = "http://x/a.jpg\t10\nhttp://x/b.png\t20\n";
        let c = Catalog::from_reader(Cursor::new(text), true).unwrap();
        assert_eq!(c.ids().collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(c.id_of("http://x/b.png"), Some(20));
    }

    #[test]
    fn malformed_line_is_fatal_with_line_number() {
        let text = "http://x/a.jpg\t10\nhttp://x/b.png\tnope\n";
        match Catalog::from_reader(Cursor::new(text), true) {
            Err(CatalogError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed error, got {:?}", other),
        }
    }
}
