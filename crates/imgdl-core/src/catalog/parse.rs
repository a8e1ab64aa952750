//! Line-level parsing of the URL list.

use super::error::CatalogError;
use super::ResourceId;

/// One data line of the URL list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct CatalogLine {
    pub url: String,
    pub id: Option<ResourceId>,
}

/// Parses one line. Returns `Ok(None)` for blank lines and `;` comments.
///
/// When `ids_in_list` is set the second tab-separated column must hold the ID;
/// otherwise any second column is ignored.
pub(super) fn parse_line(
    raw: &str,
    line: usize,
    ids_in_list: bool,
) -> Result<Option<CatalogLine>, CatalogError> {
    let text = raw.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() || text.trim_start().starts_with(';') {
        return Ok(None);
    }

    let mut fields = text.split('\t');
    let url = fields.next().unwrap_or("").trim();
    let id_field = fields.next().map(str::trim);
    if fields.next().is_some() {
        return Err(malformed(line, "more than two tab-separated columns"));
    }
    if url.is_empty() {
        return Err(malformed(line, "empty URL column"));
    }

    let id = if ids_in_list {
        let field = id_field
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed(line, "missing ID column"))?;
        let id = field
            .parse::<ResourceId>()
            .map_err(|_| malformed(line, format!("ID {:?} is not an unsigned integer", field)))?;
        Some(id)
    } else {
        None
    };

    Ok(Some(CatalogLine {
        url: url.to_string(),
        id,
    }))
}

fn malformed(line: usize, reason: impl Into<String>) -> CatalogError {
    CatalogError::Malformed {
        line,
        reason: reason.into(),
    }
}
