//! Deterministic local paths for catalog resources.
//!
//! `bucket = id / bucket_size`, path = `bucket/id.ext`, where `ext` comes from
//! the URL suffix table or the placeholder. Every component recomputes paths
//! through [`derive_path`]; nothing else persists them.

mod check;
mod ext;

pub use check::is_well_formed;
pub use ext::{canonical_exts, ext_for_format, ext_from_url, format_for_ext, PLACEHOLDER_EXT};

use std::path::{Path, PathBuf};

use crate::catalog::ResourceId;

/// Sub-folder index for `id`.
pub fn bucket_of(id: ResourceId, bucket_size: u64) -> u64 {
    id / bucket_size.max(1)
}

/// Relative path `bucket/id.ext` for an explicit extension.
pub fn path_with_ext(id: ResourceId, bucket_size: u64, ext: &str) -> PathBuf {
    PathBuf::from(bucket_of(id, bucket_size).to_string()).join(format!("{}.{}", id, ext))
}

/// Relative output path for a resource; a pure function of its inputs.
pub fn derive_path(id: ResourceId, url: &str, bucket_size: u64) -> PathBuf {
    let ext = ext_from_url(url).unwrap_or(PLACEHOLDER_EXT);
    path_with_ext(id, bucket_size, ext)
}

/// True when `path` was written under the placeholder extension.
pub fn has_placeholder_ext(path: &Path) -> bool {
    path.extension()
        .map_or(false, |e| e.eq_ignore_ascii_case(PLACEHOLDER_EXT))
}
