//! Inclusive ID-range filter (`all` or `lo-hi`).

use std::fmt;
use std::str::FromStr;

use super::ResourceId;

/// Range string that is neither `all` nor a well-formed `lo-hi` with `lo <= hi`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record range {0:?}: expected \"all\" or \"lo-hi\" with lo <= hi")]
pub struct InvalidRange(pub String);

/// Restricts which resource IDs a pass may enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdRange {
    #[default]
    All,
    Closed { lo: ResourceId, hi: ResourceId },
}

impl IdRange {
    pub fn contains(&self, id: ResourceId) -> bool {
        match *self {
            IdRange::All => true,
            IdRange::Closed { lo, hi } => lo <= id && id <= hi,
        }
    }
}

impl FromStr for IdRange {
    type Err = InvalidRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(IdRange::All);
        }
        let err = || InvalidRange(s.to_string());
        let (lo, hi) = trimmed.split_once('-').ok_or_else(err)?;
        let lo: ResourceId = lo.trim().parse().map_err(|_| err())?;
        let hi: ResourceId = hi.trim().parse().map_err(|_| err())?;
        if lo > hi {
            return Err(err());
        }
        Ok(IdRange::Closed { lo, hi })
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdRange::All => write!(f, "all"),
            IdRange::Closed { lo, hi } => write!(f, "{}-{}", lo, hi),
        }
    }
}
