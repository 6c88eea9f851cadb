//! Server version model and per-version feature gates.
//!
//! The inspector records the server's major version in the IR; the differ and
//! the SQL generators consult it before emitting syntax that older majors do
//! not accept.

use serde::{Deserialize, Serialize};

/// Oldest PostgreSQL major version the engine supports.
pub const MIN_SUPPORTED_MAJOR: u32 = 14;

/// Newest PostgreSQL major version the engine supports.
pub const MAX_SUPPORTED_MAJOR: u32 = 18;

/// A PostgreSQL server major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PgVersion {
    pub major: u32,
}

impl PgVersion {
    pub fn new(major: u32) -> Self {
        Self { major }
    }

    /// Build from the integer form of `server_version_num` (e.g. 150004).
    pub fn from_version_num(num: i32) -> Self {
        Self {
            major: (num / 10_000) as u32,
        }
    }

    pub fn is_supported(&self) -> bool {
        (MIN_SUPPORTED_MAJOR..=MAX_SUPPORTED_MAJOR).contains(&self.major)
    }

    /// `UNIQUE NULLS NOT DISTINCT` on constraints and indexes.
    pub fn supports_nulls_not_distinct(&self) -> bool {
        self.major >= 15
    }

    /// `pg_attribute.attgenerated` virtual columns landed in 18; stored
    /// generation exists on every supported major.
    pub fn supports_virtual_generated_columns(&self) -> bool {
        self.major >= 18
    }
}

impl std::fmt::Display for PgVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.major)
    }
}

impl Default for PgVersion {
    fn default() -> Self {
        Self {
            major: MIN_SUPPORTED_MAJOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_num_maps_to_major() {
        assert_eq!(PgVersion::from_version_num(140011).major, 14);
        assert_eq!(PgVersion::from_version_num(150004).major, 15);
        assert_eq!(PgVersion::from_version_num(180000).major, 18);
    }

    #[test]
    fn support_window() {
        assert!(!PgVersion::new(13).is_supported());
        assert!(PgVersion::new(14).is_supported());
        assert!(PgVersion::new(18).is_supported());
        assert!(!PgVersion::new(19).is_supported());
    }

    #[test]
    fn nulls_not_distinct_gate() {
        assert!(!PgVersion::new(14).supports_nulls_not_distinct());
        assert!(PgVersion::new(15).supports_nulls_not_distinct());
    }
}
