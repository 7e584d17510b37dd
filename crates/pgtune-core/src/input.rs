//! Calculator inputs: PostgreSQL version, target OS and the memory budget.

use std::str::FromStr;

use crate::error::TuneError;
use crate::workload::Workload;

/// PostgreSQL version as `major.minor`.
///
/// `"9.6"` parses to `9.6`, `"16"` to `16.0`. Anything after the second
/// component (`"9.6.24"`) is ignored.
///
/// Components are integers, not decimal fractions: `"9.30"` is minor 30 and
/// orders after `9.3`, the same way `"10.10"` orders after `10.9`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PgVersion {
    pub major: u32,
    pub minor: u32,
}

impl PgVersion {
    /// Last version that allocates its main shared memory with System V shm.
    pub const LAST_SYSV_SHMEM: PgVersion = PgVersion::new(9, 3);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// `true` for versions before 9.5, which use `checkpoint_segments`.
    pub fn uses_checkpoint_segments(self) -> bool {
        self < PgVersion::new(9, 5)
    }
}

impl std::fmt::Display for PgVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PgVersion {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TuneError::InvalidVersion(s.to_string());
        let mut parts = s.trim().split('.');

        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            None => 0,
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
        };

        Ok(PgVersion::new(major, minor))
    }
}

/// Operating system the server runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OsType {
    #[default]
    Linux,
    Windows,
}

impl FromStr for OsType {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "linux" => Ok(OsType::Linux),
            "windows" => Ok(OsType::Windows),
            other => Err(TuneError::UnknownOsType(other.to_string())),
        }
    }
}

/// Normalized input for both calculators.
///
/// `total_memory_bytes` is the budget after percentage scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuningInput {
    pub db_version: PgVersion,
    pub os_type: OsType,
    pub workload: Workload,
    pub total_memory_bytes: u64,
    /// Requested connection limit; `None` or out of range uses the workload default.
    pub max_connections: Option<i64>,
}

impl TuningInput {
    pub fn new(db_version: PgVersion, workload: Workload, total_memory_bytes: u64) -> Self {
        Self {
            db_version,
            os_type: OsType::Linux,
            workload,
            total_memory_bytes,
            max_connections: None,
        }
    }

    pub fn with_os_type(mut self, os_type: OsType) -> Self {
        self.os_type = os_type;
        self
    }

    pub fn with_max_connections(mut self, max_connections: Option<i64>) -> Self {
        self.max_connections = max_connections;
        self
    }
}
