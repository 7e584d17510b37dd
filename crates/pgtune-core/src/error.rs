//! Error types for request validation and file output.

use std::io;
use std::path::PathBuf;

use crate::collector::MemoryDetectError;

/// Error type for a tuning run.
///
/// Every variant except `Io` is raised during validation, before any file is
/// touched.
#[derive(Debug)]
pub enum TuneError {
    /// Workload is not one of web, oltp, dw, desktop, mixed.
    UnknownWorkloadType(String),
    /// OS type is neither linux nor windows.
    UnknownOsType(String),
    /// PostgreSQL version could not be parsed.
    InvalidVersion(String),
    /// Memory size is not `<N>KB|MB|GB|TB`.
    InvalidMemorySize(String),
    /// Memory percentage outside 1..=100.
    InvalidPercentage(u32),
    /// Total memory was not given and could not be detected.
    MemoryDetect(MemoryDetectError),
    /// Reading or writing an output file failed.
    Io { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for TuneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuneError::UnknownWorkloadType(t) => write!(
                f,
                "unknown workload type '{}' (expected web, oltp, dw, desktop or mixed)",
                t
            ),
            TuneError::UnknownOsType(t) => {
                write!(f, "unknown OS type '{}' (expected linux or windows)", t)
            }
            TuneError::InvalidVersion(v) => write!(f, "invalid PostgreSQL version '{}'", v),
            TuneError::InvalidMemorySize(s) => write!(
                f,
                "invalid memory size '{}' (expected <N>KB, <N>MB, <N>GB or <N>TB)",
                s
            ),
            TuneError::InvalidPercentage(p) => {
                write!(f, "memory percentage {} out of range (1-100)", p)
            }
            TuneError::MemoryDetect(e) => write!(f, "cannot detect total memory: {}", e),
            TuneError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for TuneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuneError::MemoryDetect(e) => Some(e),
            TuneError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<MemoryDetectError> for TuneError {
    fn from(e: MemoryDetectError) -> Self {
        TuneError::MemoryDetect(e)
    }
}
