//! Total memory detection.
//!
//! Reads `MemTotal` from `/proc/meminfo` through the [`FileSystem`] trait so
//! detection can be tested with [`mock::MockFs`] on any platform.
//!
//! ```
//! use std::path::Path;
//! use pgtune_core::collector::{detect_total_memory, mock::MockFs};
//!
//! let fs = MockFs::typical_system();
//! let bytes = detect_total_memory(&fs, Path::new("/proc")).unwrap();
//! assert_eq!(bytes, 16 * 1024 * 1024 * 1024);
//! ```

mod meminfo;
pub mod mock;
mod traits;

use std::path::Path;

use tracing::debug;

pub use meminfo::parse_mem_total;
pub use traits::{FileSystem, RealFs};

/// Error type for memory detection.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryDetectError {
    /// `meminfo` could not be read.
    Io(String),
    /// `meminfo` has no usable `MemTotal` line.
    Parse(String),
}

impl std::fmt::Display for MemoryDetectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryDetectError::Io(msg) => write!(f, "I/O error: {}", msg),
            MemoryDetectError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for MemoryDetectError {}

/// Returns total physical memory in bytes from `<proc_path>/meminfo`.
pub fn detect_total_memory<F: FileSystem + ?Sized>(
    fs: &F,
    proc_path: &Path,
) -> Result<u64, MemoryDetectError> {
    let path = proc_path.join("meminfo");
    let content = fs
        .read_to_string(&path)
        .map_err(|e| MemoryDetectError::Io(format!("{}: {}", path.display(), e)))?;
    let total_kb = parse_mem_total(&content)?;

    debug!(path = %path.display(), total_kb, "detected total memory");
    Ok(total_kb * 1024)
}
