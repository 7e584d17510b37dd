//! System V shared memory limits for `sysctl.conf`.
//!
//! Only Linux servers running 9.3 or earlier get `kernel.shmmax` and
//! `kernel.shmall`; later versions no longer depend on these limits.

use tracing::debug;

use crate::input::{OsType, PgVersion};
use crate::settings::ConfigMap;

// Both limits cover half of total memory: shmall in 4kB pages, shmmax in bytes.
const SHMALL_DIVISOR: u64 = 8192;
const PAGE_SIZE: u64 = 4096;

/// Computes kernel settings. Empty on Windows and for versions after 9.3.
///
/// Values are plain integers and never unit-formatted.
pub fn compute_kernel_settings(
    db_version: PgVersion,
    os_type: OsType,
    total_memory_bytes: u64,
) -> ConfigMap {
    let mut config = ConfigMap::new();
    if os_type == OsType::Windows || db_version > PgVersion::LAST_SYSV_SHMEM {
        return config;
    }

    let shmall = total_memory_bytes / SHMALL_DIVISOR;
    let shmmax = shmall * PAGE_SIZE;
    config.insert("kernel.shmmax", shmmax.to_string());
    config.insert("kernel.shmall", shmall.to_string());

    debug!(shmmax, shmall, "computed kernel settings");
    config
}
