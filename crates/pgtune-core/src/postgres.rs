//! PostgreSQL settings calculator.
//!
//! Ratios follow the pgtune rules: shared_buffers as a fraction of RAM,
//! effective_cache_size as the rest of the page cache, work_mem split across
//! connections, and version-dependent WAL sizing. All arithmetic is integer
//! division on KB values.

use std::ops::RangeInclusive;

use tracing::{debug, warn};

use crate::input::{OsType, TuningInput};
use crate::notice::Notice;
use crate::settings::{ConfigMap, MemorySettings, PostgresSettings, WalSizing};
use crate::workload::{Workload, WorkloadProfile};

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

/// Below this budget no memory settings are generated.
const LOW_MEMORY_BYTES: u64 = 256 * MB;
const VERY_HIGH_MEMORY_BYTES: u64 = 100 * GB;

const MAX_CONNECTIONS_RANGE: RangeInclusive<i64> = 1..=9999;

const WINDOWS_SHARED_BUFFERS_LIMIT_KB: u64 = 512 * 1024;
const MAINTENANCE_WORK_MEM_LIMIT_KB: u64 = 2 * 1024 * 1024;
const WAL_BUFFERS_LIMIT_KB: u64 = 16 * 1024;
const WAL_BUFFERS_ROUND_UP_FROM_KB: u64 = 14 * 1024;

/// Result of the PostgreSQL calculator.
#[derive(Clone, Debug, PartialEq)]
pub struct PostgresTuning {
    pub settings: PostgresSettings,
    pub notices: Vec<Notice>,
}

impl PostgresTuning {
    pub fn to_config(&self) -> ConfigMap {
        self.settings.to_config()
    }
}

/// Computes PostgreSQL settings for the given input.
pub fn compute_postgres_settings(input: &TuningInput) -> PostgresTuning {
    let profile = input.workload.profile();
    let max_connections = resolve_max_connections(input.max_connections, input.workload);
    let mem_kb = input.total_memory_bytes / 1024;
    let mut notices = Vec::new();

    let memory = if input.total_memory_bytes < LOW_MEMORY_BYTES {
        notices.push(Notice::low_memory());
        None
    } else {
        Some(memory_settings(
            profile,
            input.os_type,
            mem_kb,
            max_connections,
        ))
    };

    if input.total_memory_bytes >= VERY_HIGH_MEMORY_BYTES {
        notices.push(Notice::very_high_memory());
    }

    let wal = if input.db_version.uses_checkpoint_segments() {
        WalSizing::LegacyCheckpointSegments(profile.checkpoint_segments)
    } else {
        let (min_mb, max_mb) = profile.wal_size_mb;
        WalSizing::WalSizeBounds {
            min_wal_size: min_mb * 1024,
            max_wal_size: max_mb * 1024,
        }
    };

    let settings = PostgresSettings {
        max_connections,
        memory,
        wal,
        checkpoint_completion_target: profile.checkpoint_completion_target,
        default_statistics_target: profile.default_statistics_target,
    };

    for notice in &notices {
        warn!(notice = notice.id, "{}", notice);
    }
    debug!(
        workload = %input.workload,
        version = %input.db_version,
        mem_kb,
        ?settings,
        "computed postgres settings"
    );

    PostgresTuning { settings, notices }
}

/// Returns the requested connection limit, or the workload default when it is
/// missing or outside `1..=9999`.
pub fn resolve_max_connections(requested: Option<i64>, workload: Workload) -> u32 {
    match requested {
        Some(n) if MAX_CONNECTIONS_RANGE.contains(&n) => n as u32,
        _ => workload.profile().default_connections,
    }
}

fn memory_settings(
    profile: &WorkloadProfile,
    os_type: OsType,
    mem_kb: u64,
    max_connections: u32,
) -> MemorySettings {
    let mut shared_buffers = mem_kb / profile.shared_buffers_divisor;
    // Linux is left unclamped: the old 8GB ceiling does not hold for current versions.
    if os_type == OsType::Windows && shared_buffers > WINDOWS_SHARED_BUFFERS_LIMIT_KB {
        shared_buffers = WINDOWS_SHARED_BUFFERS_LIMIT_KB;
    }

    let (num, den) = profile.effective_cache_ratio;
    let effective_cache_size = mem_kb * num / den;

    // Each connection may run several sorts or hashes at once, so budget
    // three per connection out of what shared_buffers leaves over.
    let work_mem_base = (mem_kb - shared_buffers) / (max_connections as u64 * 3);
    let work_mem = work_mem_base / profile.work_mem_divisor;

    let maintenance_work_mem =
        (mem_kb / profile.maintenance_work_mem_divisor).min(MAINTENANCE_WORK_MEM_LIMIT_KB);

    MemorySettings {
        shared_buffers,
        effective_cache_size,
        work_mem,
        maintenance_work_mem,
        wal_buffers: wal_buffers(shared_buffers),
    }
}

/// 3% of shared_buffers, capped at 16MB. Values just under the cap (common
/// with the 512MB Windows shared_buffers limit) are rounded up to an even 16MB.
fn wal_buffers(shared_buffers: u64) -> u64 {
    let wal_buffers = (3 * shared_buffers / 100).min(WAL_BUFFERS_LIMIT_KB);
    if WAL_BUFFERS_ROUND_UP_FROM_KB < wal_buffers && wal_buffers < WAL_BUFFERS_LIMIT_KB {
        WAL_BUFFERS_LIMIT_KB
    } else {
        wal_buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PgVersion;
    use crate::notice::Severity;

    const MEMORY_SIZES: [u64; 8] = [
        256 * MB,
        300 * MB,
        GB,
        3 * GB + 7,
        16 * GB,
        64 * GB,
        100 * GB,
        512 * GB,
    ];

    fn input(version: &str, workload: Workload, total: u64) -> TuningInput {
        TuningInput::new(version.parse().unwrap(), workload, total)
    }

    #[test]
    fn test_web_96_one_gb() {
        let tuning = compute_postgres_settings(&input("9.6", Workload::Web, GB));
        let config = tuning.to_config();

        assert_eq!(config.get("max_connections"), Some("200"));
        assert_eq!(config.get("shared_buffers"), Some("256MB"));
        assert_eq!(config.get("effective_cache_size"), Some("768MB"));
        assert_eq!(config.get("work_mem"), Some("1310kB"));
        assert_eq!(config.get("maintenance_work_mem"), Some("64MB"));
        assert_eq!(config.get("min_wal_size"), Some("1GB"));
        assert_eq!(config.get("max_wal_size"), Some("2GB"));
        assert_eq!(config.get("checkpoint_completion_target"), Some("0.7"));
        assert_eq!(config.get("wal_buffers"), Some("7864kB"));
        assert_eq!(config.get("default_statistics_target"), Some("100"));
        assert!(!config.contains_key("checkpoint_segments"));
        assert!(tuning.notices.is_empty());
        let mem = tuning.settings.memory.unwrap();
        assert_eq!(mem.shared_buffers, 262144);
        assert_eq!(mem.effective_cache_size, 786432);
    }

    #[test]
    fn test_desktop_93_low_memory() {
        let tuning = compute_postgres_settings(&input("9.3", Workload::Desktop, 128 * MB));
        let config = tuning.to_config();

        for key in [
            "shared_buffers",
            "effective_cache_size",
            "work_mem",
            "maintenance_work_mem",
            "wal_buffers",
        ] {
            assert!(!config.contains_key(key), "{key} should be absent");
        }
        assert_eq!(config.get("max_connections"), Some("5"));
        assert_eq!(config.get("checkpoint_segments"), Some("3"));
        assert_eq!(config.get("checkpoint_completion_target"), Some("0.5"));
        assert_eq!(config.get("default_statistics_target"), Some("100"));
        assert_eq!(tuning.notices, vec![Notice::low_memory()]);
        assert_eq!(tuning.notices[0].severity, Severity::Warning);
    }

    #[test]
    fn test_low_memory_boundary() {
        let below = compute_postgres_settings(&input("9.6", Workload::Web, 256 * MB - 1));
        assert!(below.settings.memory.is_none());

        let at = compute_postgres_settings(&input("9.6", Workload::Web, 256 * MB));
        assert!(at.settings.memory.is_some());
        assert!(at.notices.is_empty());
    }

    #[test]
    fn test_very_high_memory_notice() {
        let below = compute_postgres_settings(&input("9.6", Workload::Oltp, 100 * GB - 1));
        assert!(below.notices.is_empty());

        let at = compute_postgres_settings(&input("9.6", Workload::Oltp, 100 * GB));
        assert_eq!(at.notices, vec![Notice::very_high_memory()]);
        assert!(at.settings.memory.is_some());
    }

    #[test]
    fn test_max_connections_substitution() {
        assert_eq!(resolve_max_connections(None, Workload::Oltp), 300);
        assert_eq!(resolve_max_connections(Some(0), Workload::Dw), 20);
        assert_eq!(resolve_max_connections(Some(-5), Workload::Mixed), 100);
        assert_eq!(resolve_max_connections(Some(10000), Workload::Web), 200);
        assert_eq!(resolve_max_connections(Some(1), Workload::Web), 1);
        assert_eq!(resolve_max_connections(Some(9999), Workload::Desktop), 9999);
        assert_eq!(resolve_max_connections(Some(50), Workload::Dw), 50);
    }

    #[test]
    fn test_dw_work_mem_and_maintenance() {
        let tuning = compute_postgres_settings(&input("9.3", Workload::Dw, 4 * GB));
        let config = tuning.to_config();
        // (4194304 - 1048576) / (20 * 3) = 52428, halved for dw.
        assert_eq!(config.get("work_mem"), Some("26214kB"));
        assert_eq!(config.get("maintenance_work_mem"), Some("512MB"));
        assert_eq!(config.get("checkpoint_segments"), Some("128"));
        assert_eq!(config.get("default_statistics_target"), Some("500"));
    }

    #[test]
    fn test_desktop_ratios() {
        let tuning = compute_postgres_settings(&input("10", Workload::Desktop, GB));
        let config = tuning.to_config();
        assert_eq!(config.get("shared_buffers"), Some("64MB"));
        assert_eq!(config.get("effective_cache_size"), Some("256MB"));
        // (1048576 - 65536) / 15 = 65536, divided by 6.
        assert_eq!(config.get("work_mem"), Some("10922kB"));
        assert_eq!(config.get("maintenance_work_mem"), Some("64MB"));
        assert_eq!(config.get("min_wal_size"), Some("100MB"));
        assert_eq!(config.get("max_wal_size"), Some("100MB"));
    }

    #[test]
    fn test_explicit_max_connections_drives_work_mem() {
        let tuning = compute_postgres_settings(
            &input("9.6", Workload::Web, GB).with_max_connections(Some(100)),
        );
        let config = tuning.to_config();
        assert_eq!(config.get("max_connections"), Some("100"));
        // (1048576 - 262144) / 300
        assert_eq!(config.get("work_mem"), Some("2621kB"));
    }

    #[test]
    fn test_maintenance_work_mem_capped() {
        let tuning = compute_postgres_settings(&input("12", Workload::Dw, 64 * GB));
        assert_eq!(tuning.to_config().get("maintenance_work_mem"), Some("2GB"));
    }

    #[test]
    fn test_windows_clamps_shared_buffers_and_rounds_wal_buffers() {
        let tuning = compute_postgres_settings(
            &input("9.6", Workload::Oltp, 8 * GB).with_os_type(OsType::Windows),
        );
        let config = tuning.to_config();
        assert_eq!(config.get("shared_buffers"), Some("512MB"));
        // 3% of 524288 is 15728, rounded up to 16MB.
        assert_eq!(config.get("wal_buffers"), Some("16MB"));
        // work_mem uses the clamped shared_buffers: (8388608 - 524288) / 900
        assert_eq!(config.get("work_mem"), Some("8738kB"));
    }

    #[test]
    fn test_linux_shared_buffers_not_clamped() {
        let tuning = compute_postgres_settings(&input("12", Workload::Web, 64 * GB));
        assert_eq!(tuning.to_config().get("shared_buffers"), Some("16GB"));
    }

    #[test]
    fn test_wal_buffers_rounding() {
        assert_eq!(wal_buffers(262144), 7864);
        // 3% = 14336 exactly: not strictly inside the round-up window.
        assert_eq!(wal_buffers(477867), 14336);
        assert_eq!(wal_buffers(477900), 16384);
        assert_eq!(wal_buffers(546133), 16384);
        assert_eq!(wal_buffers(100 * 1024 * 1024), 16384);
    }

    #[test]
    fn test_wal_sizing_is_version_gated() {
        for w in Workload::ALL {
            for version in ["8.4", "9.0", "9.4"] {
                let c = compute_postgres_settings(&input(version, w, GB)).to_config();
                assert!(c.contains_key("checkpoint_segments"));
                assert!(!c.contains_key("min_wal_size"));
                assert!(!c.contains_key("max_wal_size"));
            }
            for version in ["9.5", "9.6", "10", "16"] {
                let c = compute_postgres_settings(&input(version, w, GB)).to_config();
                assert!(!c.contains_key("checkpoint_segments"));
                assert!(c.contains_key("min_wal_size"));
                assert!(c.contains_key("max_wal_size"));
            }
        }
    }

    #[test]
    fn test_memory_invariants_all_workloads() {
        for w in Workload::ALL {
            for total in MEMORY_SIZES {
                for os in [OsType::Linux, OsType::Windows] {
                    let tuning =
                        compute_postgres_settings(&input("9.6", w, total).with_os_type(os));
                    let mem = tuning.settings.memory.expect("memory settings");
                    assert!(mem.shared_buffers <= mem.effective_cache_size, "{w} {total}");
                    assert!(mem.maintenance_work_mem <= MAINTENANCE_WORK_MEM_LIMIT_KB);
                    assert!(mem.wal_buffers <= WAL_BUFFERS_LIMIT_KB);
                    let uncapped = 3 * mem.shared_buffers / 100;
                    if uncapped > 14336 && uncapped < 16384 {
                        assert_eq!(mem.wal_buffers, 16384);
                    }
                }
            }
        }
    }

    #[test]
    fn test_always_emitted_keys() {
        for w in Workload::ALL {
            for total in [0, 128 * MB, 4 * GB] {
                let c = compute_postgres_settings(&input("9.6", w, total)).to_config();
                assert!(c.contains_key("max_connections"));
                assert!(c.contains_key("checkpoint_completion_target"));
                assert!(c.contains_key("default_statistics_target"));
                assert_eq!(c.contains_key("wal_buffers"), total >= 256 * MB);
            }
        }
    }

    #[test]
    fn test_version_field_is_used() {
        let t = compute_postgres_settings(&TuningInput::new(
            PgVersion::new(9, 4),
            Workload::Mixed,
            GB,
        ));
        assert_eq!(t.settings.wal, WalSizing::LegacyCheckpointSegments(32));
    }
}
