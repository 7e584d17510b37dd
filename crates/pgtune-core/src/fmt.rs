//! Formatting helpers for generated configuration values.
//!
//! PostgreSQL accepts memory settings with a unit suffix. Sizes are computed in
//! KB and printed with the largest unit that represents them exactly.

use crate::settings::SettingValue;

pub const KB_PER_MB: u64 = 1024;
pub const KB_PER_GB: u64 = 1024 * 1024;

const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Settings printed as bare numbers rather than sizes.
pub const SIZE_EXEMPT: [&str; 6] = [
    "max_connections",
    "checkpoint_segments",
    "checkpoint_completion_target",
    "default_statistics_target",
    "random_page_cost",
    "seq_page_cost",
];

pub fn is_size_exempt(key: &str) -> bool {
    SIZE_EXEMPT.contains(&key)
}

// ---------------------------------------------------------------------------
// postgresql.conf values
// ---------------------------------------------------------------------------

/// Format a KB count with the largest unit that divides it evenly.
///
/// `2097152` -> `"2GB"`, `262144` -> `"256MB"`, `7864` -> `"7864kB"`.
/// Larger units are only used when no resolution is lost, so a caller that
/// wants `"16MB"` must pass exactly `16384`.
pub fn format_kb_size(kb: u64) -> String {
    if kb % KB_PER_GB == 0 {
        format!("{}GB", kb / KB_PER_GB)
    } else if kb % KB_PER_MB == 0 {
        format!("{}MB", kb / KB_PER_MB)
    } else {
        format!("{}kB", kb)
    }
}

/// Format a setting value for `postgresql.conf`.
///
/// Keys in [`SIZE_EXEMPT`] keep their bare numeric form (`"200"`, `"0.7"`);
/// all other integers are sizes in KB.
pub fn format_setting(key: &str, value: SettingValue) -> String {
    match value {
        SettingValue::Integer(v) if !is_size_exempt(key) => format_kb_size(v),
        SettingValue::Integer(v) => v.to_string(),
        SettingValue::Decimal(v) => v.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Header comments
// ---------------------------------------------------------------------------

/// Format bytes as GB with up to three decimals: `"2GB"`, `"0.5GB"`, `"0.977GB"`.
pub fn format_gb(bytes: u64) -> String {
    let gb = format!("{:.3}", bytes as f64 / BYTES_PER_GB as f64);
    let gb = gb.trim_end_matches('0').trim_end_matches('.');
    format!("{}GB", gb)
}
