//! Workload profiles and their per-parameter ratios.

use std::str::FromStr;

use crate::error::TuneError;

/// Usage pattern the server is tuned for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Workload {
    /// Web applications.
    Web,
    /// Online transaction processing.
    Oltp,
    /// Data warehouse.
    Dw,
    /// Desktop application with an embedded server.
    Desktop,
    /// Mixed web and reporting load.
    Mixed,
}

/// Fixed tuning ratios for one workload.
///
/// Divisors apply to total memory in KB unless noted otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadProfile {
    pub default_connections: u32,
    pub shared_buffers_divisor: u64,
    /// `(numerator, denominator)` applied to total memory.
    pub effective_cache_ratio: (u64, u64),
    /// Applied to the per-connection work_mem base.
    pub work_mem_divisor: u64,
    pub maintenance_work_mem_divisor: u64,
    pub checkpoint_segments: u32,
    /// `(min_wal_size, max_wal_size)` in MB.
    pub wal_size_mb: (u64, u64),
    pub checkpoint_completion_target: f64,
    pub default_statistics_target: u32,
}

const WEB: WorkloadProfile = WorkloadProfile {
    default_connections: 200,
    shared_buffers_divisor: 4,
    effective_cache_ratio: (3, 4),
    work_mem_divisor: 1,
    maintenance_work_mem_divisor: 16,
    checkpoint_segments: 32,
    wal_size_mb: (1024, 2048),
    checkpoint_completion_target: 0.7,
    default_statistics_target: 100,
};

const OLTP: WorkloadProfile = WorkloadProfile {
    default_connections: 300,
    shared_buffers_divisor: 4,
    effective_cache_ratio: (3, 4),
    work_mem_divisor: 1,
    maintenance_work_mem_divisor: 16,
    checkpoint_segments: 64,
    wal_size_mb: (2048, 4096),
    checkpoint_completion_target: 0.9,
    default_statistics_target: 100,
};

const DW: WorkloadProfile = WorkloadProfile {
    default_connections: 20,
    shared_buffers_divisor: 4,
    effective_cache_ratio: (3, 4),
    work_mem_divisor: 2,
    maintenance_work_mem_divisor: 8,
    checkpoint_segments: 128,
    wal_size_mb: (4096, 8192),
    checkpoint_completion_target: 0.9,
    default_statistics_target: 500,
};

const DESKTOP: WorkloadProfile = WorkloadProfile {
    default_connections: 5,
    shared_buffers_divisor: 16,
    effective_cache_ratio: (1, 4),
    work_mem_divisor: 6,
    maintenance_work_mem_divisor: 16,
    checkpoint_segments: 3,
    wal_size_mb: (100, 100),
    checkpoint_completion_target: 0.5,
    default_statistics_target: 100,
};

const MIXED: WorkloadProfile = WorkloadProfile {
    default_connections: 100,
    shared_buffers_divisor: 4,
    effective_cache_ratio: (3, 4),
    work_mem_divisor: 2,
    maintenance_work_mem_divisor: 16,
    checkpoint_segments: 32,
    wal_size_mb: (1024, 2048),
    checkpoint_completion_target: 0.9,
    default_statistics_target: 100,
};

impl Workload {
    pub const ALL: [Workload; 5] = [
        Workload::Web,
        Workload::Oltp,
        Workload::Dw,
        Workload::Desktop,
        Workload::Mixed,
    ];

    pub fn profile(self) -> &'static WorkloadProfile {
        match self {
            Workload::Web => &WEB,
            Workload::Oltp => &OLTP,
            Workload::Dw => &DW,
            Workload::Desktop => &DESKTOP,
            Workload::Mixed => &MIXED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Workload::Web => "web",
            Workload::Oltp => "oltp",
            Workload::Dw => "dw",
            Workload::Desktop => "desktop",
            Workload::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Workload {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "web" => Ok(Workload::Web),
            "oltp" => Ok(Workload::Oltp),
            "dw" => Ok(Workload::Dw),
            "desktop" => Ok(Workload::Desktop),
            "mixed" => Ok(Workload::Mixed),
            other => Err(TuneError::UnknownWorkloadType(other.to_string())),
        }
    }
}
