//! End-to-end tuning run: validate the request, compute both configurations,
//! write the files and report what changed.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::collector::{FileSystem, detect_total_memory};
use crate::error::TuneError;
use crate::input::{OsType, PgVersion, TuningInput};
use crate::kernel::compute_kernel_settings;
use crate::notice::Notice;
use crate::postgres::compute_postgres_settings;
use crate::settings::ConfigMap;
use crate::workload::Workload;
use crate::writer::{PostgresHeader, WriteOutcome, render_postgres, render_settings, write_config};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;
const TB: u64 = 1024 * GB;

/// Default location of the proc filesystem.
pub const DEFAULT_PROC_PATH: &str = "/proc";

/// A tuning request as supplied by the caller, before validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TuneRequest {
    /// PostgreSQL version, e.g. `"9.6"` or `"16"`.
    pub db_version: String,
    /// Workload type: web, oltp, dw, desktop or mixed.
    pub db_type: String,
    /// Memory budget as `<N>KB|MB|GB|TB`. Detected from `meminfo` when `None`.
    pub total_memory: Option<String>,
    /// Share of `total_memory` to tune for, 1-100.
    pub total_memory_percentage: u32,
    pub max_connections: Option<i64>,
    /// Compute with `max_connections` but leave it out of the PostgreSQL file.
    pub disable_max_connections: bool,
    pub postgresql_file: PathBuf,
    /// Kernel settings are only written when a path is given.
    pub sysctl_file: Option<PathBuf>,
    pub os_type: String,
    pub proc_path: PathBuf,
}

impl TuneRequest {
    pub fn new(
        db_version: impl Into<String>,
        db_type: impl Into<String>,
        postgresql_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db_version: db_version.into(),
            db_type: db_type.into(),
            total_memory: None,
            total_memory_percentage: 100,
            max_connections: None,
            disable_max_connections: false,
            postgresql_file: postgresql_file.into(),
            sysctl_file: None,
            os_type: "linux".to_string(),
            proc_path: PathBuf::from(DEFAULT_PROC_PATH),
        }
    }
}

/// Computed configurations, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct TunePlan {
    pub header: PostgresHeader,
    pub postgresql: ConfigMap,
    pub kernel: ConfigMap,
    pub notices: Vec<Notice>,
}

impl TunePlan {
    pub fn render_postgres(&self) -> String {
        render_postgres(&self.header, &self.postgresql)
    }

    pub fn render_kernel(&self) -> String {
        render_settings(&self.kernel)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TuneConfig {
    pub postgresql: ConfigMap,
    pub kernel: ConfigMap,
}

/// Outcome of a tuning run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TuneReport {
    /// `true` if any written file changed.
    pub changed: bool,
    pub config: TuneConfig,
    pub notices: Vec<Notice>,
    pub files: Vec<WriteOutcome>,
}

/// Validates the request and computes both configurations without writing.
pub fn plan<F: FileSystem + ?Sized>(request: &TuneRequest, fs: &F) -> Result<TunePlan, TuneError> {
    let db_version: PgVersion = request.db_version.parse()?;
    let workload: Workload = request.db_type.parse()?;
    let os_type: OsType = request.os_type.parse()?;

    let percentage = request.total_memory_percentage;
    if !(1..=100).contains(&percentage) {
        return Err(TuneError::InvalidPercentage(percentage));
    }

    let total_memory = match &request.total_memory {
        Some(size) => parse_memory_size(size)?,
        None => detect_total_memory(fs, &request.proc_path)? / MB * MB,
    };
    let allocated = scale_memory(total_memory, percentage);

    let input = TuningInput::new(db_version, workload, allocated)
        .with_os_type(os_type)
        .with_max_connections(request.max_connections);

    let postgres = compute_postgres_settings(&input);
    let mut postgresql = postgres.to_config();
    if request.disable_max_connections {
        postgresql.remove("max_connections");
    }
    let kernel = compute_kernel_settings(db_version, os_type, allocated);

    Ok(TunePlan {
        header: PostgresHeader {
            db_version,
            workload,
            total_memory_bytes: total_memory,
            allocated_memory_bytes: allocated,
            memory_percentage: percentage,
        },
        postgresql,
        kernel,
        notices: postgres.notices,
    })
}

/// Runs the full tuning: validate, compute, write both files.
///
/// Nothing is written if validation fails.
pub fn tune<F: FileSystem + ?Sized>(request: &TuneRequest, fs: &F) -> Result<TuneReport, TuneError> {
    let plan = plan(request, fs)?;

    let mut files = vec![write_config(
        &request.postgresql_file,
        &plan.render_postgres(),
    )?];
    if let Some(path) = &request.sysctl_file {
        files.push(write_config(path, &plan.render_kernel())?);
    }

    let changed = files.iter().any(|f| f.changed);
    info!(
        workload = %plan.header.workload,
        version = %plan.header.db_version,
        changed,
        "tuning complete"
    );

    Ok(TuneReport {
        changed,
        config: TuneConfig {
            postgresql: plan.postgresql,
            kernel: plan.kernel,
        },
        notices: plan.notices,
        files,
    })
}

/// Parses a memory size such as `"512MB"` or `"16GB"` into bytes.
pub fn parse_memory_size(s: &str) -> Result<u64, TuneError> {
    let s = s.trim();
    let invalid = || TuneError::InvalidMemorySize(s.to_string());

    let (num_str, multiplier) = if let Some(num) = s.strip_suffix("TB") {
        (num, TB)
    } else if let Some(num) = s.strip_suffix("GB") {
        (num, GB)
    } else if let Some(num) = s.strip_suffix("MB") {
        (num, MB)
    } else if let Some(num) = s.strip_suffix("KB") {
        (num, KB)
    } else {
        return Err(invalid());
    };

    let n = num_str.trim().parse::<u64>().map_err(|_| invalid())?;
    if n == 0 {
        return Err(invalid());
    }
    n.checked_mul(multiplier).ok_or_else(invalid)
}

/// `floor(total * percentage / 100)`.
fn scale_memory(total: u64, percentage: u32) -> u64 {
    (total as u128 * percentage as u128 / 100) as u64
}
