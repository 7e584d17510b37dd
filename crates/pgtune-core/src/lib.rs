//! pgtune-core — PostgreSQL and kernel tuning calculator.
//!
//! Provides:
//! - `postgres` — PostgreSQL settings derived from memory, workload and version
//! - `kernel` — System V shared memory limits for legacy PostgreSQL versions
//! - `fmt` — size formatting for `postgresql.conf` values
//! - `collector` — total memory detection from `/proc/meminfo`
//! - `writer` — `key = value` rendering and change-detecting file writes
//! - `tune` — request validation and the end-to-end tuning run

pub mod collector;
pub mod error;
pub mod fmt;
pub mod input;
pub mod kernel;
pub mod notice;
pub mod postgres;
pub mod settings;
pub mod tune;
pub mod workload;
pub mod writer;

pub use error::TuneError;
pub use input::{OsType, PgVersion, TuningInput};
pub use kernel::compute_kernel_settings;
pub use notice::{Notice, Severity};
pub use postgres::{PostgresTuning, compute_postgres_settings};
pub use settings::{ConfigMap, PostgresSettings, SettingValue, WalSizing};
pub use tune::{TuneReport, TuneRequest, tune};
pub use workload::Workload;
