//! Rendering and writing of the generated configuration files.
//!
//! Files are written atomically (`.tmp` + rename) through any symlink at the
//! destination, keeping the existing file mode. The content hash is taken
//! before and after the write to report whether the file actually changed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::TuneError;
use crate::fmt::format_gb;
use crate::input::PgVersion;
use crate::settings::ConfigMap;
use crate::workload::Workload;

/// Values recorded in the comment header of the PostgreSQL file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostgresHeader {
    pub db_version: PgVersion,
    pub workload: Workload,
    /// Memory as requested, before percentage scaling.
    pub total_memory_bytes: u64,
    /// Memory the settings were computed for.
    pub allocated_memory_bytes: u64,
    pub memory_percentage: u32,
}

/// Result of writing one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub path: PathBuf,
    pub changed: bool,
}

/// Renders `key = value` lines, one per setting.
pub fn render_settings(config: &ConfigMap) -> String {
    let mut out = String::new();
    for (key, value) in config.iter() {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Renders the PostgreSQL file: comment header followed by the settings.
pub fn render_postgres(header: &PostgresHeader, config: &ConfigMap) -> String {
    let mut out = format!(
        "# pgtune db_version = {}\n\
         # pgtune db_type = {}\n\
         # pgtune total_memory = {}\n\
         # pgtune total_memory allocated = {} ({}%)\n",
        header.db_version,
        header.workload,
        format_gb(header.total_memory_bytes),
        format_gb(header.allocated_memory_bytes),
        header.memory_percentage,
    );
    out.push_str(&render_settings(config));
    out
}

/// Writes `content` to `path`, creating missing parent directories.
///
/// `changed` is `true` when the file did not exist or its content differs.
pub fn write_config(path: &Path, content: &str) -> Result<WriteOutcome, TuneError> {
    let io_err = |source: io::Error| TuneError::Io {
        path: path.to_path_buf(),
        source,
    };

    let before = hash_file(path).map_err(io_err)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    write_atomic(path, content.as_bytes()).map_err(io_err)?;

    let after = hash_file(path).map_err(io_err)?;
    let changed = before != after;

    info!(path = %path.display(), changed, "wrote configuration");
    Ok(WriteOutcome {
        path: path.to_path_buf(),
        changed,
    })
}

/// xxh3 hash of the file content, `None` if the file does not exist.
fn hash_file(path: &Path) -> io::Result<Option<u64>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(xxh3_64(&data))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes through symlinks and keeps the mode of an existing file. The
/// temporary file is created next to the resolved target and removed again if
/// any step fails.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e),
    };
    let permissions = match fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let mut tmp_path = target.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    let result =
        write_tmp(&tmp_path, data, permissions).and_then(|()| fs::rename(&tmp_path, &target));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_tmp(
    tmp_path: &Path,
    data: &[u8],
    permissions: Option<fs::Permissions>,
) -> io::Result<()> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(data)?;
    if let Some(permissions) = permissions {
        file.set_permissions(permissions)?;
    }
    file.sync_all()
}
