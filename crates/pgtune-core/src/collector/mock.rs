//! In-memory filesystem for testing memory detection without a real `/proc`.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use super::traits::FileSystem;

/// In-memory filesystem.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with 16GB of RAM.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16777216 kB
MemFree:         8388608 kB
MemAvailable:   12582912 kB
Buffers:          524288 kB
Cached:          2097152 kB
SwapTotal:       4194304 kB
SwapFree:        4194304 kB
",
        );
        fs
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }
}
