//! Non-fatal advisories emitted alongside a computed configuration.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    /// Memory budget below 256 MB: memory-derived settings were skipped.
    pub fn low_memory() -> Self {
        Self {
            id: "low_memory",
            severity: Severity::Warning,
            message: "not optimal for low memory systems (below 256MB); \
                      memory settings were not generated"
                .to_string(),
        }
    }

    /// Memory budget at or above 100 GB.
    pub fn very_high_memory() -> Self {
        Self {
            id: "very_high_memory",
            severity: Severity::Warning,
            message: "not optimal for very high memory systems (100GB and above)".to_string(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
