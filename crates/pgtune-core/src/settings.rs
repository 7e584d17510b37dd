//! Computed PostgreSQL settings and the ordered `name = value` output map.

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::fmt::format_setting;

/// Raw setting value before formatting.
///
/// Sizes are integers in KB; [`crate::fmt::format_setting`] decides by key
/// whether an integer is a size or a plain count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SettingValue {
    Integer(u64),
    Decimal(f64),
}

/// WAL sizing, selected by PostgreSQL version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalSizing {
    /// Before 9.5: number of 16MB WAL segments between checkpoints.
    LegacyCheckpointSegments(u32),
    /// 9.5 and later: bounds in KB.
    WalSizeBounds { min_wal_size: u64, max_wal_size: u64 },
}

/// Settings derived from total memory. Absent on low memory systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemorySettings {
    pub shared_buffers: u64,
    pub effective_cache_size: u64,
    pub work_mem: u64,
    pub maintenance_work_mem: u64,
    pub wal_buffers: u64,
}

/// PostgreSQL settings with sizes in KB, prior to formatting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostgresSettings {
    pub max_connections: u32,
    pub memory: Option<MemorySettings>,
    pub wal: WalSizing,
    pub checkpoint_completion_target: f64,
    pub default_statistics_target: u32,
}

impl PostgresSettings {
    /// Settings in output order.
    pub fn entries(&self) -> Vec<(&'static str, SettingValue)> {
        use SettingValue::{Decimal, Integer};

        let mut out = vec![("max_connections", Integer(self.max_connections as u64))];

        if let Some(mem) = &self.memory {
            out.push(("shared_buffers", Integer(mem.shared_buffers)));
            out.push(("effective_cache_size", Integer(mem.effective_cache_size)));
            out.push(("work_mem", Integer(mem.work_mem)));
            out.push(("maintenance_work_mem", Integer(mem.maintenance_work_mem)));
        }

        match self.wal {
            WalSizing::LegacyCheckpointSegments(n) => {
                out.push(("checkpoint_segments", Integer(n as u64)));
            }
            WalSizing::WalSizeBounds {
                min_wal_size,
                max_wal_size,
            } => {
                out.push(("min_wal_size", Integer(min_wal_size)));
                out.push(("max_wal_size", Integer(max_wal_size)));
            }
        }

        out.push((
            "checkpoint_completion_target",
            Decimal(self.checkpoint_completion_target),
        ));

        if let Some(mem) = &self.memory {
            out.push(("wal_buffers", Integer(mem.wal_buffers)));
        }

        out.push((
            "default_statistics_target",
            Integer(self.default_statistics_target as u64),
        ));
        out
    }

    /// Formats every setting for `postgresql.conf`.
    pub fn to_config(&self) -> ConfigMap {
        let mut config = ConfigMap::new();
        for (key, value) in self.entries() {
            config.insert(key, format_setting(key, value));
        }
        config
    }
}

/// Ordered `name -> value` map of formatted settings.
///
/// Keeps insertion order; inserting an existing key replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: Vec<(String, String)>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for ConfigMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_settings() -> PostgresSettings {
        PostgresSettings {
            max_connections: 20,
            memory: Some(MemorySettings {
                shared_buffers: 262144,
                effective_cache_size: 786432,
                work_mem: 6553,
                maintenance_work_mem: 131072,
                wal_buffers: 7864,
            }),
            wal: WalSizing::LegacyCheckpointSegments(128),
            checkpoint_completion_target: 0.9,
            default_statistics_target: 500,
        }
    }

    #[test]
    fn test_entries_order() {
        let keys: Vec<&str> = legacy_settings().entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "max_connections",
                "shared_buffers",
                "effective_cache_size",
                "work_mem",
                "maintenance_work_mem",
                "checkpoint_segments",
                "checkpoint_completion_target",
                "wal_buffers",
                "default_statistics_target",
            ]
        );
    }

    #[test]
    fn test_wal_bounds_replace_segments() {
        let mut s = legacy_settings();
        s.wal = WalSizing::WalSizeBounds {
            min_wal_size: 4194304,
            max_wal_size: 8388608,
        };
        let config = s.to_config();
        assert!(!config.contains_key("checkpoint_segments"));
        assert_eq!(config.get("min_wal_size"), Some("4GB"));
        assert_eq!(config.get("max_wal_size"), Some("8GB"));
    }

    #[test]
    fn test_to_config_formats_values() {
        let config = legacy_settings().to_config();
        assert_eq!(config.get("max_connections"), Some("20"));
        assert_eq!(config.get("shared_buffers"), Some("256MB"));
        assert_eq!(config.get("work_mem"), Some("6553kB"));
        assert_eq!(config.get("checkpoint_segments"), Some("128"));
        assert_eq!(config.get("checkpoint_completion_target"), Some("0.9"));
        assert_eq!(config.get("default_statistics_target"), Some("500"));
    }

    #[test]
    fn test_without_memory_settings() {
        let mut s = legacy_settings();
        s.memory = None;
        let config = s.to_config();
        assert_eq!(config.len(), 4);
        assert!(!config.contains_key("wal_buffers"));
    }

    #[test]
    fn test_config_map_insert_replaces_in_place() {
        let mut m = ConfigMap::new();
        m.insert("a", "1");
        m.insert("b", "2");
        m.insert("a", "3");
        assert_eq!(m.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
        assert_eq!(m.remove("a"), Some("3".to_string()));
        assert_eq!(m.remove("a"), None);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_config_map_serializes_in_order() {
        let mut m = ConfigMap::new();
        m.insert("kernel.shmmax", "67108864");
        m.insert("kernel.shmall", "16384");
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"{"kernel.shmmax":"67108864","kernel.shmall":"16384"}"#
        );
    }
}
