use std::path::PathBuf;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

use crate::cache::CacheConfig;
use crate::mem::main_memory::DEFAULT_MEMORY_LATENCY;
use crate::mem::Pattern;

/// A config struct deserializable from one named section of the TOML file.
/// A missing section falls back to defaults with a warning.
pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    /// Run name, used in the report header and exports.
    pub name: String,
    /// Optional CSV export path for the per-level statistics.
    pub csv: Option<PathBuf>,
    /// Optional JSON export path for the full summary.
    pub json: Option<PathBuf>,
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "cachesim".to_string(),
            csv: None,
            json: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct MemConfig {
    pub access_latency: u64,
}

impl Config for MemConfig {}

impl Default for MemConfig {
    fn default() -> Self {
        Self {
            access_latency: DEFAULT_MEMORY_LATENCY,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    File,
    #[default]
    Synthetic,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TraceConfig {
    pub mode: TraceMode,
    /// Trace file path; required in file mode.
    pub path: Option<PathBuf>,
    pub pattern: Pattern,
    pub start_address: u64,
    pub end_address: u64,
    pub num_accesses: u64,
    pub stride: u64,
    pub read_ratio: f64,
    pub seed: u64,
}

impl Config for TraceConfig {}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            mode: TraceMode::Synthetic,
            path: None,
            pattern: Pattern::Sequential,
            start_address: 0,
            end_address: 0x10_0000,
            num_accesses: 100_000,
            stride: 64,
            read_ratio: 0.7,
            seed: 0,
        }
    }
}

/// Parse the ordered `[[cache]]` array into level configs, L1 first. The
/// `level` field of each entry is stamped with its array position.
pub fn cache_levels(table: &toml::Table) -> Vec<CacheConfig> {
    let Some(Value::Array(entries)) = table.get("cache") else {
        warn!("no [[cache]] sections found, using a single default level");
        return vec![CacheConfig::default()];
    };
    entries
        .iter()
        .enumerate()
        .map(|(level, entry)| {
            let mut config: CacheConfig = entry
                .clone()
                .try_into()
                .expect("cannot deserialize cache config");
            config.level = level;
            config
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InclusionPolicy, Organization};

    #[test]
    fn sections_deserialize_from_toml() {
        let table: toml::Table = toml::from_str(
            r#"
            [sim]
            name = "two_level"

            [mem]
            access_latency = 150

            [trace]
            mode = "synthetic"
            pattern = "strided"
            num_accesses = 1000

            [[cache]]
            organization = "direct_mapped"
            size = 256
            block_size = 64
            access_latency = 1

            [[cache]]
            organization = "set_associative"
            size = 4096
            associativity = 4
            policy = "FIFO"
            access_latency = 10
            inclusion_policy = "exclusive"
            "#,
        )
        .unwrap();

        let sim = SimConfig::from_section(table.get("sim"));
        assert_eq!(sim.name, "two_level");

        let mem = MemConfig::from_section(table.get("mem"));
        assert_eq!(mem.access_latency, 150);

        let trace = TraceConfig::from_section(table.get("trace"));
        assert_eq!(trace.mode, TraceMode::Synthetic);
        assert_eq!(trace.pattern, Pattern::Strided);
        assert_eq!(trace.num_accesses, 1000);

        let levels = cache_levels(&table);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].organization, Organization::DirectMapped);
        assert_eq!(levels[0].level, 0);
        assert_eq!(levels[1].policy, "FIFO");
        assert_eq!(levels[1].level, 1);
        assert_eq!(levels[1].inclusion_policy, InclusionPolicy::Exclusive);
    }

    #[test]
    fn missing_section_falls_back_to_defaults() {
        let table = toml::Table::new();
        let mem = MemConfig::from_section(table.get("mem"));
        assert_eq!(mem.access_latency, DEFAULT_MEMORY_LATENCY);
    }
}
