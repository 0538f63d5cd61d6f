pub mod config;
pub mod hierarchy;
pub mod level;
pub mod policy;

#[cfg(test)]
mod unit_tests;

pub use config::{CacheConfig, ConfigError, InclusionPolicy, Organization};
pub use hierarchy::{CacheHierarchy, LevelStats};
pub use level::{AccessType, Cache, CacheEntry, CacheResult, Eviction};
pub use policy::ReplacementPolicy;
