use serde::Deserialize;
use thiserror::Error;

/// Structural configuration problems caught at cache construction, before
/// any entries are allocated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache size must be > 0")]
    ZeroSize,
    #[error("block size must be > 0")]
    ZeroBlockSize,
    #[error("associativity must be > 0 for a set-associative cache")]
    ZeroAssociativity,
    #[error("block size {0} is not a power of two")]
    BlockSizeNotPowerOfTwo(u64),
    #[error("cache size {size} does not divide evenly into {ways} ways of {block_size}B blocks")]
    IndivisibleSize {
        size: u64,
        block_size: u64,
        ways: u64,
    },
    #[error("set count {0} is not a power of two")]
    SetCountNotPowerOfTwo(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Organization {
    DirectMapped,
    SetAssociative,
    FullyAssociative,
}

/// Relationship a level maintains with the levels above it. Meaningful only
/// for levels after the first; ignored on L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InclusionPolicy {
    Inclusive,
    Exclusive,
    /// Non-inclusive-non-exclusive: no cross-level relationship enforced.
    #[default]
    #[serde(alias = "nine")]
    NonInclusiveNonExclusive,
}

/// Organization of one cache level. Deserializes from one `[[cache]]`
/// table of the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub organization: Organization,
    /// Total capacity in bytes.
    pub size: u64,
    /// Block (line) size in bytes.
    pub block_size: u64,
    /// Number of ways; meaningful for the set-associative organization.
    pub associativity: u64,
    /// Replacement policy name; an unrecognized name falls back to LRU.
    pub policy: String,
    /// Cycles charged for one access to this level.
    pub access_latency: u64,
    pub write_back: bool,
    pub write_allocate: bool,
    /// Position in the hierarchy, 0 closest to the requester.
    pub level: usize,
    pub inclusion_policy: InclusionPolicy,
    /// Seed for the random replacement policy.
    pub seed: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            organization: Organization::SetAssociative,
            size: 65536,
            block_size: 64,
            associativity: 8,
            policy: "LRU".to_string(),
            access_latency: 1,
            write_back: true,
            write_allocate: true,
            level: 0,
            inclusion_policy: InclusionPolicy::default(),
            seed: 0,
        }
    }
}

impl CacheConfig {
    pub fn num_sets(&self) -> u64 {
        match self.organization {
            Organization::FullyAssociative => 1,
            Organization::DirectMapped => self.size / self.block_size,
            Organization::SetAssociative => self.size / (self.block_size * self.associativity),
        }
    }

    pub fn num_ways(&self) -> u64 {
        match self.organization {
            Organization::FullyAssociative => self.size / self.block_size,
            Organization::DirectMapped => 1,
            Organization::SetAssociative => self.associativity,
        }
    }

    pub fn offset_bits(&self) -> u32 {
        self.block_size.trailing_zeros()
    }

    pub fn index_bits(&self) -> u32 {
        match self.organization {
            Organization::FullyAssociative => 0,
            _ => self.num_sets().trailing_zeros(),
        }
    }

    /// Fail fast on geometry the bit-field decomposition cannot represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if !self.block_size.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(self.block_size));
        }
        if self.organization == Organization::SetAssociative && self.associativity == 0 {
            return Err(ConfigError::ZeroAssociativity);
        }
        let ways = self.num_ways();
        if ways == 0 || self.size % (self.block_size * ways) != 0 {
            return Err(ConfigError::IndivisibleSize {
                size: self.size,
                block_size: self.block_size,
                ways,
            });
        }
        let sets = self.num_sets();
        if sets == 0 {
            return Err(ConfigError::IndivisibleSize {
                size: self.size,
                block_size: self.block_size,
                ways,
            });
        }
        if !sets.is_power_of_two() {
            return Err(ConfigError::SetCountNotPowerOfTwo(sets));
        }
        Ok(())
    }
}
