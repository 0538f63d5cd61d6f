use log::debug;

use crate::address::MemoryAddress;
use crate::cache::config::{CacheConfig, ConfigError};
use crate::cache::policy::ReplacementPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

impl AccessType {
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }

    pub fn short(self) -> &'static str {
        match self {
            Self::Read => "R",
            Self::Write => "W",
        }
    }
}

/// One (set, way) slot of the tag store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub valid: bool,
    pub dirty: bool,
    pub tag: u64,
}

impl CacheEntry {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A block displaced by an allocation, carried whole so an exclusive lower
/// level can absorb it.
#[derive(Debug, Clone, Copy)]
pub struct Eviction {
    pub address: MemoryAddress,
    pub entry: CacheEntry,
}

/// Outcome of one access to a single level.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheResult {
    pub hit: bool,
    /// This level's own latency only; downstream latency is the caller's
    /// to add.
    pub latency: u64,
    /// A dirty victim was displaced and must be written downstream.
    pub write_back: bool,
    pub evicted: Option<Eviction>,
}

/// One level of the hierarchy: a sets × ways grid of entries plus a
/// replacement policy and hit/miss counters.
#[derive(Debug, Clone)]
pub struct Cache {
    config: CacheConfig,
    policy: ReplacementPolicy,
    sets: Vec<Vec<CacheEntry>>,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Build a level from its configuration, failing fast on invalid
    /// geometry before any entries are allocated.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let num_sets = config.num_sets() as usize;
        let num_ways = config.num_ways() as usize;
        let policy = ReplacementPolicy::from_name(&config.policy, config.seed);
        Ok(Self {
            config,
            policy,
            sets: vec![vec![CacheEntry::default(); num_ways]; num_sets],
            hits: 0,
            misses: 0,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        if self.accesses() == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses() as f64
        }
    }

    pub fn set_and_tag(&self, address: MemoryAddress) -> (u64, u64) {
        let offset_bits = self.config.offset_bits();
        let index_bits = self.config.index_bits();
        (
            address.index(offset_bits, index_bits),
            address.tag(offset_bits, index_bits),
        )
    }

    fn reconstruct(&self, set: u64, tag: u64) -> MemoryAddress {
        MemoryAddress::from_parts(set, tag, self.config.offset_bits(), self.config.index_bits())
    }

    fn find(&self, set: u64, tag: u64) -> Option<usize> {
        self.sets[set as usize]
            .iter()
            .position(|entry| entry.valid && entry.tag == tag)
    }

    /// Run one read or write through this level.
    pub fn access(&mut self, address: MemoryAddress, kind: AccessType) -> CacheResult {
        let mut result = CacheResult {
            latency: self.config.access_latency,
            ..CacheResult::default()
        };
        let (set, tag) = self.set_and_tag(address);

        if let Some(way) = self.find(set, tag) {
            self.hits += 1;
            result.hit = true;
            self.policy.touch(set, way as u64);
            // Write-through propagation is the caller's concern; only the
            // dirty bit is tracked here.
            if kind.is_write() && self.config.write_back {
                self.sets[set as usize][way].dirty = true;
            }
            debug!(
                "L{} {} {}: hit (set {} way {})",
                self.config.level,
                kind.short(),
                address,
                set,
                way
            );
        } else {
            self.misses += 1;
            // A no-write-allocate write miss bypasses to the next level;
            // nothing changes here.
            if !kind.is_write() || self.config.write_allocate {
                let alloc = self.allocate(set, tag, kind);
                result.write_back = alloc.write_back;
                result.evicted = alloc.evicted;
            }
            debug!(
                "L{} {} {}: miss (set {})",
                self.config.level,
                kind.short(),
                address,
                set
            );
        }

        result
    }

    /// Install a new block in `set`, displacing a victim if the chosen way
    /// holds one.
    fn allocate(&mut self, set: u64, tag: u64, kind: AccessType) -> CacheResult {
        let mut result = CacheResult::default();
        let way = self.policy.victim(set, self.sets[set as usize].len() as u64);
        let victim = self.sets[set as usize][way as usize];

        if victim.valid {
            let address = self.reconstruct(set, victim.tag);
            if self.config.write_back && victim.dirty {
                result.write_back = true;
            }
            result.evicted = Some(Eviction {
                address,
                entry: victim,
            });
        }

        let slot = &mut self.sets[set as usize][way as usize];
        slot.valid = true;
        slot.tag = tag;
        slot.dirty = kind.is_write() && self.config.write_back;

        self.policy.touch(set, way);
        result
    }

    /// Read an entry without touching counters or policy state.
    pub fn get_entry(&self, address: MemoryAddress) -> Option<CacheEntry> {
        let (set, tag) = self.set_and_tag(address);
        self.find(set, tag).map(|way| self.sets[set as usize][way])
    }

    /// Drop the block holding `address`, if resident. No counters move.
    pub fn invalidate_entry(&mut self, address: MemoryAddress) {
        let (set, tag) = self.set_and_tag(address);
        if let Some(way) = self.find(set, tag) {
            self.sets[set as usize][way].reset();
        }
    }

    /// Install a pre-existing entry (a block migrating between levels)
    /// through the normal victim-selection path, reporting any consequent
    /// eviction exactly like `access`. Does not touch the hit/miss
    /// counters.
    pub fn force_entry(
        &mut self,
        address: MemoryAddress,
        entry: CacheEntry,
        kind: AccessType,
    ) -> CacheResult {
        let mut result = CacheResult {
            latency: self.config.access_latency,
            ..CacheResult::default()
        };
        let (set, tag) = self.set_and_tag(address);

        let way = match self.find(set, tag) {
            Some(way) => way as u64,
            None => {
                let way = self.policy.victim(set, self.sets[set as usize].len() as u64);
                let victim = self.sets[set as usize][way as usize];
                if victim.valid {
                    let victim_address = self.reconstruct(set, victim.tag);
                    if self.config.write_back && victim.dirty {
                        result.write_back = true;
                    }
                    result.evicted = Some(Eviction {
                        address: victim_address,
                        entry: victim,
                    });
                }
                way
            }
        };

        let slot = &mut self.sets[set as usize][way as usize];
        *slot = entry;
        slot.tag = tag;
        slot.valid = true;
        if kind.is_write() && self.config.write_back {
            slot.dirty = true;
        }

        self.policy.touch(set, way);
        result
    }

    /// Clear entries, counters, and policy state; the configuration stays.
    pub fn reset(&mut self) {
        for set in &mut self.sets {
            for entry in set {
                entry.reset();
            }
        }
        self.policy.reset();
        self.hits = 0;
        self.misses = 0;
    }
}
