use log::debug;
use serde::Serialize;

use crate::address::MemoryAddress;
use crate::cache::config::InclusionPolicy;
use crate::cache::level::{AccessType, Cache, Eviction};

/// Per-level counters snapshot, one row of `CacheHierarchy::stats`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LevelStats {
    pub level: usize,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
}

/// An ordered stack of cache levels, L0 closest to the requester. Runs the
/// multi-level access protocol and keeps the inclusion invariants of every
/// adjacent pair intact on each access.
#[derive(Debug, Clone, Default)]
pub struct CacheHierarchy {
    levels: Vec<Cache>,
}

impl CacheHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a level below the existing ones.
    pub fn add_level(&mut self, cache: Cache) {
        self.levels.push(cache);
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, idx: usize) -> Option<&Cache> {
        self.levels.get(idx)
    }

    fn inclusion_of(&self, idx: usize) -> InclusionPolicy {
        self.levels[idx].config().inclusion_policy
    }

    /// Run one reference through the hierarchy. Returns the summed latency
    /// of every level queried and whether any level hit; on a full miss the
    /// caller is expected to consult main memory.
    pub fn access(&mut self, address: MemoryAddress, kind: AccessType) -> (u64, bool) {
        if self.levels.is_empty() {
            return (0, false);
        }

        let mut total_latency = 0;

        let l0_result = self.levels[0].access(address, kind);
        total_latency += l0_result.latency;
        if l0_result.hit {
            return (total_latency, true);
        }

        // Victim displaced from L0 by the allocation above, carried through
        // this one call so an exclusive L1 can absorb it at the end.
        let mut pending: Option<Eviction> = l0_result.evicted;

        let mut hit = false;
        for i in 1..self.levels.len() {
            let result = self.levels[i].access(address, kind);
            total_latency += result.latency;
            if !result.hit {
                // The miss allocated here as well (the proactive install for
                // an inclusive level). If that displaced a block, no upper
                // level may keep a copy of it.
                if self.inclusion_of(i) == InclusionPolicy::Inclusive {
                    if let Some(eviction) = result.evicted {
                        debug!(
                            "inclusive level {} evicted {}, backinvalidating",
                            i, eviction.address
                        );
                        self.backinvalidate(eviction.address, i);
                    }
                }
                continue;
            }
            hit = true;

            if self.inclusion_of(i) == InclusionPolicy::Exclusive {
                // Move the block up: it must not stay in an exclusive lower
                // level once L0 holds it.
                if let Some(entry) = self.levels[i].get_entry(address) {
                    self.levels[i].invalidate_entry(address);
                    let force = self.levels[0].force_entry(address, entry, kind);
                    if force.evicted.is_some() {
                        pending = force.evicted;
                    }
                    debug!("exclusive hit at level {}: promoted {} to L0", i, address);
                }
            }
            break;
        }

        let allocated = !kind.is_write() || self.levels[0].config().write_allocate;
        if !hit
            && allocated
            && self.levels.len() > 1
            && self.inclusion_of(1) == InclusionPolicy::Exclusive
        {
            // Full miss with an exclusive L1: L0's own allocation already
            // holds the block, but the walk access above also installed a
            // copy at L1. Drop it to preserve exclusivity.
            self.levels[1].invalidate_entry(address);
        }

        if let Some(eviction) = pending {
            if self.levels.len() > 1
                && self.inclusion_of(1) == InclusionPolicy::Exclusive
                && eviction.address != address
            {
                // Victim caching: the block leaving L0 lands in the
                // exclusive level below instead of being dropped.
                self.levels[1].force_entry(eviction.address, eviction.entry, AccessType::Write);
                debug!("victim cached {} into level 1", eviction.address);
            }
        }

        (total_latency, hit)
    }

    /// Remove `address` from every level above `from_level`, so no upper
    /// level retains a copy of a block an inclusive level just gave up.
    fn backinvalidate(&mut self, address: MemoryAddress, from_level: usize) {
        for level in &mut self.levels[..from_level] {
            level.invalidate_entry(address);
        }
    }

    pub fn reset(&mut self) {
        for level in &mut self.levels {
            level.reset();
        }
    }

    pub fn stats(&self) -> Vec<LevelStats> {
        self.levels
            .iter()
            .enumerate()
            .map(|(level, cache)| LevelStats {
                level,
                hit_rate: cache.hit_rate(),
                hits: cache.hits(),
                misses: cache.misses(),
            })
            .collect()
    }
}
