use std::collections::{HashMap, HashSet};

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;

/// Per-set way ordering. Sets are tracked lazily, on first touch.
type WayOrder = HashMap<u64, SmallVec<[u64; 8]>>;

/// Victim-selection state machine for one cache level.
///
/// Whatever the variant, `victim()` hands out an untouched way while the set
/// still has one; the policy-specific order only applies once every way of
/// the set has been touched.
#[derive(Debug, Clone)]
pub enum ReplacementPolicy {
    /// MRU-first list per set; victim is the tail.
    Lru { order: WayOrder },
    /// Insertion-order list per set. Re-touching a way that is already
    /// tracked does not reorder it; victim is the oldest insertion.
    Fifo { order: WayOrder },
    /// Uniform draw once the set is warm.
    Random {
        seen: HashMap<u64, HashSet<u64>>,
        rng: StdRng,
    },
}

impl ReplacementPolicy {
    pub fn lru() -> Self {
        Self::Lru {
            order: WayOrder::new(),
        }
    }

    pub fn fifo() -> Self {
        Self::Fifo {
            order: WayOrder::new(),
        }
    }

    pub fn random(seed: u64) -> Self {
        Self::Random {
            seen: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Look up a policy by its config-file name. An unrecognized name is
    /// not an error; it falls back to LRU with a warning.
    pub fn from_name(name: &str, seed: u64) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "LRU" => Self::lru(),
            "FIFO" => Self::fifo(),
            "RANDOM" => Self::random(seed),
            other => {
                warn!("unknown replacement policy '{}', defaulting to LRU", other);
                Self::lru()
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lru { .. } => "LRU",
            Self::Fifo { .. } => "FIFO",
            Self::Random { .. } => "Random",
        }
    }

    /// Record a touch of `way` in `set`.
    pub fn touch(&mut self, set: u64, way: u64) {
        match self {
            Self::Lru { order } => {
                let stack = order.entry(set).or_default();
                if let Some(pos) = stack.iter().position(|&w| w == way) {
                    stack.remove(pos);
                }
                stack.insert(0, way);
            }
            Self::Fifo { order } => {
                let queue = order.entry(set).or_default();
                if !queue.contains(&way) {
                    queue.push(way);
                }
            }
            Self::Random { seen, .. } => {
                seen.entry(set).or_default().insert(way);
            }
        }
    }

    /// Select the eviction candidate for `set` out of `num_ways` ways.
    pub fn victim(&mut self, set: u64, num_ways: u64) -> u64 {
        match self {
            Self::Lru { order } => match order.get(&set) {
                Some(stack) if stack.len() as u64 >= num_ways => {
                    stack.last().copied().unwrap_or(0)
                }
                Some(stack) => first_untracked(stack, num_ways),
                None => 0,
            },
            Self::Fifo { order } => match order.get(&set) {
                Some(queue) if queue.len() as u64 >= num_ways => {
                    queue.first().copied().unwrap_or(0)
                }
                Some(queue) => first_untracked(queue, num_ways),
                None => 0,
            },
            Self::Random { seen, rng } => {
                let touched = seen.entry(set).or_default();
                if (touched.len() as u64) < num_ways {
                    for way in 0..num_ways {
                        if touched.insert(way) {
                            return way;
                        }
                    }
                }
                rng.gen_range(0..num_ways)
            }
        }
    }

    /// Drop all per-set state.
    pub fn reset(&mut self) {
        match self {
            Self::Lru { order } | Self::Fifo { order } => order.clear(),
            Self::Random { seen, .. } => seen.clear(),
        }
    }
}

fn first_untracked(tracked: &[u64], num_ways: u64) -> u64 {
    (0..num_ways)
        .find(|way| !tracked.contains(way))
        .unwrap_or(0)
}
