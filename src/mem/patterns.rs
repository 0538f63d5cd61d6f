use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::address::MemoryAddress;
use crate::cache::AccessType;
use crate::mem::trace::{MemoryAccess, TraceSource};

/// Number of distinct addresses the looping pattern cycles through.
const LOOP_WINDOW: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Walk the address range byte by byte, wrapping around.
    #[default]
    Sequential,
    /// Uniform random addresses within the range.
    Random,
    /// Fixed-stride walk, wrapping around.
    Strided,
    /// Cycle through a small pre-generated set of random addresses.
    Looping,
}

/// Algorithmic trace generator: a fixed number of accesses over
/// `[start_address, end_address)`, with reads drawn per `read_ratio`.
#[derive(Debug, Clone)]
pub struct SyntheticTrace {
    pattern: Pattern,
    start_address: u64,
    end_address: u64,
    num_accesses: u64,
    stride: u64,
    read_ratio: f64,
    seed: u64,
    current: u64,
    rng: StdRng,
    loop_addresses: Vec<u64>,
}

impl SyntheticTrace {
    pub fn new(
        pattern: Pattern,
        start_address: u64,
        end_address: u64,
        num_accesses: u64,
        stride: u64,
        read_ratio: f64,
        seed: u64,
    ) -> Self {
        // Normalize an empty or inverted window to one address; with
        // start < end the range arithmetic below cannot overflow.
        let start_address = start_address.min(u64::MAX - 1);
        let end_address = end_address.max(start_address + 1);
        let mut rng = StdRng::seed_from_u64(seed);
        let loop_addresses = if pattern == Pattern::Looping {
            (0..LOOP_WINDOW.min(end_address - start_address))
                .map(|_| rng.gen_range(start_address..end_address))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            pattern,
            start_address,
            end_address,
            num_accesses,
            stride: stride.max(1),
            read_ratio: read_ratio.clamp(0.0, 1.0),
            seed,
            current: 0,
            rng,
            loop_addresses,
        }
    }

    fn span(&self) -> u64 {
        self.end_address - self.start_address
    }

    fn generate_address(&mut self) -> u64 {
        match self.pattern {
            Pattern::Sequential => self.start_address + self.current % self.span(),
            Pattern::Random => self.rng.gen_range(self.start_address..self.end_address),
            Pattern::Strided => self.start_address + (self.current * self.stride) % self.span(),
            Pattern::Looping => {
                self.loop_addresses[(self.current % self.loop_addresses.len() as u64) as usize]
            }
        }
    }

    fn generate_kind(&mut self) -> AccessType {
        if self.rng.gen_bool(self.read_ratio) {
            AccessType::Read
        } else {
            AccessType::Write
        }
    }
}

impl TraceSource for SyntheticTrace {
    fn next_access(&mut self) -> anyhow::Result<Option<MemoryAccess>> {
        if self.current >= self.num_accesses {
            return Ok(None);
        }
        let address = MemoryAddress::new(self.generate_address());
        let kind = self.generate_kind();
        self.current += 1;
        Ok(Some(MemoryAccess { address, kind }))
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        self.current = 0;
        self.rng = StdRng::seed_from_u64(self.seed);
        if self.pattern == Pattern::Looping {
            self.loop_addresses = (0..LOOP_WINDOW.min(self.span()))
                .map(|_| self.rng.gen_range(self.start_address..self.end_address))
                .collect();
        }
        Ok(())
    }
}
