use crate::address::MemoryAddress;
use crate::cache::AccessType;

pub const DEFAULT_MEMORY_LATENCY: u64 = 100;

/// Flat-latency main memory below the cache hierarchy. Consulted only when
/// every cache level misses (or a write bypasses on no-write-allocate).
#[derive(Debug, Clone)]
pub struct MainMemory {
    access_latency: u64,
    reads: u64,
    writes: u64,
}

impl Default for MainMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_LATENCY)
    }
}

impl MainMemory {
    pub fn new(access_latency: u64) -> Self {
        Self {
            access_latency,
            reads: 0,
            writes: 0,
        }
    }

    pub fn access(&mut self, _address: MemoryAddress, kind: AccessType) -> u64 {
        match kind {
            AccessType::Read => self.reads += 1,
            AccessType::Write => self.writes += 1,
        }
        self.access_latency
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    pub fn access_latency(&self) -> u64 {
        self.access_latency
    }

    pub fn reset(&mut self) {
        self.reads = 0;
        self.writes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_counts_and_returns_latency() {
        let mut mem = MainMemory::new(120);
        assert_eq!(mem.access(MemoryAddress::new(0x40), AccessType::Read), 120);
        assert_eq!(mem.access(MemoryAddress::new(0x80), AccessType::Write), 120);
        assert_eq!(mem.reads(), 1);
        assert_eq!(mem.writes(), 1);
        mem.reset();
        assert_eq!(mem.accesses(), 0);
        assert_eq!(mem.access_latency(), 120);
    }
}
