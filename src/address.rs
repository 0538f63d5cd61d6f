use std::fmt;

/// Width of a simulated address in bits.
pub const ADDRESS_BITS: u32 = u64::BITS;

/// A 64-bit physical address. Carries no cache-configuration knowledge;
/// callers supply the offset/index bit widths for every decomposition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MemoryAddress(u64);

impl MemoryAddress {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Extract bits `start..=end`. A reversed range is swapped, and the
    /// range is clamped to the valid bit indices [0, 63].
    pub fn bits(self, start: u32, end: u32) -> u64 {
        let (start, mut end) = if start <= end {
            (start, end)
        } else {
            (end, start)
        };
        if start >= ADDRESS_BITS {
            return 0;
        }
        if end >= ADDRESS_BITS {
            end = ADDRESS_BITS - 1;
        }
        let width = end - start + 1;
        let shifted = self.0 >> start;
        if width >= ADDRESS_BITS {
            shifted
        } else {
            shifted & ((1u64 << width) - 1)
        }
    }

    /// Low `offset_bits` bits: the byte offset within a block.
    pub fn block_offset(self, offset_bits: u32) -> u64 {
        if offset_bits == 0 {
            return 0;
        }
        if offset_bits >= ADDRESS_BITS {
            return self.0;
        }
        self.0 & ((1u64 << offset_bits) - 1)
    }

    /// Set index: the `index_bits` bits directly above the block offset.
    /// Zero when `index_bits == 0` (fully associative).
    pub fn index(self, offset_bits: u32, index_bits: u32) -> u64 {
        if index_bits == 0 || offset_bits >= ADDRESS_BITS {
            return 0;
        }
        let shifted = self.0 >> offset_bits;
        if index_bits >= ADDRESS_BITS {
            shifted
        } else {
            shifted & ((1u64 << index_bits) - 1)
        }
    }

    /// Tag: all bits above the offset and index fields. Zero when the two
    /// fields already cover the whole address.
    pub fn tag(self, offset_bits: u32, index_bits: u32) -> u64 {
        let low_bits = offset_bits + index_bits;
        if low_bits >= ADDRESS_BITS {
            return 0;
        }
        self.0 >> low_bits
    }

    /// Rebuild a block-aligned address from its (set, tag) decomposition.
    /// The offset field of the result is always zero.
    pub fn from_parts(set: u64, tag: u64, offset_bits: u32, index_bits: u32) -> Self {
        let low_bits = offset_bits + index_bits;
        let tag_part = if low_bits >= ADDRESS_BITS {
            0
        } else {
            tag << low_bits
        };
        let set_part = if offset_bits >= ADDRESS_BITS {
            0
        } else {
            set << offset_bits
        };
        Self(tag_part | set_part)
    }
}

impl From<u64> for MemoryAddress {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl fmt::Debug for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryAddress({:#x})", self.0)
    }
}
