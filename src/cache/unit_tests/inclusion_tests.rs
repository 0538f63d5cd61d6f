use crate::address::MemoryAddress;
use crate::cache::config::{CacheConfig, InclusionPolicy, Organization};
use crate::cache::hierarchy::CacheHierarchy;
use crate::cache::level::{AccessType, Cache};

fn small_l1() -> Cache {
    // 2 sets x 2 ways.
    Cache::new(CacheConfig {
        size: 256,
        block_size: 64,
        associativity: 2,
        access_latency: 1,
        ..CacheConfig::default()
    })
    .unwrap()
}

fn l2(inclusion_policy: InclusionPolicy) -> Cache {
    // 8 sets x 2 ways.
    Cache::new(CacheConfig {
        size: 1024,
        block_size: 64,
        associativity: 2,
        access_latency: 10,
        level: 1,
        inclusion_policy,
        ..CacheConfig::default()
    })
    .unwrap()
}

fn pair(inclusion_policy: InclusionPolicy) -> CacheHierarchy {
    let mut hierarchy = CacheHierarchy::new();
    hierarchy.add_level(small_l1());
    hierarchy.add_level(l2(inclusion_policy));
    hierarchy
}

fn resident(hierarchy: &CacheHierarchy, level: usize, addr: u64) -> bool {
    hierarchy
        .level(level)
        .unwrap()
        .get_entry(MemoryAddress::new(addr))
        .is_some()
}

fn assert_exclusive(hierarchy: &CacheHierarchy, addrs: &[u64]) {
    for &addr in addrs {
        assert!(
            !(resident(hierarchy, 0, addr) && resident(hierarchy, 1, addr)),
            "{:#x} resident on both sides of an exclusive pair",
            addr
        );
    }
}

fn assert_inclusive(hierarchy: &CacheHierarchy, addrs: &[u64]) {
    for &addr in addrs {
        if resident(hierarchy, 0, addr) {
            assert!(
                resident(hierarchy, 1, addr),
                "{:#x} in L1 but not in the inclusive L2",
                addr
            );
        }
    }
}

// --- exclusive ---

#[test]
fn exclusive_fill_lands_only_in_l1() {
    let mut hierarchy = pair(InclusionPolicy::Exclusive);
    hierarchy.access(MemoryAddress::new(0x0), AccessType::Read);
    assert!(resident(&hierarchy, 0, 0x0));
    assert!(!resident(&hierarchy, 1, 0x0));
}

#[test]
fn exclusive_l1_victim_is_cached_in_l2() {
    let mut hierarchy = pair(InclusionPolicy::Exclusive);
    // 0x0, 0x100, 0x200 all map to L1 set 0; the third displaces 0x0.
    for addr in [0x0u64, 0x100, 0x200] {
        hierarchy.access(MemoryAddress::new(addr), AccessType::Read);
    }
    assert!(!resident(&hierarchy, 0, 0x0));
    assert!(resident(&hierarchy, 1, 0x0), "victim must land in L2");
    assert!(resident(&hierarchy, 0, 0x100));
    assert!(resident(&hierarchy, 0, 0x200));
    assert_exclusive(&hierarchy, &[0x0, 0x100, 0x200]);
}

#[test]
fn exclusive_l2_hit_promotes_the_block_to_l1() {
    let mut hierarchy = pair(InclusionPolicy::Exclusive);
    for addr in [0x0u64, 0x100, 0x200] {
        hierarchy.access(MemoryAddress::new(addr), AccessType::Read);
    }
    // 0x0 now lives in L2 only; touching it moves it back up and pushes
    // the displaced 0x100 down.
    let (_, hit) = hierarchy.access(MemoryAddress::new(0x0), AccessType::Read);
    assert!(hit);
    assert!(resident(&hierarchy, 0, 0x0));
    assert!(!resident(&hierarchy, 1, 0x0));
    assert!(resident(&hierarchy, 1, 0x100));
    assert!(!resident(&hierarchy, 0, 0x100));
    assert_exclusive(&hierarchy, &[0x0, 0x100, 0x200]);
}

#[test]
fn exclusive_pair_never_holds_a_block_twice() {
    let mut hierarchy = pair(InclusionPolicy::Exclusive);
    let addrs: Vec<u64> = (0..12).map(|i| i * 0x40).collect();
    // Mixed strides and revisits, writes included.
    for round in 0..4 {
        for (i, &addr) in addrs.iter().enumerate() {
            let kind = if (i + round) % 3 == 0 {
                AccessType::Write
            } else {
                AccessType::Read
            };
            hierarchy.access(MemoryAddress::new(addr), kind);
            assert_exclusive(&hierarchy, &addrs);
        }
    }
}

#[test]
fn exclusive_pair_acts_as_combined_capacity() {
    let mut hierarchy = pair(InclusionPolicy::Exclusive);
    // Four blocks of L1 set 0; L1 holds two, the two victims stay in L2.
    let addrs = [0x0u64, 0x100, 0x200, 0x300];
    for &addr in &addrs {
        hierarchy.access(MemoryAddress::new(addr), AccessType::Read);
    }
    for &addr in &addrs {
        assert!(
            resident(&hierarchy, 0, addr) || resident(&hierarchy, 1, addr),
            "{:#x} fell out of the pair",
            addr
        );
    }
    assert_exclusive(&hierarchy, &addrs);
}

// --- inclusive ---

#[test]
fn inclusive_fill_installs_in_both_levels() {
    let mut hierarchy = pair(InclusionPolicy::Inclusive);
    hierarchy.access(MemoryAddress::new(0x0), AccessType::Read);
    assert!(resident(&hierarchy, 0, 0x0));
    assert!(resident(&hierarchy, 1, 0x0));
}

#[test]
fn inclusive_eviction_backinvalidates_l1() {
    // Direct-mapped inclusive L2 (8 sets x 1 way) under a 2-way L1: the L2
    // conflict evicts a block the L1 still holds.
    let mut hierarchy = CacheHierarchy::new();
    hierarchy.add_level(small_l1());
    hierarchy.add_level(
        Cache::new(CacheConfig {
            organization: Organization::DirectMapped,
            size: 512,
            block_size: 64,
            access_latency: 10,
            level: 1,
            inclusion_policy: InclusionPolicy::Inclusive,
            ..CacheConfig::default()
        })
        .unwrap(),
    );

    hierarchy.access(MemoryAddress::new(0x0), AccessType::Read);
    assert!(resident(&hierarchy, 0, 0x0));

    // 0x200 shares L2 set 0 with 0x0 but fits next to it in L1.
    hierarchy.access(MemoryAddress::new(0x200), AccessType::Read);
    assert!(
        !resident(&hierarchy, 0, 0x0),
        "L1 must drop a block its inclusive L2 gave up"
    );
    assert!(!resident(&hierarchy, 1, 0x0));
    assert!(resident(&hierarchy, 0, 0x200));
    assert!(resident(&hierarchy, 1, 0x200));
}

#[test]
fn inclusive_invariant_survives_conflict_streams() {
    let mut hierarchy = pair(InclusionPolicy::Inclusive);
    // Blocks 0, 8, 16, 24 all collide in both L1 set 0 and L2 set 0.
    let addrs = [0x0u64, 0x200, 0x400, 0x600];
    for _ in 0..3 {
        for &addr in &addrs {
            hierarchy.access(MemoryAddress::new(addr), AccessType::Read);
            assert_inclusive(&hierarchy, &addrs);
        }
    }
}

#[test]
fn inclusive_invariant_survives_mixed_reads_and_writes() {
    let mut hierarchy = pair(InclusionPolicy::Inclusive);
    let addrs: Vec<u64> = (0..20).map(|i| i * 0x40).collect();
    for (i, &addr) in addrs.iter().enumerate().cycle().take(80) {
        let kind = if i % 4 == 0 {
            AccessType::Write
        } else {
            AccessType::Read
        };
        hierarchy.access(MemoryAddress::new(addr), kind);
        assert_inclusive(&hierarchy, &addrs);
    }
}

// --- three levels ---

#[test]
fn backinvalidation_reaches_every_upper_level() {
    // L1 and L2 both above a direct-mapped inclusive L3.
    let mut hierarchy = CacheHierarchy::new();
    hierarchy.add_level(small_l1());
    hierarchy.add_level(l2(InclusionPolicy::NonInclusiveNonExclusive));
    hierarchy.add_level(
        Cache::new(CacheConfig {
            organization: Organization::DirectMapped,
            size: 1024,
            block_size: 64,
            access_latency: 40,
            level: 2,
            inclusion_policy: InclusionPolicy::Inclusive,
            ..CacheConfig::default()
        })
        .unwrap(),
    );

    hierarchy.access(MemoryAddress::new(0x0), AccessType::Read);
    assert!(resident(&hierarchy, 0, 0x0));
    assert!(resident(&hierarchy, 1, 0x0));

    // Block 16 collides with block 0 in the 16-set L3 only.
    hierarchy.access(MemoryAddress::new(0x400), AccessType::Read);
    assert!(!resident(&hierarchy, 0, 0x0));
    assert!(!resident(&hierarchy, 1, 0x0));
    assert!(resident(&hierarchy, 2, 0x400));
}
