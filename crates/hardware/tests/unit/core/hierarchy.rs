//! # Hierarchy Tests

use cohesim::common::{AccessType, ConfigError, PhysAddr};
use cohesim::config::{CacheConfig, CacheType, Config};
use cohesim::core::Hierarchy;
use cohesim::core::coherence::BlockState;
use cohesim::SimError;

/// 32-byte L1 (two 16-byte halves of 2 sets x 2 ways) over an L2 of
/// `l2_size` bytes, all with 4-byte blocks and 2 ways.
fn config(l2_size: usize) -> Config {
    Config {
        num_cores: 1,
        cache: CacheConfig {
            block_size: 4,
            cache_size: 32,
            associativity: 2,
            hit_time: 1,
            miss_penalty: 100,
            cache_type: CacheType::L1,
        },
        l2: Some(CacheConfig {
            block_size: 4,
            cache_size: l2_size,
            associativity: 2,
            hit_time: 10,
            miss_penalty: 200,
            cache_type: CacheType::L2,
        }),
        ..Config::default()
    }
}

fn read(h: &mut Hierarchy, addr: u64) -> bool {
    h.access(PhysAddr(addr), AccessType::Read).unwrap()
}

#[test]
fn test_requires_l2() {
    let config = Config {
        l2: None,
        ..config(64)
    };
    assert!(matches!(
        Hierarchy::new(&config),
        Err(SimError::Config(ConfigError::MissingL2))
    ));
}

#[test]
fn test_rejects_mismatched_block_sizes() {
    let mut config = config(64);
    config.cache.block_size = 8;
    assert!(matches!(
        Hierarchy::new(&config),
        Err(SimError::Config(ConfigError::BlockSizeMismatch { l1: 8, l2: 4 }))
    ));
}

#[test]
fn test_l1_halves_split_the_configured_size() {
    let h = Hierarchy::new(&config(64)).unwrap();
    assert_eq!(h.l1_instr().config().cache_size, 16);
    assert_eq!(h.l1_data().config().cache_size, 16);
    assert_eq!(h.l1_data().config().cache_type, CacheType::L1);
    assert_eq!(h.l2().config().cache_type, CacheType::L2);
    assert_eq!(h.l2().num_sets(), 8);
}

#[test]
fn test_cold_miss_fills_both_levels() {
    let mut h = Hierarchy::new(&config(64)).unwrap();
    assert!(!read(&mut h, 0x0));
    assert!(h.l1_data().state_of(PhysAddr(0x0)).is_valid());
    assert!(h.l2().state_of(PhysAddr(0x0)).is_valid());
    assert!(!h.l1_instr().state_of(PhysAddr(0x0)).is_valid());

    assert!(read(&mut h, 0x2));
    let stats = h.stats();
    assert_eq!((stats.global.accesses, stats.global.hits, stats.global.misses), (2, 1, 1));
    assert_eq!(stats.traffic, 0);
}

#[test]
fn test_fetches_use_instruction_half() {
    let mut h = Hierarchy::new(&config(64)).unwrap();
    h.access(PhysAddr(0x40), AccessType::Fetch).unwrap();
    assert!(h.l1_instr().state_of(PhysAddr(0x40)).is_valid());
    assert!(!h.l1_data().state_of(PhysAddr(0x40)).is_valid());

    let stats = h.stats();
    assert_eq!(stats.global.instr_misses, 1);
    assert_eq!(stats.instr_miss_rate, Some(1.0));
    assert_eq!(stats.data_miss_rate, None);
}

#[test]
fn test_l2_hit_after_l1_eviction() {
    let mut h = Hierarchy::new(&config(64)).unwrap();
    // 0x0, 0x8 and 0x10 share an L1 set but not an L2 set.
    read(&mut h, 0x0);
    read(&mut h, 0x8);
    read(&mut h, 0x10);
    assert!(!h.l1_data().state_of(PhysAddr(0x0)).is_valid());
    assert!(h.l2().state_of(PhysAddr(0x0)).is_valid());

    assert!(read(&mut h, 0x0));
    let stats = h.stats();
    assert_eq!(stats.l1_data_traffic, 1);
    assert_eq!(stats.l1_instr_traffic, 0);
    assert_eq!(stats.global.hits, 1);
    assert_eq!(stats.global.misses, 3);
}

#[test]
fn test_dirty_l1_victim_marks_l2_dirty() {
    let mut h = Hierarchy::new(&config(64)).unwrap();
    h.access(PhysAddr(0x0), AccessType::Write).unwrap();
    assert!(h.l1_data().check_dirty(PhysAddr(0x0)));
    assert!(!h.l2().check_dirty(PhysAddr(0x0)));

    read(&mut h, 0x8);
    read(&mut h, 0x10);
    assert!(h.l2().check_dirty(PhysAddr(0x0)));
    assert_eq!(h.l2().state_of(PhysAddr(0x0)), BlockState::Modified);
    assert_eq!(h.stats().l1_data_traffic, 1);
}

#[test]
fn test_l2_eviction_keeps_inclusion() {
    // One-set L2: the third distinct block evicts the first.
    let mut h = Hierarchy::new(&config(8)).unwrap();
    h.access(PhysAddr(0x0), AccessType::Write).unwrap();
    read(&mut h, 0x4);
    read(&mut h, 0x8);

    assert!(!h.l2().state_of(PhysAddr(0x0)).is_valid());
    assert!(!h.l1_data().state_of(PhysAddr(0x0)).is_valid());
    let stats = h.stats();
    assert_eq!(stats.global.writebacks, 1);
    assert_eq!(stats.l1_data_traffic, 1);
}

#[test]
fn test_clean_l2_eviction_is_not_a_writeback() {
    let mut h = Hierarchy::new(&config(8)).unwrap();
    read(&mut h, 0x0);
    read(&mut h, 0x4);
    read(&mut h, 0x8);
    assert_eq!(h.stats().global.writebacks, 0);
}

#[test]
fn test_amat() {
    let mut h = Hierarchy::new(&config(64)).unwrap();
    assert!(matches!(h.amat(), Err(SimError::NoAccesses(_))));
    assert_eq!(h.stats().amat, None);

    read(&mut h, 0x0);
    read(&mut h, 0x0);
    // 1 + 1/2 * (10 + 1/1 * 200)
    assert_eq!(h.amat(), Ok(106.0));
}

#[test]
fn test_stats_name_each_level() {
    let mut h = Hierarchy::new(&config(64)).unwrap();
    read(&mut h, 0x0);
    let stats = h.stats();
    assert_eq!(stats.l1_data.name, "L1-D");
    assert_eq!(stats.l1_instr.name, "L1-I");
    assert_eq!(stats.l2.name, "L2");
    assert_eq!(stats.l2.counters.misses, 1);
}
