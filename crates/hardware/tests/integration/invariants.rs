//! Randomised request streams checked against a flat reference memory.

use std::collections::HashMap;

use crate::common::harness::TestHarness;
use cohesim::common::{AccessType, PhysAddr};
use cohesim::config::Protocol;
use cohesim::core::coherence::BlockState;
use proptest::prelude::*;

const CORES: usize = 3;
/// 64 bytes: 16 blocks competing for 2 sets of 2 ways per cache.
const SPAN: u64 = 64;

fn op_strategy() -> impl Strategy<Value = (usize, AccessType, u64, u8)> {
    (
        0..CORES,
        prop_oneof![
            Just(AccessType::Read),
            Just(AccessType::Write),
            Just(AccessType::Fetch),
        ],
        0..SPAN,
        any::<u8>(),
    )
}

fn protocol_strategy() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::Msi), Just(Protocol::Mesi)]
}

/// Every valid copy agrees with the reference, and memory does too for any
/// byte whose block no cache holds dirty.
fn check_values(h: &TestHarness, model: &HashMap<u64, u8>) -> Result<(), TestCaseError> {
    h.sys
        .inspect(|caches, memory| {
            for addr in 0..SPAN {
                let expected = model.get(&addr).copied().unwrap_or(0);
                let a = PhysAddr(addr);
                let mut dirty = false;
                for cache in caches {
                    if let Some(byte) = cache.peek(a) {
                        prop_assert_eq!(byte, expected, "cache{} at {:#x}", cache.id(), addr);
                    }
                    dirty |= cache.check_dirty(a);
                }
                if !dirty {
                    prop_assert_eq!(memory.read_u8(a).unwrap(), expected, "memory at {:#x}", addr);
                }
            }
            Ok(())
        })
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_reads_see_last_write(
        protocol in protocol_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let h = TestHarness::new(protocol, CORES);
        let mut model: HashMap<u64, u8> = HashMap::new();

        for (core, access, addr, data) in ops {
            let got = h.sys.access(core, PhysAddr(addr), access, data).unwrap();
            if access.is_write() {
                model.insert(addr, data);
                prop_assert_eq!(got, data);
            } else {
                prop_assert_eq!(got, model.get(&addr).copied().unwrap_or(0));
            }
            h.assert_single_owner();
        }
        check_values(&h, &model)?;
    }

    #[test]
    fn prop_single_core_read_after_write(
        protocol in protocol_strategy(),
        writes in prop::collection::vec((0..SPAN, any::<u8>()), 1..64),
    ) {
        let h = TestHarness::new(protocol, 1);
        for &(addr, data) in &writes {
            h.write(0, addr, data);
            prop_assert_eq!(h.read(0, addr), data);
        }
        let stats = h.stats();
        let c = &stats.caches[0].counters;
        prop_assert_eq!(c.accesses, 2 * writes.len() as u64);
        prop_assert_eq!(c.hits + c.misses, c.accesses);
        prop_assert!(c.writebacks <= c.misses);
    }

    #[test]
    fn prop_modified_copy_is_unique(
        ops in prop::collection::vec(op_strategy(), 1..100),
    ) {
        let h = TestHarness::new(Protocol::Mesi, CORES);
        for (core, access, addr, data) in ops {
            h.sys.access(core, PhysAddr(addr), access, data).unwrap();
            let owners = (0..CORES)
                .filter(|&c| h.state(c, addr) == BlockState::Modified)
                .count();
            prop_assert!(owners <= 1);
            if access.is_write() {
                prop_assert_eq!(h.state(core, addr), BlockState::Modified);
            }
        }
    }
}
