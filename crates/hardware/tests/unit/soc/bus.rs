//! # Bus Tests

use cohesim::common::PhysAddr;
use cohesim::core::coherence::BusMessage;
use cohesim::soc::Bus;
use rstest::rstest;

#[test]
fn test_new_bus_is_idle() {
    let bus = Bus::new(16, 8);
    assert_eq!(bus.message, None);
    assert_eq!(bus.source_core, None);
    assert_eq!(bus.data.len(), 16);
}

#[test]
fn test_begin_and_release() {
    let mut bus = Bus::new(16, 8);
    bus.message = Some(BusMessage::WriteMiss);
    bus.begin(3, PhysAddr(0x40));
    assert_eq!(bus.message, None);
    assert_eq!(bus.source_core, Some(3));
    assert_eq!(bus.address, PhysAddr(0x40));

    bus.message = Some(BusMessage::ReadMiss);
    bus.release();
    assert_eq!(bus.message, None);
    assert_eq!(bus.source_core, None);
}

#[rstest]
#[case(16, 8, 2)]
#[case(16, 16, 1)]
#[case(16, 32, 1)]
#[case(64, 8, 8)]
#[case(12, 8, 2)]
fn test_transit_beats(#[case] bytes: usize, #[case] width: usize, #[case] beats: u64) {
    let bus = Bus::new(16, width);
    assert_eq!(bus.transit_beats(bytes), beats);
}
