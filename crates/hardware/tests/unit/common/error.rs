//! # Error Tests

use std::error::Error;

use cohesim::common::{ConfigError, PhysAddr, SimError, TraceError};

#[test]
fn test_config_error_display() {
    assert_eq!(
        ConfigError::Zero("num_cores").to_string(),
        "`num_cores` must be positive"
    );
    assert_eq!(
        ConfigError::NotPowerOfTwo {
            field: "block_size",
            value: 12
        }
        .to_string(),
        "`block_size` must be a power of two (got 12)"
    );
}

#[test]
fn test_sim_error_display() {
    assert_eq!(
        SimError::AddressOutOfRange {
            addr: PhysAddr(0x2000),
            mem_size: 4096
        }
        .to_string(),
        "address 0x2000 outside 4096-byte memory"
    );
    assert_eq!(
        SimError::WayOutOfRange { way: 4, ways: 2 }.to_string(),
        "way 4 out of range for 2-way set"
    );
    assert_eq!(
        SimError::NoAccesses("miss rate").to_string(),
        "miss rate is undefined with zero accesses"
    );
}

#[test]
fn test_replay_and_hierarchy_error_display() {
    assert_eq!(
        ConfigError::BlockSizeMismatch { l1: 8, l2: 4 }.to_string(),
        "l2 block_size 4 differs from cache block_size 8"
    );
    assert_eq!(
        SimError::InclusionViolated(PhysAddr(0x40)).to_string(),
        "dirty L1 victim 0x40 has no L2 copy"
    );
    assert_eq!(
        SimError::TooFewTraces {
            traces: 1,
            num_cores: 4
        }
        .to_string(),
        "1 traces given for 4 cores"
    );
    // A panicked replay thread is not reported as a poisoned lock.
    assert_ne!(SimError::ReplayPanicked, SimError::LockPoisoned);
    assert_eq!(SimError::ReplayPanicked.to_string(), "a replay thread panicked");
}

#[test]
fn test_conversions_keep_source() {
    let err: SimError = ConfigError::MissingL2.into();
    assert_eq!(err, SimError::Config(ConfigError::MissingL2));
    assert!(err.source().is_some());

    let err: SimError = TraceError {
        line: 3,
        reason: "missing address".into(),
    }
    .into();
    assert_eq!(err.to_string(), "trace line 3: missing address");
    assert!(err.source().is_some());

    assert!(SimError::EmptyLruStack.source().is_none());
}

#[test]
fn test_io_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: SimError = io.into();
    assert!(matches!(err, SimError::Io(msg) if msg.contains("gone")));
}
