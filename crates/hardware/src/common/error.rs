//! Simulator error types.
//!
//! Configuration problems are reported once at construction time. Everything
//! else a request can hit is an invariant violation of the cache model and is
//! surfaced as a [`SimError`] instead of being tolerated silently.

use std::fmt;

use super::addr::PhysAddr;

/// Invalid simulator geometry or an unreadable configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A size or count that must be positive was zero.
    Zero(&'static str),
    /// A value that must be a power of two was not.
    NotPowerOfTwo { field: &'static str, value: u64 },
    /// `cache_size` is not a whole number of sets.
    NonIntegralSets {
        cache_size: usize,
        block_size: usize,
        ways: usize,
    },
    /// Memory cannot hold even one block.
    MemoryTooSmall { mem_size: usize, block_size: usize },
    /// The hierarchy needs an `l2` section.
    MissingL2,
    /// L1 and L2 lines differ in size.
    BlockSizeMismatch { l1: usize, l2: usize },
    /// The file could not be read.
    Io(String),
    /// The file is not valid TOML for [`crate::config::Config`].
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero(field) => write!(f, "`{field}` must be positive"),
            Self::NotPowerOfTwo { field, value } => {
                write!(f, "`{field}` must be a power of two (got {value})")
            }
            Self::NonIntegralSets {
                cache_size,
                block_size,
                ways,
            } => write!(
                f,
                "cache_size {cache_size} is not divisible by block_size {block_size} x associativity {ways}"
            ),
            Self::MemoryTooSmall {
                mem_size,
                block_size,
            } => write!(
                f,
                "mem_size {mem_size} must be a positive multiple of block_size {block_size}"
            ),
            Self::MissingL2 => write!(f, "hierarchy mode requires an [l2] section"),
            Self::BlockSizeMismatch { l1, l2 } => {
                write!(f, "l2 block_size {l2} differs from cache block_size {l1}")
            }
            Self::Io(msg) => write!(f, "cannot read config: {msg}"),
            Self::Parse(msg) => write!(f, "cannot parse config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A malformed trace line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceError {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for TraceError {}

#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    Config(ConfigError),
    Trace(TraceError),
    /// LRU victim requested from a set that has never been touched.
    EmptyLruStack,
    /// Way index outside the set's associativity.
    WayOutOfRange { way: usize, ways: usize },
    /// A rate was requested before any access was counted.
    NoAccesses(&'static str),
    /// The request still missed after its block was installed.
    MissAfterFill(PhysAddr),
    /// The block containing the address lies outside backing memory.
    AddressOutOfRange { addr: PhysAddr, mem_size: usize },
    CoreOutOfRange { core: usize, num_cores: usize },
    /// An L1 victim has no L2 copy to absorb its dirty data.
    InclusionViolated(PhysAddr),
    /// Parallel replay was given fewer traces than there are cores.
    TooFewTraces { traces: usize, num_cores: usize },
    /// A replay thread panicked.
    ReplayPanicked,
    /// Another core panicked while holding the bus.
    LockPoisoned,
    Io(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Trace(e) => write!(f, "{e}"),
            Self::EmptyLruStack => write!(f, "LRU lookup on a set with no recorded accesses"),
            Self::WayOutOfRange { way, ways } => {
                write!(f, "way {way} out of range for {ways}-way set")
            }
            Self::NoAccesses(what) => write!(f, "{what} is undefined with zero accesses"),
            Self::MissAfterFill(addr) => {
                write!(f, "access to {addr:#x} missed after its block was filled")
            }
            Self::AddressOutOfRange { addr, mem_size } => {
                write!(f, "address {addr:#x} outside {mem_size}-byte memory")
            }
            Self::CoreOutOfRange { core, num_cores } => {
                write!(f, "core {core} out of range ({num_cores} cores)")
            }
            Self::InclusionViolated(addr) => {
                write!(f, "dirty L1 victim {addr:#x} has no L2 copy")
            }
            Self::TooFewTraces { traces, num_cores } => {
                write!(f, "{traces} traces given for {num_cores} cores")
            }
            Self::ReplayPanicked => write!(f, "a replay thread panicked"),
            Self::LockPoisoned => write!(f, "system lock poisoned by a panicked core"),
            Self::Io(msg) => write!(f, "i/o error: {msg}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Trace(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TraceError> for SimError {
    fn from(e: TraceError) -> Self {
        Self::Trace(e)
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
