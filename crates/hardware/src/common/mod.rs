//! Types shared across the simulator.

/// Physical address decoding.
pub mod addr;

/// Error types.
pub mod error;

pub use self::addr::{AddressDecoder, AddressParts, PhysAddr};
pub use self::error::{ConfigError, SimError, SimResult, TraceError};

/// Kind of processor request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Instruction fetch.
    Fetch,
    /// Data load.
    Read,
    /// Data store.
    Write,
}

impl AccessType {
    /// Decodes the numeric kind used by trace files (`0` read, `1` write, `2` fetch).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Read),
            1 => Some(Self::Write),
            2 => Some(Self::Fetch),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_write(self) -> bool {
        self == Self::Write
    }

    #[inline(always)]
    pub fn is_fetch(self) -> bool {
        self == Self::Fetch
    }
}
