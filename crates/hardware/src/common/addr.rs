use super::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysAddr(pub u64);

impl PhysAddr {
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    #[inline(always)]
    pub fn val(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PhysAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl std::fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Tag, set index and byte offset of an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressParts {
    pub tag: u64,
    pub index: usize,
    pub offset: usize,
}

/// Splits physical addresses for a fixed power-of-two geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressDecoder {
    offset_bits: u32,
    index_bits: u32,
}

impl AddressDecoder {
    /// Builds a decoder for `block_size`-byte blocks spread over `num_sets` sets.
    ///
    /// Both values must be non-zero powers of two so that the bit split is exact.
    pub fn new(block_size: usize, num_sets: usize) -> Result<Self, ConfigError> {
        if block_size == 0 {
            return Err(ConfigError::Zero("block_size"));
        }
        if num_sets == 0 {
            return Err(ConfigError::Zero("num_sets"));
        }
        if !block_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "block_size",
                value: block_size as u64,
            });
        }
        if !num_sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "num_sets",
                value: num_sets as u64,
            });
        }
        Ok(Self {
            offset_bits: block_size.trailing_zeros(),
            index_bits: num_sets.trailing_zeros(),
        })
    }

    #[inline(always)]
    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    #[inline(always)]
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    #[inline]
    pub fn split(&self, addr: PhysAddr) -> AddressParts {
        let a = addr.val();
        let index_mask = (1u64 << self.index_bits) - 1;
        let offset_mask = (1u64 << self.offset_bits) - 1;
        AddressParts {
            tag: a >> (self.index_bits + self.offset_bits),
            index: ((a >> self.offset_bits) & index_mask) as usize,
            offset: (a & offset_mask) as usize,
        }
    }

    /// Base address of the block identified by `tag` and `index`.
    #[inline]
    pub fn rebuild(&self, tag: u64, index: usize) -> PhysAddr {
        PhysAddr((tag << (self.index_bits + self.offset_bits)) | ((index as u64) << self.offset_bits))
    }

    /// Address of the first byte of the block containing `addr`.
    #[inline]
    pub fn block_base(&self, addr: PhysAddr) -> PhysAddr {
        PhysAddr(addr.val() & !((1u64 << self.offset_bits) - 1))
    }
}
