use super::bus::Bus;
use crate::common::PhysAddr;
use crate::common::error::{SimError, SimResult};
use crate::stats::MemoryStats;

/// Direction of a block transfer, seen from the component being accessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryAccess {
    /// Copy the block onto the bus.
    Send,
    /// Copy the bus payload into the block.
    Store,
}

/// Flat backing store. Holds no coherence state and is authoritative for any
/// block no cache holds dirty.
#[derive(Debug)]
pub struct Memory {
    bytes: Vec<u8>,
    block_size: usize,
    stats: MemoryStats,
}

impl Memory {
    pub fn new(size: usize, block_size: usize) -> Self {
        Self {
            bytes: vec![0; size],
            block_size,
            stats: MemoryStats::default(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn stats(&self) -> &MemoryStats {
        &self.stats
    }

    /// Transfers the block containing `addr` between memory and the bus.
    pub fn access(&mut self, addr: PhysAddr, op: MemoryAccess, bus: &mut Bus) -> SimResult<()> {
        let range = self.block_range(addr)?;
        match op {
            MemoryAccess::Send => {
                bus.data.copy_from_slice(&self.bytes[range]);
                self.stats.reads += 1;
            }
            MemoryAccess::Store => {
                self.bytes[range].copy_from_slice(&bus.data);
                self.stats.writes += 1;
            }
        }
        Ok(())
    }

    pub fn read_u8(&self, addr: PhysAddr) -> SimResult<u8> {
        self.bytes
            .get(addr.val() as usize)
            .copied()
            .ok_or(SimError::AddressOutOfRange {
                addr,
                mem_size: self.bytes.len(),
            })
    }

    /// Copies `data` into memory at `addr`, bypassing the bus.
    pub fn load(&mut self, data: &[u8], addr: PhysAddr) -> SimResult<()> {
        let out_of_range = SimError::AddressOutOfRange {
            addr,
            mem_size: self.bytes.len(),
        };
        let start = usize::try_from(addr.val()).map_err(|_| out_of_range.clone())?;
        let end = start.checked_add(data.len()).ok_or(out_of_range.clone())?;
        if end > self.bytes.len() {
            return Err(out_of_range);
        }
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn block_range(&self, addr: PhysAddr) -> SimResult<std::ops::Range<usize>> {
        let out_of_range = SimError::AddressOutOfRange {
            addr,
            mem_size: self.bytes.len(),
        };
        let base = usize::try_from(addr.val()).map_err(|_| out_of_range.clone())?
            & !(self.block_size - 1);
        match base.checked_add(self.block_size) {
            Some(end) if end <= self.bytes.len() => Ok(base..end),
            _ => Err(out_of_range),
        }
    }
}
