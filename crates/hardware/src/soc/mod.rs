//! Multicore system: per-core caches, one bus and shared memory.
//!
//! [`System::access`] is the only concurrency boundary. It holds a single
//! lock for the whole request (lookup, peer snooping, block transfer, fill
//! and invalidation broadcast), which models a bus that carries one
//! transaction at a time and gives every completed access a total order.

pub mod bus;
pub mod memory;

use std::sync::{Mutex, MutexGuard};

use log::{debug, info};

pub use self::bus::Bus;
pub use self::memory::{Memory, MemoryAccess};

use crate::common::error::{SimError, SimResult};
use crate::common::{AccessType, PhysAddr};
use crate::config::{Config, Protocol};
use crate::core::cache::{Cache, SystemAccess};
use crate::core::coherence::{BusMessage, CoherenceProtocol};
use crate::stats::SystemStats;

pub struct System {
    protocol: Protocol,
    num_cores: usize,
    state: Mutex<SystemState>,
}

/// Everything guarded by the bus lock.
struct SystemState {
    caches: Vec<Cache>,
    memory: Memory,
    bus: Bus,
    table: &'static dyn CoherenceProtocol,
    block_size: usize,
    invalidations: u64,
    bus_data_transactions: u64,
    bus_beats: u64,
}

impl System {
    pub fn new(config: &Config) -> SimResult<Self> {
        config.validate()?;
        let table = config.protocol.table();
        let caches = (0..config.num_cores)
            .map(|id| Cache::new(id, &config.cache, table))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "{} cores, {}, {}B {}-way caches with {} sets of {}B blocks, {}B memory",
            config.num_cores,
            table.name(),
            config.cache.cache_size,
            config.cache.associativity,
            caches[0].num_sets(),
            config.cache.block_size,
            config.mem_size,
        );

        let state = SystemState {
            caches,
            memory: Memory::new(config.mem_size, config.cache.block_size),
            bus: Bus::new(config.cache.block_size, config.bus_width),
            table,
            block_size: config.cache.block_size,
            invalidations: 0,
            bus_data_transactions: 0,
            bus_beats: 0,
        };

        Ok(Self {
            protocol: config.protocol,
            num_cores: config.num_cores,
            state: Mutex::new(state),
        })
    }

    pub fn num_cores(&self) -> usize {
        self.num_cores
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Performs one request from `core` and returns the byte read or written.
    ///
    /// Blocks until the bus is free; there is no timeout.
    pub fn access(
        &self,
        core: usize,
        addr: PhysAddr,
        access: AccessType,
        data: u8,
    ) -> SimResult<u8> {
        self.lock()?.access(core, addr, access, data)
    }

    pub fn stats(&self) -> SimResult<SystemStats> {
        let state = self.lock()?;
        Ok(SystemStats {
            protocol: state.table.name(),
            caches: state.caches.iter().map(Cache::stats).collect(),
            memory: state.memory.stats().clone(),
            invalidations: state.invalidations,
            bus_data_transactions: state.bus_data_transactions,
            bus_beats: state.bus_beats,
        })
    }

    /// Runs `f` over the caches and memory while holding the bus lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&[Cache], &Memory) -> R) -> SimResult<R> {
        let state = self.lock()?;
        Ok(f(&state.caches, &state.memory))
    }

    /// Writes `data` straight into memory at `addr`, bypassing every cache.
    pub fn preload(&self, addr: PhysAddr, data: &[u8]) -> SimResult<()> {
        self.lock()?.memory.load(data, addr)
    }

    fn lock(&self) -> SimResult<MutexGuard<'_, SystemState>> {
        self.state.lock().map_err(|_| SimError::LockPoisoned)
    }
}

impl SystemState {
    fn access(
        &mut self,
        core: usize,
        addr: PhysAddr,
        access: AccessType,
        data: u8,
    ) -> SimResult<u8> {
        if core >= self.caches.len() {
            return Err(SimError::CoreOutOfRange {
                core,
                num_cores: self.caches.len(),
            });
        }
        if addr.val() as usize >= self.memory.size() {
            return Err(SimError::AddressOutOfRange {
                addr,
                mem_size: self.memory.size(),
            });
        }

        self.bus.begin(core, addr);
        let outcome = self.caches[core].try_access(addr, access, data)?;
        let Some(message) = outcome.message else {
            self.bus.release();
            return Ok(outcome.data);
        };
        self.bus.message = Some(message);

        let mut result = outcome.data;
        if message.is_miss() {
            result = self.fill(core, addr, access, data, message)?;
        }
        if message.claims_exclusive() {
            self.invalidate_peers(core, addr);
        }
        self.bus.release();
        Ok(result)
    }

    /// Brings the block into the requesting cache and completes the request.
    fn fill(
        &mut self,
        core: usize,
        addr: PhysAddr,
        access: AccessType,
        data: u8,
        message: BusMessage,
    ) -> SimResult<u8> {
        let owner = (0..self.caches.len()).find(|&i| i != core && self.caches[i].check_dirty(addr));
        match owner {
            Some(peer) => {
                debug!("core{core} {message:?} {addr:#x}: cache{peer} supplies dirty block");
                self.caches[peer].system_access(addr, SystemAccess::Send, &mut self.bus)?;
                self.memory.access(addr, MemoryAccess::Store, &mut self.bus)?;
            }
            None => {
                debug!("core{core} {message:?} {addr:#x}: memory supplies block");
                self.memory.access(addr, MemoryAccess::Send, &mut self.bus)?;
            }
        }
        self.record_data_transaction();

        // Every peer overhears the miss.
        let mut shared = false;
        for (i, cache) in self.caches.iter_mut().enumerate() {
            if i == core {
                continue;
            }
            if let Some(t) = cache.snoop(addr, message) {
                shared |= t.next.is_valid();
            }
        }

        let fill = self.table.fill_state(access, shared);
        self.bus.message = Some(BusMessage::Data);
        let writeback =
            self.caches[core].system_access(addr, SystemAccess::Store(fill), &mut self.bus)?;
        if let Some(wb) = writeback {
            debug!("core{core}: writing back dirty victim {:#x}", wb.address);
            self.bus.message = Some(BusMessage::Writeback);
            self.bus.address = wb.address;
            self.bus.data.copy_from_slice(&wb.data);
            self.memory.access(wb.address, MemoryAccess::Store, &mut self.bus)?;
            self.record_data_transaction();
        }

        self.caches[core].processor_access(addr, access, data)
    }

    fn invalidate_peers(&mut self, core: usize, addr: PhysAddr) {
        self.invalidations += 1;
        debug!("core{core} {addr:#x}: invalidating peer copies");
        for (i, cache) in self.caches.iter_mut().enumerate() {
            if i != core {
                let dropped_dirty = cache.invalidate(addr);
                debug_assert!(!dropped_dirty, "dirty copy of {addr:#x} lost in cache{i}");
            }
        }
    }

    fn record_data_transaction(&mut self) {
        self.bus_data_transactions += 1;
        self.bus_beats += self.bus.transit_beats(self.block_size);
    }
}
