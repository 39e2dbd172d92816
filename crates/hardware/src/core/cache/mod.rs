//! Set-associative, write-back cache with per-block coherence state.
//!
//! A [`Cache`] never talks to its peers directly. Processor requests go
//! through [`Cache::try_access`], which reports a hit or a pending bus
//! message in an [`AccessOutcome`]; the orchestrator then resolves the miss
//! with [`Cache::system_access`] and completes it with
//! [`Cache::processor_access`]. Snooped traffic arrives through
//! [`Cache::snoop`] and [`Cache::invalidate`].
//!
//! The same engine doubles as one level of the single-core hierarchy via
//! [`Cache::add_block`] and [`Cache::mark_dirty`].

pub mod block;
pub mod lru;

use log::trace;

use self::block::{CacheBlock, CacheSet};
use crate::common::error::{ConfigError, SimError, SimResult};
use crate::common::{AccessType, AddressDecoder, PhysAddr};
use crate::config::{CacheConfig, CacheType};
use crate::core::coherence::{BlockState, BusMessage, CoherenceProtocol, SnoopTransition};
use crate::soc::bus::Bus;
use crate::stats::{CacheCounters, CacheStats};

/// What a processor request did to the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessOutcome {
    pub hit: bool,
    /// Way the block will be filled into on a miss.
    pub victim_way: Option<usize>,
    /// Message the orchestrator must resolve before the request is done.
    pub message: Option<BusMessage>,
    /// Byte read or written; meaningless on a miss.
    pub data: u8,
}

/// Bus-side operation requested by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemAccess {
    /// Copy the resident block onto the bus and give up ownership.
    Send,
    /// Install the bus payload in the given state.
    Store(BlockState),
}

/// A dirty block pushed out by a fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Writeback {
    pub address: PhysAddr,
    pub data: Box<[u8]>,
}

/// Eviction caused by [`Cache::add_block`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: bool,
    pub evicted_addr: PhysAddr,
    pub evicted_dirty: bool,
}

#[derive(Debug)]
pub struct Cache {
    id: usize,
    config: CacheConfig,
    decoder: AddressDecoder,
    sets: Box<[CacheSet]>,
    protocol: &'static dyn CoherenceProtocol,
    counters: CacheCounters,
}

impl Cache {
    pub fn new(
        id: usize,
        config: &CacheConfig,
        protocol: &'static dyn CoherenceProtocol,
    ) -> Result<Self, ConfigError> {
        let num_sets = config.validate()?;
        let decoder = AddressDecoder::new(config.block_size, num_sets)?;
        let sets = (0..num_sets)
            .map(|_| CacheSet::new(config.associativity, config.block_size))
            .collect();

        Ok(Self {
            id,
            config: config.clone(),
            decoder,
            sets,
            protocol,
            counters: CacheCounters::default(),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn decoder(&self) -> &AddressDecoder {
        &self.decoder
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn protocol(&self) -> &'static dyn CoherenceProtocol {
        self.protocol
    }

    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Non-destructive statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats::new(format!("cache{}", self.id), &self.config, &self.counters)
    }

    /// First attempt at a processor request.
    ///
    /// On a hit the request transition, recency update and byte access are
    /// applied immediately. On a miss only the counters move: the victim way
    /// is chosen but not touched, and the miss message is returned for the
    /// orchestrator.
    pub fn try_access(
        &mut self,
        addr: PhysAddr,
        access: AccessType,
        data: u8,
    ) -> SimResult<AccessOutcome> {
        let protocol = self.protocol;
        let parts = self.decoder.split(addr);
        let set = &mut self.sets[parts.index];
        self.counters.record_access(access);

        if let Some(way) = set.find(parts.tag) {
            self.counters.hits += 1;
            let block = &mut set.blocks[way];
            let t = protocol.transition_on_request(block.state, access);
            if t.next != block.state {
                trace!(
                    "cache{} {addr:#x}: {} -> {} on local {access:?}",
                    self.id, block.state, t.next
                );
            }
            block.set_state(t.next);
            let byte = apply_byte(block, parts.offset, access, data);
            set.lru.set_mru(way)?;
            return Ok(AccessOutcome {
                hit: true,
                victim_way: None,
                message: t.message,
                data: byte,
            });
        }

        self.counters.record_miss(access);
        let victim = match set.first_invalid() {
            Some(way) => way,
            None => set.lru.get_lru()?,
        };
        let t = protocol.transition_on_request(BlockState::Invalid, access);
        Ok(AccessOutcome {
            hit: false,
            victim_way: Some(victim),
            message: t.message,
            data: 0,
        })
    }

    /// Orchestrator-driven block transfer between this cache and the bus.
    ///
    /// `Send` copies a resident block to the bus payload, marks it clean and
    /// applies the read-miss snoop transition; it is a no-op if the block is
    /// absent. `Store` installs the payload and returns the dirty victim it
    /// displaced, if any.
    pub fn system_access(
        &mut self,
        addr: PhysAddr,
        op: SystemAccess,
        bus: &mut Bus,
    ) -> SimResult<Option<Writeback>> {
        let parts = self.decoder.split(addr);
        match op {
            SystemAccess::Send => {
                let protocol = self.protocol;
                let set = &mut self.sets[parts.index];
                if let Some(way) = set.find(parts.tag) {
                    let block = &mut set.blocks[way];
                    bus.data.copy_from_slice(&block.data);
                    block.dirty = false;
                    let t = protocol.transition_on_snoop(block.state, BusMessage::ReadMiss);
                    trace!(
                        "cache{} {addr:#x}: {} -> {} supplying block",
                        self.id, t.prev, t.next
                    );
                    block.set_state(t.next);
                }
                Ok(None)
            }
            SystemAccess::Store(state) => {
                let set = &mut self.sets[parts.index];
                let way = match set.find(parts.tag).or_else(|| set.first_invalid()) {
                    Some(way) => way,
                    None => set.lru.get_lru()?,
                };
                let victim = &mut set.blocks[way];
                let writeback = if victim.valid && victim.dirty && victim.tag != parts.tag {
                    self.counters.writebacks += 1;
                    Some(Writeback {
                        address: self.decoder.rebuild(victim.tag, parts.index),
                        data: victim.data.clone(),
                    })
                } else {
                    None
                };

                victim.data.copy_from_slice(&bus.data);
                victim.tag = parts.tag;
                victim.set_state(state);
                victim.dirty = false;
                set.lru.set_mru(way)?;
                trace!("cache{} {addr:#x}: filled way {way} as {state}", self.id);
                Ok(writeback)
            }
        }
    }

    /// Completes a request after its block has been filled.
    pub fn processor_access(
        &mut self,
        addr: PhysAddr,
        access: AccessType,
        data: u8,
    ) -> SimResult<u8> {
        let parts = self.decoder.split(addr);
        let set = &mut self.sets[parts.index];
        let way = set.find(parts.tag).ok_or(SimError::MissAfterFill(addr))?;
        let byte = apply_byte(&mut set.blocks[way], parts.offset, access, data);
        set.lru.set_mru(way)?;
        Ok(byte)
    }

    /// Applies the snoop table to a resident copy of `addr`'s block.
    pub fn snoop(&mut self, addr: PhysAddr, message: BusMessage) -> Option<SnoopTransition> {
        let (id, protocol) = (self.id, self.protocol);
        let block = self.block_mut(addr)?;
        let t = protocol.transition_on_snoop(block.state, message);
        block.set_state(t.next);
        if t.prev != t.next {
            trace!(
                "cache{id} {addr:#x}: {} -> {} on snooped {message:?}",
                t.prev, t.next
            );
        }
        Some(t)
    }

    /// Drops the block containing `addr`. Returns whether the dropped copy was dirty.
    pub fn invalidate(&mut self, addr: PhysAddr) -> bool {
        let id = self.id;
        match self.block_mut(addr) {
            Some(block) => {
                let dirty = block.dirty;
                trace!("cache{id} {addr:#x}: {} -> I (invalidated)", block.state);
                block.set_state(BlockState::Invalid);
                dirty
            }
            None => false,
        }
    }

    /// Whether this cache holds a dirty copy of `addr`'s block.
    pub fn check_dirty(&self, addr: PhysAddr) -> bool {
        self.block(addr).is_some_and(|b| b.dirty)
    }

    pub fn state_of(&self, addr: PhysAddr) -> BlockState {
        self.block(addr).map_or(BlockState::Invalid, |b| b.state)
    }

    /// Reads the cached byte at `addr` without touching recency or counters.
    pub fn peek(&self, addr: PhysAddr) -> Option<u8> {
        let offset = self.decoder.split(addr).offset;
        self.block(addr).map(|b| b.data[offset])
    }

    /// Valid blocks with their base addresses.
    pub fn resident_blocks(&self) -> impl Iterator<Item = (PhysAddr, &CacheBlock)> + '_ {
        self.sets.iter().enumerate().flat_map(move |(index, set)| {
            set.blocks
                .iter()
                .filter(|b| b.valid)
                .map(move |b| (self.decoder.rebuild(b.tag, index), b))
        })
    }

    /// Installs `addr`'s block without data, for tag-level hierarchy modelling.
    ///
    /// An L2 reports every valid victim so upper levels can drop their copies;
    /// an L1 reports only dirty victims, whose L2 copy must become dirty.
    pub fn add_block(&mut self, addr: PhysAddr, access: AccessType) -> SimResult<EvictionReport> {
        let parts = self.decoder.split(addr);
        let fill = self.protocol.fill_state(access, false);
        let set = &mut self.sets[parts.index];
        let way = match set.find(parts.tag).or_else(|| set.first_invalid()) {
            Some(way) => way,
            None => set.lru.get_lru()?,
        };

        let victim = &mut set.blocks[way];
        let mut report = EvictionReport::default();
        if victim.valid && victim.tag != parts.tag {
            let reportable = match self.config.cache_type {
                CacheType::L2 => true,
                CacheType::L1 => victim.dirty,
            };
            if reportable {
                report = EvictionReport {
                    evicted: true,
                    evicted_addr: self.decoder.rebuild(victim.tag, parts.index),
                    evicted_dirty: victim.dirty,
                };
            }
        }

        victim.tag = parts.tag;
        victim.data.fill(0);
        victim.set_state(fill);
        victim.dirty = access.is_write();
        set.lru.set_mru(way)?;
        Ok(report)
    }

    /// Marks a resident block dirty. Returns false if the block is absent.
    pub fn mark_dirty(&mut self, addr: PhysAddr) -> bool {
        match self.block_mut(addr) {
            Some(block) => {
                block.dirty = true;
                block.set_state(BlockState::Modified);
                true
            }
            None => false,
        }
    }

    fn block(&self, addr: PhysAddr) -> Option<&CacheBlock> {
        let parts = self.decoder.split(addr);
        let set = &self.sets[parts.index];
        let way = set.find(parts.tag)?;
        Some(&set.blocks[way])
    }

    fn block_mut(&mut self, addr: PhysAddr) -> Option<&mut CacheBlock> {
        let parts = self.decoder.split(addr);
        let set = &mut self.sets[parts.index];
        let way = set.find(parts.tag)?;
        Some(&mut set.blocks[way])
    }
}

fn apply_byte(block: &mut CacheBlock, offset: usize, access: AccessType, data: u8) -> u8 {
    if access.is_write() {
        block.data[offset] = data;
        block.dirty = true;
    }
    block.data[offset]
}
