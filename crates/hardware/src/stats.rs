//! Statistics snapshots.
//!
//! Counters live inside the components that bump them; the types here are
//! cheap copies taken on demand. Rates are `None` when no access has been
//! counted yet, and the `*_rate` methods on [`CacheCounters`] return
//! [`SimError::NoAccesses`] in that case instead of dividing by zero.

use serde::Serialize;

use crate::common::AccessType;
use crate::common::error::{SimError, SimResult};
use crate::config::CacheConfig;

/// Raw per-cache counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub writebacks: u64,
    pub data_accesses: u64,
    pub data_misses: u64,
    pub instr_accesses: u64,
    pub instr_misses: u64,
}

impl CacheCounters {
    pub fn record_access(&mut self, access: AccessType) {
        self.accesses += 1;
        if access.is_fetch() {
            self.instr_accesses += 1;
        } else {
            self.data_accesses += 1;
        }
    }

    pub fn record_miss(&mut self, access: AccessType) {
        self.misses += 1;
        if access.is_fetch() {
            self.instr_misses += 1;
        } else {
            self.data_misses += 1;
        }
    }

    pub fn miss_rate(&self) -> SimResult<f64> {
        ratio(self.misses, self.accesses, "miss rate")
    }

    pub fn instr_miss_rate(&self) -> SimResult<f64> {
        ratio(self.instr_misses, self.instr_accesses, "instruction miss rate")
    }

    pub fn data_miss_rate(&self) -> SimResult<f64> {
        ratio(self.data_misses, self.data_accesses, "data miss rate")
    }

    /// `hit_time + miss_rate * miss_penalty`.
    pub fn amat(&self, hit_time: u64, miss_penalty: u64) -> SimResult<f64> {
        Ok(hit_time as f64 + self.miss_rate()? * miss_penalty as f64)
    }
}

pub(crate) fn ratio(num: u64, den: u64, what: &'static str) -> SimResult<f64> {
    if den == 0 {
        return Err(SimError::NoAccesses(what));
    }
    Ok(num as f64 / den as f64)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheStats {
    pub name: String,
    pub cache_size: usize,
    pub associativity: usize,
    pub block_size: usize,
    pub hit_time: u64,
    pub miss_penalty: u64,
    #[serde(flatten)]
    pub counters: CacheCounters,
    pub miss_rate: Option<f64>,
    pub instr_miss_rate: Option<f64>,
    pub data_miss_rate: Option<f64>,
    pub amat: Option<f64>,
}

impl CacheStats {
    pub fn new(name: String, config: &CacheConfig, counters: &CacheCounters) -> Self {
        Self {
            name,
            cache_size: config.cache_size,
            associativity: config.associativity,
            block_size: config.block_size,
            hit_time: config.hit_time,
            miss_penalty: config.miss_penalty,
            counters: counters.clone(),
            miss_rate: counters.miss_rate().ok(),
            instr_miss_rate: counters.instr_miss_rate().ok(),
            data_miss_rate: counters.data_miss_rate().ok(),
            amat: counters.amat(config.hit_time, config.miss_penalty).ok(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Blocks sent to the bus.
    pub reads: u64,
    /// Blocks stored from the bus.
    pub writes: u64,
}

/// Whole-system snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemStats {
    pub protocol: &'static str,
    pub caches: Vec<CacheStats>,
    pub memory: MemoryStats,
    pub invalidations: u64,
    pub bus_data_transactions: u64,
    /// Bus-width transfers needed for all data transactions.
    pub bus_beats: u64,
}

impl SystemStats {
    /// Counters summed over every cache.
    pub fn totals(&self) -> CacheCounters {
        self.caches
            .iter()
            .fold(CacheCounters::default(), |mut acc, c| {
                let c = &c.counters;
                acc.accesses += c.accesses;
                acc.hits += c.hits;
                acc.misses += c.misses;
                acc.writebacks += c.writebacks;
                acc.data_accesses += c.data_accesses;
                acc.data_misses += c.data_misses;
                acc.instr_accesses += c.instr_accesses;
                acc.instr_misses += c.instr_misses;
                acc
            })
    }
}

/// Single-core L1/L2 hierarchy snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HierarchyStats {
    #[serde(flatten)]
    pub global: CacheCounters,
    pub miss_rate: Option<f64>,
    pub instr_miss_rate: Option<f64>,
    pub data_miss_rate: Option<f64>,
    pub amat: Option<f64>,
    /// Block moves between either L1 and the L2.
    pub traffic: u64,
    pub l1_data_traffic: u64,
    pub l1_instr_traffic: u64,
    pub l1_instr: CacheStats,
    pub l1_data: CacheStats,
    pub l2: CacheStats,
}
