//! Single-core two-level hierarchy.
//!
//! Split L1 (instruction and data, each half of the configured L1 size) over
//! a unified, inclusive L2. Only tags are modelled. Inclusion is kept by
//! dropping both L1 copies of any block the L2 evicts; a dirty L1 victim
//! marks its L2 copy dirty instead of going to memory.

use log::debug;

use super::cache::Cache;
use crate::common::error::{ConfigError, SimError, SimResult};
use crate::common::{AccessType, PhysAddr};
use crate::config::{CacheType, Config};
use crate::stats::{CacheCounters, CacheStats, HierarchyStats, ratio};

pub struct Hierarchy {
    l1_instr: Cache,
    l1_data: Cache,
    l2: Cache,
    global: CacheCounters,
    l1_instr_traffic: u64,
    l1_data_traffic: u64,
}

impl Hierarchy {
    /// Builds the hierarchy from `config.cache` (L1) and `config.l2`.
    pub fn new(config: &Config) -> SimResult<Self> {
        let l2_config = config.l2.as_ref().ok_or(ConfigError::MissingL2)?;
        config.validate()?;

        let mut l1 = config.cache.clone();
        l1.cache_size /= 2;
        l1.cache_type = CacheType::L1;
        let mut l2 = l2_config.clone();
        l2.cache_type = CacheType::L2;

        let table = config.protocol.table();
        Ok(Self {
            l1_instr: Cache::new(0, &l1, table)?,
            l1_data: Cache::new(1, &l1, table)?,
            l2: Cache::new(2, &l2, table)?,
            global: CacheCounters::default(),
            l1_instr_traffic: 0,
            l1_data_traffic: 0,
        })
    }

    /// Performs one request; returns whether it hit in either level.
    pub fn access(&mut self, addr: PhysAddr, access: AccessType) -> SimResult<bool> {
        let Self {
            l1_instr,
            l1_data,
            l2,
            global,
            l1_instr_traffic,
            l1_data_traffic,
        } = self;
        let (l1, other_l1, traffic) = if access.is_fetch() {
            (l1_instr, l1_data, l1_instr_traffic)
        } else {
            (l1_data, l1_instr, l1_data_traffic)
        };

        global.record_access(access);
        if l1.try_access(addr, access, 0)?.hit {
            global.hits += 1;
            return Ok(true);
        }

        let l2_hit = l2.try_access(addr, AccessType::Read, 0)?.hit;
        if l2_hit {
            global.hits += 1;
            *traffic += 1;
        } else {
            global.record_miss(access);
            let evicted = l2.add_block(addr, AccessType::Read)?;
            if evicted.evicted {
                *traffic += 1;
                let l1_dirty = l1.invalidate(evicted.evicted_addr)
                    | other_l1.invalidate(evicted.evicted_addr);
                if evicted.evicted_dirty || l1_dirty {
                    debug!("L2 evicted {:#x}, writing back", evicted.evicted_addr);
                    global.writebacks += 1;
                }
            }
        }

        let evicted = l1.add_block(addr, access)?;
        if evicted.evicted_dirty {
            *traffic += 1;
            if !l2.mark_dirty(evicted.evicted_addr) {
                return Err(SimError::InclusionViolated(evicted.evicted_addr));
            }
        }
        Ok(l2_hit)
    }

    pub fn l1_instr(&self) -> &Cache {
        &self.l1_instr
    }

    pub fn l1_data(&self) -> &Cache {
        &self.l1_data
    }

    pub fn l2(&self) -> &Cache {
        &self.l2
    }

    /// `l1_hit + l1_miss_rate * (l2_hit + l2_miss_rate * l2_miss_penalty)`.
    pub fn amat(&self) -> SimResult<f64> {
        let (i, d) = (self.l1_instr.counters(), self.l1_data.counters());
        let l1_misses = i.misses + d.misses;
        let l1_rate = ratio(l1_misses, i.accesses + d.accesses, "L1 miss rate")?;
        let l1_penalty = if l1_misses == 0 {
            0.0
        } else {
            let l2 = self.l2.config();
            self.l2.counters().amat(l2.hit_time, l2.miss_penalty)?
        };
        Ok(self.l1_data.config().hit_time as f64 + l1_rate * l1_penalty)
    }

    pub fn stats(&self) -> HierarchyStats {
        HierarchyStats {
            global: self.global.clone(),
            miss_rate: self.global.miss_rate().ok(),
            instr_miss_rate: self.global.instr_miss_rate().ok(),
            data_miss_rate: self.global.data_miss_rate().ok(),
            amat: self.amat().ok(),
            traffic: self.l1_instr_traffic + self.l1_data_traffic,
            l1_data_traffic: self.l1_data_traffic,
            l1_instr_traffic: self.l1_instr_traffic,
            l1_instr: CacheStats {
                name: "L1-I".into(),
                ..self.l1_instr.stats()
            },
            l1_data: CacheStats {
                name: "L1-D".into(),
                ..self.l1_data.stats()
            },
            l2: CacheStats {
                name: "L2".into(),
                ..self.l2.stats()
            },
        }
    }
}
