//! Simulator configuration.
//!
//! A [`Config`] describes the whole machine: core count, coherence protocol,
//! per-core cache geometry and backing memory. It is deserialized from TOML:
//!
//! ```toml
//! num_cores = 2
//! protocol = "MESI"
//! mem_size = 65536
//! bus_width = 8
//!
//! [cache]
//! block_size = 16
//! cache_size = 1024
//! associativity = 2
//! hit_time = 1
//! miss_penalty = 100
//! ```
//!
//! Geometry is checked once by [`Config::validate`]; nothing downstream
//! re-checks it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;

/// Coherence protocol shared by every cache in the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Msi,
    Mesi,
}

/// Position of a cache in a multi-level hierarchy. Controls eviction reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheType {
    L1,
    L2,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Bytes per block.
    pub block_size: usize,
    /// Total capacity in bytes.
    pub cache_size: usize,
    /// Ways per set.
    pub associativity: usize,
    pub hit_time: u64,
    pub miss_penalty: u64,
    pub cache_type: CacheType,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_size: 16,
            cache_size: 1024,
            associativity: 2,
            hit_time: 1,
            miss_penalty: 100,
            cache_type: CacheType::L1,
        }
    }
}

impl CacheConfig {
    /// Checks the geometry and returns the number of sets it yields.
    pub fn validate(&self) -> Result<usize, ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Zero("block_size"));
        }
        if self.cache_size == 0 {
            return Err(ConfigError::Zero("cache_size"));
        }
        if self.associativity == 0 {
            return Err(ConfigError::Zero("associativity"));
        }
        if self.hit_time == 0 {
            return Err(ConfigError::Zero("hit_time"));
        }
        if self.miss_penalty == 0 {
            return Err(ConfigError::Zero("miss_penalty"));
        }
        if !self.block_size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "block_size",
                value: self.block_size as u64,
            });
        }
        let set_bytes = self.block_size * self.associativity;
        if self.cache_size % set_bytes != 0 {
            return Err(ConfigError::NonIntegralSets {
                cache_size: self.cache_size,
                block_size: self.block_size,
                ways: self.associativity,
            });
        }
        let num_sets = self.cache_size / set_bytes;
        if !num_sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "num_sets",
                value: num_sets as u64,
            });
        }
        Ok(num_sets)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub num_cores: usize,
    pub protocol: Protocol,
    /// Backing memory size in bytes.
    pub mem_size: usize,
    /// Bytes moved per bus beat.
    pub bus_width: usize,
    /// Geometry shared by every per-core cache (and the L1 of a hierarchy).
    pub cache: CacheConfig,
    /// Unified L2 for the single-core hierarchy.
    pub l2: Option<CacheConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_cores: 2,
            protocol: Protocol::Mesi,
            mem_size: 64 * 1024,
            bus_width: 8,
            cache: CacheConfig::default(),
            l2: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cores == 0 {
            return Err(ConfigError::Zero("num_cores"));
        }
        if self.bus_width == 0 {
            return Err(ConfigError::Zero("bus_width"));
        }
        self.cache.validate()?;
        if self.mem_size == 0 || self.mem_size % self.cache.block_size != 0 {
            return Err(ConfigError::MemoryTooSmall {
                mem_size: self.mem_size,
                block_size: self.cache.block_size,
            });
        }
        if let Some(l2) = &self.l2 {
            l2.validate()?;
            // Inclusion needs one L2 line per L1 line.
            if l2.block_size != self.cache.block_size {
                return Err(ConfigError::BlockSizeMismatch {
                    l1: self.cache.block_size,
                    l2: l2.block_size,
                });
            }
        }
        Ok(())
    }
}
