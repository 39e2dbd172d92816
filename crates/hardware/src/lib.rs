//! Multicore cache-coherence simulator core library.
//!
//! The crate models per-core set-associative caches kept coherent by an
//! MSI or MESI snooping protocol over a single shared bus, backed by a flat
//! memory. Requests are `(core, address, kind, data)` tuples; every request is
//! serialized end-to-end by [`soc::System`].
//!
//! Layout:
//! - [`common`]: address decoding, access kinds and error types.
//! - [`config`]: validated simulator geometry, loadable from TOML.
//! - [`core`]: the cache engine, LRU stacks, coherence tables and the
//!   single-core L1/L2 hierarchy.
//! - [`soc`]: bus, memory and the orchestrating system.
//! - [`sim`]: trace parsing and replay.
//! - [`stats`]: serializable statistics snapshots.

/// Address types, access kinds and errors shared by every component.
pub mod common;

/// Simulator configuration and geometry validation.
pub mod config;

/// Cache engine, replacement and coherence protocol tables.
pub mod core;

/// Trace parsing and replay drivers.
pub mod sim;

/// Bus, memory and the multicore system orchestrator.
pub mod soc;

/// Statistics snapshots.
pub mod stats;

pub use crate::common::error::{SimError, SimResult};
pub use crate::config::Config;
pub use crate::soc::System;
