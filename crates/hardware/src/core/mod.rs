pub mod cache;
pub mod coherence;
pub mod hierarchy;

pub use self::cache::{AccessOutcome, Cache, EvictionReport, SystemAccess, Writeback};
pub use self::coherence::{BlockState, BusMessage, CoherenceProtocol};
pub use self::hierarchy::Hierarchy;
