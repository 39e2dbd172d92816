//! Snooping coherence protocols.
//!
//! Each protocol is a pair of transition tables behind [`CoherenceProtocol`]:
//! one driven by the local processor, one driven by messages overheard on the
//! bus. The protocol is picked once from [`Protocol`] and shared by every
//! cache as a `&'static dyn CoherenceProtocol`; call sites never branch on
//! which protocol is active.

use std::fmt;

use serde::Serialize;

use crate::common::AccessType;
use crate::config::Protocol;

pub use self::mesi::Mesi;
pub use self::msi::Msi;

mod mesi;
mod msi;

/// Coherence state of one cache block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum BlockState {
    #[default]
    Invalid,
    Shared,
    Exclusive,
    Modified,
}

impl BlockState {
    #[inline(always)]
    pub fn is_valid(self) -> bool {
        self != Self::Invalid
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Invalid => "I",
            Self::Shared => "S",
            Self::Exclusive => "E",
            Self::Modified => "M",
        };
        f.write_str(c)
    }
}

/// Messages carried by the shared bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BusMessage {
    ReadMiss,
    WriteMiss,
    /// Upgrade of a shared copy; peers must drop theirs.
    Invalidate,
    /// Block payload moving between a cache and memory.
    Data,
    Writeback,
}

impl BusMessage {
    /// Whether the message needs a block fill before the request can complete.
    #[inline(always)]
    pub fn is_miss(self) -> bool {
        matches!(self, Self::ReadMiss | Self::WriteMiss)
    }

    /// Whether every peer copy must be invalidated once the request completes.
    #[inline(always)]
    pub fn claims_exclusive(self) -> bool {
        matches!(self, Self::WriteMiss | Self::Invalidate)
    }
}

/// Result of a local processor request against a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTransition {
    pub next: BlockState,
    /// Message the requester must put on the bus, if any.
    pub message: Option<BusMessage>,
}

/// Result of a peer overhearing a bus message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnoopTransition {
    pub prev: BlockState,
    pub next: BlockState,
    /// The peer owns the only up-to-date copy and must put it on the bus.
    pub supply_data: bool,
}

pub trait CoherenceProtocol: Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Transition for a request issued by the cache's own processor.
    ///
    /// For a miss (`state == Invalid`) `next` is the state the block would
    /// take if no peer holds a copy; the final state comes from
    /// [`CoherenceProtocol::fill_state`].
    fn transition_on_request(&self, state: BlockState, access: AccessType) -> RequestTransition;

    /// Transition for a message issued by another cache.
    fn transition_on_snoop(&self, state: BlockState, message: BusMessage) -> SnoopTransition;

    /// State of a freshly filled block. `shared` is true when at least one
    /// peer still holds a valid copy after snooping the miss.
    fn fill_state(&self, access: AccessType, shared: bool) -> BlockState;
}

static MSI: Msi = Msi;
static MESI: Mesi = Mesi;

impl Protocol {
    /// Transition tables for this protocol.
    pub fn table(self) -> &'static dyn CoherenceProtocol {
        match self {
            Protocol::Msi => &MSI,
            Protocol::Mesi => &MESI,
        }
    }
}

/// Snoop rows shared by MSI and MESI.
fn snoop_common(state: BlockState, message: BusMessage) -> Option<SnoopTransition> {
    use BlockState::*;
    use BusMessage::*;

    let (next, supply_data) = match (state, message) {
        (Shared, WriteMiss | Invalidate) => (Invalid, false),
        (Modified, Invalidate) => (Invalid, false),
        (Modified, WriteMiss) => (Invalid, true),
        (Modified, ReadMiss) => (Shared, true),
        _ => return None,
    };
    Some(SnoopTransition {
        prev: state,
        next,
        supply_data,
    })
}

/// Request rows shared by MSI and MESI.
fn request_common(state: BlockState, access: AccessType) -> Option<RequestTransition> {
    use BlockState::*;

    let t = match (state, access) {
        (Invalid, AccessType::Write) => RequestTransition {
            next: Modified,
            message: Some(BusMessage::WriteMiss),
        },
        (Shared, AccessType::Write) => RequestTransition {
            next: Modified,
            message: Some(BusMessage::Invalidate),
        },
        (Modified, _) | (Shared | Exclusive, AccessType::Read | AccessType::Fetch) => {
            RequestTransition {
                next: state,
                message: None,
            }
        }
        _ => return None,
    };
    Some(t)
}

fn unchanged(state: BlockState) -> SnoopTransition {
    SnoopTransition {
        prev: state,
        next: state,
        supply_data: false,
    }
}
