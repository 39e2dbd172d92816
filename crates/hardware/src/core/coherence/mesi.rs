use super::{
    BlockState, BusMessage, CoherenceProtocol, RequestTransition, SnoopTransition, request_common,
    snoop_common, unchanged,
};
use crate::common::AccessType;

/// MSI plus a clean `Exclusive` state, so a core that is the only holder of a
/// block can write it without a bus transaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mesi;

impl CoherenceProtocol for Mesi {
    fn name(&self) -> &'static str {
        "MESI"
    }

    fn transition_on_request(&self, state: BlockState, access: AccessType) -> RequestTransition {
        if let Some(t) = request_common(state, access) {
            return t;
        }
        match (state, access) {
            // Provisional; downgraded to Shared by `fill_state` if a peer holds a copy.
            (BlockState::Invalid, _) => RequestTransition {
                next: BlockState::Exclusive,
                message: Some(BusMessage::ReadMiss),
            },
            (BlockState::Exclusive, AccessType::Write) => RequestTransition {
                next: BlockState::Modified,
                message: None,
            },
            _ => RequestTransition {
                next: state,
                message: None,
            },
        }
    }

    fn transition_on_snoop(&self, state: BlockState, message: BusMessage) -> SnoopTransition {
        if let Some(t) = snoop_common(state, message) {
            return t;
        }
        let next = match (state, message) {
            (BlockState::Exclusive, BusMessage::ReadMiss) => BlockState::Shared,
            (BlockState::Exclusive, BusMessage::WriteMiss | BusMessage::Invalidate) => {
                BlockState::Invalid
            }
            _ => return unchanged(state),
        };
        SnoopTransition {
            prev: state,
            next,
            supply_data: false,
        }
    }

    fn fill_state(&self, access: AccessType, shared: bool) -> BlockState {
        match (access, shared) {
            (AccessType::Write, _) => BlockState::Modified,
            (_, true) => BlockState::Shared,
            (_, false) => BlockState::Exclusive,
        }
    }
}
