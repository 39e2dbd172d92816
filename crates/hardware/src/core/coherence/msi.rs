use super::{
    BlockState, BusMessage, CoherenceProtocol, RequestTransition, SnoopTransition, request_common,
    snoop_common, unchanged,
};
use crate::common::AccessType;

/// Modified / Shared / Invalid.
///
/// MSI never produces `Exclusive`; should one appear it is handled as a
/// clean shared copy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Msi;

impl CoherenceProtocol for Msi {
    fn name(&self) -> &'static str {
        "MSI"
    }

    fn transition_on_request(&self, state: BlockState, access: AccessType) -> RequestTransition {
        if let Some(t) = request_common(state, access) {
            return t;
        }
        match (state, access) {
            (BlockState::Invalid, _) => RequestTransition {
                next: BlockState::Shared,
                message: Some(BusMessage::ReadMiss),
            },
            (BlockState::Exclusive, _) => RequestTransition {
                next: BlockState::Modified,
                message: Some(BusMessage::Invalidate),
            },
            _ => RequestTransition {
                next: state,
                message: None,
            },
        }
    }

    fn transition_on_snoop(&self, state: BlockState, message: BusMessage) -> SnoopTransition {
        let state = match state {
            BlockState::Exclusive => BlockState::Shared,
            s => s,
        };
        snoop_common(state, message).unwrap_or_else(|| unchanged(state))
    }

    fn fill_state(&self, access: AccessType, _shared: bool) -> BlockState {
        if access.is_write() {
            BlockState::Modified
        } else {
            BlockState::Shared
        }
    }
}
