use crate::common::PhysAddr;
use crate::core::coherence::BusMessage;

/// The single in-flight bus transaction.
///
/// There is no queue: the bus is owned by whichever core holds the system
/// lock, and is reset at the start of every request.
#[derive(Clone, Debug)]
pub struct Bus {
    pub message: Option<BusMessage>,
    pub address: PhysAddr,
    /// One block of payload.
    pub data: Box<[u8]>,
    pub source_core: Option<usize>,
    pub width_bytes: usize,
}

impl Bus {
    pub fn new(block_size: usize, width_bytes: usize) -> Self {
        Self {
            message: None,
            address: PhysAddr::default(),
            data: vec![0; block_size].into_boxed_slice(),
            source_core: None,
            width_bytes,
        }
    }

    /// Claims the bus for a new request from `core`.
    pub fn begin(&mut self, core: usize, address: PhysAddr) {
        self.message = None;
        self.address = address;
        self.source_core = Some(core);
    }

    pub fn release(&mut self) {
        self.message = None;
        self.source_core = None;
    }

    /// Bus-width transfers needed to move `bytes`.
    pub fn transit_beats(&self, bytes: usize) -> u64 {
        bytes.div_ceil(self.width_bytes) as u64
    }
}
