use super::lru::LruStack;
use crate::core::coherence::BlockState;

#[derive(Clone, Debug)]
pub struct CacheBlock {
    pub tag: u64,
    pub valid: bool,
    pub dirty: bool,
    pub state: BlockState,
    pub data: Box<[u8]>,
}

impl CacheBlock {
    pub fn new(block_size: usize) -> Self {
        Self {
            tag: 0,
            valid: false,
            dirty: false,
            state: BlockState::Invalid,
            data: vec![0; block_size].into_boxed_slice(),
        }
    }

    #[inline(always)]
    pub fn holds(&self, tag: u64) -> bool {
        self.valid && self.tag == tag
    }

    /// Moves the block to `state`, keeping `valid` in step with it.
    #[inline]
    pub fn set_state(&mut self, state: BlockState) {
        self.state = state;
        self.valid = state.is_valid();
        if !self.valid {
            self.dirty = false;
        }
    }
}

/// One set: `ways` blocks and their recency order.
#[derive(Clone, Debug)]
pub struct CacheSet {
    pub blocks: Box<[CacheBlock]>,
    pub lru: LruStack,
}

impl CacheSet {
    pub fn new(ways: usize, block_size: usize) -> Self {
        Self {
            blocks: (0..ways).map(|_| CacheBlock::new(block_size)).collect(),
            lru: LruStack::new(ways),
        }
    }

    pub fn find(&self, tag: u64) -> Option<usize> {
        self.blocks.iter().position(|b| b.holds(tag))
    }

    pub fn first_invalid(&self) -> Option<usize> {
        self.blocks.iter().position(|b| !b.valid)
    }
}
