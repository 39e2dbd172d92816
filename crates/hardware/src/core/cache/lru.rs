//! Per-set LRU stack.
//!
//! Recency is a doubly-linked list threaded through a fixed arena with one
//! slot per way, so both the MRU update and the LRU lookup are O(1) and no
//! node is ever allocated after construction.

use crate::common::error::{SimError, SimResult};

/// Link value for "no neighbour".
const ABSENT: usize = usize::MAX;

#[derive(Clone, Copy, Debug)]
struct Slot {
    /// Neighbour towards the MRU end.
    more_recent: usize,
    /// Neighbour towards the LRU end.
    less_recent: usize,
    linked: bool,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            more_recent: ABSENT,
            less_recent: ABSENT,
            linked: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LruStack {
    slots: Box<[Slot]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl LruStack {
    pub fn new(ways: usize) -> Self {
        Self {
            slots: vec![Slot::default(); ways].into_boxed_slice(),
            head: ABSENT,
            tail: ABSENT,
            len: 0,
        }
    }

    /// Number of ways tracked so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Marks `way` as most recently used.
    pub fn set_mru(&mut self, way: usize) -> SimResult<()> {
        if way >= self.slots.len() {
            return Err(SimError::WayOutOfRange {
                way,
                ways: self.slots.len(),
            });
        }
        if self.head == way {
            return Ok(());
        }
        if self.slots[way].linked {
            self.unlink(way);
        } else {
            self.len += 1;
        }
        self.push_front(way);
        Ok(())
    }

    /// Least recently used way.
    pub fn get_lru(&self) -> SimResult<usize> {
        if self.tail == ABSENT {
            return Err(SimError::EmptyLruStack);
        }
        Ok(self.tail)
    }

    pub fn get_mru(&self) -> Option<usize> {
        (self.head != ABSENT).then_some(self.head)
    }

    /// Tracked ways from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            if cur == ABSENT {
                return None;
            }
            let way = cur;
            cur = self.slots[way].less_recent;
            Some(way)
        })
    }

    fn unlink(&mut self, way: usize) {
        let Slot {
            more_recent,
            less_recent,
            ..
        } = self.slots[way];

        if more_recent == ABSENT {
            self.head = less_recent;
        } else {
            self.slots[more_recent].less_recent = less_recent;
        }
        if less_recent == ABSENT {
            self.tail = more_recent;
        } else {
            self.slots[less_recent].more_recent = more_recent;
        }
        self.slots[way] = Slot::default();
    }

    fn push_front(&mut self, way: usize) {
        self.slots[way] = Slot {
            more_recent: ABSENT,
            less_recent: self.head,
            linked: true,
        };
        if self.head == ABSENT {
            self.tail = way;
        } else {
            self.slots[self.head].more_recent = way;
        }
        self.head = way;
    }
}
