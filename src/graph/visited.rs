//! Thread-local visited sets for graph traversal.
//!
//! Each set is an epoch array: `visit` stamps the current epoch and a fresh
//! traversal bumps the epoch instead of zeroing memory.

use std::cell::RefCell;

/// Sets kept per thread for reuse.
const POOL_SIZE: usize = 4;

thread_local! {
    static POOL: RefCell<Vec<EpochSet>> = const { RefCell::new(Vec::new()) };
}

struct EpochSet {
    stamps: Vec<u32>,
    epoch: u32,
}

impl EpochSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            stamps: vec![0; capacity.max(64)],
            epoch: 1,
        }
    }

    fn reset(&mut self, capacity: usize) {
        if self.stamps.len() < capacity {
            self.stamps.resize(capacity, 0);
        }
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamps.fill(0);
            self.epoch = 1;
        }
    }
}

/// Visited marks for one traversal; returned to the thread's pool on drop.
pub(crate) struct VisitedSet {
    set: Option<EpochSet>,
}

impl VisitedSet {
    /// Borrows a cleared set able to hold ids `< capacity` without growing.
    pub(crate) fn new(capacity: usize) -> Self {
        let mut set = POOL
            .with(|pool| pool.borrow_mut().pop())
            .unwrap_or_else(|| EpochSet::with_capacity(capacity));
        set.reset(capacity);
        Self { set: Some(set) }
    }

    /// Marks `id` and returns true if it was not visited before.
    #[inline]
    pub(crate) fn insert(&mut self, id: usize) -> bool {
        let Some(set) = self.set.as_mut() else {
            return false;
        };
        if id >= set.stamps.len() {
            let len = (id + 1).next_power_of_two();
            set.stamps.resize(len, 0);
        }
        if set.stamps[id] == set.epoch {
            return false;
        }
        set.stamps[id] = set.epoch;
        true
    }

    #[cfg(test)]
    fn contains(&self, id: usize) -> bool {
        self.set
            .as_ref()
            .is_some_and(|s| s.stamps.get(id) == Some(&s.epoch))
    }
}

impl Drop for VisitedSet {
    fn drop(&mut self) {
        if let Some(set) = self.set.take() {
            POOL.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < POOL_SIZE {
                    pool.push(set);
                }
            });
        }
    }
}
