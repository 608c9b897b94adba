//! Reusable-entity pool
//!
//! Entities are created lazily on first demand. Releasing resets an entity
//! and keeps it for reuse only while the available list is under
//! `max_size`; excess releases are dropped. Active and available are
//! disjoint, and active entities keep their acquisition order so iteration
//! is deterministic.

use serde::{Deserialize, Serialize};

/// Pool-ownership tag, unique per acquisition within a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub u32);

/// An entity a [`Pool`] can construct and recycle
pub trait Poolable: Default {
    /// Return to a neutral state before going back on the shelf
    fn reset(&mut self);
}

/// Generic pool with an unbounded active set and a capped available set
#[derive(Debug, Clone)]
pub struct Pool<T: Poolable> {
    available: Vec<T>,
    active: Vec<(PoolId, T)>,
    max_size: usize,
    next_id: u32,
    created: usize,
    dropped: usize,
}

impl<T: Poolable> Pool<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            available: Vec::with_capacity(max_size),
            active: Vec::new(),
            max_size,
            next_id: 1,
            created: 0,
            dropped: 0,
        }
    }

    /// Take an available entity, or construct one if none is left
    pub fn acquire(&mut self) -> (PoolId, &mut T) {
        let item = match self.available.pop() {
            Some(item) => item,
            None => {
                self.created += 1;
                T::default()
            }
        };
        let id = PoolId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active.push((id, item));
        let index = self.active.len() - 1;
        (id, &mut self.active[index].1)
    }

    /// Return an active entity. No-op (returns false) if `id` is not active.
    pub fn release(&mut self, id: PoolId) -> bool {
        let Some(index) = self.active.iter().position(|(active_id, _)| *active_id == id) else {
            return false;
        };
        let (_, item) = self.active.remove(index);
        self.shelve(item);
        true
    }

    /// Release every active entity for which `pred` returns true
    pub fn release_where<F>(&mut self, mut pred: F) -> Vec<PoolId>
    where
        F: FnMut(PoolId, &T) -> bool,
    {
        let mut released = Vec::new();
        let mut kept = Vec::with_capacity(self.active.len());
        for (id, item) in std::mem::take(&mut self.active) {
            if pred(id, &item) {
                released.push(id);
                self.shelve(item);
            } else {
                kept.push((id, item));
            }
        }
        self.active = kept;
        released
    }

    /// Release everything that is active
    pub fn release_all(&mut self) -> usize {
        self.release_where(|_, _| true).len()
    }

    fn shelve(&mut self, mut item: T) {
        item.reset();
        if self.available.len() < self.max_size {
            self.available.push(item);
        } else {
            self.dropped += 1;
            log::debug!("Pool at capacity ({}), dropping released entity", self.max_size);
        }
    }

    pub fn get(&self, id: PoolId) -> Option<&T> {
        self.active.iter().find(|(active_id, _)| *active_id == id).map(|(_, item)| item)
    }

    pub fn get_mut(&mut self, id: PoolId) -> Option<&mut T> {
        self.active
            .iter_mut()
            .find(|(active_id, _)| *active_id == id)
            .map(|(_, item)| item)
    }

    pub fn is_active(&self, id: PoolId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &T)> {
        self.active.iter().map(|(id, item)| (*id, item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PoolId, &mut T)> {
        self.active.iter_mut().map(|(id, item)| (*id, item))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Entities constructed over the pool's lifetime
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Releases discarded because the pool was full
    pub fn dropped_count(&self) -> usize {
        self.dropped
    }

    /// Forget every entity, active and available
    pub fn clear(&mut self) {
        self.available.clear();
        self.active.clear();
    }
}
