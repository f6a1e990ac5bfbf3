//! Component J: a persistent, typed object store addressed by opaque
//! 64-bit handles.
//!
//! A handle packs a 32-bit store signature into its high bits and a
//! 32-bit slot index into its low bits, so a handle minted by one store
//! can never be mistaken for a valid handle into another (`get` checks
//! the signature before touching the slot map). Slots are never reused
//! after `release`, so a stale handle always fails with `NotFound`
//! rather than silently resolving to an unrelated value.

use std::hash::Hash;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::MomentError;

pub type Handle = u64;

fn combine(signature: u32, slot: u32) -> Handle {
    ((signature as u64) << 32) | slot as u64
}

fn split(handle: Handle) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

pub struct PersistentStore<T> {
    signature: u32,
    slots: RwLock<HashMap<u32, Arc<T>>>,
    next_slot: AtomicU32,
}

impl<T> PersistentStore<T> {
    pub fn new(tag: [u8; 4]) -> Self {
        Self {
            signature: super::signature::make_signature(tag),
            slots: RwLock::new(HashMap::new()),
            next_slot: AtomicU32::new(0),
        }
    }

    pub fn signature(&self) -> u32 {
        self.signature
    }

    pub fn store(&self, value: T) -> Handle {
        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        self.slots.write().insert(slot, Arc::new(value));
        let handle = combine(self.signature, slot);
        log::trace!("PersistentStore[{:#010x}]: inserted slot {slot} (handle {handle:#018x})", self.signature);
        handle
    }

    pub fn get(&self, handle: Handle) -> Result<Arc<T>, MomentError> {
        let (signature, slot) = split(handle);
        if signature != self.signature {
            return Err(MomentError::BadSignature {
                key: handle,
                expected: self.signature,
                found: signature,
            });
        }
        self.slots
            .read()
            .get(&slot)
            .cloned()
            .ok_or(MomentError::NotFound { key: handle })
    }

    pub fn release(&self, handle: Handle) -> Result<(), MomentError> {
        let (signature, slot) = split(handle);
        if signature != self.signature {
            return Err(MomentError::BadSignature {
                key: handle,
                expected: self.signature,
                found: signature,
            });
        }
        let removed = self.slots.write().remove(&slot);
        if removed.is_some() {
            log::trace!("PersistentStore[{:#010x}]: released slot {slot} (handle {handle:#018x})", self.signature);
        }
        removed.map(|_| ()).ok_or(MomentError::NotFound { key: handle })
    }

    pub fn first(&self) -> Option<Handle> {
        self.slots.read().keys().min().map(|&slot| combine(self.signature, slot))
    }

    pub fn next(&self, handle: Handle) -> Result<Option<Handle>, MomentError> {
        let (signature, slot) = split(handle);
        if signature != self.signature {
            return Err(MomentError::BadSignature {
                key: handle,
                expected: self.signature,
                found: signature,
            });
        }
        Ok(self
            .slots
            .read()
            .keys()
            .filter(|&&s| s > slot)
            .min()
            .map(|&s| combine(self.signature, s)))
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

/// A `PersistentStore` variant keyed by a caller-supplied key `K`, used
/// when the same logical object (e.g. a particular tensor instance)
/// must only ever be constructed once no matter how many callers ask
/// for it concurrently. `create_if_empty` double-checks under the write
/// lock so two racing callers never both pay the construction cost.
pub struct MonoidStore<T, K> {
    inner: PersistentStore<T>,
    index: RwLock<HashMap<K, Handle>>,
}

impl<T, K: Eq + Hash + Clone> MonoidStore<T, K> {
    pub fn new(tag: [u8; 4]) -> Self {
        Self {
            inner: PersistentStore::new(tag),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn signature(&self) -> u32 {
        self.inner.signature()
    }

    pub fn get(&self, handle: Handle) -> Result<Arc<T>, MomentError> {
        self.inner.get(handle)
    }

    pub fn handle_for(&self, key: &K) -> Option<Handle> {
        self.index.read().get(key).copied()
    }

    pub fn create_if_empty(&self, key: K, make: impl FnOnce() -> T) -> Handle {
        if let Some(handle) = self.index.read().get(&key).copied() {
            return handle;
        }
        let mut index = self.index.write();
        match index.entry(key) {
            Entry::Occupied(existing) => *existing.get(),
            Entry::Vacant(slot) => {
                let handle = self.inner.store(make());
                slot.insert(handle);
                handle
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
