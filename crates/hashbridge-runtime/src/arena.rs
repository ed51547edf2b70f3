//! Generation-tagged handle arena
//!
//! Handles pack a slot index and the slot's generation at allocation time.
//! Freeing a slot bumps its generation before the index is reused, so a
//! handle that outlived its value is reported as stale instead of silently
//! resolving to whatever took its place.

use dashmap::DashMap;
use hashbridge_abi::{Handle, InteropError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::warn;

use crate::value::Value;

struct Slot {
    generation: u32,
    value: Option<Value>,
    pinned: bool,
}

/// Thread-safe arena mapping handles to boxed values.
pub struct HandleArena {
    slots: DashMap<u32, Slot>,
    free: Mutex<Vec<u32>>,
    next_index: AtomicU32,
}

impl HandleArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            free: Mutex::new(Vec::new()),
            next_index: AtomicU32::new(0),
        }
    }

    /// Box a value and return its handle.
    pub fn insert(&self, value: Value) -> Handle {
        self.insert_slot(value, false)
    }

    /// Box a value that is never released. Used for singletons.
    pub fn insert_pinned(&self, value: Value) -> Handle {
        self.insert_slot(value, true)
    }

    fn insert_slot(&self, value: Value, pinned: bool) -> Handle {
        let reused = self.free.lock().pop();
        match reused {
            Some(index) => {
                let mut slot = self
                    .slots
                    .entry(index)
                    .or_insert_with(|| Slot {
                        generation: 1,
                        value: None,
                        pinned: false,
                    });
                slot.value = Some(value);
                slot.pinned = pinned;
                Handle::new(index, slot.generation)
            }
            None => {
                let index = self.next_index.fetch_add(1, Ordering::Relaxed);
                self.slots.insert(
                    index,
                    Slot {
                        generation: 1,
                        value: Some(value),
                        pinned,
                    },
                );
                Handle::new(index, 1)
            }
        }
    }

    /// Resolve a handle to its value.
    pub fn get(&self, handle: Handle) -> Result<Value, InteropError> {
        if handle.is_null() {
            return Err(InteropError::NullHandle);
        }
        let slot = self
            .slots
            .get(&handle.index())
            .ok_or(InteropError::StaleHandle(handle))?;
        if slot.generation != handle.generation() {
            return Err(InteropError::StaleHandle(handle));
        }
        slot.value.clone().ok_or(InteropError::StaleHandle(handle))
    }

    /// Whether a handle refers to a pinned value.
    pub fn is_pinned(&self, handle: Handle) -> bool {
        self.slots
            .get(&handle.index())
            .is_some_and(|slot| slot.generation == handle.generation() && slot.pinned)
    }

    /// Release a handle's value.
    ///
    /// Returns `Ok(false)` for pinned handles, which stay live.
    pub fn free(&self, handle: Handle) -> Result<bool, InteropError> {
        if handle.is_null() {
            return Err(InteropError::NullHandle);
        }
        let Some(mut slot) = self.slots.get_mut(&handle.index()) else {
            warn!(%handle, "free of unknown handle");
            return Err(InteropError::StaleHandle(handle));
        };
        if slot.generation != handle.generation() || slot.value.is_none() {
            warn!(%handle, "free of stale handle");
            return Err(InteropError::StaleHandle(handle));
        }
        if slot.pinned {
            return Ok(false);
        }
        slot.value = None;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        drop(slot);
        self.free.lock().push(handle.index());
        Ok(true)
    }

    /// Number of live values, pinned ones included.
    pub fn live(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value.is_some())
            .count()
    }
}

impl Default for HandleArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_insert_get() {
        let arena = HandleArena::new();
        let handle = arena.insert(Value::from(42));
        assert!(!handle.is_null());
        assert_eq!(arena.get(handle).unwrap().as_i32(), Some(42));
    }

    #[test]
    fn test_arena_free_makes_handle_stale() {
        let arena = HandleArena::new();
        let handle = arena.insert(Value::from(1));
        assert!(arena.free(handle).unwrap());
        assert_eq!(arena.get(handle).unwrap_err(), InteropError::StaleHandle(handle));
        assert_eq!(arena.free(handle).unwrap_err(), InteropError::StaleHandle(handle));
    }

    #[test]
    fn test_arena_reuses_slot_with_new_generation() {
        let arena = HandleArena::new();
        let first = arena.insert(Value::from(1));
        arena.free(first).unwrap();
        let second = arena.insert(Value::from(2));
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(arena.get(first).is_err());
        assert_eq!(arena.get(second).unwrap().as_i32(), Some(2));
    }

    #[test]
    fn test_arena_pinned_is_never_freed() {
        let arena = HandleArena::new();
        let handle = arena.insert_pinned(Value::from("service"));
        assert!(arena.is_pinned(handle));
        assert!(!arena.free(handle).unwrap());
        assert!(!arena.free(handle).unwrap());
        assert_eq!(arena.get(handle).unwrap().as_str(), Some("service"));
    }

    #[test]
    fn test_arena_null_handle() {
        let arena = HandleArena::new();
        assert_eq!(arena.get(Handle::NULL).unwrap_err(), InteropError::NullHandle);
    }

    #[test]
    fn test_arena_live_count() {
        let arena = HandleArena::new();
        let a = arena.insert(Value::from(1));
        let _b = arena.insert(Value::from(2));
        assert_eq!(arena.live(), 2);
        arena.free(a).unwrap();
        assert_eq!(arena.live(), 1);
    }
}
