//! Handle Table Module
//!
//! Provides a generational slot arena for pooled runtime objects. Each
//! stored object is addressed by a [`Handle`] carrying the slot index and
//! the slot's generation at insertion time. Removing an object bumps the
//! slot generation, so a handle held past destruction fails validation on
//! the next lookup instead of reaching a reused slot.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

/// Opaque handle to an object stored in a [`HandleTable`]
///
/// A handle is a copyable value pairing a slot index with the generation
/// the slot had when the object was inserted. Handles stay cheap to pass
/// across threads; only `lookup`/`contains` touch the table itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Slot index within the table
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Errors that can occur when operating on the handle table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleTableError {
    /// Table is at maximum capacity
    TableFull,
}

impl std::fmt::Display for HandleTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleTableError::TableFull => write!(f, "Handle table is full"),
        }
    }
}

impl std::error::Error for HandleTableError {}

/// One slot of the arena
///
/// The generation counts how many times the slot has been vacated; a
/// handle is valid only while its generation matches the slot's.
struct Slot<T> {
    generation: u32,
    value: Option<Arc<T>>,
}

/// Generational handle table
///
/// Maps opaque handles to shared object references. This is a thread-safe
/// implementation that allows concurrent lookups while maintaining data
/// integrity; vacated slots are reused in FIFO order.
pub struct HandleTable<T> {
    /// Slot arena; indices are stable for the table's lifetime
    slots: RwLock<Vec<Slot<T>>>,
    /// Queue of vacated slot indices available for reuse
    free_slots: Mutex<VecDeque<u32>>,
    /// Maximum number of live objects in the table (0 = unlimited)
    max_size: usize,
}

impl<T> HandleTable<T> {
    /// Create a new empty handle table with unlimited capacity
    ///
    /// # Examples
    /// ```
    /// use infrastructure_registry::HandleTable;
    ///
    /// let table: HandleTable<i32> = HandleTable::new();
    /// assert_eq!(table.size(), 0);
    /// ```
    pub fn new() -> Self {
        Self::with_max_size(0)
    }

    /// Create a new handle table with a maximum size limit
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of live objects (0 = unlimited)
    ///
    /// # Examples
    /// ```
    /// use infrastructure_registry::HandleTable;
    ///
    /// let table: HandleTable<i32> = HandleTable::with_max_size(1000);
    /// assert_eq!(table.max_size(), Some(1000));
    /// ```
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
            free_slots: Mutex::new(VecDeque::new()),
            max_size,
        }
    }

    /// Get the maximum size of the table
    ///
    /// # Returns
    /// * `Some(max_size)` - If a limit is set
    /// * `None` - If unlimited
    pub fn max_size(&self) -> Option<usize> {
        if self.max_size == 0 {
            None
        } else {
            Some(self.max_size)
        }
    }

    /// Insert an object and issue a handle for it
    ///
    /// Reuses a vacated slot when one is available, otherwise grows the
    /// arena by one slot.
    ///
    /// # Arguments
    /// * `value` - Object to store
    ///
    /// # Returns
    /// * `Ok(Handle)` - Handle addressing the stored object
    /// * `Err(HandleTableError::TableFull)` - Table is at maximum capacity
    ///
    /// # Examples
    /// ```
    /// use infrastructure_registry::HandleTable;
    ///
    /// let table = HandleTable::new();
    /// let handle = table.insert(42).unwrap();
    /// assert_eq!(*table.lookup(handle).unwrap(), 42);
    /// ```
    pub fn insert(&self, value: T) -> Result<Handle, HandleTableError> {
        let mut slots = self.slots.write().unwrap();

        if self.max_size > 0 {
            let live = slots.iter().filter(|slot| slot.value.is_some()).count();
            if live >= self.max_size {
                return Err(HandleTableError::TableFull);
            }
        }

        let index = {
            let mut free_slots = self.free_slots.lock().unwrap();
            free_slots.pop_front()
        };

        match index {
            Some(index) => {
                let slot = &mut slots[index as usize];
                slot.value = Some(Arc::new(value));
                Ok(Handle {
                    index,
                    generation: slot.generation,
                })
            }
            None => {
                let index = slots.len() as u32;
                slots.push(Slot {
                    generation: 0,
                    value: Some(Arc::new(value)),
                });
                Ok(Handle {
                    index,
                    generation: 0,
                })
            }
        }
    }

    /// Look up an object by handle
    ///
    /// Validates the handle's generation against the slot; a handle whose
    /// object was removed is reported as absent even if the slot has been
    /// reused since.
    ///
    /// # Arguments
    /// * `handle` - Handle to look up
    ///
    /// # Returns
    /// * `Some(Arc<T>)` - If the handle is live
    /// * `None` - If the handle is stale or unknown
    pub fn lookup(&self, handle: Handle) -> Option<Arc<T>> {
        let slots = self.slots.read().unwrap();
        let slot = slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref().map(Arc::clone)
    }

    /// Check whether a handle refers to a live object
    ///
    /// Safe to call with any handle value, including handles whose object
    /// has been removed.
    pub fn contains(&self, handle: Handle) -> bool {
        let slots = self.slots.read().unwrap();
        match slots.get(handle.index as usize) {
            Some(slot) => slot.generation == handle.generation && slot.value.is_some(),
            None => false,
        }
    }

    /// Remove an object from the table
    ///
    /// Bumps the slot generation so the removed handle (and any copies of
    /// it) become stale, then queues the slot for reuse.
    ///
    /// # Arguments
    /// * `handle` - Handle to remove
    ///
    /// # Returns
    /// * `Some(Arc<T>)` - Removed object if the handle was live
    /// * `None` - If the handle was stale or unknown
    ///
    /// # Examples
    /// ```
    /// use infrastructure_registry::HandleTable;
    ///
    /// let table = HandleTable::new();
    /// let handle = table.insert(7).unwrap();
    /// assert!(table.remove(handle).is_some());
    /// assert!(!table.contains(handle));
    /// assert!(table.remove(handle).is_none());
    /// ```
    pub fn remove(&self, handle: Handle) -> Option<Arc<T>> {
        let mut slots = self.slots.write().unwrap();
        let slot = slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let removed = slot.value.take();

        if removed.is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            let mut free_slots = self.free_slots.lock().unwrap();
            free_slots.push_back(handle.index);
        }

        removed
    }

    /// Get the number of live objects in the table
    pub fn size(&self) -> usize {
        let slots = self.slots.read().unwrap();
        slots.iter().filter(|slot| slot.value.is_some()).count()
    }

    /// Check if the table has no live objects
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_table_new() {
        let table: HandleTable<i32> = HandleTable::new();
        assert_eq!(table.size(), 0);
        assert!(table.is_empty());
        assert_eq!(table.max_size(), None);
    }

    #[test]
    fn test_insert_and_lookup() {
        let table = HandleTable::new();
        let handle = table.insert("first").unwrap();

        let found = table.lookup(handle);
        assert!(found.is_some());
        assert_eq!(*found.unwrap(), "first");
        assert_eq!(table.size(), 1);
    }

    #[test]
    fn test_lookup_unknown_handle() {
        let table_a = HandleTable::new();
        let table_b: HandleTable<i32> = HandleTable::new();
        let handle = table_a.insert(1).unwrap();

        // Handle from another table has an out-of-range index here
        assert!(table_b.lookup(handle).is_none());
        assert!(!table_b.contains(handle));
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let table = HandleTable::new();
        let handle = table.insert(10).unwrap();

        let removed = table.remove(handle);
        assert!(removed.is_some());
        assert_eq!(*removed.unwrap(), 10);

        assert!(table.lookup(handle).is_none());
        assert!(!table.contains(handle));
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn test_double_remove_is_safe() {
        let table = HandleTable::new();
        let handle = table.insert(10).unwrap();
        assert!(table.remove(handle).is_some());
        assert!(table.remove(handle).is_none());
    }

    #[test]
    fn test_slot_reuse_changes_generation() {
        let table = HandleTable::new();
        let first = table.insert(1).unwrap();
        table.remove(first);

        // Same slot is reused, but the stale handle must not see the new
        // occupant
        let second = table.insert(2).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());

        assert!(table.lookup(first).is_none());
        assert_eq!(*table.lookup(second).unwrap(), 2);
    }

    #[test]
    fn test_max_size_enforced() {
        let table = HandleTable::with_max_size(2);
        let a = table.insert(1).unwrap();
        let _b = table.insert(2).unwrap();

        let result = table.insert(3);
        assert_eq!(result.unwrap_err(), HandleTableError::TableFull);

        // Removing frees capacity
        table.remove(a);
        assert!(table.insert(3).is_ok());
        assert_eq!(table.size(), 2);
    }

    #[test]
    fn test_handle_accessors() {
        let table = HandleTable::new();
        let handle = table.insert(5).unwrap();
        assert_eq!(handle.index(), 0);
        assert_eq!(handle.generation(), 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let table = Arc::new(HandleTable::new());
        let mut threads = vec![];

        for i in 0..10 {
            let table_clone = Arc::clone(&table);
            threads.push(thread::spawn(move || {
                let handle = table_clone.insert(i).unwrap();
                assert_eq!(*table_clone.lookup(handle).unwrap(), i);
                handle
            }));
        }

        let handles: Vec<Handle> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert_eq!(table.size(), 10);
        for handle in handles {
            assert!(table.contains(handle));
        }
    }
}
