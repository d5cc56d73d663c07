//! In-memory storage origin shared by any number of tab handles.
//!
//! DESIGN
//! ======
//! A [`MemoryOrigin`] plays the role of a browser origin's `localStorage`
//! area. Each [`MemoryStorage`] handle is one "tab": writes made through a
//! handle notify listeners registered through every *other* handle, never
//! its own, which is how the browser `storage` event behaves.
//!
//! The origin also carries the knobs tests need to exercise failure paths:
//! a byte quota, per-key read faults, a global write fault and a counter
//! of successful writes.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use super::{ChangeListener, KeyValueStore, StorageError, StorageEvent, Subscription};

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

struct ListenerEntry {
    id: u64,
    tab: u64,
    listener: ChangeListener,
}

#[derive(Default)]
struct OriginInner {
    slots: RefCell<BTreeMap<String, String>>,
    listeners: RefCell<Vec<ListenerEntry>>,
    quota: Option<usize>,
    next_tab: Cell<u64>,
    next_listener: Cell<u64>,
    writes: Cell<usize>,
    failing_reads: RefCell<BTreeSet<String>>,
    failing_writes: Cell<bool>,
}

impl OriginInner {
    fn used_bytes_without(&self, key: &str) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    /// Deliver `event` to every listener not registered by `origin_tab`.
    fn broadcast(&self, origin_tab: Option<u64>, event: &StorageEvent) {
        // Clone out so listeners may read or subscribe re-entrantly.
        let targets: Vec<ChangeListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|entry| Some(entry.tab) != origin_tab)
            .map(|entry| Rc::clone(&entry.listener))
            .collect();
        for listener in targets {
            listener(event);
        }
    }
}

// =============================================================================
// ORIGIN
// =============================================================================

/// Shared in-memory storage area.
#[derive(Clone, Default)]
pub struct MemoryOrigin {
    inner: Rc<OriginInner>,
}

impl MemoryOrigin {
    /// An origin without a size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An origin that rejects writes once keys plus values exceed `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self { inner: Rc::new(OriginInner { quota: Some(quota), ..OriginInner::default() }) }
    }

    /// Open a new tab handle on this origin.
    #[must_use]
    pub fn tab(&self) -> MemoryStorage {
        let tab = self.inner.next_tab.get();
        self.inner.next_tab.set(tab + 1);
        MemoryStorage { origin: self.clone(), tab }
    }

    /// Remove every slot and notify all tabs.
    pub fn clear(&self) {
        self.inner.slots.borrow_mut().clear();
        self.inner.writes.set(self.inner.writes.get() + 1);
        self.inner.broadcast(None, &StorageEvent::cleared());
    }

    /// Make reads of `key` fail until [`MemoryOrigin::heal_reads`] is called.
    pub fn fail_reads_for(&self, key: &str) {
        self.inner.failing_reads.borrow_mut().insert(key.to_string());
    }

    pub fn heal_reads(&self) {
        self.inner.failing_reads.borrow_mut().clear();
    }

    /// Toggle failure of every `put` and `remove`.
    pub fn fail_writes(&self, failing: bool) {
        self.inner.failing_writes.set(failing);
    }

    /// Number of successful writes (puts, removes, clears) on this origin.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.writes.get()
    }

    /// Raw slot contents, bypassing fault injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.slots.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.slots.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl std::fmt::Debug for MemoryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryOrigin")
            .field("slots", &self.inner.slots.borrow().len())
            .field("listeners", &self.listener_count())
            .field("quota", &self.inner.quota)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TAB HANDLE
// =============================================================================

/// One tab's view of a [`MemoryOrigin`].
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    origin: MemoryOrigin,
    tab: u64,
}

impl MemoryStorage {
    /// A handle on a fresh, private, unlimited origin.
    #[must_use]
    pub fn new() -> Self {
        MemoryOrigin::new().tab()
    }

    #[must_use]
    pub fn origin(&self) -> &MemoryOrigin {
        &self.origin
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.origin.inner.failing_writes.get() {
            return Err(StorageError::Backend("write rejected by memory origin".into()));
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = &self.origin.inner;
        if inner.failing_reads.borrow().contains(key) {
            return Err(StorageError::Backend(format!("read of {key} rejected by memory origin")));
        }
        Ok(inner.slots.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        let inner = &self.origin.inner;
        if let Some(quota) = inner.quota {
            let needed = inner.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { key: key.to_string(), needed, quota });
            }
        }
        inner.slots.borrow_mut().insert(key.to_string(), value.to_string());
        inner.writes.set(inner.writes.get() + 1);
        inner.broadcast(Some(self.tab), &StorageEvent::for_key(key));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        let inner = &self.origin.inner;
        let removed = inner.slots.borrow_mut().remove(key).is_some();
        if removed {
            inner.writes.set(inner.writes.get() + 1);
            inner.broadcast(Some(self.tab), &StorageEvent::for_key(key));
        }
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let inner = &self.origin.inner;
        let id = inner.next_listener.get();
        inner.next_listener.set(id + 1);
        inner.listeners.borrow_mut().push(ListenerEntry { id, tab: self.tab, listener });

        let weak: Weak<OriginInner> = Rc::downgrade(inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|entry| entry.id != id);
            }
        })
    }
}
