//! Typed value mirrored into one storage slot.
//!
//! DESIGN
//! ======
//! The in-memory mirror is authoritative for reads. Writes land in the mirror
//! first and are then serialized to the slot; if that fails the mirror keeps
//! the new value and the failure is only logged. Durability is best-effort,
//! visibility within this handle is guaranteed.
//!
//! The mirror re-reads its slot whenever the storage origin reports a change
//! made elsewhere (another tab), so handles on the same slot converge on the
//! last write. The listener is removed when the value is dropped.
//!
//! ERROR HANDLING
//! ==============
//! No operation returns an error. An absent slot yields the default; an
//! unreadable or undecodable slot yields the default with a warning.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageEvent, Subscription};

#[cfg(test)]
#[path = "persisted_test.rs"]
mod tests;

struct Slot<T> {
    key: String,
    storage: Rc<dyn KeyValueStore>,
    default: T,
    current: RefCell<T>,
}

impl<T> Slot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    fn load(&self) -> T {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "storage slot empty, using default");
                return self.default.clone();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "error reading storage slot, using default");
                return self.default.clone();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %self.key, error = %e, "error decoding storage slot, using default");
                self.default.clone()
            }
        }
    }

    fn refresh(&self) {
        let value = self.load();
        *self.current.borrow_mut() = value;
    }
}

/// A value of type `T` persisted under one storage key.
pub struct PersistentValue<T> {
    slot: Rc<Slot<T>>,
    _subscription: Subscription,
}

impl<T> PersistentValue<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Load `key` from `storage`, falling back to `default`, and start
    /// following external changes to the origin.
    pub fn open(storage: Rc<dyn KeyValueStore>, key: impl Into<String>, default: T) -> Self {
        let slot = Rc::new(Slot {
            key: key.into(),
            storage,
            current: RefCell::new(default.clone()),
            default,
        });
        slot.refresh();

        let weak: Weak<Slot<T>> = Rc::downgrade(&slot);
        let subscription = slot.storage.subscribe(Rc::new(move |event: &StorageEvent| {
            if let Some(slot) = weak.upgrade() {
                debug!(key = %slot.key, changed = ?event.key, "storage changed externally, re-reading slot");
                slot.refresh();
            }
        }));

        Self { slot, _subscription: subscription }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.slot.key
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.slot.current.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.current.borrow())
    }

    /// Replace the value and persist it.
    ///
    /// Returns `true` if the value reached durable storage. The in-memory
    /// value is replaced either way.
    pub fn set(&self, value: T) -> bool {
        let encoded = serde_json::to_string(&value);
        *self.slot.current.borrow_mut() = value;

        let raw = match encoded {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.slot.key, error = %e, "error encoding value for storage slot");
                return false;
            }
        };

        match self.slot.storage.put(&self.slot.key, &raw) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.slot.key, error = %e, "error writing storage slot");
                false
            }
        }
    }

    /// Re-read the slot, replacing the in-memory value.
    pub fn refresh(&self) {
        self.slot.refresh();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PersistentValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentValue")
            .field("key", &self.slot.key)
            .field("current", &self.slot.current.borrow())
            .finish_non_exhaustive()
    }
}
