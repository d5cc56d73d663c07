//! Key-value storage capability backing persisted values.
//!
//! DESIGN
//! ======
//! Every backend exposes the same string-keyed, string-valued slot API that
//! browser `localStorage` offers, plus an origin-wide change subscription.
//! Values are opaque JSON text at this layer; typing happens one level up in
//! [`crate::persisted::PersistentValue`].
//!
//! Subscriptions are RAII guards: dropping a [`Subscription`] removes the
//! listener from the backend. Backends without shared multi-process storage
//! (the file backend) hand out inert guards.

mod file;
mod memory;

#[cfg(feature = "hydrate")]
mod browser;

use std::rc::Rc;

pub use file::FileStorage;
pub use memory::{MemoryOrigin, MemoryStorage};

#[cfg(feature = "hydrate")]
pub use browser::BrowserStorage;

use crate::config::{StorageBackend, StorageConfig};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded writing {key}: needs {needed} bytes, quota {quota}")]
    QuotaExceeded { key: String, needed: usize, quota: usize },
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Change signal delivered to subscribers.
///
/// `key` is `None` when the whole origin was cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: Option<String>,
}

impl StorageEvent {
    #[must_use]
    pub fn for_key(key: &str) -> Self {
        Self { key: Some(key.to_string()) }
    }

    #[must_use]
    pub fn cleared() -> Self {
        Self { key: None }
    }
}

/// Listener invoked on every change observed on the storage origin.
pub type ChangeListener = Rc<dyn Fn(&StorageEvent)>;

/// Guard for a registered [`ChangeListener`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription removes the listener immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// A guard with nothing to cancel, for backends without change signals.
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}

// =============================================================================
// CAPABILITY
// =============================================================================

/// Durable per-origin key-value storage.
pub trait KeyValueStore {
    /// Read the raw value of `key`, `Ok(None)` when the slot is absent.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the raw value of `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the value could not be stored, e.g.
    /// [`StorageError::QuotaExceeded`].
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Register `listener` for changes made to this origin elsewhere.
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

// =============================================================================
// FACTORY
// =============================================================================

/// Build the backend selected by `config`.
///
/// # Errors
///
/// Returns [`StorageError::Io`] if the file backend directory cannot be
/// created, or [`StorageError::Unavailable`] if the browser backend is
/// requested outside a browser build.
pub fn open(config: &StorageConfig) -> Result<Rc<dyn KeyValueStore>, StorageError> {
    let store: Rc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Memory => Rc::new(MemoryOrigin::with_quota(config.quota_bytes).tab()),
        StorageBackend::File => Rc::new(FileStorage::open(&config.data_dir)?),
        StorageBackend::Browser => open_browser()?,
    };
    tracing::info!(backend = %config.backend, "storage backend opened");
    Ok(store)
}

#[cfg(feature = "hydrate")]
fn open_browser() -> Result<Rc<dyn KeyValueStore>, StorageError> {
    Ok(Rc::new(BrowserStorage::local()?))
}

#[cfg(not(feature = "hydrate"))]
fn open_browser() -> Result<Rc<dyn KeyValueStore>, StorageError> {
    Err(StorageError::Unavailable("browser storage requires the `hydrate` feature".into()))
}
