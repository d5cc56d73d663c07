//! Browser `localStorage` backend (hydrate builds only).
//!
//! The `storage` event fires on `window` in every *other* tab of the origin
//! when a slot changes; subscribing attaches a listener for it and the
//! returned guard detaches that same listener on drop.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::{ChangeListener, KeyValueStore, StorageError, StorageEvent, Subscription};

const STORAGE_EVENT: &str = "storage";

#[derive(Clone, Debug)]
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl BrowserStorage {
    /// Handle on `window.localStorage`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when there is no window or the
    /// browser denies storage access (e.g. disabled cookies).
    pub fn local() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_error_text(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

fn js_error_text(value: &wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Browsers report quota failures as a `DOMException` named `QuotaExceededError`.
fn classify_put_error(key: &str, value: &str, err: &wasm_bindgen::JsValue) -> StorageError {
    let is_quota = err
        .dyn_ref::<web_sys::DomException>()
        .is_some_and(|ex| ex.name() == "QuotaExceededError");
    if is_quota {
        StorageError::QuotaExceeded { key: key.to_string(), needed: key.len() + value.len(), quota: 0 }
    } else {
        StorageError::Backend(js_error_text(err))
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(|e| StorageError::Backend(js_error_text(&e)))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| classify_put_error(key, value, &e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(|e| StorageError::Backend(js_error_text(&e)))
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let Some(window) = web_sys::window() else {
            return Subscription::inert();
        };

        let callback = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let key = event
                .dyn_ref::<web_sys::StorageEvent>()
                .and_then(web_sys::StorageEvent::key);
            listener(&StorageEvent { key });
        }) as Box<dyn FnMut(web_sys::Event)>);

        if window
            .add_event_listener_with_callback(STORAGE_EVENT, callback.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::warn!("failed to attach storage event listener");
            return Subscription::inert();
        }

        Subscription::new(move || {
            let _ = window.remove_event_listener_with_callback(STORAGE_EVENT, callback.as_ref().unchecked_ref());
            drop(callback);
        })
    }
}
