//! Generic CRUD controller over a persisted record list.
//!
//! DESIGN
//! ======
//! One `RecordCollection<T>` backs one dashboard page. It owns two small
//! state machines, the add/edit form and the delete confirmation, and is
//! the only writer of the list. The list itself lives in a
//! [`PersistentValue`], which is the single source of truth and the only
//! path to durable storage.
//!
//! Form flow:   `Closed -> Create | Edit(target) -> Closed`
//! Delete flow: `Closed -> Confirming(target) -> Closed`
//!
//! New records get `max(existing ids) + 1`, or `1` for an empty list. Ids
//! vacated by deletes are never handed out again while a higher id exists.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here returns an error. Storage problems are absorbed (and logged)
//! by the persisted value; confirming a delete with no target is a no-op.

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::entities::Entity;
use crate::notify::{CrudAction, Notification, Notifier};
use crate::persisted::PersistentValue;
use crate::storage::KeyValueStore;

#[cfg(test)]
#[path = "crud_test.rs"]
mod tests;

// =============================================================================
// RECORD
// =============================================================================

pub type RecordId = u64;

/// A storable value carrying a unique numeric id.
pub trait Record: Clone + Serialize + DeserializeOwned + 'static {
    fn id(&self) -> RecordId;
    fn set_id(&mut self, id: RecordId);
}

/// Id for the next created record: one past the current maximum.
///
/// If the maximum is already `RecordId::MAX` the lowest unused id is taken
/// instead, so the result never collides with an existing record.
#[must_use]
pub fn next_id<T: Record>(records: &[T]) -> RecordId {
    let Some(max) = records.iter().map(Record::id).max() else {
        return 1;
    };
    if let Some(next) = max.checked_add(1) {
        return next;
    }

    let mut used: Vec<RecordId> = records.iter().map(Record::id).collect();
    used.sort_unstable();
    used.dedup();
    let lowest_free = used
        .iter()
        .zip(1..)
        .find(|(id, expected)| **id != *expected)
        .map_or(used.len() as RecordId + 1, |(_, expected)| expected);
    warn!(max, id = lowest_free, "record id space exhausted, reusing lowest free id");
    lowest_free
}

// =============================================================================
// FLOW STATE
// =============================================================================

/// Add/edit form flow. The variant doubles as the edit selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormState<T> {
    Closed,
    /// Open for a new record.
    Create,
    /// Open for editing the contained record.
    Edit(T),
}

impl<T> Default for FormState<T> {
    fn default() -> Self {
        Self::Closed
    }
}

impl<T> FormState<T> {
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    #[must_use]
    pub fn edit_target(&self) -> Option<&T> {
        match self {
            Self::Edit(target) => Some(target),
            Self::Closed | Self::Create => None,
        }
    }
}

/// Delete confirmation flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteState<T> {
    Closed,
    Confirming(T),
}

impl<T> Default for DeleteState<T> {
    fn default() -> Self {
        Self::Closed
    }
}

impl<T> DeleteState<T> {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Confirming(_))
    }

    #[must_use]
    pub fn target(&self) -> Option<&T> {
        match self {
            Self::Confirming(target) => Some(target),
            Self::Closed => None,
        }
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Called after every successful mutation with the affected record.
pub type SuccessCallback<T> = Box<dyn FnMut(CrudAction, &T)>;

pub struct CollectionOptions<T> {
    /// Initial list used while the storage slot is empty.
    pub seed: Vec<T>,
    /// Human-readable entity label used in notifications, e.g. "Client".
    pub entity_name: String,
    pub storage_key: String,
    pub on_success: Option<SuccessCallback<T>>,
}

impl<T> CollectionOptions<T> {
    pub fn new(entity_name: impl Into<String>, storage_key: impl Into<String>, seed: Vec<T>) -> Self {
        Self { seed, entity_name: entity_name.into(), storage_key: storage_key.into(), on_success: None }
    }

    #[must_use]
    pub fn on_success(mut self, callback: impl FnMut(CrudAction, &T) + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }
}

impl<E: Entity> CollectionOptions<E> {
    /// Options for one of the dashboard entities, keyed under the configured prefix.
    #[must_use]
    pub fn for_entity(config: &StorageConfig, seed: Vec<E>) -> Self {
        Self::new(E::LABEL, config.slot_key(E::SLOT), seed)
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct RecordCollection<T: Record> {
    data: PersistentValue<Vec<T>>,
    entity_name: String,
    form: FormState<T>,
    delete: DeleteState<T>,
    notifier: Rc<dyn Notifier>,
    on_success: Option<SuccessCallback<T>>,
}

impl<T: Record> RecordCollection<T> {
    pub fn new(storage: Rc<dyn KeyValueStore>, notifier: Rc<dyn Notifier>, options: CollectionOptions<T>) -> Self {
        let CollectionOptions { seed, entity_name, storage_key, on_success } = options;
        let data = PersistentValue::open(storage, storage_key, seed);
        Self {
            data,
            entity_name,
            form: FormState::Closed,
            delete: DeleteState::Closed,
            notifier,
            on_success,
        }
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.data.key()
    }

    /// Snapshot of the current list.
    #[must_use]
    pub fn records(&self) -> Vec<T> {
        self.data.get()
    }

    pub fn with_records<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.data.with(|records| f(records))
    }

    #[must_use]
    pub fn find(&self, id: RecordId) -> Option<T> {
        self.with_records(|records| records.iter().find(|r| r.id() == id).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.with_records(<[T]>::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn form(&self) -> &FormState<T> {
        &self.form
    }

    #[must_use]
    pub fn delete_state(&self) -> &DeleteState<T> {
        &self.delete
    }

    #[must_use]
    pub fn is_form_open(&self) -> bool {
        self.form.is_open()
    }

    #[must_use]
    pub fn is_delete_open(&self) -> bool {
        self.delete.is_open()
    }

    #[must_use]
    pub fn edit_target(&self) -> Option<&T> {
        self.form.edit_target()
    }

    #[must_use]
    pub fn delete_target(&self) -> Option<&T> {
        self.delete.target()
    }

    // -------------------------------------------------------------------------
    // Flow transitions
    // -------------------------------------------------------------------------

    /// Open the form for a new record.
    pub fn request_add(&mut self) {
        self.form = FormState::Create;
    }

    /// Open the form for editing `record`.
    pub fn request_edit(&mut self, record: T) {
        self.form = FormState::Edit(record);
    }

    /// Ask for confirmation before deleting `record`.
    pub fn request_delete(&mut self, record: T) {
        self.delete = DeleteState::Confirming(record);
    }

    pub fn cancel_form(&mut self) {
        self.form = FormState::Closed;
    }

    pub fn cancel_delete(&mut self) {
        self.delete = DeleteState::Closed;
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Delete the pending target, if any, and close the dialog.
    ///
    /// Returns the deleted record, or `None` when nothing was pending.
    pub fn confirm_delete(&mut self) -> Option<T> {
        let DeleteState::Confirming(target) = std::mem::take(&mut self.delete) else {
            return None;
        };

        let target_id = target.id();
        let mut records = self.data.get();
        records.retain(|r| r.id() != target_id);
        self.data.set(records);

        self.finish(CrudAction::Delete, &target);
        Some(target)
    }

    /// Save the form: update the edit target in place, or append `record`
    /// under a fresh id. Closes the form.
    ///
    /// Returns the record as stored. If the edit target has meanwhile left
    /// the list (e.g. deleted in another tab) the list is written back
    /// unchanged and the update is still reported.
    pub fn save(&mut self, mut record: T) -> T {
        let mut records = self.data.get();

        let action = match std::mem::take(&mut self.form) {
            FormState::Edit(target) => {
                let target_id = target.id();
                record.set_id(target_id);
                if let Some(slot) = records.iter_mut().find(|r| r.id() == target_id) {
                    *slot = record.clone();
                } else {
                    warn!(entity = %self.entity_name, id = target_id, "edit target no longer exists, list unchanged");
                }
                CrudAction::Update
            }
            FormState::Create | FormState::Closed => {
                record.set_id(next_id(&records));
                records.push(record.clone());
                CrudAction::Create
            }
        };

        self.data.set(records);
        self.finish(action, &record);
        record
    }

    /// Replace the whole list without notifications.
    ///
    /// Returns `true` if the list reached durable storage.
    pub fn replace_all(&mut self, records: Vec<T>) -> bool {
        self.data.set(records)
    }

    /// Re-read the list from storage.
    pub fn refresh(&self) {
        self.data.refresh();
    }

    fn finish(&mut self, action: CrudAction, record: &T) {
        debug!(entity = %self.entity_name, %action, id = record.id(), "record mutation applied");
        self.notifier.notify(Notification::for_action(&self.entity_name, action));
        if let Some(callback) = self.on_success.as_mut() {
            callback(action, record);
        }
    }
}

impl<T: Record + std::fmt::Debug> std::fmt::Debug for RecordCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCollection")
            .field("entity_name", &self.entity_name)
            .field("data", &self.data)
            .field("form", &self.form)
            .field("delete", &self.delete)
            .finish_non_exhaustive()
    }
}
