//! User-facing notifications (toasts) emitted after successful mutations.
//!
//! The controller only produces title + description pairs; presentation is
//! the host's business. [`TracingNotifier`] logs them, [`NotificationLog`]
//! queues them for a UI layer to drain.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;

/// Which mutation a notification or callback refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudAction {
    Create,
    Update,
    Delete,
}

impl CrudAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Past-tense verb used in notification text.
    #[must_use]
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    /// Standard success message, e.g. "Client Created" /
    /// "The client has been successfully created.".
    #[must_use]
    pub fn for_action(entity_name: &str, action: CrudAction) -> Self {
        let verb = action.past_tense();
        let mut title_verb = verb.to_string();
        if let Some(first) = title_verb.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Self {
            title: format!("{entity_name} {title_verb}"),
            description: format!("The {} has been successfully {verb}.", entity_name.to_lowercase()),
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Logs notifications at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::info!(title = %notification.title, description = %notification.description, "notification");
    }
}

/// Shared FIFO of notifications waiting to be shown.
#[derive(Clone, Debug, Default)]
pub struct NotificationLog {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl NotificationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.entries.borrow().last().cloned()
    }

    /// Remove and return everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries.borrow_mut().push(notification);
    }
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}
