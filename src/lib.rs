//! # mkm-dashboard
//!
//! Record storage core for the business-management dashboard: purchase
//! orders, production orders, products, sales orders and clients.
//!
//! Each page drives a [`crud::RecordCollection`], a generic add/edit/delete
//! controller whose list lives in a [`persisted::PersistentValue`] slot of a
//! [`storage::KeyValueStore`]: in memory, in a directory of JSON files, or
//! (with the `hydrate` feature) in browser `localStorage`.

pub mod config;
pub mod crud;
pub mod entities;
pub mod logging;
pub mod notify;
pub mod persisted;
pub mod storage;

pub use crud::{CollectionOptions, DeleteState, FormState, Record, RecordCollection, RecordId};
pub use entities::{Client, Entity, Product, ProductionOrder, PurchaseOrder, SalesOrder};
pub use notify::{CrudAction, Notification, NotificationLog, Notifier, TracingNotifier};
pub use persisted::PersistentValue;
pub use storage::{KeyValueStore, StorageError};
