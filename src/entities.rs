//! Record shapes for the five dashboard pages.
//!
//! Field names serialize in camelCase so slots stay readable by (and
//! shared with) the web dashboard's existing `localStorage` data.

use serde::{Deserialize, Serialize};

use crate::crud::{Record, RecordId};

#[cfg(test)]
#[path = "entities_test.rs"]
mod tests;

/// A dashboard entity with a fixed label and storage slot.
pub trait Entity: Record {
    /// Label used in notifications, e.g. "Purchase Order".
    const LABEL: &'static str;
    /// Slot name appended to the configured key prefix.
    const SLOT: &'static str;
}

macro_rules! impl_entity {
    ($ty:ty, $label:literal, $slot:literal) => {
        impl Record for $ty {
            fn id(&self) -> RecordId {
                self.id
            }

            fn set_id(&mut self, id: RecordId) {
                self.id = id;
            }
        }

        impl Entity for $ty {
            const LABEL: &'static str = $label;
            const SLOT: &'static str = $slot;
        }
    };
}

// =============================================================================
// PURCHASING
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: RecordId,
    pub supplier_name: String,
    /// `yyyy-MM-dd`.
    pub date: String,
    pub product_name: String,
    pub unit_cost: f64,
    pub total_cost: f64,
}

impl_entity!(PurchaseOrder, "Purchase Order", "purchase-orders");

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub material: String,
    pub thickness: f64,
    pub length: f64,
    pub width: f64,
    pub links: String,
}

impl_entity!(Product, "Product", "products");

// =============================================================================
// PRODUCTION
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrder {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_order_id: Option<RecordId>,
    pub product_id: RecordId,
    pub product_name: String,
    pub production_start: String,
    pub production_end: String,
    pub completed: bool,
}

impl_entity!(ProductionOrder, "Production Order", "production-orders");

// =============================================================================
// SALES
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub id: RecordId,
    pub client_name: String,
    pub date: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

impl SalesOrder {
    /// `quantity * unit_price`, the value the order form pre-fills.
    #[must_use]
    pub fn computed_total(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

impl_entity!(SalesOrder, "Sales Order", "sales-orders");

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: RecordId,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
}

impl_entity!(Client, "Client", "clients");
