use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::config::StorageConfig;
use crate::crud::{CollectionOptions, RecordCollection};
use crate::notify::NotificationLog;
use crate::storage::MemoryOrigin;

// =============================================================================
// Wire shape
// =============================================================================

#[test]
fn purchase_order_serializes_camel_case() {
    let po = PurchaseOrder {
        id: 3,
        supplier_name: "Steelworks".into(),
        date: "2024-05-01".into(),
        product_name: "Sheet".into(),
        unit_cost: 12.5,
        total_cost: 125.0,
    };
    assert_eq!(
        serde_json::to_value(&po).unwrap(),
        json!({
            "id": 3,
            "supplierName": "Steelworks",
            "date": "2024-05-01",
            "productName": "Sheet",
            "unitCost": 12.5,
            "totalCost": 125.0,
        })
    );
}

#[test]
fn production_order_omits_missing_purchase_order() {
    let order = ProductionOrder { id: 1, product_id: 2, product_name: "Bracket".into(), ..ProductionOrder::default() };
    let value = serde_json::to_value(&order).unwrap();
    assert!(value.get("purchaseOrderId").is_none());
    assert_eq!(value["productId"], json!(2));

    let parsed: ProductionOrder = serde_json::from_value(json!({
        "id": 4,
        "productId": 2,
        "productName": "Bracket",
        "productionStart": "2024-01-01",
        "productionEnd": "2024-01-09",
        "completed": true,
    }))
    .unwrap();
    assert_eq!(parsed.purchase_order_id, None);
    assert!(parsed.completed);
}

#[test]
fn client_reads_dashboard_storage_format() {
    let raw = r#"[{"id":1,"name":"Ana","company":"MKM","email":"ana@mkm.test","phone":"555","active":true}]"#;
    let clients: Vec<Client> = serde_json::from_str(raw).unwrap();
    assert_eq!(clients[0].company, "MKM");
    assert!(clients[0].active);
}

#[test]
fn sales_order_computed_total() {
    let order = SalesOrder { quantity: 4, unit_price: 2.5, ..SalesOrder::default() };
    assert!((order.computed_total() - 10.0).abs() < f64::EPSILON);
}

// =============================================================================
// Entity metadata
// =============================================================================

#[test]
fn entity_labels_and_slots() {
    let config = StorageConfig::default();
    assert_eq!(config.slot_key(PurchaseOrder::SLOT), "mkmsolutions-purchase-orders");
    assert_eq!(config.slot_key(Product::SLOT), "mkmsolutions-products");
    assert_eq!(config.slot_key(ProductionOrder::SLOT), "mkmsolutions-production-orders");
    assert_eq!(config.slot_key(SalesOrder::SLOT), "mkmsolutions-sales-orders");
    assert_eq!(config.slot_key(Client::SLOT), "mkmsolutions-clients");
    assert_eq!(PurchaseOrder::LABEL, "Purchase Order");
    assert_eq!(ProductionOrder::LABEL, "Production Order");
}

#[test]
fn record_impl_reads_and_writes_id() {
    let mut product = Product::default();
    product.set_id(9);
    assert_eq!(product.id(), 9);
    assert_eq!(product.id, 9);
}

// =============================================================================
// Entities through the controller
// =============================================================================

#[test]
fn client_page_flow_end_to_end() {
    let origin = MemoryOrigin::new();
    let log = NotificationLog::new();
    let config = StorageConfig::default();
    let mut clients = RecordCollection::new(
        Rc::new(origin.tab()),
        Rc::new(log.clone()),
        CollectionOptions::<Client>::for_entity(&config, Vec::new()),
    );

    clients.request_add();
    let ana = clients
        .save(Client { name: "Ana".into(), company: "MKM".into(), active: true, ..Client::default() });
    assert_eq!(ana.id, 1);

    clients.request_edit(ana.clone());
    clients.save(Client { phone: "555-0100".into(), ..ana.clone() });

    let raw = origin.raw("mkmsolutions-clients").unwrap();
    let stored: Vec<Client> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].phone, "555-0100");

    clients.request_delete(stored[0].clone());
    clients.confirm_delete();
    assert!(clients.is_empty());

    let titles: Vec<String> = log.drain().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["Client Created", "Client Updated", "Client Deleted"]);
}
