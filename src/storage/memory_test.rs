use std::cell::RefCell;

use super::*;

fn recorder() -> (ChangeListener, Rc<RefCell<Vec<StorageEvent>>>) {
    let seen: Rc<RefCell<Vec<StorageEvent>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let listener: ChangeListener = Rc::new(move |event: &StorageEvent| sink.borrow_mut().push(event.clone()));
    (listener, seen)
}

// =============================================================================
// Slot operations
// =============================================================================

#[test]
fn get_absent_key_is_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("missing").unwrap(), None);
}

#[test]
fn put_then_get_returns_value() {
    let storage = MemoryStorage::new();
    storage.put("k", "v").unwrap();
    assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn tabs_share_slots() {
    let origin = MemoryOrigin::new();
    origin.tab().put("k", "v").unwrap();
    assert_eq!(origin.tab().get("k").unwrap().as_deref(), Some("v"));
    assert_eq!(origin.keys(), vec!["k".to_string()]);
}

#[test]
fn remove_absent_key_is_ok_and_not_counted() {
    let storage = MemoryStorage::new();
    storage.remove("nothing").unwrap();
    assert_eq!(storage.origin().write_count(), 0);
}

// =============================================================================
// Quota and fault injection
// =============================================================================

#[test]
fn quota_counts_keys_and_values() {
    let origin = MemoryOrigin::with_quota(10);
    let tab = origin.tab();
    tab.put("ab", "cdef").unwrap();
    let err = tab.put("gh", "ijklm").unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded { needed: 13, quota: 10, .. }));
}

#[test]
fn quota_ignores_value_being_replaced() {
    let origin = MemoryOrigin::with_quota(10);
    let tab = origin.tab();
    tab.put("ab", "cdefgh").unwrap();
    tab.put("ab", "12345678").unwrap();
    assert_eq!(origin.raw("ab").as_deref(), Some("12345678"));
}

#[test]
fn failing_reads_are_scoped_to_key() {
    let origin = MemoryOrigin::new();
    let tab = origin.tab();
    tab.put("bad", "1").unwrap();
    tab.put("good", "2").unwrap();
    origin.fail_reads_for("bad");
    assert!(tab.get("bad").is_err());
    assert_eq!(tab.get("good").unwrap().as_deref(), Some("2"));
    origin.heal_reads();
    assert_eq!(tab.get("bad").unwrap().as_deref(), Some("1"));
}

#[test]
fn failing_writes_reject_put_and_remove() {
    let origin = MemoryOrigin::new();
    let tab = origin.tab();
    tab.put("k", "v").unwrap();
    origin.fail_writes(true);
    assert!(matches!(tab.put("k", "w"), Err(StorageError::Backend(_))));
    assert!(tab.remove("k").is_err());
    assert_eq!(origin.raw("k").as_deref(), Some("v"));
    assert_eq!(origin.write_count(), 1);
}

// =============================================================================
// Change notification
// =============================================================================

#[test]
fn put_notifies_other_tabs_only() {
    let origin = MemoryOrigin::new();
    let writer = origin.tab();
    let reader = origin.tab();
    let (own, own_seen) = recorder();
    let (other, other_seen) = recorder();
    let _own_sub = writer.subscribe(own);
    let _other_sub = reader.subscribe(other);

    writer.put("k", "v").unwrap();

    assert!(own_seen.borrow().is_empty());
    assert_eq!(*other_seen.borrow(), vec![StorageEvent::for_key("k")]);
}

#[test]
fn clear_notifies_every_tab() {
    let origin = MemoryOrigin::new();
    let (listener, seen) = recorder();
    let _sub = origin.tab().subscribe(listener);
    origin.tab().put("k", "v").unwrap();
    origin.clear();
    assert_eq!(*seen.borrow(), vec![StorageEvent::for_key("k"), StorageEvent::cleared()]);
    assert!(origin.keys().is_empty());
}

#[test]
fn dropped_subscription_stops_delivery() {
    let origin = MemoryOrigin::new();
    let (listener, seen) = recorder();
    let sub = origin.tab().subscribe(listener);
    assert!(sub.is_active());
    drop(sub);
    origin.tab().put("k", "v").unwrap();
    assert!(seen.borrow().is_empty());
    assert_eq!(origin.listener_count(), 0);
}

#[test]
fn listener_may_read_storage_reentrantly() {
    let origin = MemoryOrigin::new();
    let reader = origin.tab();
    let seen: Rc<RefCell<Option<String>>> = Rc::default();
    let sink = Rc::clone(&seen);
    let reader_for_cb = reader.clone();
    let _sub = reader.subscribe(Rc::new(move |_event: &StorageEvent| {
        *sink.borrow_mut() = reader_for_cb.get("k").unwrap();
    }));
    origin.tab().put("k", "fresh").unwrap();
    assert_eq!(seen.borrow().as_deref(), Some("fresh"));
}
