use super::*;

#[test]
fn init_installs_subscriber_only_once() {
    let config = StorageConfig::default();
    let _ = init(&config);
    assert!(!init(&config));
    tracing::info!("subscriber installed");
}
