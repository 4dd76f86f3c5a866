//! End-to-end messaging flows against the durable backend.

use courier_commons::{MessagingConfig, NamespaceId, StoreRequest, TopicId};
use courier_core::{MessagingService, OpenGate, TtlCleanupScheduler};
use courier_store::{SledBackend, StorageBackend};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn topic(name: &str) -> TopicId {
    TopicId::new(NamespaceId::new("tenant1"), name)
}

fn open_service(path: &std::path::Path) -> (Arc<dyn StorageBackend>, MessagingService) {
    let backend: Arc<dyn StorageBackend> = Arc::new(SledBackend::open(path).unwrap());
    let service = MessagingService::new(
        backend.clone(),
        Arc::new(OpenGate),
        MessagingConfig::default(),
    )
    .unwrap();
    (backend, service)
}

#[test]
fn test_publish_fetch_expire_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (backend, service) = open_service(dir.path());

    let t1 = topic("t1");
    let props = HashMap::from([("ttl".to_string(), "1".to_string())]);
    service.create_topic(&t1, props).unwrap();

    service
        .publish(StoreRequest::new(
            t1.clone(),
            vec![b"a".to_vec(), b"b".to_vec()],
        ))
        .unwrap()
        .unwrap();

    let messages: Vec<_> = service.fetch(&t1, None, 10, None).unwrap().collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].payload, b"a");
    assert_eq!(messages[1].payload, b"b");
    assert!(messages[0].id < messages[1].id);

    // Let the retention window elapse, then sweep.
    std::thread::sleep(Duration::from_millis(1_300));
    let scheduler = TtlCleanupScheduler::new(backend, MessagingConfig::default()).unwrap();
    let stats = scheduler.run_sweep();
    assert_eq!(stats.messages_deleted, 2);

    assert_eq!(service.fetch(&t1, None, 10, None).unwrap().count(), 0);
}

#[test]
fn test_ids_keep_increasing_across_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first_range = {
        let (_, service) = open_service(dir.path());
        let t = topic("orders");
        service.create_topic(&t, HashMap::new()).unwrap();
        service
            .publish(StoreRequest::new(t, vec![b"before".to_vec()]))
            .unwrap()
            .unwrap()
    };

    let (_, service) = open_service(dir.path());
    let t = topic("orders");
    let second_range = service
        .publish(StoreRequest::new(t.clone(), vec![b"after".to_vec()]))
        .unwrap()
        .unwrap();

    assert_eq!(second_range.generation, first_range.generation);
    assert!(second_range.first > first_range.last);

    let payloads: Vec<_> = service
        .fetch(&t, None, 10, None)
        .unwrap()
        .map(|m| m.payload)
        .collect();
    assert_eq!(payloads, vec![b"before".to_vec(), b"after".to_vec()]);
}

#[test]
fn test_transactional_flow_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let (_, service) = open_service(dir.path());
        let t = topic("ledger");
        service.create_topic(&t, HashMap::new()).unwrap();
        service
            .store_payload(StoreRequest::transactional(
                t.clone(),
                42,
                vec![b"debit".to_vec()],
            ))
            .unwrap();
        // Invisible while staged.
        assert_eq!(service.fetch(&t, None, 10, None).unwrap().count(), 0);
    }

    // The coordinator signals commit after a restart.
    let (_, service) = open_service(dir.path());
    let t = topic("ledger");
    assert_eq!(service.finalize(&t, 42).unwrap(), 1);

    let messages: Vec<_> = service.fetch(&t, None, 10, None).unwrap().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].payload, b"debit");
    assert_eq!(messages[0].id.write_pointer, Some(42));
}

#[tokio::test]
async fn test_background_scheduler_expires_messages() {
    let dir = tempfile::tempdir().unwrap();
    let (backend, service) = open_service(dir.path());

    let t = topic("ephemeral");
    let props = HashMap::from([("ttl".to_string(), "1".to_string())]);
    service.create_topic(&t, props).unwrap();
    service
        .publish(StoreRequest::new(t.clone(), vec![b"x".to_vec()]))
        .unwrap();

    let config = MessagingConfig {
        cleanup_interval_seconds: 1,
        ..MessagingConfig::default()
    };
    let scheduler = Arc::new(TtlCleanupScheduler::new(backend, config).unwrap());
    scheduler.start();

    // Give the scheduler a few intervals to pass the retention window.
    tokio::time::sleep(Duration::from_millis(2_600)).await;
    scheduler.stop().await;

    assert_eq!(service.fetch(&t, None, 10, None).unwrap().count(), 0);
}
