//! Lifecycle tests against a real MongoDB
//!
//! Tests that need a server start one with testcontainers and are ignored by default:
//! `cargo test -p mongo_store -- --ignored`

use core_config::{Environment, tracing::init_tracing};
use mongo_store::{MongoStore, StoreConfig, StoreErrorKind, check_health, check_health_detailed};
use mongodb::bson::{Document, doc};
use mongodb::options::ReadPreference;
use std::time::Duration;
use test_utils::TestMongo;

fn config_for(mongo: &TestMongo) -> StoreConfig {
    init_tracing(&Environment::from_env());

    StoreConfig {
        host: mongo.host().to_string(),
        port: mongo.port().to_string(),
        db: "store_tests".to_string(),
        username: mongo.username().to_string(),
        password: mongo.password().to_string(),
        conn_timeout: Duration::from_secs(5),
        pool_size: 1,
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_start_shutdown_repeatable() {
    let mongo = TestMongo::new().await;
    let config = config_for(&mongo);
    assert!(config.check().is_ok());

    let mut store = MongoStore::new(config);
    assert!(!store.is_running());

    for _ in 0..2 {
        store.start().await.unwrap();
        assert!(store.is_running());
        assert!(check_health(&store).await);

        store.shutdown().await;
        assert!(!store.is_running());
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_one_nanosecond_timeout() {
    let mongo = TestMongo::new().await;
    let mut store = MongoStore::new(StoreConfig {
        conn_timeout: Duration::from_nanos(1),
        ..config_for(&mongo)
    });

    let err = store.start().await.unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::DeadlineExceeded);
    assert!(!store.is_running());
    store.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_wrong_port_times_out() {
    let mongo = TestMongo::new().await;
    let mut store = MongoStore::new(StoreConfig {
        port: "12345".to_string(),
        conn_timeout: Duration::from_millis(500),
        ..config_for(&mongo)
    });

    let err = store.start().await.unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::DeadlineExceeded);
    assert!(!store.is_running());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_wrong_password_is_auth_failure() {
    let mongo = TestMongo::new().await;
    let mut store = MongoStore::new(StoreConfig {
        password: "error".to_string(),
        ..config_for(&mongo)
    });

    let err = store.start().await.unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::AuthenticationFailed, "{err}");
    assert!(!err.is_timeout());
    assert!(!store.is_running());

    // A corrected configuration works on a fresh store
    let mut store = MongoStore::new(config_for(&mongo));
    store.start().await.unwrap();
    store.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_capabilities_while_running() {
    let mongo = TestMongo::new().await;
    let mut store = MongoStore::connect(config_for(&mongo)).await.unwrap();

    store.ping(ReadPreference::Primary).await.unwrap();

    let items = store.collection::<Document>("items").unwrap();
    items.insert_one(doc! { "name": "widget" }).await.unwrap();
    let found = items.find_one(doc! { "name": "widget" }).await.unwrap();
    assert!(found.is_some());

    let mut session = store.start_session(None).await.unwrap();
    let count = items
        .count_documents(doc! {})
        .session(&mut session)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let status = check_health_detailed(&store).await;
    assert!(status.running && status.healthy);

    // The session is still alive here
    tokio::time::timeout(Duration::from_secs(5), store.shutdown())
        .await
        .unwrap();
    assert!(!store.is_running());
    assert!(store.collection::<Document>("items").is_err());
    drop(session);
}
