use mongodb::options::ReadPreference;
use serde::Serialize;
use std::time::Instant;

use crate::driver::Driver;
use crate::store::MongoStore;

/// Health check status for a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// Whether the store has a live connection (readiness)
    pub running: bool,
    /// Whether the primary answered a ping (liveness)
    pub healthy: bool,
    /// Error details when unhealthy
    pub message: Option<String>,
    /// Ping round trip in milliseconds
    pub response_time_ms: u64,
}

/// Check store health with a ping against the primary
///
/// An idle store is unhealthy and is not pinged.
///
/// # Example
/// ```ignore
/// if !mongo_store::check_health(&store).await {
///     tracing::warn!("MongoDB is not answering");
/// }
/// ```
pub async fn check_health<D: Driver>(store: &MongoStore<D>) -> bool {
    store.ping(ReadPreference::Primary).await.is_ok()
}

/// Check store health with timing and error details
pub async fn check_health_detailed<D: Driver>(store: &MongoStore<D>) -> HealthStatus {
    if !store.is_running() {
        return HealthStatus {
            running: false,
            healthy: false,
            message: Some("store is not running".to_string()),
            response_time_ms: 0,
        };
    }

    let start = Instant::now();
    let result = store.ping(ReadPreference::Primary).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus {
            running: true,
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            running: true,
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
        },
    }
}
