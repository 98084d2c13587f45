//! Lifecycle wrapper around a MongoDB client
//!
//! [`StoreConfig`] describes where and how to connect and checks itself with
//! [`StoreConfig::check`]. [`MongoStore`] owns a single connection: it is idle until
//! [`MongoStore::start`] connects and pings the primary within the configured timeout, and
//! [`MongoStore::shutdown`] always returns it to idle.
//!
//! # Features
//!
//! - `config` (default) - load [`StoreConfig`] with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use mongo_store::{MongoStore, StoreConfig, check_health};
//!
//! let config = StoreConfig::from_env()?;
//! config.check()?;
//!
//! let mut store = MongoStore::new(config);
//! store.start().await?;
//! assert!(check_health(&store).await);
//!
//! let items = store.collection::<Document>("items")?;
//! // ...
//! store.shutdown().await;
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod health;
pub mod store;

pub use config::{ConfigViolations, StoreConfig};
pub use driver::{ConnectOptions, Driver, MongoDriver};
pub use error::{StoreError, StoreErrorKind, StoreResult};
pub use health::{HealthStatus, check_health, check_health_detailed};
pub use store::MongoStore;

// Re-export MongoDB types for convenience
pub use mongodb::{Client, ClientSession, Collection, Database};
