//! Shared test utilities
//!
//! Disposable database containers for integration tests:
//! - `TestMongo`: MongoDB with a root user and automatic cleanup (feature: "mongo")
//!
//! # Usage
//!
//! Add the feature to your dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["mongo"] }
//! ```
//!
//! Then in your tests:
//!
//! ```rust,ignore
//! use test_utils::TestMongo;
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let db = mongo.client().database("test");
//!     // ...
//! }
//! ```

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::{ROOT_PASSWORD, ROOT_USERNAME, TestMongo};
