//! # DynamoDB ordered key-value adapter
//!
//! Adapts an ordered key-value storage interface onto a DynamoDB table:
//! one store instance binds one table and one fixed partition-key value,
//! and logical record keys map 1:1 onto the table's range key, which gives
//! lexicographic iteration order for free.
//!
//! What's inside:
//! - A [`value::Codec`] between a dynamic value model and DynamoDB's tagged
//!   attribute representation
//! - Lazy, paginating range iteration with client-side limit enforcement
//! - Batch writes chunked to the provider's 25-entry cap, with bounded
//!   retry of unprocessed entries
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use dynamo_kv::{KvStore, StoreConfig, Error};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     // One DescribeTable call discovers the key schema.
//!     let store = KvStore::connect(StoreConfig::new("kv-table", "tenant-1")).await?;
//!
//!     store.put("greeting", br#"{"text":"hello"}"#).await?;
//!     let value = store.get("greeting").await?;
//!     println!("{}", String::from_utf8_lossy(&value));
//!
//!     store.delete("greeting").await?;
//!     Ok(())
//! }
//! ```
//!
//! Values are JSON documents (objects at the top level); keys are strings.
//! Scope is deliberately narrow: single-partition access with one range
//! key, no secondary indexes, no transactions.
#![deny(
    warnings,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::Error;

/// The store surface: adapter, iterator, batch writer, query planning
pub mod store;

/// Dynamic value model and attribute codec
pub mod value;

// Re-export the main types for convenience
pub use store::{
    IterOptions, KvIterator, KvStore, Provider, RetryPolicy, StoreConfig, WriteOp,
};
pub use value::{Codec, Value};

// Re-export aws-config types for custom client configuration
pub use aws_config::{BehaviorVersion, Region, SdkConfig, defaults};

use aws_sdk_dynamodb::Client as DynamoDbClient;
use tokio::sync::OnceCell;

/// Global DynamoDB client instance shared by [`KvStore::connect`]
static GLOBAL_CLIENT: OnceCell<DynamoDbClient> = OnceCell::const_new();

/// Default AWS configuration for the shared client: adaptive retry with 3
/// attempts, short connect timeout, and a LocalStack endpoint override when
/// `AWS_PROFILE=localstack`.
async fn aws_config_defaults() -> SdkConfig {
    use aws_types::sdk_config::{RetryConfig, TimeoutConfig};
    use std::time::Duration;

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}

/// Initialize the global DynamoDB client with a custom AWS config.
///
/// Call before the first [`KvStore::connect`] to override the defaults;
/// later calls are no-ops.
pub async fn init(config: &SdkConfig) {
    let _ = GLOBAL_CLIENT
        .get_or_init(|| async { DynamoDbClient::new(config) })
        .await;
}

/// Initialize the global DynamoDB client with a prebuilt client instance.
///
/// Useful for tests or fine-grained client configuration.
pub async fn init_with_client(client: DynamoDbClient) {
    let _ = GLOBAL_CLIENT.get_or_init(|| async { client }).await;
}

/// Get the global DynamoDB client, auto-initializing it with
/// [`aws_config_defaults`]-style settings on first use.
pub async fn dynamodb_client() -> &'static DynamoDbClient {
    GLOBAL_CLIENT
        .get_or_init(|| async {
            let config = aws_config_defaults().await;
            DynamoDbClient::new(&config)
        })
        .await
}
