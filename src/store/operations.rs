use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::store::batch::{RetryPolicy, WriteOp, run_batch};
use crate::store::iter::KvIterator;
use crate::store::mapper::Mapper;
use crate::store::provider::Provider;
use crate::store::query::IterOptions;
use crate::store::schema::{StoreConfig, TableSchema};
use crate::value::Codec;

/// An ordered key-value store backed by one DynamoDB partition.
///
/// The store owns its provider handle, the table's discovered key schema,
/// and the value codec. The schema is resolved once at [`KvStore::open`]
/// and read-only afterwards, so a store can be shared freely across tasks;
/// it holds no locks and gives no isolation beyond what DynamoDB itself
/// guarantees (in particular, no read-your-writes across separate calls).
///
/// # Example
///
/// ```rust,no_run
/// use dynamo_kv::{KvStore, StoreConfig, IterOptions, WriteOp, Error};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let store = KvStore::connect(StoreConfig::new("kv-table", "tenant-1")).await?;
///
///     store.put("user:1", br#"{"name":"alice"}"#).await?;
///     let value = store.get("user:1").await?;
///     assert!(!value.is_empty());
///
///     store
///         .batch(vec![
///             WriteOp::put("user:2", br#"{"name":"bob"}"#.to_vec()),
///             WriteOp::delete("user:1"),
///         ])
///         .await?;
///
///     let mut iter = store.iter(IterOptions {
///         gte: Some("user:".to_string()),
///         lt: Some("user;".to_string()),
///         ..IterOptions::default()
///     });
///     while let Some((key, _value)) = iter.next().await? {
///         println!("{key}");
///     }
///     Ok(())
/// }
/// ```
pub struct KvStore {
    provider: Arc<dyn Provider>,
    table: String,
    schema: TableSchema,
    codec: Codec,
    retry: RetryPolicy,
}

impl KvStore {
    /// Open a store against an existing table.
    ///
    /// Issues one `DescribeTable` call to discover the hash and range key
    /// attribute names; fails with [`Error::SchemaMismatch`] if the table
    /// has no range key. The schema is immutable for the store's lifetime.
    pub async fn open(provider: Arc<dyn Provider>, config: StoreConfig) -> Result<Self, Error> {
        let keys = provider.describe_table(&config.table).await?;
        let schema = TableSchema::from_key_schema(keys, config.hash_value)?;
        Ok(Self {
            provider,
            table: config.table,
            schema,
            codec: Codec::default(),
            retry: RetryPolicy::default(),
        })
    }

    /// Open a store using a DynamoDB client built with the crate's default
    /// AWS configuration (see [`crate::dynamodb_client`]).
    pub async fn connect(config: StoreConfig) -> Result<Self, Error> {
        let client = crate::dynamodb_client().await.clone();
        Self::open(Arc::new(client), config).await
    }

    /// Replace the value codec (e.g. to disable the empty-string collapse)
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the batch writer's retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The resolved key schema this store operates against
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn mapper(&self) -> Mapper<'_> {
        Mapper::new(&self.schema, &self.codec)
    }

    /// Fetch the value stored at `key`.
    ///
    /// Fails with [`Error::NotFound`] when the key is absent; that is the
    /// expected miss path, distinguishable via [`Error::is_not_found`].
    pub async fn get(&self, key: &str) -> Result<Vec<u8>, Error> {
        let item = self
            .provider
            .get_item(&self.table, self.mapper().key_item(key))
            .await?;
        match item {
            Some(item) => Ok(self.mapper().to_record(item)?.1),
            None => Err(Error::NotFound(key.to_string())),
        }
    }

    /// Insert or replace the record at `key` with a JSON-serialized value
    pub async fn put(&self, key: &str, value: &[u8]) -> Result<(), Error> {
        let item = self.mapper().to_item(key, Some(value))?;
        self.provider.put_item(&self.table, item).await
    }

    /// Remove the record at `key`. Deleting an absent key is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        self.provider
            .delete_item(&self.table, self.mapper().key_item(key))
            .await
    }

    /// Apply a batch of put/delete operations.
    ///
    /// Operations are chunked into provider-limited calls of 25 entries and
    /// unprocessed entries are resubmitted under the store's
    /// [`RetryPolicy`]. When several operations target the same key, the
    /// last one wins. Completion means every entry was accepted by the
    /// provider; a hard provider failure or an exhausted retry budget
    /// surfaces as an error with no partial-progress report.
    pub async fn batch(&self, ops: Vec<WriteOp>) -> Result<(), Error> {
        run_batch(
            self.provider.as_ref(),
            &self.table,
            &self.mapper(),
            &self.retry,
            ops,
        )
        .await
    }

    /// Create a lazy iterator over the partition.
    ///
    /// No request is issued until the first [`KvIterator::next`] call.
    /// Multiple iterators may run concurrently; each fetches its own pages
    /// strictly sequentially.
    pub fn iter(&self, options: IterOptions) -> KvIterator {
        KvIterator::new(
            Arc::clone(&self.provider),
            self.table.clone(),
            self.schema.clone(),
            self.codec.clone(),
            options,
        )
    }

    /// Delete every record in the partition.
    ///
    /// Built from the core primitives: iterates all keys, then batch-deletes
    /// them. Not atomic; records written concurrently may survive.
    pub async fn clear(&self) -> Result<(), Error> {
        let mut iter = self.iter(IterOptions::default());
        let mut deletes = Vec::new();
        while let Some((key, _value)) = iter.next().await? {
            deletes.push(WriteOp::delete(key));
        }
        if deletes.is_empty() {
            return Ok(());
        }
        self.batch(deletes).await
    }
}

impl fmt::Debug for KvStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvStore")
            .field("table", &self.table)
            .field("schema", &self.schema)
            .field("codec", &self.codec)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
