use crate::error::Error;

/// Per-call-site configuration for a store instance
///
/// One store binds one table plus one fixed hash-key value: all records the
/// store reads or writes live in that single partition, ordered by the
/// table's range key.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// DynamoDB table name
    pub table: String,
    /// Fixed hash-key attribute value identifying this store's partition
    pub hash_value: String,
}

impl StoreConfig {
    /// Create a config for `table`, scoping the store to the partition
    /// identified by `hash_value`.
    pub fn new(table: impl Into<String>, hash_value: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            hash_value: hash_value.into(),
        }
    }
}

/// Key attribute names discovered from a table description
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySchema {
    /// Hash (partition) key attribute name
    pub hash: String,
    /// Range (sort) key attribute name, if the table has one
    pub range: Option<String>,
}

/// The resolved key layout a store operates against.
///
/// Populated once from `DescribeTable` when the store opens and immutable
/// for its lifetime; the mapper and query planner borrow it read-only.
#[derive(Clone, Debug)]
pub struct TableSchema {
    /// Hash key attribute name
    pub hash_name: String,
    /// Fixed hash key value for this store's partition
    pub hash_value: String,
    /// Range key attribute name; logical record keys map onto it 1:1
    pub range_name: String,
}

impl TableSchema {
    /// Bind a discovered key schema to this store's fixed hash value.
    ///
    /// The adapter needs a range key to order records, so a hash-only table
    /// is rejected here, at open time.
    pub(crate) fn from_key_schema(keys: KeySchema, hash_value: String) -> Result<Self, Error> {
        let range_name = keys.range.ok_or_else(|| {
            Error::SchemaMismatch("table has no range key; ordered iteration needs one".to_string())
        })?;
        Ok(Self {
            hash_name: keys.hash,
            hash_value,
            range_name,
        })
    }
}
