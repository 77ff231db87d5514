mod batch;
mod iter;
mod mapper;
mod operations;
mod provider;
mod query;
mod schema;

pub use batch::{RetryPolicy, WriteOp};
pub use iter::KvIterator;
pub use operations::KvStore;
pub use provider::{Item, Provider, QueryPage};
pub use query::{IterOptions, QueryPlan, RangeCond};
pub use schema::{KeySchema, StoreConfig, TableSchema};
