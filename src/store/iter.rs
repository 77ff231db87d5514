//! Lazy, paginating range iteration.

use futures_util::Stream;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::store::mapper::Mapper;
use crate::store::provider::{Item, Provider};
use crate::store::query::{IterOptions, QueryPlan, plan_query};
use crate::store::schema::TableSchema;
use crate::value::Codec;

/// A lazy iterator over one partition's records in range-key order.
///
/// Pages are fetched from the provider strictly sequentially and on demand:
/// constructing the iterator issues no requests, and each [`KvIterator::next`]
/// call issues at most the page fetches needed to produce one record. The
/// internal state is an owned buffer of decoded records, the continuation
/// token for the next page, and an exhaustion flag; once exhausted (or once
/// the configured limit is spent) every further `next` returns `Ok(None)`
/// without touching the provider.
pub struct KvIterator {
    provider: Arc<dyn Provider>,
    table: String,
    schema: TableSchema,
    codec: Codec,
    plan: QueryPlan,
    buffer: VecDeque<(String, Vec<u8>)>,
    start_key: Option<Item>,
    exhausted: bool,
    remaining: Option<usize>,
}

impl KvIterator {
    pub(crate) fn new(
        provider: Arc<dyn Provider>,
        table: String,
        schema: TableSchema,
        codec: Codec,
        options: IterOptions,
    ) -> Self {
        let plan = plan_query(&options, &schema);
        Self {
            provider,
            table,
            schema,
            codec,
            plan,
            buffer: VecDeque::new(),
            start_key: None,
            exhausted: false,
            remaining: options.limit,
        }
    }

    /// Yield the next record, or `Ok(None)` at the end of the range.
    ///
    /// The limit is enforced here as an absolute count of records ever
    /// yielded, independent of the provider's per-request page size.
    /// Provider errors during a page fetch surface unchanged and are not
    /// retried; the iterator stays usable and the failed fetch can be
    /// reattempted by calling `next` again.
    pub async fn next(&mut self) -> Result<Option<(String, Vec<u8>)>, Error> {
        loop {
            if self.remaining == Some(0) {
                return Ok(None);
            }
            if let Some(record) = self.buffer.pop_front() {
                if let Some(remaining) = &mut self.remaining {
                    *remaining -= 1;
                }
                return Ok(Some(record));
            }
            if self.exhausted {
                return Ok(None);
            }

            // The token is only replaced once the fetch succeeds, so an
            // errored `next` can be retried without losing the position.
            let page = self
                .provider
                .query(&self.table, &self.plan, self.start_key.clone())
                .await?;

            let mapper = Mapper::new(&self.schema, &self.codec);
            for item in page.items {
                self.buffer.push_back(mapper.to_record(item)?);
            }
            match page.last_evaluated_key {
                Some(token) => self.start_key = Some(token),
                None => {
                    self.start_key = None;
                    self.exhausted = true;
                }
            }
        }
    }

    /// Drain the iterator into a vector. Mostly useful in tests and for
    /// small, bounded ranges.
    pub async fn collect(mut self) -> Result<Vec<(String, Vec<u8>)>, Error> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Adapt the iterator into an async [`Stream`] of records.
    pub fn into_stream(self) -> impl Stream<Item = Result<(String, Vec<u8>), Error>> {
        futures_util::stream::try_unfold(self, |mut iter| async move {
            Ok(iter.next().await?.map(|record| (record, iter)))
        })
    }
}

impl fmt::Debug for KvIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvIterator")
            .field("table", &self.table)
            .field("plan", &self.plan)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}
