//! Chunked batch writes with bounded unprocessed-entry retry.

use aws_sdk_dynamodb::types::{DeleteRequest, PutRequest, WriteRequest};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Error;
use crate::store::mapper::Mapper;
use crate::store::provider::Provider;

/// DynamoDB's hard cap on entries per BatchWriteItem call
pub(crate) const BATCH_WRITE_SIZE: usize = 25;

/// A single operation within a write batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or replace the record at `key`
    Put {
        /// Record key
        key: String,
        /// JSON-serialized record value
        value: Vec<u8>,
    },
    /// Remove the record at `key`
    Delete {
        /// Record key
        key: String,
    },
}

impl WriteOp {
    /// Convenience constructor for a put
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        WriteOp::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Convenience constructor for a delete
    pub fn delete(key: impl Into<String>) -> Self {
        WriteOp::Delete { key: key.into() }
    }

    fn key(&self) -> &str {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// Retry policy for unprocessed batch entries
///
/// DynamoDB reports throttled entries as "unprocessed" rather than failing
/// the call; those are resubmitted with exponential backoff until accepted
/// or until `max_retries` rounds of backoff have been spent.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of backoff rounds before giving up
    pub max_retries: usize,
    /// Delay before the first resubmission
    pub initial_delay: Duration,
    /// Upper bound on the backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(2000),
        }
    }
}

/// Exponential backoff delay for the given 0-based attempt, capped at `max`
pub(crate) fn retry_delay(attempt: usize, initial: Duration, max: Duration) -> Duration {
    let delay_ms = initial.as_millis() as u64 * 2u64.pow(attempt.min(32) as u32);
    Duration::from_millis(delay_ms.min(max.as_millis() as u64))
}

/// Run a logical write batch to completion.
///
/// Each round submits up to 25 entries: unprocessed entries from the
/// previous round first, then new entries pulled from the pending queue to
/// fill the remaining capacity. A hard provider error aborts immediately
/// with no partial-progress reporting; a round that leaves entries
/// unprocessed costs one backoff round from the retry budget before they
/// are resubmitted.
pub(crate) async fn run_batch(
    provider: &dyn Provider,
    table: &str,
    mapper: &Mapper<'_>,
    retry: &RetryPolicy,
    ops: Vec<WriteOp>,
) -> Result<(), Error> {
    // At most one outcome per key within a logical batch: DynamoDB rejects
    // duplicate keys in a single call, so keep only the last operation for
    // each key.
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped: Vec<WriteOp> = Vec::with_capacity(ops.len());
    for op in ops.into_iter().rev() {
        if seen.insert(op.key().to_string()) {
            deduped.push(op);
        }
    }
    deduped.reverse();

    let mut pending: VecDeque<WriteRequest> = VecDeque::with_capacity(deduped.len());
    for op in deduped {
        pending.push_back(to_write_request(mapper, op)?);
    }

    let mut carry: Vec<WriteRequest> = Vec::new();
    let mut attempt = 0usize;

    while !pending.is_empty() || !carry.is_empty() {
        if !carry.is_empty() {
            if attempt >= retry.max_retries {
                return Err(Error::BatchRetriesExhausted(carry.len() + pending.len()));
            }
            sleep(retry_delay(attempt, retry.initial_delay, retry.max_delay)).await;
            attempt += 1;
        }

        let mut round = std::mem::take(&mut carry);
        while round.len() < BATCH_WRITE_SIZE {
            match pending.pop_front() {
                Some(entry) => round.push(entry),
                None => break,
            }
        }

        carry = provider.batch_write(table, round).await?;
    }

    Ok(())
}

fn to_write_request(mapper: &Mapper<'_>, op: WriteOp) -> Result<WriteRequest, Error> {
    let request = match op {
        WriteOp::Put { key, value } => {
            let put = PutRequest::builder()
                .set_item(Some(mapper.to_item(&key, Some(&value))?))
                .build()?;
            WriteRequest::builder().set_put_request(Some(put)).build()
        }
        WriteOp::Delete { key } => {
            let delete = DeleteRequest::builder()
                .set_key(Some(mapper.key_item(&key)))
                .build()?;
            WriteRequest::builder()
                .set_delete_request(Some(delete))
                .build()
        }
    };
    Ok(request)
}
