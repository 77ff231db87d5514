#![allow(dead_code)]

//! In-memory DynamoDB double for exercising the store without a network.
//!
//! Rows live in a `BTreeMap` keyed by range-key value, which matches the
//! provider's ordering guarantee. Page size, scripted unprocessed counts,
//! and injected failures are all configurable per test; every query and
//! batch round is recorded for assertions.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, WriteRequest};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dynamo_kv::store::{Item, KeySchema, Provider, QueryPage, QueryPlan, RangeCond};
use dynamo_kv::{Codec, Error, KvStore, StoreConfig, Value};

pub const TABLE: &str = "kv-test";
pub const HASH_NAME: &str = "hk";
pub const RANGE_NAME: &str = "rk";
pub const HASH_VALUE: &str = "H";

pub struct MockProvider {
    pub rows: Mutex<BTreeMap<String, Item>>,
    pub page_size: usize,
    pub query_calls: AtomicUsize,
    /// Range-key values of each batch round's entries, in submission order
    pub batch_rounds: Mutex<Vec<Vec<String>>>,
    /// Per-round count of entries to bounce back as unprocessed
    pub unprocessed_script: Mutex<VecDeque<usize>>,
    pub fail_queries: AtomicBool,
    pub fail_batches: AtomicBool,
}

impl MockProvider {
    pub fn new(page_size: usize) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(BTreeMap::new()),
            page_size,
            query_calls: AtomicUsize::new(0),
            batch_rounds: Mutex::new(Vec::new()),
            unprocessed_script: Mutex::new(VecDeque::new()),
            fail_queries: AtomicBool::new(false),
            fail_batches: AtomicBool::new(false),
        })
    }

    /// Seed a record directly, bypassing the store's write path.
    pub fn seed(&self, key: &str, value_json: &str) {
        let codec = Codec::default();
        let json: serde_json::Value = serde_json::from_str(value_json).unwrap();
        let serde_json::Value::Object(fields) = json else {
            panic!("seed value must be a JSON object");
        };

        let mut item = Item::new();
        for (name, field) in fields {
            let _ = item.insert(name, codec.encode(&Value::from_json(field)));
        }
        let _ = item.insert(
            HASH_NAME.to_string(),
            AttributeValue::S(HASH_VALUE.to_string()),
        );
        let _ = item.insert(RANGE_NAME.to_string(), AttributeValue::S(key.to_string()));
        let _ = self.rows.lock().unwrap().insert(key.to_string(), item);
    }

    pub fn keys(&self) -> Vec<String> {
        self.rows.lock().unwrap().keys().cloned().collect()
    }

    pub fn query_call_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn batch_call_count(&self) -> usize {
        self.batch_rounds.lock().unwrap().len()
    }

    pub fn script_unprocessed(&self, counts: &[usize]) {
        let mut script = self.unprocessed_script.lock().unwrap();
        script.extend(counts.iter().copied());
    }

    fn range_key_of(item: &Item) -> String {
        match item.get(RANGE_NAME) {
            Some(AttributeValue::S(s)) => s.clone(),
            other => panic!("item without string range key: {other:?}"),
        }
    }

    fn entry_key(entry: &WriteRequest) -> String {
        if let Some(put) = &entry.put_request {
            return Self::range_key_of(&put.item);
        }
        if let Some(delete) = &entry.delete_request {
            return Self::range_key_of(&delete.key);
        }
        panic!("write request with neither put nor delete");
    }

    fn in_range(key: &str, range: &Option<RangeCond>) -> bool {
        match range {
            None => true,
            Some(RangeCond::Between(lo, hi)) => key >= lo.as_str() && key <= hi.as_str(),
            Some(RangeCond::Gt(lo)) => key > lo.as_str(),
            Some(RangeCond::Gte(lo)) => key >= lo.as_str(),
            Some(RangeCond::Lt(hi)) => key < hi.as_str(),
            Some(RangeCond::Lte(hi)) => key <= hi.as_str(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn describe_table(&self, _table: &str) -> Result<KeySchema, Error> {
        Ok(KeySchema {
            hash: HASH_NAME.to_string(),
            range: Some(RANGE_NAME.to_string()),
        })
    }

    async fn get_item(&self, _table: &str, key: Item) -> Result<Option<Item>, Error> {
        let range_key = Self::range_key_of(&key);
        Ok(self.rows.lock().unwrap().get(&range_key).cloned())
    }

    async fn put_item(&self, _table: &str, item: Item) -> Result<(), Error> {
        let range_key = Self::range_key_of(&item);
        let _ = self.rows.lock().unwrap().insert(range_key, item);
        Ok(())
    }

    async fn delete_item(&self, _table: &str, key: Item) -> Result<(), Error> {
        let range_key = Self::range_key_of(&key);
        let _ = self.rows.lock().unwrap().remove(&range_key);
        Ok(())
    }

    async fn query(
        &self,
        _table: &str,
        plan: &QueryPlan,
        start_key: Option<Item>,
    ) -> Result<QueryPage, Error> {
        let _ = self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::Provider("injected query failure".to_string()));
        }

        let rows = self.rows.lock().unwrap();
        let mut keys: Vec<String> = rows
            .keys()
            .filter(|key| Self::in_range(key, &plan.range))
            .cloned()
            .collect();
        if !plan.scan_forward {
            keys.reverse();
        }

        // Resume strictly after the continuation token, in scan order.
        if let Some(start) = start_key {
            let resume_after = Self::range_key_of(&start);
            if let Some(pos) = keys.iter().position(|key| *key == resume_after) {
                let _ = keys.drain(..=pos);
            }
        }

        let cap = plan
            .page_limit
            .map_or(self.page_size, |limit| self.page_size.min(limit as usize));
        let page: Vec<String> = keys.iter().take(cap).cloned().collect();
        let more = keys.len() > page.len();

        let items: Vec<Item> = page.iter().map(|key| rows[key].clone()).collect();
        let last_evaluated_key = if more {
            let mut token = Item::new();
            let _ = token.insert(
                HASH_NAME.to_string(),
                AttributeValue::S(HASH_VALUE.to_string()),
            );
            let _ = token.insert(
                RANGE_NAME.to_string(),
                AttributeValue::S(page.last().unwrap().clone()),
            );
            Some(token)
        } else {
            None
        };

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn batch_write(
        &self,
        _table: &str,
        entries: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, Error> {
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(Error::Provider("injected batch failure".to_string()));
        }
        assert!(entries.len() <= 25, "provider cap exceeded: {}", entries.len());

        let round_keys: Vec<String> = entries.iter().map(Self::entry_key).collect();
        self.batch_rounds.lock().unwrap().push(round_keys);

        let bounce = self
            .unprocessed_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(0);
        let accepted = entries.len().saturating_sub(bounce);

        let mut rows = self.rows.lock().unwrap();
        let mut unprocessed = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            if index >= accepted {
                unprocessed.push(entry);
                continue;
            }
            if let Some(put) = &entry.put_request {
                let _ = rows.insert(Self::range_key_of(&put.item), put.item.clone());
            } else if let Some(delete) = &entry.delete_request {
                let _ = rows.remove(&Self::range_key_of(&delete.key));
            }
        }
        Ok(unprocessed)
    }
}

/// Open a store over the mock with the standard test config.
pub async fn open_store(provider: Arc<MockProvider>) -> KvStore {
    KvStore::open(provider, StoreConfig::new(TABLE, HASH_VALUE))
        .await
        .unwrap()
}
