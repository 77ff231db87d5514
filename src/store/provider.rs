//! The provider seam.
//!
//! Every DynamoDB call the store makes goes through [`Provider`], so the
//! query/batch machinery can be exercised against an in-memory double and
//! the AWS-specific request building stays in one place.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeyType, WriteRequest};
use std::collections::HashMap;

use crate::error::Error;
use crate::store::query::QueryPlan;
use crate::store::schema::KeySchema;

/// A provider item: attribute name to tagged attribute value
pub type Item = HashMap<String, AttributeValue>;

/// One page of query results
#[derive(Clone, Debug, Default)]
pub struct QueryPage {
    /// Items in provider order
    pub items: Vec<Item>,
    /// Continuation token for the next page; `None` means this was the
    /// last page
    pub last_evaluated_key: Option<Item>,
}

/// The subset of DynamoDB the store consumes.
///
/// Implemented for [`aws_sdk_dynamodb::Client`]; tests implement it over an
/// in-memory map. Implementations do not retry: transport and service
/// failures surface unchanged, and the only partial-success signal is the
/// unprocessed-entry list from [`Provider::batch_write`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Describe the table's key attributes
    async fn describe_table(&self, table: &str) -> Result<KeySchema, Error>;

    /// Fetch a single item by its full key, `None` when absent
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, Error>;

    /// Insert or replace a single item
    async fn put_item(&self, table: &str, item: Item) -> Result<(), Error>;

    /// Delete a single item by its full key
    async fn delete_item(&self, table: &str, key: Item) -> Result<(), Error>;

    /// Run one page of a planned query, resuming from `start_key` when
    /// given
    async fn query(
        &self,
        table: &str,
        plan: &QueryPlan,
        start_key: Option<Item>,
    ) -> Result<QueryPage, Error>;

    /// Submit up to 25 write entries; returns the entries the provider
    /// reported as unprocessed
    async fn batch_write(
        &self,
        table: &str,
        entries: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, Error>;
}

#[async_trait]
impl Provider for aws_sdk_dynamodb::Client {
    async fn describe_table(&self, table: &str) -> Result<KeySchema, Error> {
        let output = self.describe_table().table_name(table).send().await?;

        let description = output.table.ok_or_else(|| {
            Error::SchemaMismatch(format!("no description returned for table {table}"))
        })?;

        let mut hash = None;
        let mut range = None;
        for element in description.key_schema.unwrap_or_default() {
            match element.key_type {
                KeyType::Hash => hash = Some(element.attribute_name),
                KeyType::Range => range = Some(element.attribute_name),
                _ => {}
            }
        }

        let hash = hash.ok_or_else(|| {
            Error::SchemaMismatch(format!("table {table} reports no hash key"))
        })?;
        Ok(KeySchema { hash, range })
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, Error> {
        let output = self
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await?;
        Ok(output.item)
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), Error> {
        let _ = self
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await?;
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: Item) -> Result<(), Error> {
        let _ = self
            .delete_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        table: &str,
        plan: &QueryPlan,
        start_key: Option<Item>,
    ) -> Result<QueryPage, Error> {
        let (expression, values) = plan.key_condition();

        let mut builder = self
            .query()
            .table_name(table)
            .scan_index_forward(plan.scan_forward)
            .key_condition_expression(expression)
            .set_expression_attribute_names(Some(plan.expression_names()))
            .set_exclusive_start_key(start_key);

        for (placeholder, value) in values {
            builder = builder.expression_attribute_values(placeholder, value);
        }
        if let Some(limit) = plan.page_limit {
            builder = builder.limit(limit);
        }

        let output = builder.send().await?;

        Ok(QueryPage {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    async fn batch_write(
        &self,
        table: &str,
        entries: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, Error> {
        let output = self
            .batch_write_item()
            .request_items(table, entries)
            .send()
            .await?;

        let unprocessed = output
            .unprocessed_items
            .unwrap_or_default()
            .into_values()
            .flatten()
            .collect();
        Ok(unprocessed)
    }
}
