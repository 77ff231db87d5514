//! Range-query planning.
//!
//! Translates the storage interface's open/closed/bounded key-range options
//! into a provider-native key condition. The planner never talks to the
//! provider; it only produces parameters for it.

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

use crate::store::schema::TableSchema;

/// Iteration options for a range scan over one partition
#[derive(Clone, Debug, Default)]
pub struct IterOptions {
    /// Exclusive lower bound on the record key
    pub gt: Option<String>,
    /// Inclusive lower bound; wins over `gt` when both are set
    pub gte: Option<String>,
    /// Exclusive upper bound on the record key
    pub lt: Option<String>,
    /// Inclusive upper bound; wins over `lt` when both are set
    pub lte: Option<String>,
    /// Absolute cap on records yielded, enforced client-side by the
    /// iterator. Also caps the provider page size. `None` means unlimited.
    pub limit: Option<usize>,
    /// Yield records in descending key order
    pub reverse: bool,
}

/// A single range-key condition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeCond {
    /// `BETWEEN lo AND hi` — inclusive on both ends regardless of the
    /// requested inclusivity; see [`plan_query`]
    Between(String, String),
    /// Strictly greater than
    Gt(String),
    /// Greater than or equal
    Gte(String),
    /// Strictly less than
    Lt(String),
    /// Less than or equal
    Lte(String),
}

/// Provider-native query parameters produced by the planner
#[derive(Clone, Debug)]
pub struct QueryPlan {
    /// Hash key attribute name (always matched for equality)
    pub hash_name: String,
    /// Fixed hash key value
    pub hash_value: String,
    /// Range key attribute name
    pub range_name: String,
    /// Range key condition, absent for an unbounded partition scan
    pub range: Option<RangeCond>,
    /// Per-request page size cap passed to the provider
    pub page_limit: Option<i32>,
    /// Provider scan direction; `false` yields descending key order
    pub scan_forward: bool,
}

/// Build the provider condition set for `options` against `schema`.
///
/// Always includes an equality condition on the hash attribute. With both a
/// lower and an upper bound the condition collapses to a single `BETWEEN`,
/// which DynamoDB defines as inclusive on both ends — an exclusive `gt`/`lt`
/// flag cannot be honored in that case. This is a known precision
/// limitation kept deliberately; callers that need strict exclusivity with
/// two bounds must filter the boundary keys themselves.
pub(crate) fn plan_query(options: &IterOptions, schema: &TableSchema) -> QueryPlan {
    // Inclusive flag wins when both variants of a bound are supplied.
    let lower = options
        .gte
        .clone()
        .map(|key| (key, true))
        .or_else(|| options.gt.clone().map(|key| (key, false)));
    let upper = options
        .lte
        .clone()
        .map(|key| (key, true))
        .or_else(|| options.lt.clone().map(|key| (key, false)));

    let range = match (lower, upper) {
        (Some((lo, _)), Some((hi, _))) => Some(RangeCond::Between(lo, hi)),
        (Some((lo, true)), None) => Some(RangeCond::Gte(lo)),
        (Some((lo, false)), None) => Some(RangeCond::Gt(lo)),
        (None, Some((hi, true))) => Some(RangeCond::Lte(hi)),
        (None, Some((hi, false))) => Some(RangeCond::Lt(hi)),
        (None, None) => None,
    };

    QueryPlan {
        hash_name: schema.hash_name.clone(),
        hash_value: schema.hash_value.clone(),
        range_name: schema.range_name.clone(),
        range,
        page_limit: options.limit.map(|limit| limit.min(i32::MAX as usize) as i32),
        scan_forward: !options.reverse,
    }
}

impl QueryPlan {
    /// Render the key condition expression and its attribute values.
    ///
    /// Attribute names go through `#hash`/`#range` placeholders (see
    /// [`QueryPlan::expression_names`]) so discovered schema names that
    /// happen to be DynamoDB reserved words still work.
    pub fn key_condition(&self) -> (String, HashMap<String, AttributeValue>) {
        let mut values = HashMap::new();
        let _ = values.insert(
            ":hash_value".to_string(),
            AttributeValue::S(self.hash_value.clone()),
        );

        let expression = match &self.range {
            None => "#hash = :hash_value".to_string(),
            Some(RangeCond::Between(lo, hi)) => {
                let _ = values.insert(":range_start".to_string(), AttributeValue::S(lo.clone()));
                let _ = values.insert(":range_end".to_string(), AttributeValue::S(hi.clone()));
                "#hash = :hash_value AND #range BETWEEN :range_start AND :range_end".to_string()
            }
            Some(RangeCond::Gt(lo)) => {
                let _ = values.insert(":range_start".to_string(), AttributeValue::S(lo.clone()));
                "#hash = :hash_value AND #range > :range_start".to_string()
            }
            Some(RangeCond::Gte(lo)) => {
                let _ = values.insert(":range_start".to_string(), AttributeValue::S(lo.clone()));
                "#hash = :hash_value AND #range >= :range_start".to_string()
            }
            Some(RangeCond::Lt(hi)) => {
                let _ = values.insert(":range_end".to_string(), AttributeValue::S(hi.clone()));
                "#hash = :hash_value AND #range < :range_end".to_string()
            }
            Some(RangeCond::Lte(hi)) => {
                let _ = values.insert(":range_end".to_string(), AttributeValue::S(hi.clone()));
                "#hash = :hash_value AND #range <= :range_end".to_string()
            }
        };

        (expression, values)
    }

    /// Placeholder-to-attribute-name map for the rendered condition
    pub fn expression_names(&self) -> HashMap<String, String> {
        let mut names = HashMap::new();
        let _ = names.insert("#hash".to_string(), self.hash_name.clone());
        if self.range.is_some() {
            let _ = names.insert("#range".to_string(), self.range_name.clone());
        }
        names
    }
}
