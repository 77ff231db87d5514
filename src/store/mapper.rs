//! Record ↔ item mapping.
//!
//! A logical record is a `(key, JSON value)` pair. Its provider item is the
//! value's fields encoded attribute by attribute, plus the schema's fixed
//! hash attribute and the record key under the range attribute.

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::Error;
use crate::store::provider::Item;
use crate::store::schema::TableSchema;
use crate::value::{Codec, Value, json_type_name};

pub(crate) struct Mapper<'a> {
    schema: &'a TableSchema,
    codec: &'a Codec,
}

impl<'a> Mapper<'a> {
    pub(crate) fn new(schema: &'a TableSchema, codec: &'a Codec) -> Self {
        Self { schema, codec }
    }

    /// The bare key item for `key`: hash and range attributes only.
    /// Used by get, delete, and batch delete entries.
    pub(crate) fn key_item(&self, key: &str) -> Item {
        let mut item = Item::new();
        let _ = item.insert(
            self.schema.hash_name.clone(),
            AttributeValue::S(self.schema.hash_value.clone()),
        );
        let _ = item.insert(
            self.schema.range_name.clone(),
            AttributeValue::S(key.to_string()),
        );
        item
    }

    /// Build the full provider item for a record.
    ///
    /// `value` is the record's JSON-serialized form and must be an object
    /// at its top level; anything else fails with `UnsupportedType` naming
    /// the offending JSON type. `None` produces the bare key item.
    pub(crate) fn to_item(&self, key: &str, value: Option<&[u8]>) -> Result<Item, Error> {
        let mut item = match value {
            None => Item::new(),
            Some(bytes) => {
                let json: serde_json::Value = serde_json::from_slice(bytes)?;
                let serde_json::Value::Object(fields) = json else {
                    return Err(Error::UnsupportedType(json_type_name(&json)));
                };
                fields
                    .into_iter()
                    .map(|(name, field)| (name, self.codec.encode(&Value::from_json(field))))
                    .collect()
            }
        };

        // Key attributes are written last so a value field that collides
        // with a key attribute name cannot shadow the real keys.
        let _ = item.insert(
            self.schema.hash_name.clone(),
            AttributeValue::S(self.schema.hash_value.clone()),
        );
        let _ = item.insert(
            self.schema.range_name.clone(),
            AttributeValue::S(key.to_string()),
        );
        Ok(item)
    }

    /// Recover the logical record from a provider item: range attribute as
    /// the key, everything except the key attributes re-serialized as the
    /// JSON value.
    pub(crate) fn to_record(&self, item: Item) -> Result<(String, Vec<u8>), Error> {
        let mut key = None;
        let mut fields = serde_json::Map::new();

        for (name, attr) in item {
            if name == self.schema.range_name {
                match self.codec.decode(&attr)? {
                    Value::String(s) => key = Some(s),
                    _ => {
                        return Err(Error::SchemaMismatch(format!(
                            "range attribute {} is not a string",
                            self.schema.range_name
                        )));
                    }
                }
            } else if name != self.schema.hash_name {
                let _ = fields.insert(name, self.codec.decode(&attr)?.into_json());
            }
        }

        let key = key.ok_or_else(|| {
            Error::SchemaMismatch(format!(
                "item missing range attribute {}",
                self.schema.range_name
            ))
        })?;
        let value = serde_json::to_vec(&serde_json::Value::Object(fields))?;
        Ok((key, value))
    }
}
