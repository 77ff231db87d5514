//! Dynamic value model and its DynamoDB attribute codec.
//!
//! [`Value`] is the native shape of everything this adapter stores: the
//! scalar and composite types DynamoDB can represent, closed under nesting.
//! [`Codec`] converts between that model and the SDK's tagged
//! [`AttributeValue`] wire form. Encoding is total over the union (the sum
//! type leaves nothing else to encode); decoding fails for tags outside the
//! supported set.

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Number;
use std::collections::HashMap;

use crate::error::Error;

/// A dynamically typed storage value.
///
/// Every composite element is itself a `Value`, so arbitrarily nested
/// lists and maps round-trip through the codec.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent / null
    Null,
    /// UTF-8 text
    String(String),
    /// Boolean
    Bool(bool),
    /// Number, kept in JSON's decimal representation to avoid float
    /// precision loss in transit
    Number(Number),
    /// Raw bytes (base64 on the wire)
    Binary(Vec<u8>),
    /// Ordered list; element order is significant and preserved
    List(Vec<Value>),
    /// String-keyed map; key order is not significant
    Map(HashMap<String, Value>),
}

impl Value {
    /// Lift a JSON document into the value model.
    ///
    /// JSON has no binary type, so this never produces [`Value::Binary`].
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(elements) => {
                Value::List(elements.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(name, field)| (name, Value::from_json(field)))
                    .collect(),
            ),
        }
    }

    /// Lower the value back to JSON.
    ///
    /// [`Value::Binary`] becomes a base64 string; that mapping is one-way,
    /// since JSON cannot distinguish it from ordinary text.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::Binary(bytes) => serde_json::Value::String(BASE64.encode(bytes)),
            Value::List(elements) => {
                serde_json::Value::Array(elements.into_iter().map(Value::into_json).collect())
            }
            Value::Map(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(name, field)| (name, field.into_json()))
                    .collect(),
            ),
        }
    }
}

/// The runtime type name of a JSON value, for error reporting.
pub(crate) fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Bidirectional [`Value`] ↔ [`AttributeValue`] codec.
///
/// By default both `Null` and the empty string encode to the `NULL` tag, so
/// `decode(encode("")) == Null`. This collapse is inherited behavior that
/// existing data may depend on; set `collapse_empty_strings` to `false` to
/// keep empty strings distinct.
#[derive(Clone, Debug)]
pub struct Codec {
    /// Encode `String("")` as `NULL` (the documented lossy collapse)
    pub collapse_empty_strings: bool,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            collapse_empty_strings: true,
        }
    }
}

impl Codec {
    /// Encode a value into the provider's tagged attribute form.
    ///
    /// Total: every `Value` has an attribute representation. Numbers are
    /// rendered as decimal strings, lists element by element in order, maps
    /// field by field.
    pub fn encode(&self, value: &Value) -> AttributeValue {
        match value {
            Value::Null => AttributeValue::Null(true),
            Value::String(s) if s.is_empty() && self.collapse_empty_strings => {
                AttributeValue::Null(true)
            }
            Value::String(s) => AttributeValue::S(s.clone()),
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Number(n) => AttributeValue::N(n.to_string()),
            Value::Binary(bytes) => AttributeValue::B(Blob::new(bytes.clone())),
            Value::List(elements) => {
                AttributeValue::L(elements.iter().map(|element| self.encode(element)).collect())
            }
            Value::Map(fields) => AttributeValue::M(
                fields
                    .iter()
                    .map(|(name, field)| (name.clone(), self.encode(field)))
                    .collect(),
            ),
        }
    }

    /// Decode a tagged attribute back into a value.
    ///
    /// Fails with [`Error::UnknownTag`] for any tag outside
    /// {`NULL`, `S`, `B`, `BOOL`, `N`, `L`, `M`} and with
    /// [`Error::InvalidNumber`] for an `N` payload that is not decimal.
    /// Inverse of [`Codec::encode`] except for the empty-string collapse.
    pub fn decode(&self, attr: &AttributeValue) -> Result<Value, Error> {
        match attr {
            AttributeValue::Null(_) => Ok(Value::Null),
            AttributeValue::S(s) => Ok(Value::String(s.clone())),
            AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
            AttributeValue::N(n) => parse_number(n).map(Value::Number),
            AttributeValue::B(blob) => Ok(Value::Binary(blob.as_ref().to_vec())),
            AttributeValue::L(elements) => Ok(Value::List(
                elements
                    .iter()
                    .map(|element| self.decode(element))
                    .collect::<Result<_, _>>()?,
            )),
            AttributeValue::M(fields) => Ok(Value::Map(
                fields
                    .iter()
                    .map(|(name, field)| Ok((name.clone(), self.decode(field)?)))
                    .collect::<Result<_, Error>>()?,
            )),
            other => Err(Error::UnknownTag(attribute_tag(other))),
        }
    }
}

/// Parse DynamoDB's decimal-string number payload without losing integer
/// precision where JSON can hold it.
fn parse_number(payload: &str) -> Result<Number, Error> {
    if let Ok(i) = payload.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = payload.parse::<u64>() {
        return Ok(Number::from(u));
    }
    payload
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| Error::InvalidNumber(payload.to_string()))
}

fn attribute_tag(attr: &AttributeValue) -> &'static str {
    match attr {
        AttributeValue::S(_) => "S",
        AttributeValue::N(_) => "N",
        AttributeValue::B(_) => "B",
        AttributeValue::Bool(_) => "BOOL",
        AttributeValue::Null(_) => "NULL",
        AttributeValue::L(_) => "L",
        AttributeValue::M(_) => "M",
        AttributeValue::Ss(_) => "SS",
        AttributeValue::Ns(_) => "NS",
        AttributeValue::Bs(_) => "BS",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip(value: Value) {
        let codec = Codec::default();
        let decoded = codec.decode(&codec.encode(&value)).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_scalar_roundtrips() {
        roundtrip(Value::Null);
        roundtrip(Value::String("hello".to_string()));
        roundtrip(Value::Bool(true));
        roundtrip(Value::Bool(false));
        roundtrip(Value::Number(Number::from(42)));
        roundtrip(Value::Number(Number::from(-7)));
        roundtrip(Value::Number(Number::from_f64(1.5).unwrap()));
        roundtrip(Value::Binary(vec![0, 1, 2, 255]));
    }

    #[test]
    fn test_composite_roundtrips() {
        roundtrip(Value::List(vec![
            Value::Number(Number::from(1)),
            Value::String("two".to_string()),
            Value::List(vec![Value::Bool(false)]),
        ]));

        let mut fields = HashMap::new();
        let _ = fields.insert("name".to_string(), Value::String("alice".to_string()));
        let _ = fields.insert(
            "tags".to_string(),
            Value::List(vec![Value::String("a".to_string()), Value::Null]),
        );
        roundtrip(Value::Map(fields));
    }

    #[test]
    fn test_list_order_preserved() {
        let codec = Codec::default();
        let list = Value::List(vec![
            Value::String("first".to_string()),
            Value::String("second".to_string()),
            Value::String("third".to_string()),
        ]);
        let encoded = codec.encode(&list);
        let AttributeValue::L(elements) = &encoded else {
            panic!("expected L tag");
        };
        assert_eq!(elements[0], AttributeValue::S("first".to_string()));
        assert_eq!(elements[2], AttributeValue::S("third".to_string()));
    }

    #[test]
    fn test_numbers_encode_as_decimal_strings() {
        let codec = Codec::default();
        assert_eq!(
            codec.encode(&Value::Number(Number::from(1234))),
            AttributeValue::N("1234".to_string())
        );
        assert_eq!(
            codec.encode(&Value::Number(Number::from_f64(0.25).unwrap())),
            AttributeValue::N("0.25".to_string())
        );
    }

    #[test]
    fn test_large_integer_precision_survives() {
        let codec = Codec::default();
        // Past f64's 53-bit mantissa; must not go through a float.
        let big = 9_007_199_254_740_993_i64;
        let decoded = codec
            .decode(&AttributeValue::N(big.to_string()))
            .unwrap();
        assert_eq!(decoded, Value::Number(Number::from(big)));
    }

    #[test]
    fn test_null_and_empty_string_collapse() {
        let codec = Codec::default();
        assert_eq!(codec.encode(&Value::Null), AttributeValue::Null(true));
        assert_eq!(
            codec.encode(&Value::String(String::new())),
            AttributeValue::Null(true)
        );
        // The collapse is lossy: the empty string comes back as Null.
        let decoded = codec
            .decode(&codec.encode(&Value::String(String::new())))
            .unwrap();
        assert_eq!(decoded, Value::Null);
    }

    #[test]
    fn test_collapse_opt_out() {
        let codec = Codec {
            collapse_empty_strings: false,
        };
        let empty = Value::String(String::new());
        assert_eq!(
            codec.encode(&empty),
            AttributeValue::S(String::new())
        );
        assert_eq!(codec.decode(&codec.encode(&empty)).unwrap(), empty);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let codec = Codec::default();
        let err = codec
            .decode(&AttributeValue::Ss(vec!["a".to_string()]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTag("SS")));

        let err = codec
            .decode(&AttributeValue::Ns(vec!["1".to_string()]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTag("NS")));
    }

    #[test]
    fn test_bad_number_payload_rejected() {
        let codec = Codec::default();
        let err = codec
            .decode(&AttributeValue::N("not-a-number".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidNumber(_)));
    }

    #[test]
    fn test_json_bridge() {
        let json = json!({
            "name": "alice",
            "age": 30,
            "active": true,
            "scores": [1, 2.5, null],
            "nested": {"deep": "value"}
        });
        let value = Value::from_json(json.clone());
        assert_eq!(value.into_json(), json);
    }

    #[test]
    fn test_binary_lowers_to_base64_text() {
        let value = Value::Binary(vec![1, 2, 3]);
        assert_eq!(value.into_json(), json!("AQID"));
    }
}
