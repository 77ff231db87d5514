use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use serde_json::Error as JsonError;
use std::error::Error as StdError;
use std::fmt;

type DynamoDescribeTableError = SdkError<DescribeTableError, Response>;
type DynamoGetError = SdkError<GetItemError, Response>;
type DynamoPutError = SdkError<PutItemError, Response>;
type DynamoDeleteItemError = SdkError<DeleteItemError, Response>;
type DynamoQueryError = SdkError<QueryError, Response>;
type DynamoBatchWriteItemError = SdkError<BatchWriteItemError, Response>;

/// Key-value store operation error
#[derive(Debug)]
pub enum Error {
    /// A `get` was issued for a key that does not exist in the partition.
    ///
    /// This is the only expected, recoverable failure of the read path.
    NotFound(String),
    /// A value could not be represented as a DynamoDB item. Carries the
    /// name of the offending runtime type (for example `"number"` when a
    /// serialized value is not a JSON object at its top level).
    UnsupportedType(&'static str),
    /// An attribute value carried a type tag outside the supported set
    /// (`NULL`, `S`, `B`, `BOOL`, `N`, `L`, `M`). Indicates data written by
    /// something other than this adapter, or a provider contract violation.
    UnknownTag(&'static str),
    /// An `N`-tagged attribute carried a payload that does not parse as a
    /// decimal number.
    InvalidNumber(String),
    /// The live table's key schema does not match what the adapter needs
    /// (a hash key plus a range key), or an item came back without the
    /// expected key attributes.
    SchemaMismatch(String),
    /// The batch writer gave up after its retry budget was spent with the
    /// given number of entries still unprocessed by the provider.
    BatchRetriesExhausted(usize),
    /// A non-SDK provider implementation failed. The AWS-backed provider
    /// never produces this variant; it reports the typed SDK errors below.
    Provider(String),
    /// Value (de)serialization error at the JSON boundary
    Json(JsonError),
    /// DynamoDB request builder error
    BuildError(BuildError),
    /// DynamoDB DescribeTable operation error
    DynamoDescribeTableError(DynamoDescribeTableError),
    /// DynamoDB GetItem operation error
    DynamoGetError(DynamoGetError),
    /// DynamoDB PutItem operation error
    DynamoPutError(DynamoPutError),
    /// DynamoDB DeleteItem operation error
    DynamoDeleteItemError(DynamoDeleteItemError),
    /// DynamoDB Query operation error
    DynamoQueryError(DynamoQueryError),
    /// DynamoDB BatchWriteItem operation error
    DynamoBatchWriteItemError(DynamoBatchWriteItemError),
}

impl Error {
    /// Check if the error is a missing-key read
    ///
    /// `get` on an absent key is an expected outcome for callers probing
    /// for existence, so it gets its own predicate.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if the error indicates corrupt or foreign data in the table
    ///
    /// Returns `true` for decode failures: unknown attribute tags, bad
    /// number payloads, or items missing their key attributes.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::UnknownTag(_) | Error::InvalidNumber(_) | Error::SchemaMismatch(_)
        )
    }

    /// Check if the error came from the provider rather than this adapter
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Error::Provider(_)
                | Error::DynamoDescribeTableError(_)
                | Error::DynamoGetError(_)
                | Error::DynamoPutError(_)
                | Error::DynamoDeleteItemError(_)
                | Error::DynamoQueryError(_)
                | Error::DynamoBatchWriteItemError(_)
        )
    }
}

macro_rules! impl_from_error {
    ($name:ident, $variant:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$variant(e)
            }
        }
    };
    ($name:ident) => {
        impl From<$name> for Error {
            fn from(e: $name) -> Self {
                Error::$name(e)
            }
        }
    };
}

impl_from_error!(JsonError, Json);
impl_from_error!(BuildError);
impl_from_error!(DynamoDescribeTableError);
impl_from_error!(DynamoGetError);
impl_from_error!(DynamoPutError);
impl_from_error!(DynamoDeleteItemError);
impl_from_error!(DynamoQueryError);
impl_from_error!(DynamoBatchWriteItemError);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(key) => write!(f, "key not found: {}", key),
            Error::UnsupportedType(name) => {
                write!(f, "unsupported value type: {}", name)
            }
            Error::UnknownTag(tag) => {
                write!(f, "unknown attribute value tag: {}", tag)
            }
            Error::InvalidNumber(payload) => {
                write!(f, "invalid number payload: {}", payload)
            }
            Error::SchemaMismatch(reason) => write!(f, "schema mismatch: {}", reason),
            Error::BatchRetriesExhausted(remaining) => write!(
                f,
                "batch write retries exhausted with {} entries unprocessed",
                remaining
            ),
            Error::Provider(reason) => write!(f, "provider error: {}", reason),
            Error::Json(e) => write!(f, "value serialization error: {}", e),
            Error::BuildError(e) => write!(f, "DynamoDB request builder error: {}", e),
            Error::DynamoDescribeTableError(e) => {
                write!(f, "DynamoDB DescribeTable operation failed: {}", e)
            }
            Error::DynamoGetError(e) => {
                write!(f, "DynamoDB GetItem operation failed: {}", e)
            }
            Error::DynamoPutError(e) => {
                write!(f, "DynamoDB PutItem operation failed: {}", e)
            }
            Error::DynamoDeleteItemError(e) => {
                write!(f, "DynamoDB DeleteItem operation failed: {}", e)
            }
            Error::DynamoQueryError(e) => {
                write!(f, "DynamoDB Query operation failed: {}", e)
            }
            Error::DynamoBatchWriteItemError(e) => {
                write!(f, "DynamoDB BatchWriteItem operation failed: {}", e)
            }
        }
    }
}

impl StdError for Error {}
