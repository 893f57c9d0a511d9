//! Document store contract shared by every repository.
//!
//! # Responsibility
//! - Model the record store as named collections of JSON documents.
//! - Define filters and single-document update specs (`set`, `push`,
//!   `push_each`) independently of the backing engine.
//!
//! # Invariants
//! - Every stored document carries its identifier under [`ID_FIELD`].
//! - `update_one`/`replace_one`/`delete_one` touch at most one document and
//!   are atomic per document. Nothing is atomic across documents.
//! - A filter matching nothing is not an error: results report zero matches.

use crate::db::DbError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub mod sqlite;

pub use sqlite::SqliteDocumentStore;

/// Field holding the document identifier in every stored body.
pub const ID_FIELD: &str = "id";

/// A stored JSON object.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque, store-generated document identifier.
///
/// Serialized as a hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(Uuid);

impl DocId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the string form of an identifier.
    ///
    /// # Errors
    /// - Returns `StoreError::MalformedId` for anything that is not a UUID.
    pub fn parse(value: &str) -> StoreResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| StoreError::MalformedId(value.to_string()))
    }
}

impl Display for DocId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocId {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Errors from document store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap failure.
    Db(DbError),
    /// Identifier string is not well formed.
    MalformedId(String),
    /// Insert collided with an existing identifier.
    DuplicateId { collection: String, id: DocId },
    /// Document body cannot be encoded, decoded or lacks its identifier.
    InvalidDocument(String),
    /// Update spec cannot be applied to the matched document.
    InvalidUpdate(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MalformedId(value) => write!(f, "malformed document id `{value}`"),
            Self::DuplicateId { collection, id } => {
                write!(f, "document {id} already exists in {collection}")
            }
            Self::InvalidDocument(message) => write!(f, "invalid document: {message}"),
            Self::InvalidUpdate(message) => write!(f, "invalid update: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: expected schema {expected_version}, found {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidDocument(value.to_string())
    }
}

/// Document selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document in the collection.
    All,
    /// The document with this identifier.
    Id(DocId),
    /// Documents whose top-level `field` equals `value`, or whose array
    /// `field` contains `value`.
    FieldEq { field: String, value: Value },
}

impl Filter {
    pub fn id(id: DocId) -> Self {
        Self::Id(id)
    }

    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::FieldEq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns whether `document` is selected by this filter.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => {
                document.get(ID_FIELD).and_then(Value::as_str) == Some(id.to_string().as_str())
            }
            Self::FieldEq { field, value } => match document.get(field) {
                Some(Value::Array(items)) if !value.is_array() => items.contains(value),
                Some(current) => current == value,
                None => value.is_null(),
            },
        }
    }
}

/// Atomic single-document field update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSpec {
    /// Overwrites `field` with `value`.
    Set { field: String, value: Value },
    /// Appends `value` to the array `field`, creating it when absent.
    Push { field: String, value: Value },
    /// Appends every value to the array `field`, creating it when absent.
    /// Existing elements are not de-duplicated.
    PushEach { field: String, values: Vec<Value> },
}

impl UpdateSpec {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn push(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Push {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn push_each<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::PushEach {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Target field name.
    pub fn field(&self) -> &str {
        match self {
            Self::Set { field, .. } | Self::Push { field, .. } | Self::PushEach { field, .. } => {
                field
            }
        }
    }

    /// Short operator name used in log lines.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Push { .. } => "push",
            Self::PushEach { .. } => "push_each",
        }
    }

    /// Applies the update in place and returns whether the document changed.
    ///
    /// # Errors
    /// - `InvalidUpdate` when targeting the identifier field.
    /// - `InvalidUpdate` when appending to a field that is not an array.
    pub fn apply(&self, document: &mut Document) -> StoreResult<bool> {
        if self.field() == ID_FIELD {
            return Err(StoreError::InvalidUpdate(format!(
                "`{ID_FIELD}` is immutable"
            )));
        }

        match self {
            Self::Set { field, value } => {
                let changed = document.get(field) != Some(value);
                document.insert(field.clone(), value.clone());
                Ok(changed)
            }
            Self::Push { field, value } => {
                array_field(document, field)?.push(value.clone());
                Ok(true)
            }
            Self::PushEach { field, values } => {
                array_field(document, field)?.extend(values.iter().cloned());
                Ok(!values.is_empty())
            }
        }
    }
}

fn array_field<'doc>(
    document: &'doc mut Document,
    field: &str,
) -> StoreResult<&'doc mut Vec<Value>> {
    let slot = document
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => Ok(items),
        _ => Err(StoreError::InvalidUpdate(format!(
            "field `{field}` is not an array"
        ))),
    }
}

/// Counts reported by single-document writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents selected by the filter (0 or 1).
    pub matched: u64,
    /// Documents whose stored body changed (0 or 1).
    pub modified: u64,
}

impl UpdateResult {
    pub fn matched_any(&self) -> bool {
        self.matched > 0
    }
}

/// Record store consumed by repositories.
///
/// Implementations must make each write atomic for the single document it
/// touches. Callers get no cross-document guarantees.
pub trait DocumentStore {
    /// Returns the first document matching `filter`.
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;
    /// Returns every document matching `filter`, in insertion order.
    fn find_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;
    /// Inserts a document that already carries its identifier.
    fn insert_one(&self, collection: &str, document: Document) -> StoreResult<DocId>;
    /// Replaces the first matching document, keeping its identifier.
    fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<UpdateResult>;
    /// Applies `update` to the first matching document.
    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> StoreResult<UpdateResult>;
    /// Deletes the first matching document and returns the deleted count.
    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        (**self).find_one(collection, filter)
    }

    fn find_all(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        (**self).find_all(collection, filter)
    }

    fn insert_one(&self, collection: &str, document: Document) -> StoreResult<DocId> {
        (**self).insert_one(collection, document)
    }

    fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<UpdateResult> {
        (**self).replace_one(collection, filter, document)
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateSpec,
    ) -> StoreResult<UpdateResult> {
        (**self).update_one(collection, filter, update)
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        (**self).delete_one(collection, filter)
    }
}

/// Reads the identifier stored under [`ID_FIELD`].
pub fn document_id(document: &Document) -> StoreResult<DocId> {
    match document.get(ID_FIELD) {
        Some(Value::String(value)) => DocId::parse(value),
        Some(other) => Err(StoreError::InvalidDocument(format!(
            "`{ID_FIELD}` must be a string, got {other}"
        ))),
        None => Err(StoreError::InvalidDocument(format!(
            "missing `{ID_FIELD}` field"
        ))),
    }
}

/// Encodes a serializable record as a document body.
pub fn to_document<T: Serialize>(record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Decodes a document body into a typed record.
pub fn from_document<T: DeserializeOwned>(document: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
