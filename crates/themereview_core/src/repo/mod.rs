//! Repository layer over the document store.
//!
//! # Responsibility
//! - Map typed records to and from store documents.
//! - Return semantic errors (`NotFound`, `Validation`) next to store errors.
//!
//! # Invariants
//! - Review write paths validate the rating before touching the store.
//! - Read paths reject undecodable persisted documents instead of masking
//!   them.

use crate::model::review::ReviewValidationError;
use crate::store::{from_document, DocId, Document, StoreError};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod review_repo;
pub mod theme_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every collection.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReviewValidationError),
    Store(StoreError),
    NotFound(DocId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ReviewValidationError> for RepoError {
    fn from(value: ReviewValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Decodes a persisted document, reporting shape mismatches as `InvalidData`.
pub(crate) fn decode<T: DeserializeOwned>(collection: &str, document: Document) -> RepoResult<T> {
    from_document(document).map_err(|err| match err {
        StoreError::InvalidDocument(message) => {
            RepoError::InvalidData(format!("{collection}: {message}"))
        }
        other => RepoError::Store(other),
    })
}
