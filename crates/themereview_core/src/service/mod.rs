//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into request-level operations.
//! - Translate repository errors into the caller-facing taxonomy.
//! - Parse caller-supplied string ids at the boundary.
//!
//! # Invariants
//! - Services never reach the store except through repositories.
//! - Every service receives its repositories explicitly; there is no
//!   process-wide service state.

use crate::model::review::ReviewValidationError;
use crate::repo::RepoError;
use crate::store::{DocId, StoreError};
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod aggregate_service;
pub mod review_service;
pub mod statistics_service;
pub mod theme_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error taxonomy.
#[derive(Debug)]
pub enum ServiceError {
    /// Rating outside the accepted range; nothing was written.
    Range(ReviewValidationError),
    /// Target record is absent.
    NotFound { kind: &'static str, id: String },
    /// Identifier is not well formed.
    BadRequest(String),
    /// Storage transport, database or persisted-data failure.
    StoreUnavailable(RepoError),
}

impl ServiceError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Converts a repository error raised by operation `event`, naming
    /// `kind` on not-found.
    ///
    /// Storage failures are logged here and nowhere else.
    pub(crate) fn from_repo(event: &'static str, kind: &'static str, err: RepoError) -> Self {
        match err {
            RepoError::Validation(err) => Self::Range(err),
            RepoError::NotFound(id) => Self::not_found(kind, id),
            RepoError::Store(StoreError::MalformedId(value)) => {
                Self::BadRequest(format!("malformed id `{value}`"))
            }
            other => {
                error!(
                    "event={event} module=service status=error kind={kind} error_code=store_unavailable error={other}"
                );
                Self::StoreUnavailable(other)
            }
        }
    }

    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Range(_) => "range",
            Self::NotFound { .. } => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Range(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            Self::NotFound { .. } | Self::BadRequest(_) => None,
        }
    }
}

impl From<ReviewValidationError> for ServiceError {
    fn from(value: ReviewValidationError) -> Self {
        Self::Range(value)
    }
}

/// Parses a caller-supplied id, reporting malformed input as `BadRequest`.
pub(crate) fn parse_id(value: &str) -> ServiceResult<DocId> {
    DocId::parse(value).map_err(|_| ServiceError::BadRequest(format!("malformed id `{value}`")))
}
