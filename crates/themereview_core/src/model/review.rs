//! Review domain model.
//!
//! # Responsibility
//! - Define the authoritative review record.
//! - Validate the rating range before any write path touches the store.
//!
//! # Invariants
//! - `RATING_MIN <= rating <= RATING_MAX`.
//! - `id` is assigned once and never reused.

use crate::store::DocId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lowest accepted rating.
pub const RATING_MIN: i32 = 1;
/// Highest accepted rating.
pub const RATING_MAX: i32 = 5;

/// Review field validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewValidationError {
    RatingOutOfRange { rating: i32 },
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RatingOutOfRange { rating } => write!(
                f,
                "rating must be between {RATING_MIN} and {RATING_MAX}, got {rating}"
            ),
        }
    }
}

impl Error for ReviewValidationError {}

/// Checks a rating against the accepted range.
pub fn validate_rating(rating: i32) -> Result<(), ReviewValidationError> {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Ok(())
    } else {
        Err(ReviewValidationError::RatingOutOfRange { rating })
    }
}

/// A user's rating and comment for one theme.
///
/// Copies of a review embedded in `Theme::reviews` are snapshots taken when
/// the review was left; they do not follow later edits or deletes of this
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: DocId,
    pub user_id: String,
    pub theme_id: String,
    pub rating: i32,
    pub comment: String,
}

impl Review {
    /// Creates a review with a freshly generated id. Does not validate.
    pub fn new(
        user_id: impl Into<String>,
        theme_id: impl Into<String>,
        rating: i32,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: DocId::generate(),
            user_id: user_id.into(),
            theme_id: theme_id.into(),
            rating,
            comment: comment.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ReviewValidationError> {
        validate_rating(self.rating)
    }
}
