//! Theme and book domain models.
//!
//! # Responsibility
//! - Define the theme record with its embedded review snapshots and cached
//!   mean rating.
//! - Define the book shape consumed by genre merge.
//!
//! # Invariants
//! - `reviews` is append-only.
//! - After a completed aggregate update, `rating == mean_rating(&reviews)`.

use crate::model::review::Review;
use crate::store::DocId;
use serde::{Deserialize, Serialize};

/// Document field holding embedded review snapshots.
pub const REVIEWS_FIELD: &str = "reviews";
/// Document field holding the cached mean rating.
pub const RATING_FIELD: &str = "rating";
/// Document field holding genre tags.
pub const GENRES_FIELD: &str = "genres";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: DocId,
    #[serde(default)]
    pub name: String,
    /// Tag list; appends are duplicate tolerant.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Point-in-time review snapshots, in the order they were left.
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Cached mean of `reviews[].rating`; `0.0` with no reviews.
    #[serde(default)]
    pub rating: f64,
}

impl Theme {
    /// Creates an empty theme with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocId::generate(),
            name: name.into(),
            genres: Vec::new(),
            reviews: Vec::new(),
            rating: 0.0,
        }
    }

    /// Mean of the embedded snapshot ratings.
    pub fn embedded_mean(&self) -> f64 {
        mean_rating(&self.reviews)
    }
}

/// Arithmetic mean of review ratings, `0.0` for an empty slice.
///
/// Always recomputed from the full list so repeated updates cannot drift.
pub fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: i64 = reviews.iter().map(|review| i64::from(review.rating)).sum();
    total as f64 / reviews.len() as f64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: DocId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        genres: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: DocId::generate(),
            title: title.into(),
            genres: genres.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{mean_rating, Theme};
    use crate::model::review::Review;

    #[test]
    fn mean_of_empty_list_is_zero() {
        assert_eq!(mean_rating(&[]), 0.0);
    }

    #[test]
    fn mean_uses_every_snapshot() {
        let reviews = vec![
            Review::new("u1", "t", 4, "good"),
            Review::new("u2", "t", 2, "meh"),
            Review::new("u3", "t", 5, "great"),
        ];
        assert!((mean_rating(&reviews) - 11.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_optional_fields_deserialize_to_defaults() {
        let theme = Theme::new("x");
        let minimal = serde_json::json!({ "id": theme.id.to_string() });
        let parsed: Theme = serde_json::from_value(minimal).unwrap();
        assert!(parsed.reviews.is_empty());
        assert!(parsed.genres.is_empty());
        assert_eq!(parsed.rating, 0.0);
    }
}
