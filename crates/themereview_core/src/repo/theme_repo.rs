//! Theme repository contracts and document-store implementation.
//!
//! # Responsibility
//! - Persist themes and expose the single-document atomic updates the
//!   aggregate maintainer and genre merge are built from.
//!
//! # Invariants
//! - Every mutation is one store call touching one theme document.
//! - Updates report the matched count; matching no theme is not an error.

use crate::model::review::Review;
use crate::model::theme::{Theme, GENRES_FIELD, RATING_FIELD, REVIEWS_FIELD};
use crate::model::THEME_COLLECTION;
use crate::repo::{decode, RepoError, RepoResult};
use crate::store::{to_document, DocId, DocumentStore, Filter, UpdateResult, UpdateSpec};
use serde_json::Value;

/// Repository interface for theme records.
pub trait ThemeRepository {
    fn create_theme(&self, theme: &Theme) -> RepoResult<DocId>;
    fn get_theme(&self, id: DocId) -> RepoResult<Option<Theme>>;
    /// Atomically appends a review snapshot to the theme's `reviews`.
    fn append_review(&self, theme_id: DocId, review: &Review) -> RepoResult<UpdateResult>;
    /// Atomically overwrites the cached mean rating.
    fn set_rating(&self, theme_id: DocId, rating: f64) -> RepoResult<UpdateResult>;
    /// Atomically appends every tag to the first theme matching `filter`.
    fn append_genres(&self, filter: &Filter, genres: &[String]) -> RepoResult<UpdateResult>;
}

/// Theme repository backed by any [`DocumentStore`].
pub struct DocumentThemeRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DocumentThemeRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: DocumentStore> ThemeRepository for DocumentThemeRepository<S> {
    fn create_theme(&self, theme: &Theme) -> RepoResult<DocId> {
        Ok(self
            .store
            .insert_one(THEME_COLLECTION, to_document(theme)?)?)
    }

    fn get_theme(&self, id: DocId) -> RepoResult<Option<Theme>> {
        self.store
            .find_one(THEME_COLLECTION, &Filter::id(id))?
            .map(|document| decode(THEME_COLLECTION, document))
            .transpose()
    }

    fn append_review(&self, theme_id: DocId, review: &Review) -> RepoResult<UpdateResult> {
        let snapshot = Value::Object(to_document(review)?);
        Ok(self.store.update_one(
            THEME_COLLECTION,
            &Filter::id(theme_id),
            &UpdateSpec::push(REVIEWS_FIELD, snapshot),
        )?)
    }

    fn set_rating(&self, theme_id: DocId, rating: f64) -> RepoResult<UpdateResult> {
        if !rating.is_finite() {
            return Err(RepoError::InvalidData(format!(
                "theme rating must be finite, got {rating}"
            )));
        }
        Ok(self.store.update_one(
            THEME_COLLECTION,
            &Filter::id(theme_id),
            &UpdateSpec::set(RATING_FIELD, rating),
        )?)
    }

    fn append_genres(&self, filter: &Filter, genres: &[String]) -> RepoResult<UpdateResult> {
        Ok(self.store.update_one(
            THEME_COLLECTION,
            filter,
            &UpdateSpec::push_each(GENRES_FIELD, genres.iter().cloned()),
        )?)
    }
}
