//! Review repository contracts and document-store implementation.
//!
//! # Responsibility
//! - Own the authoritative `ReviewCollection` records.
//! - Keep document encoding details out of services.
//!
//! # Invariants
//! - `update_review` rejects out-of-range ratings before any store call.
//! - `delete_review` is idempotent.

use crate::model::review::{validate_rating, Review};
use crate::model::REVIEW_COLLECTION;
use crate::repo::{decode, RepoError, RepoResult};
use crate::store::{to_document, DocId, DocumentStore, Filter};
use log::warn;

/// Repository interface for review records.
pub trait ReviewRepository {
    /// Persists a validated review under its own id.
    fn create_review(&self, review: &Review) -> RepoResult<DocId>;
    fn get_review(&self, id: DocId) -> RepoResult<Option<Review>>;
    /// Read-then-replace of rating and comment.
    ///
    /// If the record disappears between the read and the replace, the
    /// replace affects nothing and the call still succeeds.
    fn update_review(&self, id: DocId, rating: i32, comment: &str) -> RepoResult<()>;
    /// Deletes one review; a missing id is not an error.
    fn delete_review(&self, id: DocId) -> RepoResult<()>;
    /// Full unordered scan.
    fn list_reviews(&self) -> RepoResult<Vec<Review>>;
}

/// Review repository backed by any [`DocumentStore`].
pub struct DocumentReviewRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DocumentReviewRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: DocumentStore> ReviewRepository for DocumentReviewRepository<S> {
    fn create_review(&self, review: &Review) -> RepoResult<DocId> {
        review.validate()?;
        Ok(self
            .store
            .insert_one(REVIEW_COLLECTION, to_document(review)?)?)
    }

    fn get_review(&self, id: DocId) -> RepoResult<Option<Review>> {
        self.store
            .find_one(REVIEW_COLLECTION, &Filter::id(id))?
            .map(|document| decode(REVIEW_COLLECTION, document))
            .transpose()
    }

    fn update_review(&self, id: DocId, rating: i32, comment: &str) -> RepoResult<()> {
        validate_rating(rating)?;

        let mut review = self.get_review(id)?.ok_or(RepoError::NotFound(id))?;
        review.rating = rating;
        review.comment = comment.to_string();

        let result =
            self.store
                .replace_one(REVIEW_COLLECTION, &Filter::id(id), to_document(&review)?)?;
        if !result.matched_any() {
            warn!(
                "event=review_update module=repo status=warn review_id={id} reason=vanished_before_replace"
            );
        }
        Ok(())
    }

    fn delete_review(&self, id: DocId) -> RepoResult<()> {
        self.store.delete_one(REVIEW_COLLECTION, &Filter::id(id))?;
        Ok(())
    }

    fn list_reviews(&self) -> RepoResult<Vec<Review>> {
        self.store
            .find_all(REVIEW_COLLECTION, &Filter::All)?
            .into_iter()
            .map(|document| decode(REVIEW_COLLECTION, document))
            .collect()
    }
}
