//! Review use-case service.
//!
//! # Responsibility
//! - Provide create/get/update/delete/list entry points for standalone
//!   reviews, taking caller-supplied string ids.
//!
//! # Invariants
//! - Edits and deletes only touch `ReviewCollection`; embedded theme
//!   snapshots are never rewritten from here.
//! - Out-of-range ratings are rejected before the id is even parsed.

use crate::model::review::{validate_rating, Review};
use crate::repo::review_repo::ReviewRepository;
use crate::service::{parse_id, ServiceError, ServiceResult};
use crate::store::DocId;
use log::info;

const KIND: &str = "review";

/// Use-case service over a review repository.
pub struct ReviewService<R: ReviewRepository> {
    repo: R,
}

impl<R: ReviewRepository> ReviewService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists `review` under a fresh id and returns it.
    ///
    /// Any id carried by the input is discarded.
    pub fn create_review(&self, mut review: Review) -> ServiceResult<DocId> {
        review.id = DocId::generate();
        review.validate()?;
        let id = self
            .repo
            .create_review(&review)
            .map_err(|err| ServiceError::from_repo("review_create", KIND, err))?;
        info!("event=review_create module=service status=ok review_id={id}");
        Ok(id)
    }

    pub fn get_review(&self, id: &str) -> ServiceResult<Review> {
        let review_id = parse_id(id)?;
        self.repo
            .get_review(review_id)
            .map_err(|err| ServiceError::from_repo("review_get", KIND, err))?
            .ok_or_else(|| ServiceError::not_found(KIND, review_id))
    }

    /// Changes rating and comment of a standalone review.
    pub fn update_review(&self, id: &str, rating: i32, comment: &str) -> ServiceResult<()> {
        validate_rating(rating)?;
        let review_id = parse_id(id)?;
        self.repo
            .update_review(review_id, rating, comment)
            .map_err(|err| ServiceError::from_repo("review_update", KIND, err))?;
        info!("event=review_update module=service status=ok review_id={review_id}");
        Ok(())
    }

    /// Deletes a review. Deleting an absent review succeeds.
    pub fn delete_review(&self, id: &str) -> ServiceResult<()> {
        let review_id = parse_id(id)?;
        self.repo
            .delete_review(review_id)
            .map_err(|err| ServiceError::from_repo("review_delete", KIND, err))?;
        info!("event=review_delete module=service status=ok review_id={review_id}");
        Ok(())
    }

    pub fn list_reviews(&self) -> ServiceResult<Vec<Review>> {
        self.repo
            .list_reviews()
            .map_err(|err| ServiceError::from_repo("review_list", KIND, err))
    }
}
