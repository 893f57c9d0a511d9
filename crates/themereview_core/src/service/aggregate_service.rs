//! Theme aggregate maintenance for the leave-review workflow.
//!
//! # Responsibility
//! - Append a new review snapshot to its theme, recompute the theme's mean
//!   rating, then persist the standalone review.
//! - Report exactly which steps committed when the sequence stops early.
//!
//! # Invariants
//! - Ratings outside `[1, 5]` and malformed theme ids are rejected before the
//!   first write.
//! - The mean is always recomputed from the full embedded list, never
//!   maintained incrementally.
//! - The three writes are independent single-document operations. After the
//!   append has committed, a failure triggers one best-effort recompute and
//!   is reported as `LeaveReviewError::Partial`; nothing is rolled back.
//! - Not idempotent: retrying after a partial failure can append twice.
//!
//! # Concurrency
//! Two calls for the same theme race between append and rating write. The
//! last rating write wins and may omit a review appended concurrently. Both
//! standalone reviews are still persisted.

use crate::model::review::{validate_rating, Review};
use crate::model::theme::mean_rating;
use crate::repo::review_repo::ReviewRepository;
use crate::repo::theme_repo::ThemeRepository;
use crate::service::{parse_id, ServiceError, ServiceResult};
use crate::store::DocId;
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const EVENT: &str = "leave_review";
const RECOMPUTE_EVENT: &str = "theme_recompute";
const THEME: &str = "theme";
const REVIEW: &str = "review";

/// What to do when the target theme of a new review does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReviewPolicy {
    /// Persist the standalone review anyway and report `ThemeMissing`.
    #[default]
    Persist,
    /// Write nothing and fail with `NotFound` for the theme.
    Reject,
}

/// Write steps of the leave-review sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReviewStep {
    AppendToTheme,
    RecomputeRating,
    PersistReview,
}

impl LeaveReviewStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AppendToTheme => "append_to_theme",
            Self::RecomputeRating => "recompute_rating",
            Self::PersistReview => "persist_review",
        }
    }
}

/// Successful leave-review result.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveReviewOutcome {
    /// All three steps committed.
    Committed { review: Review, theme_rating: f64 },
    /// No theme matched; the standalone review was persisted on its own.
    ThemeMissing { review: Review },
}

impl LeaveReviewOutcome {
    pub fn review(&self) -> &Review {
        match self {
            Self::Committed { review, .. } | Self::ThemeMissing { review } => review,
        }
    }
}

/// Result of the recompute attempted after a partial failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Compensation {
    /// The rating now matches the embedded list as currently stored.
    Resynced { theme_rating: f64 },
    /// The recompute failed too; the cached rating may be stale.
    Failed(String),
}

/// Details of a leave-review call that stopped after the append committed.
#[derive(Debug)]
pub struct PartialCommit {
    /// The review whose snapshot is already embedded in the theme.
    pub review: Review,
    /// Steps that took effect before the failure.
    pub committed: Vec<LeaveReviewStep>,
    pub failed_step: LeaveReviewStep,
    pub cause: ServiceError,
    pub compensation: Compensation,
}

/// Failed leave-review call.
#[derive(Debug)]
pub enum LeaveReviewError {
    /// Nothing was written.
    Rejected(ServiceError),
    /// Some steps committed; see `PartialCommit::committed`.
    Partial(Box<PartialCommit>),
}

impl LeaveReviewError {
    /// Underlying error regardless of commit state.
    pub fn cause(&self) -> &ServiceError {
        match self {
            Self::Rejected(err) => err,
            Self::Partial(partial) => &partial.cause,
        }
    }
}

impl Display for LeaveReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "leave review rejected: {err}"),
            Self::Partial(partial) => write!(
                f,
                "leave review partially committed: {} failed after {} step(s): {}",
                partial.failed_step.as_str(),
                partial.committed.len(),
                partial.cause
            ),
        }
    }
}

impl Error for LeaveReviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause())
    }
}

impl From<ServiceError> for LeaveReviewError {
    fn from(value: ServiceError) -> Self {
        Self::Rejected(value)
    }
}

/// Keeps a theme's embedded reviews and mean rating in step with new reviews.
pub struct ThemeAggregateMaintainer<T: ThemeRepository, R: ReviewRepository> {
    themes: T,
    reviews: R,
    orphan_policy: OrphanReviewPolicy,
}

impl<T: ThemeRepository, R: ReviewRepository> ThemeAggregateMaintainer<T, R> {
    /// Creates a maintainer with the default `OrphanReviewPolicy::Persist`.
    pub fn new(themes: T, reviews: R) -> Self {
        Self {
            themes,
            reviews,
            orphan_policy: OrphanReviewPolicy::default(),
        }
    }

    pub fn with_orphan_policy(mut self, policy: OrphanReviewPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    /// Leaves a review for a theme.
    ///
    /// Sequence: validate, append snapshot to the theme, recompute and store
    /// the theme mean, persist the standalone review.
    ///
    /// # Errors
    /// - `Rejected(Range)` / `Rejected(BadRequest)` before any write.
    /// - `Rejected(StoreUnavailable)` when the append itself fails.
    /// - `Rejected(NotFound)` for a missing theme under
    ///   `OrphanReviewPolicy::Reject`.
    /// - `Partial` when the recompute or the standalone insert fails after
    ///   the append committed.
    pub fn leave_review(
        &self,
        user_id: &str,
        theme_id: &str,
        rating: i32,
        comment: &str,
    ) -> Result<LeaveReviewOutcome, LeaveReviewError> {
        validate_rating(rating).map_err(ServiceError::from)?;
        let theme_doc_id = parse_id(theme_id)?;
        let review = Review::new(user_id, theme_doc_id.to_string(), rating, comment);

        info!(
            "event=leave_review module=aggregate status=start review_id={} theme_id={}",
            review.id, theme_doc_id
        );

        let appended = self
            .themes
            .append_review(theme_doc_id, &review)
            .map_err(|err| ServiceError::from_repo(EVENT, THEME, err))?;

        if !appended.matched_any() {
            return self.handle_missing_theme(review, theme_doc_id);
        }

        let theme_rating = match self.recompute(theme_doc_id) {
            Ok(Some(theme_rating)) => theme_rating,
            // Theme deleted between append and re-read; its snapshot went with it.
            Ok(None) => return self.handle_missing_theme(review, theme_doc_id),
            Err(cause) => {
                return Err(self.partial(
                    review,
                    theme_doc_id,
                    vec![LeaveReviewStep::AppendToTheme],
                    LeaveReviewStep::RecomputeRating,
                    cause,
                ));
            }
        };

        if let Err(err) = self.reviews.create_review(&review) {
            return Err(self.partial(
                review,
                theme_doc_id,
                vec![
                    LeaveReviewStep::AppendToTheme,
                    LeaveReviewStep::RecomputeRating,
                ],
                LeaveReviewStep::PersistReview,
                ServiceError::from_repo(EVENT, REVIEW, err),
            ));
        }

        info!(
            "event=leave_review module=aggregate status=ok review_id={} theme_id={} theme_rating={}",
            review.id, theme_doc_id, theme_rating
        );
        Ok(LeaveReviewOutcome::Committed {
            review,
            theme_rating,
        })
    }

    /// Recomputes a theme's mean from its stored embedded list and saves it.
    ///
    /// Also the compensation path after a partial leave-review failure.
    pub fn resync_theme_rating(&self, theme_id: &str) -> ServiceResult<f64> {
        let theme_doc_id = parse_id(theme_id)?;
        let theme_rating = self
            .recompute(theme_doc_id)?
            .ok_or_else(|| ServiceError::not_found(THEME, theme_doc_id))?;
        info!(
            "event=theme_resync module=aggregate status=ok theme_id={theme_doc_id} theme_rating={theme_rating}"
        );
        Ok(theme_rating)
    }

    /// Returns `None` when the theme does not exist.
    fn recompute(&self, theme_id: DocId) -> ServiceResult<Option<f64>> {
        let Some(theme) = self
            .themes
            .get_theme(theme_id)
            .map_err(|err| ServiceError::from_repo(RECOMPUTE_EVENT, THEME, err))?
        else {
            return Ok(None);
        };

        let theme_rating = mean_rating(&theme.reviews);
        let written = self
            .themes
            .set_rating(theme_id, theme_rating)
            .map_err(|err| ServiceError::from_repo(RECOMPUTE_EVENT, THEME, err))?;
        if !written.matched_any() {
            return Ok(None);
        }
        Ok(Some(theme_rating))
    }

    fn handle_missing_theme(
        &self,
        review: Review,
        theme_id: DocId,
    ) -> Result<LeaveReviewOutcome, LeaveReviewError> {
        match self.orphan_policy {
            OrphanReviewPolicy::Reject => {
                warn!(
                    "event=leave_review module=aggregate status=error review_id={} theme_id={} error_code=theme_not_found",
                    review.id, theme_id
                );
                Err(ServiceError::not_found(THEME, theme_id).into())
            }
            OrphanReviewPolicy::Persist => {
                warn!(
                    "event=leave_review module=aggregate status=warn review_id={} theme_id={} reason=theme_not_found",
                    review.id, theme_id
                );
                self.reviews
                    .create_review(&review)
                    .map_err(|err| ServiceError::from_repo(EVENT, REVIEW, err))?;
                Ok(LeaveReviewOutcome::ThemeMissing { review })
            }
        }
    }

    fn partial(
        &self,
        review: Review,
        theme_id: DocId,
        committed: Vec<LeaveReviewStep>,
        failed_step: LeaveReviewStep,
        cause: ServiceError,
    ) -> LeaveReviewError {
        let compensation = match self.recompute(theme_id) {
            Ok(Some(theme_rating)) => Compensation::Resynced { theme_rating },
            Ok(None) => Compensation::Failed(format!("theme not found: {theme_id}")),
            Err(err) => Compensation::Failed(err.to_string()),
        };

        warn!(
            "event=leave_review module=aggregate status=partial failed_step={} committed_steps={} review_id={} theme_id={} compensated={}",
            failed_step.as_str(),
            committed.len(),
            review.id,
            theme_id,
            matches!(compensation, Compensation::Resynced { .. })
        );

        LeaveReviewError::Partial(Box::new(PartialCommit {
            review,
            committed,
            failed_step,
            cause,
            compensation,
        }))
    }
}
