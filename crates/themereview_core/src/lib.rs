//! Core domain logic for the theme review platform.
//! This crate is the single source of truth for review and theme aggregate
//! invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::review::{Review, ReviewValidationError, RATING_MAX, RATING_MIN};
pub use model::theme::{mean_rating, Book, Theme};
pub use model::user::{Statistics, User};
pub use repo::review_repo::{DocumentReviewRepository, ReviewRepository};
pub use repo::theme_repo::{DocumentThemeRepository, ThemeRepository};
pub use repo::user_repo::{DocumentUserRepository, StatisticsRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::aggregate_service::{
    Compensation, LeaveReviewError, LeaveReviewOutcome, LeaveReviewStep, OrphanReviewPolicy,
    PartialCommit, ThemeAggregateMaintainer,
};
pub use service::review_service::ReviewService;
pub use service::statistics_service::{RepositoryStatisticsService, StatisticsService};
pub use service::theme_service::ThemeService;
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};
pub use store::{
    DocId, Document, DocumentStore, Filter, SqliteDocumentStore, StoreError, StoreResult,
    UpdateResult, UpdateSpec,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
