//! Domain records persisted in the document store.
//!
//! # Responsibility
//! - Define the serialized shape of reviews, themes, books and users.
//! - Own field-level invariants (rating range) and derived values (mean).
//!
//! # Invariants
//! - Every record is identified by a stable `DocId` assigned at creation.
//! - Cross-record references (`user_id`, `theme_id`, `theme_ids`) are plain
//!   strings and are never enforced by the store.

pub mod review;
pub mod theme;
pub mod user;

/// Collection holding authoritative review records.
pub const REVIEW_COLLECTION: &str = "ReviewCollection";
/// Collection holding themes with embedded review snapshots.
pub const THEME_COLLECTION: &str = "ThemeCollection";
/// Collection holding user profiles.
pub const USER_COLLECTION: &str = "UserCollection";
/// Collection holding per-user statistics.
pub const STATISTICS_COLLECTION: &str = "StatisticsCollection";
