//! Theme use-case service and genre merge.
//!
//! # Responsibility
//! - Create and fetch themes.
//! - Merge a book's genre tags into a theme with one batch append.
//!
//! # Invariants
//! - Genre merge does not de-duplicate; merging the same book twice leaves
//!   every tag twice. Callers wanting set semantics de-duplicate upstream.

use crate::model::theme::{mean_rating, Book, Theme};
use crate::repo::theme_repo::ThemeRepository;
use crate::service::{parse_id, ServiceError, ServiceResult};
use crate::store::{DocId, Filter};
use log::{debug, info};

const KIND: &str = "theme";

/// Use-case service over a theme repository.
pub struct ThemeService<T: ThemeRepository> {
    repo: T,
}

impl<T: ThemeRepository> ThemeService<T> {
    pub fn new(repo: T) -> Self {
        Self { repo }
    }

    /// Persists `theme` under a fresh id.
    ///
    /// The cached rating is derived from any reviews the input already embeds.
    pub fn create_theme(&self, mut theme: Theme) -> ServiceResult<DocId> {
        theme.id = DocId::generate();
        theme.rating = mean_rating(&theme.reviews);
        let id = self
            .repo
            .create_theme(&theme)
            .map_err(|err| ServiceError::from_repo("theme_create", KIND, err))?;
        info!("event=theme_create module=service status=ok theme_id={id}");
        Ok(id)
    }

    pub fn get_theme(&self, id: &str) -> ServiceResult<Theme> {
        let theme_id = parse_id(id)?;
        self.repo
            .get_theme(theme_id)
            .map_err(|err| ServiceError::from_repo("theme_get", KIND, err))?
            .ok_or_else(|| ServiceError::not_found(KIND, theme_id))
    }

    /// Appends every genre of `book` to the first theme matching
    /// `theme_filter` and returns the matched count (0 or 1).
    ///
    /// Matching no theme is not an error.
    pub fn add_genres_to_theme(&self, book: &Book, theme_filter: &Filter) -> ServiceResult<u64> {
        let result = self
            .repo
            .append_genres(theme_filter, &book.genres)
            .map_err(|err| ServiceError::from_repo("genre_merge", KIND, err))?;
        debug!(
            "event=genre_merge module=service status=ok book_id={} genres={} matched={}",
            book.id,
            book.genres.len(),
            result.matched
        );
        Ok(result.matched)
    }
}
