//! User and statistics repositories over the document store.

use crate::model::user::{Statistics, User, THEME_IDS_FIELD};
use crate::model::{STATISTICS_COLLECTION, USER_COLLECTION};
use crate::repo::{decode, RepoResult};
use crate::store::{to_document, DocId, DocumentStore, Filter, UpdateResult, UpdateSpec};

/// Repository interface for user profiles.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<DocId>;
    fn get_user(&self, id: DocId) -> RepoResult<Option<User>>;
    /// Replaces the stored profile with the same id.
    fn replace_user(&self, user: &User) -> RepoResult<UpdateResult>;
    /// Deletes one user; a missing id is not an error.
    fn delete_user(&self, id: DocId) -> RepoResult<()>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Atomically appends `theme_id` to the user's applied-for themes.
    fn append_theme_id(&self, user_id: DocId, theme_id: &str) -> RepoResult<UpdateResult>;
}

/// Repository interface for per-user statistics.
pub trait StatisticsRepository {
    fn create_statistics(&self, statistics: &Statistics) -> RepoResult<DocId>;
    fn get_statistics(&self, id: DocId) -> RepoResult<Option<Statistics>>;
}

/// User and statistics repository backed by any [`DocumentStore`].
pub struct DocumentUserRepository<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DocumentUserRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: DocumentStore> UserRepository for DocumentUserRepository<S> {
    fn create_user(&self, user: &User) -> RepoResult<DocId> {
        Ok(self.store.insert_one(USER_COLLECTION, to_document(user)?)?)
    }

    fn get_user(&self, id: DocId) -> RepoResult<Option<User>> {
        self.store
            .find_one(USER_COLLECTION, &Filter::id(id))?
            .map(|document| decode(USER_COLLECTION, document))
            .transpose()
    }

    fn replace_user(&self, user: &User) -> RepoResult<UpdateResult> {
        Ok(self
            .store
            .replace_one(USER_COLLECTION, &Filter::id(user.id), to_document(user)?)?)
    }

    fn delete_user(&self, id: DocId) -> RepoResult<()> {
        self.store.delete_one(USER_COLLECTION, &Filter::id(id))?;
        Ok(())
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        self.store
            .find_all(USER_COLLECTION, &Filter::All)?
            .into_iter()
            .map(|document| decode(USER_COLLECTION, document))
            .collect()
    }

    fn append_theme_id(&self, user_id: DocId, theme_id: &str) -> RepoResult<UpdateResult> {
        Ok(self.store.update_one(
            USER_COLLECTION,
            &Filter::id(user_id),
            &UpdateSpec::push(THEME_IDS_FIELD, theme_id),
        )?)
    }
}

impl<S: DocumentStore> StatisticsRepository for DocumentUserRepository<S> {
    fn create_statistics(&self, statistics: &Statistics) -> RepoResult<DocId> {
        Ok(self
            .store
            .insert_one(STATISTICS_COLLECTION, to_document(statistics)?)?)
    }

    fn get_statistics(&self, id: DocId) -> RepoResult<Option<Statistics>> {
        self.store
            .find_one(STATISTICS_COLLECTION, &Filter::id(id))?
            .map(|document| decode(STATISTICS_COLLECTION, document))
            .transpose()
    }
}
