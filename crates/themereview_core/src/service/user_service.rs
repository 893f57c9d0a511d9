//! User profile use-case service.
//!
//! # Responsibility
//! - Create users together with their statistics record.
//! - Provide profile read/update/delete and apply-for-theme entry points.
//!
//! # Invariants
//! - A user is inserted only after its statistics were created.
//! - Passwords are stored as given and never logged.

use crate::model::user::User;
use crate::repo::user_repo::UserRepository;
use crate::service::statistics_service::StatisticsService;
use crate::service::{parse_id, ServiceError, ServiceResult};
use crate::store::DocId;
use log::{info, warn};

const KIND: &str = "user";

/// Use-case service over a user repository and statistics collaborator.
pub struct UserService<U: UserRepository, S: StatisticsService> {
    repo: U,
    statistics: S,
}

impl<U: UserRepository, S: StatisticsService> UserService<U, S> {
    pub fn new(repo: U, statistics: S) -> Self {
        Self { repo, statistics }
    }

    /// Persists `user` under a fresh id with newly created statistics.
    ///
    /// # Errors
    /// - Statistics failures fail the whole call; no user is inserted.
    pub fn create_user(&self, mut user: User) -> ServiceResult<DocId> {
        user.id = DocId::generate();
        user.statistics = Some(self.statistics.create_statistics(user.id)?);

        let id = self
            .repo
            .create_user(&user)
            .map_err(|err| ServiceError::from_repo("user_create", KIND, err))?;
        info!("event=user_create module=service status=ok user_id={id}");
        Ok(id)
    }

    pub fn get_user(&self, id: &str) -> ServiceResult<User> {
        let user_id = parse_id(id)?;
        self.load("user_get", user_id)
    }

    pub fn update_country(&self, id: &str, country: &str) -> ServiceResult<()> {
        let user_id = parse_id(id)?;
        let mut user = self.load("user_update", user_id)?;
        user.country = country.to_string();
        self.replace(user)
    }

    pub fn change_password(&self, id: &str, password: &str) -> ServiceResult<()> {
        let user_id = parse_id(id)?;
        let mut user = self.load("user_update", user_id)?;
        user.password = password.to_string();
        self.replace(user)
    }

    /// Deletes a user. Deleting an absent user succeeds.
    pub fn delete_user(&self, id: &str) -> ServiceResult<()> {
        let user_id = parse_id(id)?;
        self.repo
            .delete_user(user_id)
            .map_err(|err| ServiceError::from_repo("user_delete", KIND, err))
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        self.repo
            .list_users()
            .map_err(|err| ServiceError::from_repo("user_list", KIND, err))
    }

    /// Records that a user applied for a theme.
    ///
    /// Repeated applications append the theme id again. The theme itself is
    /// not checked for existence.
    pub fn apply_for_theme(&self, user_id: &str, theme_id: &str) -> ServiceResult<()> {
        let user_doc_id = parse_id(user_id)?;
        let theme_doc_id = parse_id(theme_id)?;
        let result = self
            .repo
            .append_theme_id(user_doc_id, &theme_doc_id.to_string())
            .map_err(|err| ServiceError::from_repo("theme_apply", KIND, err))?;
        if !result.matched_any() {
            return Err(ServiceError::not_found(KIND, user_doc_id));
        }
        info!(
            "event=theme_apply module=service status=ok user_id={user_doc_id} theme_id={theme_doc_id}"
        );
        Ok(())
    }

    fn load(&self, event: &'static str, user_id: DocId) -> ServiceResult<User> {
        self.repo
            .get_user(user_id)
            .map_err(|err| ServiceError::from_repo(event, KIND, err))?
            .ok_or_else(|| ServiceError::not_found(KIND, user_id))
    }

    fn replace(&self, user: User) -> ServiceResult<()> {
        let result = self
            .repo
            .replace_user(&user)
            .map_err(|err| ServiceError::from_repo("user_update", KIND, err))?;
        if !result.matched_any() {
            warn!(
                "event=user_update module=service status=warn user_id={} reason=vanished_before_replace",
                user.id
            );
        }
        Ok(())
    }
}
