//! Statistics collaborator used at user creation.

use crate::model::user::Statistics;
use crate::repo::user_repo::StatisticsRepository;
use crate::service::{ServiceError, ServiceResult};
use crate::store::DocId;

/// Creates the statistics record owned by a new user.
pub trait StatisticsService {
    fn create_statistics(&self, user_id: DocId) -> ServiceResult<Statistics>;
}

/// Statistics service persisting into `StatisticsCollection`.
pub struct RepositoryStatisticsService<R: StatisticsRepository> {
    repo: R,
}

impl<R: StatisticsRepository> RepositoryStatisticsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: StatisticsRepository> StatisticsService for RepositoryStatisticsService<R> {
    fn create_statistics(&self, user_id: DocId) -> ServiceResult<Statistics> {
        let statistics = Statistics::for_user(user_id);
        self.repo
            .create_statistics(&statistics)
            .map_err(|err| ServiceError::from_repo("statistics_create", "statistics", err))?;
        Ok(statistics)
    }
}
