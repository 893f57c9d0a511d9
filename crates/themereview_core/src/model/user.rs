//! User and statistics domain models.

use crate::store::DocId;
use serde::{Deserialize, Serialize};

/// Document field listing themes a user applied for.
pub const THEME_IDS_FIELD: &str = "themeIds";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DocId,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub password: String,
    /// Applied-for themes; appends are duplicate tolerant.
    #[serde(default)]
    pub theme_ids: Vec<String>,
    /// Set once when the user is created.
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

impl User {
    pub fn new(country: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: DocId::generate(),
            country: country.into(),
            password: password.into(),
            theme_ids: Vec::new(),
            statistics: None,
        }
    }
}

/// Per-user counters owned by the statistics service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub id: DocId,
    pub user_id: String,
    #[serde(default)]
    pub reviews_written: u32,
}

impl Statistics {
    pub fn for_user(user_id: DocId) -> Self {
        Self {
            id: DocId::generate(),
            user_id: user_id.to_string(),
            reviews_written: 0,
        }
    }
}
