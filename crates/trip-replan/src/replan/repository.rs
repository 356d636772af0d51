use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::ReplanResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplanId(pub String);

impl fmt::Display for ReplanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored outcome of one replan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub replan_id: ReplanId,
    pub itinerary_id: String,
    pub result: ReplanResult,
    pub recorded_at: DateTime<Utc>,
}

impl RecoveryRecord {
    pub fn summary(&self) -> String {
        match &self.result.primary {
            Some(primary) => format!(
                "{}: {} via {}",
                self.replan_id,
                self.result.status.label(),
                primary.option.id
            ),
            None => format!("{}: {}", self.replan_id, self.result.status.label()),
        }
    }
}

/// Storage abstraction so the service can be exercised without a database.
pub trait RecoveryRepository: Send + Sync {
    fn insert(&self, record: RecoveryRecord) -> Result<RecoveryRecord, RepositoryError>;
    fn fetch(&self, id: &ReplanId) -> Result<Option<RecoveryRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
