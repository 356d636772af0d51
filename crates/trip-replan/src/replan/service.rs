use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Itinerary, TravelerState, TriggerEvent, TripContext};
use super::engine::{ReplanEngine, ReplanRequest};
use super::repository::{RecoveryRecord, RecoveryRepository, ReplanId, RepositoryError};
use super::slots::{ExtractionError, SlotExtractor};

/// Inbound request body: the raw itinerary plus everything known at decision time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanPayload {
    pub itinerary: Itinerary,
    pub trigger: TriggerEvent,
    pub state: TravelerState,
    #[serde(default)]
    pub context: TripContext,
}

/// Service composing extraction, the replan engine and the repository.
pub struct ReplanService<R> {
    engine: Arc<ReplanEngine>,
    extractor: SlotExtractor,
    repository: Arc<R>,
    total_timeout: Duration,
}

static REPLAN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_replan_id() -> ReplanId {
    let id = REPLAN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReplanId(format!("replan-{id:06}"))
}

impl<R> ReplanService<R>
where
    R: RecoveryRepository + 'static,
{
    pub fn new(engine: Arc<ReplanEngine>, repository: Arc<R>, total_timeout: Duration) -> Self {
        Self {
            engine,
            extractor: SlotExtractor::default(),
            repository,
            total_timeout,
        }
    }

    pub fn with_extractor(mut self, extractor: SlotExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Extract, replan within the total timeout, and persist the outcome.
    pub async fn replan(
        &self,
        payload: ReplanPayload,
    ) -> Result<RecoveryRecord, ReplanServiceError> {
        let plan = self.extractor.extract(&payload.itinerary)?;
        let request = ReplanRequest {
            event: payload.trigger,
            plan,
            state: payload.state,
            context: payload.context,
        };

        let result = tokio::time::timeout(self.total_timeout, self.engine.replan(&request))
            .await
            .map_err(|_| {
                let after_ms = self.total_timeout.as_millis() as u64;
                warn!(after_ms, itinerary = %payload.itinerary.id, "replan timed out");
                ReplanServiceError::TimedOut { after_ms }
            })?;

        let record = RecoveryRecord {
            replan_id: next_replan_id(),
            itinerary_id: payload.itinerary.id,
            result,
            recorded_at: Utc::now(),
        };
        let stored = self.repository.insert(record)?;
        info!(record = %stored.summary(), "recovery stored");

        Ok(stored)
    }

    pub fn get(&self, replan_id: &ReplanId) -> Result<RecoveryRecord, ReplanServiceError> {
        let record = self
            .repository
            .fetch(replan_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the replan service.
#[derive(Debug, thiserror::Error)]
pub enum ReplanServiceError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("replan did not finish within {after_ms} ms")]
    TimedOut { after_ms: u64 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
