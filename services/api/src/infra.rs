use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use trip_replan::config::ReplanSettings;
use trip_replan::replan::{
    ConstraintDetector, EngineConfig, RecoveryRecord, RecoveryRepository, ReplanEngine, ReplanId,
    ReplanTrigger, RepositoryError, SlotExtractor,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRecoveryRepository {
    records: Arc<Mutex<HashMap<ReplanId, RecoveryRecord>>>,
}

impl InMemoryRecoveryRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ReplanId, RecoveryRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl RecoveryRepository for InMemoryRecoveryRepository {
    fn insert(&self, record: RecoveryRecord) -> Result<RecoveryRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.replan_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.replan_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ReplanId) -> Result<Option<RecoveryRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }
}

pub(crate) fn build_engine(settings: &ReplanSettings) -> ReplanEngine {
    ReplanEngine::new(EngineConfig::from(settings))
}

pub(crate) fn build_extractor() -> SlotExtractor {
    SlotExtractor::new(ConstraintDetector::new())
}

pub(crate) fn parse_trigger(raw: &str) -> Result<ReplanTrigger, String> {
    let wanted = raw.trim().to_ascii_lowercase();
    ReplanTrigger::ALL
        .into_iter()
        .find(|trigger| trigger.label() == wanted)
        .ok_or_else(|| format!("unknown trigger '{raw}' (expected rain, fatigue or delay)"))
}
