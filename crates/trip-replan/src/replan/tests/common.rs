use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveTime, Utc};
use serde_json::Value;

use crate::replan::domain::{
    Activity, ActivityValidation, BookingDetails, BudgetTier, CompanionType, DayPlan, GeoPoint,
    Itinerary, OptionId, PlanSlot, RecoveryCategory, RecoveryOption, ReplanTrigger,
    ReturnConstraint, SlotId, SlotPriority, TravelerState, TriggerEvent, TripContext,
    WeatherCondition, WeatherInfo,
};
use crate::replan::engine::{EngineConfig, ReplanEngine};
use crate::replan::provider::{CandidateProvider, ProviderError};
use crate::replan::repository::{
    RecoveryRecord, RecoveryRepository, ReplanId, RepositoryError,
};
use crate::replan::service::{ReplanPayload, ReplanService};

pub(super) fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

pub(super) fn activity(time: &str, name: &str) -> Activity {
    Activity {
        time: time.to_string(),
        name: name.to_string(),
        description: String::new(),
        is_locked: false,
        must_visit: false,
        booking: None,
        validation: None,
        walking_limit_km: None,
    }
}

pub(super) fn validation(opening_hours: &[&str]) -> ActivityValidation {
    ActivityValidation {
        spot_name: String::new(),
        is_verified: true,
        opening_hours: opening_hours.iter().map(|hours| hours.to_string()).collect(),
        last_transit: None,
        closing_time: None,
    }
}

/// Two-day Kyoto plan. Day 1 slot 4 is a locked dinner, slot 5 has a last-transit time.
pub(super) fn kyoto_itinerary() -> Itinerary {
    let mut temple = activity("11:00-12:00", "Kiyomizu-dera");
    temple.validation = Some(validation(&["06:00-18:00"]));

    let mut dinner = activity("18:30-20:30", "Kaiseki dinner in Gion");
    dinner.is_locked = true;
    dinner.booking = Some(BookingDetails {
        reference: "GION-4411".to_string(),
        time: Some("18:30".to_string()),
        movable: false,
        deadline: None,
    });

    let mut night_walk = activity("21:00", "Gion night walk");
    night_walk.validation = Some(ActivityValidation {
        spot_name: "Hanamikoji".to_string(),
        is_verified: false,
        opening_hours: Vec::new(),
        last_transit: Some("22:45".to_string()),
        closing_time: None,
    });

    Itinerary {
        id: "kyoto-weekend".to_string(),
        destination: "Kyoto".to_string(),
        days: vec![
            DayPlan {
                day: 1,
                title: "Eastern Kyoto".to_string(),
                activities: vec![
                    activity("09:00-10:30", "Fushimi Inari"),
                    temple,
                    activity("13:00-15:00", "Arashiyama bamboo grove"),
                    activity("15:30-17:00", "Nishiki market"),
                    dinner,
                    night_walk,
                ],
            },
            DayPlan {
                day: 2,
                title: "Northern Kyoto".to_string(),
                activities: vec![
                    activity("10:00-11:30", "Kinkaku-ji"),
                    activity("13:00", "Philosopher's path"),
                ],
            },
        ],
    }
}

pub(super) fn plan_slot(day: u16, index: usize, priority: SlotPriority) -> PlanSlot {
    PlanSlot {
        id: SlotId::for_position(day, index),
        day,
        index,
        activity_name: format!("stop {index}"),
        start: None,
        end: None,
        buffer_minutes: 15,
        priority,
        is_skippable: priority != SlotPriority::Must,
        constraints: Vec::new(),
    }
}

pub(super) fn option(
    id: &str,
    category: RecoveryCategory,
    minutes: Option<u32>,
    displaced: Vec<PlanSlot>,
) -> RecoveryOption {
    RecoveryOption {
        id: OptionId(id.to_string()),
        category,
        explanation: "A nearby spot with seating, about ten minutes on foot".to_string(),
        estimated_duration_minutes: minutes,
        replacement_slots: displaced,
        opening_hours: None,
        walking_distance_km: None,
    }
}

pub(super) fn traveler(now: NaiveTime, fatigue: f32) -> TravelerState {
    TravelerState {
        current_time: now,
        current_location: Some(GeoPoint {
            lat: 35.0037,
            lng: 135.7788,
        }),
        estimated_fatigue: fatigue,
        walking_distance_km: 4.0,
        delay_minutes: 0,
    }
}

pub(super) fn last_train() -> ReturnConstraint {
    ReturnConstraint {
        label: "last train".to_string(),
        at: at(22, 30),
    }
}

pub(super) fn rainy_context() -> TripContext {
    TripContext {
        city: "Kyoto".to_string(),
        weather: Some(WeatherInfo {
            condition: WeatherCondition::Rainy,
            temperature_celsius: Some(14.0),
            precipitation_probability: Some(0.9),
        }),
        companion: CompanionType::Couple,
        budget: BudgetTier::Standard,
        return_by: Some(last_train()),
        bookings: Vec::new(),
    }
}

pub(super) fn family_context() -> TripContext {
    TripContext {
        city: "Kyoto".to_string(),
        weather: Some(WeatherInfo {
            condition: WeatherCondition::Cloudy,
            temperature_celsius: Some(18.0),
            precipitation_probability: None,
        }),
        companion: CompanionType::Family,
        budget: BudgetTier::Standard,
        return_by: Some(last_train()),
        bookings: Vec::new(),
    }
}

pub(super) fn trigger_event(trigger: ReplanTrigger, slot: &str) -> TriggerEvent {
    TriggerEvent {
        trigger,
        slot_id: SlotId(slot.to_string()),
        occurred_at: Utc::now(),
    }
}

pub(super) fn payload(trigger: ReplanTrigger) -> ReplanPayload {
    ReplanPayload {
        itinerary: kyoto_itinerary(),
        trigger: trigger_event(trigger, "day1-slot2"),
        state: traveler(at(13, 0), 0.4),
        context: rainy_context(),
    }
}

pub(super) fn engine_config() -> EngineConfig {
    EngineConfig {
        provider_timeout: Duration::from_millis(50),
        ..EngineConfig::default()
    }
}

pub(super) fn build_service() -> (ReplanService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let engine = Arc::new(ReplanEngine::new(engine_config()));
    let service = ReplanService::new(engine, repository.clone(), Duration::from_secs(3));
    (service, repository)
}

/// Provider returning a fixed list and counting calls.
pub(super) struct StaticProvider {
    pub(super) options: Vec<RecoveryOption>,
    pub(super) calls: AtomicUsize,
}

impl StaticProvider {
    pub(super) fn new(options: Vec<RecoveryOption>) -> Self {
        Self {
            options,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateProvider for StaticProvider {
    async fn propose(
        &self,
        _trigger: ReplanTrigger,
        _impacted: &[PlanSlot],
        _context: &TripContext,
    ) -> Result<Vec<RecoveryOption>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.options.clone())
    }
}

pub(super) struct FailingProvider;

#[async_trait]
impl CandidateProvider for FailingProvider {
    async fn propose(
        &self,
        _trigger: ReplanTrigger,
        _impacted: &[PlanSlot],
        _context: &TripContext,
    ) -> Result<Vec<RecoveryOption>, ProviderError> {
        Err(ProviderError::Unavailable("model quota exhausted".to_string()))
    }
}

pub(super) struct SlowProvider {
    pub(super) delay: Duration,
}

#[async_trait]
impl CandidateProvider for SlowProvider {
    async fn propose(
        &self,
        _trigger: ReplanTrigger,
        _impacted: &[PlanSlot],
        _context: &TripContext,
    ) -> Result<Vec<RecoveryOption>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![option(
            "too-late",
            RecoveryCategory::Indoor,
            Some(60),
            Vec::new(),
        )])
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ReplanId, RecoveryRecord>>>,
}

impl RecoveryRepository for MemoryRepository {
    fn insert(&self, record: RecoveryRecord) -> Result<RecoveryRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.replan_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.replan_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ReplanId) -> Result<Option<RecoveryRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl RecoveryRepository for UnavailableRepository {
    fn insert(&self, _record: RecoveryRecord) -> Result<RecoveryRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ReplanId) -> Result<Option<RecoveryRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
