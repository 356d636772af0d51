//! Disruption recovery for multi-day itineraries.
//!
//! An itinerary is split into independent slots, each carrying the constraints its
//! metadata implies. When a trigger (rain, fatigue, delay) hits a slot, the engine asks a
//! candidate provider for substitutes (falling back to a fixed catalog), scores every
//! candidate behind a hard-constraint gate, ranks the survivors and narrates the winner.
//! Nothing here relaxes a hard constraint: if no candidate survives the gate the result
//! is unresolved.

pub mod clock;
pub mod constraints;
pub mod domain;
pub mod engine;
pub mod explain;
pub mod provider;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod slots;

#[cfg(test)]
mod tests;

pub use constraints::ConstraintDetector;
pub use domain::{
    Activity, ActivityValidation, BookedItem, BookingDetails, BudgetTier, CompanionType,
    Constraint, ConstraintKind, ConstraintSource, ConstraintStrength, DayPlan, GeoPoint,
    Itinerary, OptionId, PlanSlot, RecoveryCategory, RecoveryOption, ReplanTrigger,
    ReturnConstraint, SlotId, SlotPriority, TimeWindow, TravelerState, TriggerEvent,
    TripContext, WeatherCondition, WeatherInfo,
};
pub use engine::{
    EngineConfig, ReplanEngine, ReplanRequest, ReplanResult, ReplanStatus, ScoredOption,
};
pub use provider::{CandidateProvider, CandidateSource, FallbackReason, ProviderError};
pub use repository::{RecoveryRecord, RecoveryRepository, ReplanId, RepositoryError};
pub use router::replan_router;
pub use scoring::{
    HardConstraintViolation, ScoreBreakdown, ScoreTotal, ScoringConfig, ScoringEngine,
    ScoringInput, ScoringSignal, SignalKind, SignalRegistry, WeightSet,
};
pub use service::{ReplanPayload, ReplanService, ReplanServiceError};
pub use slots::{extract_slots, ExtractionError, SlotExtractor, SlotPlan};
