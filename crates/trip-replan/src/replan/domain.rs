use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::clock;

/// Identifier wrapper for extracted slots (`day{N}-slot{i}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub String);

impl SlotId {
    pub fn for_position(day: u16, index: usize) -> Self {
        Self(format!("day{day}-slot{index}"))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for detected constraints, scoped to their slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub String);

/// Identifier wrapper for candidate recovery options.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionId(pub String);

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Itinerary input
// ---------------------------------------------------------------------------

/// Read-only plan handed over by the itinerary source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// 1-based day number.
    pub day: u16,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// One scheduled stop. `time` is free text such as `"10:00"` or `"10:00-12:00"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub time: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub must_visit: bool,
    #[serde(default)]
    pub booking: Option<BookingDetails>,
    #[serde(default)]
    pub validation: Option<ActivityValidation>,
    #[serde(default)]
    pub walking_limit_km: Option<f32>,
}

/// Reservation metadata attached to an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub reference: String,
    #[serde(default)]
    pub time: Option<String>,
    /// A movable booking can be rescheduled with the venue.
    #[serde(default)]
    pub movable: bool,
    /// Latest time the booking lets the traveler stay, e.g. a timed-entry exit.
    #[serde(default)]
    pub deadline: Option<String>,
}

/// Venue facts gathered when the itinerary was verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityValidation {
    #[serde(default)]
    pub spot_name: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub opening_hours: Vec<String>,
    #[serde(default)]
    pub last_transit: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
}

// ---------------------------------------------------------------------------
// Slots and constraints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotPriority {
    Must,
    Should,
    Nice,
}

impl SlotPriority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Must => "must",
            Self::Should => "should",
            Self::Nice => "nice",
        }
    }
}

/// Closed interval of wall-clock time within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "clock::hhmm")]
    pub start: NaiveTime,
    #[serde(with = "clock::hhmm")]
    pub end: NaiveTime,
}

/// Atomic, independently replaceable unit of a day's schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSlot {
    pub id: SlotId,
    pub day: u16,
    pub index: usize,
    pub activity_name: String,
    #[serde(default, with = "clock::hhmm_option")]
    pub start: Option<NaiveTime>,
    #[serde(default, with = "clock::hhmm_option")]
    pub end: Option<NaiveTime>,
    #[serde(default)]
    pub buffer_minutes: u32,
    pub priority: SlotPriority,
    pub is_skippable: bool,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintStrength {
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintSource {
    User,
    System,
    Booking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    Deadline {
        #[serde(with = "clock::hhmm")]
        at: NaiveTime,
        label: String,
    },
    Booking {
        #[serde(with = "clock::hhmm")]
        at: NaiveTime,
        reference: String,
    },
    BusinessHours {
        window: TimeWindow,
    },
    WalkingDistance {
        max_km: f32,
    },
}

impl ConstraintKind {
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Deadline { .. } => "deadline",
            Self::Booking { .. } => "booking",
            Self::BusinessHours { .. } => "business_hours",
            Self::WalkingDistance { .. } => "walking_distance",
        }
    }
}

/// A fact limiting feasible substitution, detected once per extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    pub slot_id: SlotId,
    pub kind: ConstraintKind,
    pub strength: ConstraintStrength,
    pub source: ConstraintSource,
    pub description: String,
}

impl Constraint {
    pub fn is_hard(&self) -> bool {
        self.strength == ConstraintStrength::Hard
    }
}

// ---------------------------------------------------------------------------
// Trigger, traveler and trip context
// ---------------------------------------------------------------------------

/// Disruption class that selects weight profiles and narrative templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplanTrigger {
    Rain,
    Fatigue,
    Delay,
}

impl ReplanTrigger {
    pub const ALL: [Self; 3] = [Self::Rain, Self::Fatigue, Self::Delay];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Rain => "rain",
            Self::Fatigue => "fatigue",
            Self::Delay => "delay",
        }
    }
}

/// A trigger observed at a specific slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub trigger: ReplanTrigger,
    pub slot_id: SlotId,
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Snapshot of the traveler at decision time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelerState {
    #[serde(with = "clock::hhmm")]
    pub current_time: NaiveTime,
    #[serde(default)]
    pub current_location: Option<GeoPoint>,
    /// 0 = fresh, 1 = exhausted.
    pub estimated_fatigue: f32,
    #[serde(default)]
    pub walking_distance_km: f32,
    #[serde(default)]
    pub delay_minutes: u32,
}

impl TravelerState {
    pub fn fatigue(&self) -> f64 {
        let fatigue = f64::from(self.estimated_fatigue);
        if fatigue.is_nan() {
            0.0
        } else {
            fatigue.clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
}

impl WeatherCondition {
    pub const fn is_wet(self) -> bool {
        matches!(self, Self::Rainy | Self::Stormy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub condition: WeatherCondition,
    #[serde(default)]
    pub temperature_celsius: Option<f32>,
    #[serde(default)]
    pub precipitation_probability: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanionType {
    Solo,
    Couple,
    Family,
    Friends,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Budget,
    #[default]
    Standard,
    Premium,
}

/// Latest time the travelers must start heading back, e.g. the last train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnConstraint {
    pub label: String,
    #[serde(with = "clock::hhmm")]
    pub at: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedItem {
    pub name: String,
    #[serde(with = "clock::hhmm")]
    pub time: NaiveTime,
    #[serde(default)]
    pub location: Option<String>,
    pub is_cancellable: bool,
}

/// Trip-level facts that feed scoring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TripContext {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub weather: Option<WeatherInfo>,
    #[serde(default)]
    pub companion: CompanionType,
    #[serde(default)]
    pub budget: BudgetTier,
    #[serde(default)]
    pub return_by: Option<ReturnConstraint>,
    #[serde(default)]
    pub bookings: Vec<BookedItem>,
}

// ---------------------------------------------------------------------------
// Recovery options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCategory {
    Outdoor,
    Indoor,
    Food,
    Culture,
    Rest,
}

impl RecoveryCategory {
    pub const ALL: [Self; 5] = [
        Self::Outdoor,
        Self::Indoor,
        Self::Food,
        Self::Culture,
        Self::Rest,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Outdoor => "outdoor",
            Self::Indoor => "indoor",
            Self::Food => "food",
            Self::Culture => "culture",
            Self::Rest => "rest",
        }
    }

    /// Categories that spare tired legs.
    pub const fn is_low_exertion(self) -> bool {
        matches!(self, Self::Indoor | Self::Rest | Self::Food)
    }
}

/// Candidate substitute produced by a provider or the fallback catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryOption {
    pub id: OptionId,
    pub category: RecoveryCategory,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    #[serde(default)]
    pub replacement_slots: Vec<PlanSlot>,
    #[serde(default)]
    pub opening_hours: Option<TimeWindow>,
    #[serde(default)]
    pub walking_distance_km: Option<f32>,
}

impl RecoveryOption {
    /// Duration in minutes; zero counts as unknown.
    pub fn duration_minutes(&self) -> Option<u32> {
        self.estimated_duration_minutes.filter(|minutes| *minutes > 0)
    }

    pub fn displaced_count(&self) -> usize {
        self.replacement_slots.len()
    }
}
