use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::clock::{self, ClockSpan, SpanError};
use super::constraints::ConstraintDetector;
use super::domain::{Activity, Constraint, Itinerary, PlanSlot, SlotId, SlotPriority};

const DEFAULT_BUFFER_MINUTES: u32 = 15;

/// Validation errors raised while turning an itinerary into slots.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("day number must start at 1 (found {day})")]
    InvalidDay { day: u16 },
    #[error("day {day} appears more than once in the itinerary")]
    DuplicateDay { day: u16 },
    #[error("day {day}, activity {index} ('{activity}'): unrecognized time '{value}'")]
    InvalidTime {
        day: u16,
        index: usize,
        activity: String,
        value: String,
    },
    #[error("day {day}, activity {index} ('{activity}'): window ends at {end} before it starts at {start}")]
    ReversedWindow {
        day: u16,
        index: usize,
        activity: String,
        start: String,
        end: String,
    },
    #[error("activity '{activity}': malformed {field} '{value}'")]
    MalformedMetadata {
        activity: String,
        field: &'static str,
        value: String,
    },
    #[error("activity '{activity}': walking limit must be a positive distance (found {value})")]
    InvalidWalkingLimit { activity: String, value: f32 },
}

/// Extracted schedule: slots in day/index order plus every detected constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotPlan {
    pub slots: Vec<PlanSlot>,
    pub constraints: Vec<Constraint>,
}

impl SlotPlan {
    pub fn slot(&self, id: &SlotId) -> Option<&PlanSlot> {
        self.slots.iter().find(|slot| &slot.id == id)
    }
}

/// Pure transform from an itinerary to priority-tagged slots.
#[derive(Debug, Clone, Default)]
pub struct SlotExtractor {
    detector: ConstraintDetector,
}

impl SlotExtractor {
    pub fn new(detector: ConstraintDetector) -> Self {
        Self { detector }
    }

    pub fn extract(&self, itinerary: &Itinerary) -> Result<SlotPlan, ExtractionError> {
        let mut plan = SlotPlan::default();
        let mut seen_days = BTreeSet::new();

        for day in &itinerary.days {
            if day.day == 0 {
                return Err(ExtractionError::InvalidDay { day: day.day });
            }
            if !seen_days.insert(day.day) {
                return Err(ExtractionError::DuplicateDay { day: day.day });
            }

            for (index, activity) in day.activities.iter().enumerate() {
                let id = SlotId::for_position(day.day, index);
                let (start, end) = read_window(day.day, index, activity)?;
                let constraints = self.detector.detect(&id, activity)?;
                let priority = infer_priority(activity);

                plan.constraints.extend(constraints.iter().cloned());
                plan.slots.push(PlanSlot {
                    id,
                    day: day.day,
                    index,
                    activity_name: activity.name.clone(),
                    start,
                    end,
                    buffer_minutes: DEFAULT_BUFFER_MINUTES,
                    priority,
                    is_skippable: priority != SlotPriority::Must,
                    constraints,
                });
            }
        }

        plan.slots.sort_by_key(|slot| (slot.day, slot.index));
        Ok(plan)
    }
}

/// Extracts with the default detector (no global walking cap).
pub fn extract_slots(itinerary: &Itinerary) -> Result<SlotPlan, ExtractionError> {
    SlotExtractor::default().extract(itinerary)
}

/// Locked, must-visit or fixed-booking stops are `must`; movable bookings and verified
/// stops are `should`.
pub fn infer_priority(activity: &Activity) -> SlotPriority {
    let fixed_booking = activity
        .booking
        .as_ref()
        .is_some_and(|booking| !booking.movable);
    if activity.is_locked || activity.must_visit || fixed_booking {
        return SlotPriority::Must;
    }

    let booked = activity.booking.is_some();
    let verified = activity
        .validation
        .as_ref()
        .map(|validation| validation.is_verified)
        .unwrap_or(false);

    if booked || verified {
        SlotPriority::Should
    } else {
        SlotPriority::Nice
    }
}

fn read_window(
    day: u16,
    index: usize,
    activity: &Activity,
) -> Result<(Option<chrono::NaiveTime>, Option<chrono::NaiveTime>), ExtractionError> {
    match clock::parse_span(&activity.time) {
        Ok(ClockSpan::Unspecified) => Ok((None, None)),
        Ok(ClockSpan::At(start)) => Ok((Some(start), None)),
        Ok(ClockSpan::Between(start, end)) => Ok((Some(start), Some(end))),
        Err(SpanError::Unrecognized) => Err(ExtractionError::InvalidTime {
            day,
            index,
            activity: activity.name.clone(),
            value: activity.time.clone(),
        }),
        Err(SpanError::Reversed { start, end }) => Err(ExtractionError::ReversedWindow {
            day,
            index,
            activity: activity.name.clone(),
            start: start.format("%H:%M").to_string(),
            end: end.format("%H:%M").to_string(),
        }),
    }
}
