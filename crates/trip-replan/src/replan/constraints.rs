use chrono::NaiveTime;

use super::clock::{self, ClockSpan};
use super::domain::{
    Activity, Constraint, ConstraintId, ConstraintKind, ConstraintSource, ConstraintStrength,
    SlotId, TimeWindow,
};
use super::slots::ExtractionError;

/// Declarative detector turning activity metadata into constraints.
///
/// Detection is additive: every rule that finds its metadata contributes one constraint
/// and missing metadata contributes nothing. Metadata that is present but unreadable is
/// reported instead of guessed around.
#[derive(Debug, Clone, Default)]
pub struct ConstraintDetector {
    default_walking_limit_km: Option<f32>,
}

impl ConstraintDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a walking cap to every activity that does not carry its own.
    pub fn with_walking_limit(mut self, max_km: f32) -> Self {
        self.default_walking_limit_km = Some(max_km);
        self
    }

    pub fn detect(
        &self,
        slot_id: &SlotId,
        activity: &Activity,
    ) -> Result<Vec<Constraint>, ExtractionError> {
        let mut constraints = Vec::new();

        if let Some((at, reference)) = self.booking(activity)? {
            let strength = match &activity.booking {
                Some(booking) if booking.movable && !activity.is_locked => ConstraintStrength::Soft,
                _ => ConstraintStrength::Hard,
            };
            let description = format!(
                "'{}' is booked for {} ({reference})",
                activity.name,
                at.format("%H:%M")
            );
            constraints.push(build(
                slot_id,
                ConstraintKind::Booking { at, reference },
                strength,
                ConstraintSource::Booking,
                description,
            ));
        }

        if let Some((at, label)) = self.deadline(activity)? {
            let description = format!("{label} at {}", at.format("%H:%M"));
            constraints.push(build(
                slot_id,
                ConstraintKind::Deadline { at, label },
                ConstraintStrength::Hard,
                ConstraintSource::System,
                description,
            ));
        }

        if let Some(window) = self.business_hours(activity)? {
            let description = format!(
                "'{}' is open {}-{}",
                activity.name,
                window.start.format("%H:%M"),
                window.end.format("%H:%M")
            );
            constraints.push(build(
                slot_id,
                ConstraintKind::BusinessHours { window },
                ConstraintStrength::Soft,
                ConstraintSource::System,
                description,
            ));
        }

        if let Some((max_km, source)) = self.walking_limit(activity)? {
            constraints.push(build(
                slot_id,
                ConstraintKind::WalkingDistance { max_km },
                ConstraintStrength::Hard,
                source,
                format!("keep walking under {max_km:.1} km"),
            ));
        }

        Ok(constraints)
    }

    fn booking(&self, activity: &Activity) -> Result<Option<(NaiveTime, String)>, ExtractionError> {
        if let Some(booking) = &activity.booking {
            if let Some(raw) = &booking.time {
                let at = read_clock(activity, "booking time", raw)?;
                return Ok(Some((at, booking.reference.clone())));
            }
        }

        if !activity.is_locked {
            return Ok(None);
        }

        let start = match clock::parse_span(&activity.time) {
            Ok(ClockSpan::At(start)) | Ok(ClockSpan::Between(start, _)) => start,
            Ok(ClockSpan::Unspecified) => return Ok(None),
            Err(_) => return Err(malformed(activity, "time", &activity.time)),
        };
        let reference = activity
            .booking
            .as_ref()
            .map(|booking| booking.reference.clone())
            .unwrap_or_else(|| activity.name.clone());

        Ok(Some((start, reference)))
    }

    fn deadline(&self, activity: &Activity) -> Result<Option<(NaiveTime, String)>, ExtractionError> {
        let mut candidates = Vec::new();

        if let Some(validation) = &activity.validation {
            if let Some(raw) = &validation.last_transit {
                candidates.push((read_clock(activity, "last transit", raw)?, "last transit"));
            }
            if let Some(raw) = &validation.closing_time {
                candidates.push((read_clock(activity, "closing time", raw)?, "closing time"));
            }
        }
        if let Some(raw) = activity.booking.as_ref().and_then(|b| b.deadline.as_ref()) {
            candidates.push((read_clock(activity, "booking deadline", raw)?, "booking deadline"));
        }

        Ok(candidates
            .into_iter()
            .min_by_key(|(at, _)| *at)
            .map(|(at, label)| (at, label.to_string())))
    }

    fn business_hours(&self, activity: &Activity) -> Result<Option<TimeWindow>, ExtractionError> {
        let Some(validation) = &activity.validation else {
            return Ok(None);
        };

        let mut window: Option<TimeWindow> = None;
        for entry in &validation.opening_hours {
            if entry.trim().eq_ignore_ascii_case("closed") {
                continue;
            }
            let (opens, closes) = match clock::parse_span(entry) {
                Ok(ClockSpan::Between(opens, closes)) => (opens, closes),
                _ => return Err(malformed(activity, "opening hours", entry)),
            };
            window = Some(match window {
                Some(current) => TimeWindow {
                    start: current.start.min(opens),
                    end: current.end.max(closes),
                },
                None => TimeWindow {
                    start: opens,
                    end: closes,
                },
            });
        }

        Ok(window)
    }

    fn walking_limit(
        &self,
        activity: &Activity,
    ) -> Result<Option<(f32, ConstraintSource)>, ExtractionError> {
        let limit = match (activity.walking_limit_km, self.default_walking_limit_km) {
            (Some(own), _) => (own, ConstraintSource::User),
            (None, Some(default)) => (default, ConstraintSource::System),
            (None, None) => return Ok(None),
        };

        if !limit.0.is_finite() || limit.0 <= 0.0 {
            return Err(ExtractionError::InvalidWalkingLimit {
                activity: activity.name.clone(),
                value: limit.0,
            });
        }

        Ok(Some(limit))
    }
}

fn build(
    slot_id: &SlotId,
    kind: ConstraintKind,
    strength: ConstraintStrength,
    source: ConstraintSource,
    description: String,
) -> Constraint {
    Constraint {
        id: ConstraintId(format!("{slot_id}/{}", kind.tag())),
        slot_id: slot_id.clone(),
        kind,
        strength,
        source,
        description,
    }
}

fn read_clock(
    activity: &Activity,
    field: &'static str,
    raw: &str,
) -> Result<NaiveTime, ExtractionError> {
    clock::parse_clock(raw).ok_or_else(|| malformed(activity, field, raw))
}

fn malformed(activity: &Activity, field: &'static str, raw: &str) -> ExtractionError {
    ExtractionError::MalformedMetadata {
        activity: activity.name.clone(),
        field,
        value: raw.to_string(),
    }
}
