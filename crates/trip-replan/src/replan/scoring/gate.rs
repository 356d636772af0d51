use serde::{Deserialize, Serialize};

use super::config::ScoringConfig;
use super::{DeadlineKind, ScoringInput};
use crate::replan::clock;
use crate::replan::domain::ConstraintKind;

/// Non-negotiable rule an option broke; carried on infeasible breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum HardConstraintViolation {
    MissesDeadline {
        label: String,
        deadline: String,
        estimated_end: String,
    },
    BookingConflict {
        name: String,
        booked_at: String,
        estimated_end: String,
    },
    OutsideBusinessHours {
        opens: String,
        closes: String,
    },
    WalkingLimitExceeded {
        projected_km: f32,
        limit_km: f32,
    },
}

impl HardConstraintViolation {
    pub fn summary(&self) -> String {
        match self {
            Self::MissesDeadline {
                label,
                deadline,
                estimated_end,
            } => format!("would end at {estimated_end}, after {label} ({deadline})"),
            Self::BookingConflict {
                name,
                booked_at,
                estimated_end,
            } => format!("would end at {estimated_end}, too late for '{name}' at {booked_at}"),
            Self::OutsideBusinessHours { opens, closes } => {
                format!("falls outside opening hours {opens}-{closes}")
            }
            Self::WalkingLimitExceeded {
                projected_km,
                limit_km,
            } => format!(
                "walking would reach {projected_km:.1} km, above the {limit_km:.1} km limit"
            ),
        }
    }
}

/// Cheap, deterministic admission checks evaluated before any weighting.
///
/// Order: deadlines and bookings, business hours, walking distance. The first failure wins.
pub fn check_hard_constraints(
    input: &ScoringInput<'_>,
    config: &ScoringConfig,
) -> Result<(), HardConstraintViolation> {
    let start = input.start_minutes();

    if let Some(end) = input.estimated_end() {
        for deadline in input.deadlines().into_iter().filter(|d| d.binding) {
            if end <= deadline.at {
                continue;
            }
            let deadline_label = deadline.time.format("%H:%M").to_string();
            return Err(match deadline.kind {
                DeadlineKind::Return => HardConstraintViolation::MissesDeadline {
                    label: deadline.label,
                    deadline: deadline_label,
                    estimated_end: clock::format_minutes(end),
                },
                DeadlineKind::Booking => HardConstraintViolation::BookingConflict {
                    name: deadline.label,
                    booked_at: deadline_label,
                    estimated_end: clock::format_minutes(end),
                },
            });
        }
    }

    if let Some(hours) = input.option.opening_hours {
        let opens = clock::minutes_of_day(hours.start);
        let closes = clock::minutes_of_day(hours.end);
        let end = input.estimated_end().unwrap_or(start);
        if start < opens || end > closes {
            return Err(HardConstraintViolation::OutsideBusinessHours {
                opens: hours.start.format("%H:%M").to_string(),
                closes: hours.end.format("%H:%M").to_string(),
            });
        }
    }

    let limit_km = input
        .constraints
        .iter()
        .filter(|constraint| constraint.is_hard())
        .filter_map(|constraint| match constraint.kind {
            ConstraintKind::WalkingDistance { max_km } => Some(max_km),
            _ => None,
        })
        .fold(config.max_walking_km, f32::min);
    let projected_km =
        input.state.walking_distance_km + input.option.walking_distance_km.unwrap_or(0.0);
    if projected_km > limit_km {
        return Err(HardConstraintViolation::WalkingLimitExceeded {
            projected_km,
            limit_km,
        });
    }

    Ok(())
}
