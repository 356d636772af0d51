use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::replan::clock;

/// Tunables shared by the hard-constraint gate and the built-in signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Ideal slack between an option's end and the next deadline.
    pub target_buffer_minutes: u32,
    /// Latest time the day's plan is expected to run until.
    #[serde(with = "clock::hhmm")]
    pub day_end: NaiveTime,
    /// Displacement count at which optionality bottoms out.
    pub max_displaced_slots: usize,
    pub explanation_min_chars: usize,
    pub explanation_ideal_chars: usize,
    pub max_walking_km: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            target_buffer_minutes: 60,
            day_end: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
            max_displaced_slots: 5,
            explanation_min_chars: 20,
            explanation_ideal_chars: 80,
            max_walking_km: 15.0,
        }
    }
}
