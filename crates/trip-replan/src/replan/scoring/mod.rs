//! Human-resolution scoring: a hard-constraint gate followed by a weighted signal sum.
//!
//! Scoring is a pure function of its [`ScoringInput`]. The gate runs first and, when it
//! rejects an option, the breakdown carries [`ScoreTotal::Infeasible`] and no signals.
//! Otherwise every registered signal contributes `raw * weight`, penalty signals with a
//! negative sign, and the sum is clamped into `[0, 1]`.

mod config;
mod gate;
mod signals;
mod weights;

pub use config::ScoringConfig;
pub use gate::{check_hard_constraints, HardConstraintViolation};
pub use signals::{Polarity, ScoringSignal, SignalKind, SignalRegistry};
pub use weights::{resolve_weights, WeightSet};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::clock;
use super::domain::{
    Constraint, ConstraintKind, OptionId, RecoveryOption, ReplanTrigger, TravelerState,
    TripContext,
};

/// Everything a signal or the gate may look at for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub option: &'a RecoveryOption,
    pub state: &'a TravelerState,
    pub context: &'a TripContext,
    pub mode: ReplanTrigger,
    /// Hard constraints collected from the plan around the impacted slots.
    pub constraints: &'a [Constraint],
}

impl<'a> ScoringInput<'a> {
    pub fn new(
        option: &'a RecoveryOption,
        state: &'a TravelerState,
        context: &'a TripContext,
        mode: ReplanTrigger,
    ) -> Self {
        Self {
            option,
            state,
            context,
            mode,
            constraints: &[],
        }
    }

    pub fn with_constraints(mut self, constraints: &'a [Constraint]) -> Self {
        self.constraints = constraints;
        self
    }

    /// Minutes since midnight at which the option would start.
    pub fn start_minutes(&self) -> u32 {
        clock::minutes_of_day(self.state.current_time)
    }

    /// Minutes since today's midnight at which the option would end, when its duration is known.
    pub fn estimated_end(&self) -> Option<u32> {
        self.option
            .duration_minutes()
            .map(|duration| self.start_minutes() + duration)
    }

    /// Every time the option must finish before, earliest first. A passed return time
    /// stays in the past so that no option with a known duration can meet it.
    pub fn deadlines(&self) -> Vec<Deadline> {
        let now = self.state.current_time;
        let mut deadlines = Vec::new();

        if let Some(return_by) = &self.context.return_by {
            deadlines.push(Deadline {
                label: return_by.label.clone(),
                time: return_by.at,
                at: clock::deadline_minutes(now, return_by.at),
                kind: DeadlineKind::Return,
                binding: true,
            });
        }

        for booking in &self.context.bookings {
            if booking.time < now {
                continue;
            }
            deadlines.push(Deadline {
                label: booking.name.clone(),
                time: booking.time,
                at: clock::minutes_of_day(booking.time),
                kind: DeadlineKind::Booking,
                binding: !booking.is_cancellable,
            });
        }

        for constraint in self.constraints.iter().filter(|c| c.is_hard()) {
            match &constraint.kind {
                ConstraintKind::Deadline { at, .. } => deadlines.push(Deadline {
                    label: constraint.description.clone(),
                    time: *at,
                    at: clock::deadline_minutes(now, *at),
                    kind: DeadlineKind::Return,
                    binding: true,
                }),
                ConstraintKind::Booking { at, reference } if *at >= now => {
                    deadlines.push(Deadline {
                        label: reference.clone(),
                        time: *at,
                        at: clock::minutes_of_day(*at),
                        kind: DeadlineKind::Booking,
                        binding: true,
                    })
                }
                _ => {}
            }
        }

        deadlines.sort_by(|a, b| a.at.cmp(&b.at).then_with(|| a.label.cmp(&b.label)));
        deadlines
    }

    pub fn nearest_deadline(&self) -> Option<Deadline> {
        self.deadlines().into_iter().next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineKind {
    Return,
    Booking,
}

/// A time the option must end by, resolved against the traveler's clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deadline {
    pub label: String,
    pub time: NaiveTime,
    /// Minutes since today's midnight; early-morning deadlines exceed 24 * 60.
    pub at: u32,
    pub kind: DeadlineKind,
    /// Binding deadlines are enforced by the gate; the rest only shape the safety margin.
    pub binding: bool,
}

/// Weighted total, or the sentinel produced by a failed gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScoreTotal {
    Feasible(f64),
    Infeasible,
}

impl ScoreTotal {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Feasible(value) => Some(value),
            Self::Infeasible => None,
        }
    }

    /// Numeric view where infeasible sorts below everything.
    pub fn as_f64(self) -> f64 {
        self.value().unwrap_or(f64::NEG_INFINITY)
    }

    pub fn is_feasible(self) -> bool {
        matches!(self, Self::Feasible(_))
    }
}

/// Raw value and applied weight for one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub name: String,
    pub raw: f64,
    pub weight: f64,
}

/// Scoring output for one option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub option_id: OptionId,
    pub hard_pass: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<HardConstraintViolation>,
    pub signals: Vec<SignalScore>,
    pub total: ScoreTotal,
}

impl ScoreBreakdown {
    pub fn raw(&self, name: &str) -> Option<f64> {
        self.signals
            .iter()
            .find(|signal| signal.name == name)
            .map(|signal| signal.raw)
    }

    pub fn signal(&self, kind: SignalKind) -> Option<f64> {
        self.raw(kind.name())
    }

    fn rejected(option_id: OptionId, violation: HardConstraintViolation) -> Self {
        Self {
            option_id,
            hard_pass: false,
            violation: Some(violation),
            signals: Vec::new(),
            total: ScoreTotal::Infeasible,
        }
    }
}

/// Stateless scorer combining the gate, a signal registry and weight overrides.
pub struct ScoringEngine {
    registry: SignalRegistry,
    config: ScoringConfig,
    overrides: WeightSet,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            registry: SignalRegistry::standard(&config),
            config,
            overrides: WeightSet::default(),
        }
    }

    pub fn with_registry(registry: SignalRegistry, config: ScoringConfig) -> Self {
        Self {
            registry,
            config,
            overrides: WeightSet::default(),
        }
    }

    /// Caller-supplied weights applied after the trigger profile.
    pub fn with_weight_overrides(mut self, overrides: WeightSet) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, input: &ScoringInput<'_>) -> ScoreBreakdown {
        let option_id = input.option.id.clone();
        if let Err(violation) = check_hard_constraints(input, &self.config) {
            return ScoreBreakdown::rejected(option_id, violation);
        }

        let weights = resolve_weights(input.mode, &self.overrides);
        let mut total = 0.0;
        let mut signals = Vec::with_capacity(self.registry.len());

        for signal in self.registry.iter() {
            let raw = unit_interval(signal.calculate(input));
            let weight = weights.get(signal.name()).unwrap_or(0.0);
            let weight = match signal.polarity() {
                Polarity::Reward => weight,
                Polarity::Penalty => -weight.abs(),
            };
            total += raw * weight;
            signals.push(SignalScore {
                name: signal.name().to_string(),
                raw,
                weight,
            });
        }

        ScoreBreakdown {
            option_id,
            hard_pass: true,
            violation: None,
            signals,
            total: ScoreTotal::Feasible(unit_interval(total)),
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
