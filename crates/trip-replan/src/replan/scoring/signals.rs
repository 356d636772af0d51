use super::config::ScoringConfig;
use super::{DeadlineKind, ScoringInput};
use crate::replan::clock;
use crate::replan::domain::{
    BudgetTier, CompanionType, RecoveryCategory, ReplanTrigger, SlotPriority,
};

const FATIGUE_THRESHOLD: f64 = 0.7;
const NO_DEADLINE_SAFETY: f64 = 0.9;
const UNKNOWN_DURATION_FEASIBILITY: f64 = 0.5;

/// Whether a signal raises or lowers the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Reward,
    Penalty,
}

/// One scoring evaluator. Implementations must be pure and return a value in `[0, 1]`;
/// anything outside is clamped by the engine.
pub trait ScoringSignal: Send + Sync {
    fn name(&self) -> &'static str;

    fn polarity(&self) -> Polarity {
        Polarity::Reward
    }

    fn calculate(&self, input: &ScoringInput<'_>) -> f64;
}

/// The built-in signals, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    SafetyMargin,
    TimeFeasibility,
    PhysicalLoad,
    RecoveryMargin,
    PreferenceFit,
    Optionality,
    NarrativePotential,
    Explainability,
    RegretRisk,
    ContextMismatch,
    Uncertainty,
}

impl SignalKind {
    pub const ALL: [Self; 11] = [
        Self::SafetyMargin,
        Self::TimeFeasibility,
        Self::PhysicalLoad,
        Self::RecoveryMargin,
        Self::PreferenceFit,
        Self::Optionality,
        Self::NarrativePotential,
        Self::Explainability,
        Self::RegretRisk,
        Self::ContextMismatch,
        Self::Uncertainty,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::SafetyMargin => "safety_margin",
            Self::TimeFeasibility => "time_feasibility",
            Self::PhysicalLoad => "physical_load",
            Self::RecoveryMargin => "recovery_margin",
            Self::PreferenceFit => "preference_fit",
            Self::Optionality => "optionality",
            Self::NarrativePotential => "narrative_potential",
            Self::Explainability => "explainability",
            Self::RegretRisk => "regret_risk",
            Self::ContextMismatch => "context_mismatch",
            Self::Uncertainty => "uncertainty",
        }
    }

    pub const fn polarity(self) -> Polarity {
        match self {
            Self::RegretRisk | Self::ContextMismatch | Self::Uncertainty => Polarity::Penalty,
            _ => Polarity::Reward,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Ordered, pluggable list of signals. Order is preserved in every breakdown.
#[derive(Default)]
pub struct SignalRegistry {
    signals: Vec<Box<dyn ScoringSignal>>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The eleven built-in signals tuned by `config`.
    pub fn standard(config: &ScoringConfig) -> Self {
        let mut registry = Self::new();
        for kind in SignalKind::ALL {
            registry.register(BuiltinSignal {
                kind,
                config: config.clone(),
            });
        }
        registry
    }

    pub fn register<S>(&mut self, signal: S) -> &mut Self
    where
        S: ScoringSignal + 'static,
    {
        self.signals.push(Box::new(signal));
        self
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.signals.iter().map(|signal| signal.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ScoringSignal> {
        self.signals.iter().map(|signal| signal.as_ref())
    }
}

struct BuiltinSignal {
    kind: SignalKind,
    config: ScoringConfig,
}

impl ScoringSignal for BuiltinSignal {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn polarity(&self) -> Polarity {
        self.kind.polarity()
    }

    fn calculate(&self, input: &ScoringInput<'_>) -> f64 {
        match self.kind {
            SignalKind::SafetyMargin => safety_margin(input, &self.config),
            SignalKind::TimeFeasibility => time_feasibility(input, &self.config),
            SignalKind::PhysicalLoad => physical_load(input),
            SignalKind::RecoveryMargin => recovery_margin(input),
            SignalKind::PreferenceFit => preference_fit(input),
            SignalKind::Optionality => optionality(input, &self.config),
            SignalKind::NarrativePotential => narrative_potential(input.mode, input.option.category),
            SignalKind::Explainability => explainability(input, &self.config),
            SignalKind::RegretRisk => regret_risk(input),
            SignalKind::ContextMismatch => context_mismatch(input),
            SignalKind::Uncertainty => uncertainty(input),
        }
    }
}

fn safety_margin(input: &ScoringInput<'_>, config: &ScoringConfig) -> f64 {
    let Some(deadline) = input.nearest_deadline() else {
        return NO_DEADLINE_SAFETY;
    };
    if config.target_buffer_minutes == 0 {
        return 1.0;
    }

    let end = input.estimated_end().unwrap_or_else(|| input.start_minutes());
    let margin = deadline.at.saturating_sub(end);
    (f64::from(margin) / f64::from(config.target_buffer_minutes)).min(1.0)
}

fn time_feasibility(input: &ScoringInput<'_>, config: &ScoringConfig) -> f64 {
    let Some(duration) = input.option.duration_minutes() else {
        return UNKNOWN_DURATION_FEASIBILITY;
    };

    let start = input.start_minutes();
    let mut remaining = clock::minutes_of_day(config.day_end).saturating_sub(start);
    if let Some(return_at) = input
        .deadlines()
        .into_iter()
        .find(|deadline| deadline.kind == DeadlineKind::Return)
        .map(|deadline| deadline.at.saturating_sub(start))
    {
        remaining = remaining.min(return_at);
    }

    if remaining < duration {
        return 0.0;
    }
    let ratio = f64::from(remaining) / f64::from(duration);
    (ratio / 2.0).min(1.0)
}

fn physical_load(input: &ScoringInput<'_>) -> f64 {
    let fatigue = input.state.fatigue();
    let tired = fatigue >= FATIGUE_THRESHOLD;

    if input.option.category.is_low_exertion() {
        if tired {
            1.0
        } else {
            0.5 + 0.5 * fatigue / FATIGUE_THRESHOLD
        }
    } else if tired {
        0.2
    } else {
        1.0 - 0.8 * fatigue / FATIGUE_THRESHOLD
    }
}

fn recovery_margin(input: &ScoringInput<'_>) -> f64 {
    let fatigue = input.state.fatigue();
    let affinity = match input.option.category {
        RecoveryCategory::Rest => 1.0,
        RecoveryCategory::Food => 0.85,
        RecoveryCategory::Indoor => 0.7,
        RecoveryCategory::Outdoor | RecoveryCategory::Culture => {
            return 0.6 - 0.5 * fatigue;
        }
    };
    0.3 + 0.7 * fatigue * affinity
}

fn preference_fit(input: &ScoringInput<'_>) -> f64 {
    use RecoveryCategory::*;

    let category = input.option.category;
    let mut score: f64 = 0.5;

    let companion_match = match input.context.companion {
        CompanionType::Family => matches!(category, Rest | Food),
        CompanionType::Couple => matches!(category, Food | Culture),
        CompanionType::Friends => matches!(category, Outdoor | Food),
        CompanionType::Solo => matches!(category, Culture | Indoor),
        CompanionType::Other => false,
    };
    if companion_match {
        score += 0.2;
    }

    let budget_match = match input.context.budget {
        BudgetTier::Budget => matches!(category, Rest | Outdoor),
        BudgetTier::Premium => matches!(category, Food | Culture),
        BudgetTier::Standard => false,
    };
    if budget_match {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

fn optionality(input: &ScoringInput<'_>, config: &ScoringConfig) -> f64 {
    let displaced = input.option.displaced_count();
    let max = config.max_displaced_slots;

    if displaced <= 1 {
        1.0
    } else if displaced >= max {
        0.2
    } else {
        1.0 - 0.8 * (displaced - 1) as f64 / (max - 1) as f64
    }
}

/// How good a story the substitution makes for the disruption at hand.
pub(crate) fn narrative_potential(trigger: ReplanTrigger, category: RecoveryCategory) -> f64 {
    use RecoveryCategory::*;

    match (trigger, category) {
        (ReplanTrigger::Rain, Indoor) => 0.9,
        (ReplanTrigger::Rain, Culture) => 0.85,
        (ReplanTrigger::Rain, Food) => 0.8,
        (ReplanTrigger::Rain, Rest) => 0.6,
        (ReplanTrigger::Rain, Outdoor) => 0.05,
        (ReplanTrigger::Fatigue, Rest) => 0.95,
        (ReplanTrigger::Fatigue, Food) => 0.8,
        (ReplanTrigger::Fatigue, Indoor) => 0.6,
        (ReplanTrigger::Fatigue, Culture) => 0.4,
        (ReplanTrigger::Fatigue, Outdoor) => 0.1,
        (ReplanTrigger::Delay, Food) => 0.7,
        (ReplanTrigger::Delay, Indoor) => 0.6,
        (ReplanTrigger::Delay, Culture) => 0.6,
        (ReplanTrigger::Delay, Rest) => 0.5,
        (ReplanTrigger::Delay, Outdoor) => 0.5,
    }
}

fn explainability(input: &ScoringInput<'_>, config: &ScoringConfig) -> f64 {
    let length = input.option.explanation.trim().chars().count();
    let min = config.explanation_min_chars;
    let ideal = config.explanation_ideal_chars;

    if length <= min {
        return 0.0;
    }
    if ideal <= min || length >= ideal {
        return 1.0;
    }
    (length - min) as f64 / (ideal - min) as f64
}

fn regret_risk(input: &ScoringInput<'_>) -> f64 {
    let displaced = &input.option.replacement_slots;
    if displaced.iter().any(|slot| slot.priority == SlotPriority::Must) {
        1.0
    } else if displaced.iter().any(|slot| slot.priority == SlotPriority::Should) {
        0.5
    } else {
        0.1
    }
}

fn context_mismatch(input: &ScoringInput<'_>) -> f64 {
    if input.option.category != RecoveryCategory::Outdoor {
        return 0.0;
    }

    let mut mismatch = 0.0;
    if input.mode == ReplanTrigger::Rain {
        mismatch += 0.5;
    }
    if input
        .context
        .weather
        .map(|weather| weather.condition.is_wet())
        .unwrap_or(false)
    {
        mismatch += 0.3;
    }
    if input.mode == ReplanTrigger::Fatigue {
        mismatch += 0.4;
    }
    f64::min(mismatch, 1.0)
}

fn uncertainty(input: &ScoringInput<'_>) -> f64 {
    let mut penalty = 0.0;
    if input.option.duration_minutes().is_none() {
        penalty += 0.4;
    }
    if input.context.weather.is_none() {
        penalty += 0.3;
    }
    if input.state.current_location.is_none() {
        penalty += 0.2;
    }
    f64::min(penalty, 1.0)
}
