use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::signals::SignalKind;
use crate::replan::domain::ReplanTrigger;

/// Signal weights keyed by signal name.
///
/// Magnitudes only: the engine applies the sign from each signal's polarity, so a
/// penalty stays a penalty whatever sign an override carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightSet(BTreeMap<String, f64>);

impl WeightSet {
    pub fn defaults() -> Self {
        SignalKind::ALL
            .into_iter()
            .map(|kind| (kind.name(), default_weight(kind)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, weight: f64) -> &mut Self {
        self.0.insert(name.into(), weight);
        self
    }

    /// Overwrites entries present in `other`; entries absent from `other` are kept.
    pub fn merge(&mut self, other: &WeightSet) {
        for (name, weight) in &other.0 {
            self.0.insert(name.clone(), *weight);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for WeightSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, weight)| (name.to_string(), weight))
                .collect(),
        )
    }
}

pub(crate) fn default_weight(kind: SignalKind) -> f64 {
    match kind {
        SignalKind::SafetyMargin => 0.15,
        SignalKind::TimeFeasibility => 0.10,
        SignalKind::PhysicalLoad => 0.10,
        SignalKind::RecoveryMargin => 0.10,
        SignalKind::PreferenceFit => 0.10,
        SignalKind::Optionality => 0.10,
        SignalKind::NarrativePotential => 0.15,
        SignalKind::Explainability => 0.10,
        SignalKind::RegretRisk => 0.15,
        SignalKind::ContextMismatch => 0.20,
        SignalKind::Uncertainty => 0.10,
    }
}

fn trigger_overrides(trigger: ReplanTrigger) -> &'static [(SignalKind, f64)] {
    match trigger {
        ReplanTrigger::Rain => &[
            (SignalKind::NarrativePotential, 0.20),
            (SignalKind::ContextMismatch, 0.30),
            (SignalKind::PhysicalLoad, 0.05),
        ],
        ReplanTrigger::Fatigue => &[
            (SignalKind::PhysicalLoad, 0.20),
            (SignalKind::RecoveryMargin, 0.20),
            (SignalKind::SafetyMargin, 0.10),
            (SignalKind::NarrativePotential, 0.10),
            (SignalKind::ContextMismatch, 0.25),
        ],
        ReplanTrigger::Delay => &[
            (SignalKind::TimeFeasibility, 0.20),
            (SignalKind::SafetyMargin, 0.20),
            (SignalKind::Optionality, 0.15),
            (SignalKind::NarrativePotential, 0.10),
        ],
    }
}

/// Defaults, then the trigger profile, then caller overrides.
pub fn resolve_weights(trigger: ReplanTrigger, overrides: &WeightSet) -> WeightSet {
    let mut weights = WeightSet::defaults();
    for (kind, weight) in trigger_overrides(trigger) {
        weights.set(kind.name(), *weight);
    }
    weights.merge(overrides);
    weights
}
