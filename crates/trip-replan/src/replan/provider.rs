use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::explain;
use super::domain::{
    OptionId, PlanSlot, RecoveryCategory, RecoveryOption, ReplanTrigger, SlotId, TripContext,
};

/// Outbound boundary to whatever proposes substitute activities (a generative model,
/// a curated catalog, ...). Callers bound each call with a timeout.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn propose(
        &self,
        trigger: ReplanTrigger,
        impacted: &[PlanSlot],
        context: &TripContext,
    ) -> Result<Vec<RecoveryOption>, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("candidate provider unavailable: {0}")]
    Unavailable(String),
    #[error("candidate provider returned malformed options: {0}")]
    Malformed(String),
}

/// Where the scored candidates came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSource {
    Provider,
    Fallback { reason: FallbackReason },
}

impl CandidateSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    NoProvider,
    ProviderFailed { message: String },
    TimedOut { after_ms: u64 },
    NoCandidates,
}

impl FallbackReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoProvider => "no_provider",
            Self::ProviderFailed { .. } => "provider_failed",
            Self::TimedOut { .. } => "timed_out",
            Self::NoCandidates => "no_candidates",
        }
    }
}

const FALLBACK_CATALOG: [(RecoveryCategory, u32); 4] = [
    (RecoveryCategory::Indoor, 60),
    (RecoveryCategory::Food, 60),
    (RecoveryCategory::Rest, 60),
    (RecoveryCategory::Rest, 30),
];

/// Deterministic candidate set used when the provider cannot be relied on.
///
/// Every fallback displaces the whole impacted set; ids are `fallback-{n}` and the
/// explanations come from the trigger's narrative templates.
pub fn fallback_candidates(trigger: ReplanTrigger, impacted: &[PlanSlot]) -> Vec<RecoveryOption> {
    FALLBACK_CATALOG
        .iter()
        .enumerate()
        .map(|(index, (category, minutes))| {
            let id = OptionId(format!("fallback-{}", index + 1));
            RecoveryOption {
                replacement_slots: impacted
                    .iter()
                    .map(|slot| PlanSlot {
                        id: SlotId(format!("{}/{}", id, slot.id)),
                        ..slot.clone()
                    })
                    .collect(),
                id,
                category: *category,
                explanation: explain::template(trigger, *category).to_string(),
                estimated_duration_minutes: Some(*minutes),
                opening_hours: None,
                walking_distance_km: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replan::domain::SlotPriority;

    fn slot(index: usize) -> PlanSlot {
        PlanSlot {
            id: SlotId::for_position(1, index),
            day: 1,
            index,
            activity_name: format!("stop {index}"),
            start: None,
            end: None,
            buffer_minutes: 15,
            priority: SlotPriority::Nice,
            is_skippable: true,
            constraints: Vec::new(),
        }
    }

    #[test]
    fn fallback_catalog_is_stable() {
        let impacted = vec![slot(2), slot(3)];
        let first = fallback_candidates(ReplanTrigger::Rain, &impacted);
        let second = fallback_candidates(ReplanTrigger::Rain, &impacted);

        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].id.0, "fallback-1");
        assert_eq!(first[3].duration_minutes(), Some(30));
        assert!(first.iter().all(|option| option.displaced_count() == 2));
        assert_eq!(
            first[1].replacement_slots[0].id.0,
            "fallback-2/day1-slot2"
        );
        assert!(first
            .iter()
            .all(|option| option.category != RecoveryCategory::Outdoor));
    }

    #[test]
    fn fallback_explanations_follow_the_trigger() {
        let impacted = vec![slot(2)];
        let rain = fallback_candidates(ReplanTrigger::Rain, &impacted);
        let fatigue = fallback_candidates(ReplanTrigger::Fatigue, &impacted);
        let delay = fallback_candidates(ReplanTrigger::Delay, &impacted);

        for ((rain, fatigue), delay) in rain.iter().zip(&fatigue).zip(&delay) {
            assert_eq!(rain.category, fatigue.category);
            assert_ne!(rain.explanation, fatigue.explanation);
            assert_ne!(rain.explanation, delay.explanation);
            assert_ne!(fatigue.explanation, delay.explanation);
        }
        assert_eq!(
            delay[1].explanation,
            explain::template(ReplanTrigger::Delay, RecoveryCategory::Food)
        );
    }

    #[test]
    fn fallback_reason_labels() {
        assert_eq!(FallbackReason::NoProvider.label(), "no_provider");
        assert_eq!(
            FallbackReason::TimedOut { after_ms: 2000 }.label(),
            "timed_out"
        );
        assert!(CandidateSource::Fallback {
            reason: FallbackReason::NoCandidates
        }
        .is_fallback());
        assert!(!CandidateSource::Provider.is_fallback());
    }
}
