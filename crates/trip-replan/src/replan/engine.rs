use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    Constraint, ConstraintKind, PlanSlot, RecoveryOption, ReplanTrigger, SlotId, TravelerState,
    TriggerEvent, TripContext,
};
use super::explain;
use super::provider::{fallback_candidates, CandidateProvider, CandidateSource, FallbackReason};
use super::scoring::{ScoreBreakdown, ScoringConfig, ScoringEngine, ScoringInput};
use super::slots::SlotPlan;
use crate::config::ReplanSettings;

/// Orchestration tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub provider_timeout: Duration,
    /// Number of alternatives kept after the primary.
    pub max_alternatives: usize,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_millis(2_000),
            max_alternatives: 3,
            scoring: ScoringConfig::default(),
        }
    }
}

impl From<&ReplanSettings> for EngineConfig {
    fn from(settings: &ReplanSettings) -> Self {
        Self {
            provider_timeout: settings.provider_timeout,
            max_alternatives: settings.max_alternatives,
            scoring: ScoringConfig {
                max_walking_km: settings.max_walking_km,
                ..ScoringConfig::default()
            },
        }
    }
}

/// One replan invocation: the disruption, the extracted plan and the traveler snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanRequest {
    pub event: TriggerEvent,
    pub plan: SlotPlan,
    pub state: TravelerState,
    pub context: TripContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplanStatus {
    Resolved,
    Unresolved,
}

impl ReplanStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOption {
    pub option: RecoveryOption,
    pub breakdown: ScoreBreakdown,
}

/// Ranked outcome of a replan. `primary` is absent exactly when `status` is unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanResult {
    pub status: ReplanStatus,
    pub trigger: ReplanTrigger,
    pub primary: Option<ScoredOption>,
    pub alternatives: Vec<ScoredOption>,
    /// Gate failures, kept for diagnostics only.
    pub rejected: Vec<ScoredOption>,
    pub explanation: String,
    pub impacted_slots: Vec<SlotId>,
    pub source: CandidateSource,
    pub processing_time_ms: u64,
}

impl ReplanResult {
    /// Selectable options, best first.
    pub fn ranked(&self) -> impl Iterator<Item = &ScoredOption> {
        self.primary.iter().chain(self.alternatives.iter())
    }
}

/// Stateless orchestrator: impacted slots, constraints, candidates, scoring, ranking,
/// narration.
pub struct ReplanEngine {
    scoring: ScoringEngine,
    provider: Option<Arc<dyn CandidateProvider>>,
    config: EngineConfig,
}

impl ReplanEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scoring: ScoringEngine::new(config.scoring.clone()),
            provider: None,
            config,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn CandidateProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Swaps in a scorer with custom signals or weight overrides.
    pub fn with_scoring(mut self, scoring: ScoringEngine) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub async fn replan(&self, request: &ReplanRequest) -> ReplanResult {
        let started = Instant::now();
        let trigger = request.event.trigger;

        let impacted = impacted_slots(&request.plan, &request.event.slot_id);
        if request.plan.slot(&request.event.slot_id).is_none() {
            warn!(
                slot = %request.event.slot_id,
                "trigger slot is not part of the plan; nothing is impacted"
            );
        }
        let constraints = collect_constraints(&request.plan, &impacted);
        info!(
            trigger = trigger.label(),
            impacted = impacted.len(),
            constraints = constraints.len(),
            "replanning"
        );

        let (candidates, source) = self.candidates(trigger, &impacted, &request.context).await;
        if let CandidateSource::Fallback { reason } = &source {
            warn!(reason = reason.label(), "using fallback candidates");
        }

        let scored: Vec<ScoredOption> = candidates
            .into_par_iter()
            .map(|option| {
                let input = ScoringInput::new(&option, &request.state, &request.context, trigger)
                    .with_constraints(&constraints);
                let breakdown = self.scoring.score(&input);
                ScoredOption { option, breakdown }
            })
            .collect();

        let (mut feasible, rejected): (Vec<_>, Vec<_>) = scored
            .into_iter()
            .partition(|scored| scored.breakdown.hard_pass);
        feasible.sort_by(|a, b| self.compare(a, b, &request.state));
        debug!(
            feasible = feasible.len(),
            rejected = rejected.len(),
            "candidates scored"
        );

        let mut ranked = feasible.into_iter();
        let primary = ranked.next();
        let alternatives: Vec<_> = ranked.take(self.config.max_alternatives).collect();

        let (status, explanation) = match &primary {
            Some(primary) => (
                ReplanStatus::Resolved,
                self.narrate(primary, request, &constraints),
            ),
            None => (
                ReplanStatus::Unresolved,
                explain::UNRESOLVED_MESSAGE.to_string(),
            ),
        };

        info!(
            status = status.label(),
            primary = primary
                .as_ref()
                .map(|scored| scored.option.id.0.as_str())
                .unwrap_or("none"),
            alternatives = alternatives.len(),
            "replan finished"
        );

        ReplanResult {
            status,
            trigger,
            primary,
            alternatives,
            rejected,
            explanation,
            impacted_slots: impacted.iter().map(|slot| slot.id.clone()).collect(),
            source,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn candidates(
        &self,
        trigger: ReplanTrigger,
        impacted: &[PlanSlot],
        context: &TripContext,
    ) -> (Vec<RecoveryOption>, CandidateSource) {
        let reason = match &self.provider {
            None => FallbackReason::NoProvider,
            Some(provider) => {
                let proposal = tokio::time::timeout(
                    self.config.provider_timeout,
                    provider.propose(trigger, impacted, context),
                )
                .await;

                match proposal {
                    Ok(Ok(options)) if !options.is_empty() => {
                        return (options, CandidateSource::Provider)
                    }
                    Ok(Ok(_)) => FallbackReason::NoCandidates,
                    Ok(Err(error)) => FallbackReason::ProviderFailed {
                        message: error.to_string(),
                    },
                    Err(_) => FallbackReason::TimedOut {
                        after_ms: self.config.provider_timeout.as_millis() as u64,
                    },
                }
            }
        };

        (
            fallback_candidates(trigger, impacted),
            CandidateSource::Fallback { reason },
        )
    }

    /// Higher total first, then fewer displaced slots, earlier end, and option id.
    fn compare(&self, a: &ScoredOption, b: &ScoredOption, state: &TravelerState) -> Ordering {
        b.breakdown
            .total
            .as_f64()
            .total_cmp(&a.breakdown.total.as_f64())
            .then_with(|| {
                a.option
                    .displaced_count()
                    .cmp(&b.option.displaced_count())
            })
            .then_with(|| end_key(&a.option, state).cmp(&end_key(&b.option, state)))
            .then_with(|| a.option.id.cmp(&b.option.id))
    }

    fn narrate(
        &self,
        primary: &ScoredOption,
        request: &ReplanRequest,
        constraints: &[Constraint],
    ) -> String {
        let option = &primary.option;
        let mut text = explain::explain(request.event.trigger, option.category, option);

        let input = ScoringInput::new(
            option,
            &request.state,
            &request.context,
            request.event.trigger,
        )
        .with_constraints(constraints);
        if let Some(end) = input.estimated_end() {
            text.push(' ');
            text.push_str(&explain::timing_note(end, input.nearest_deadline().as_ref()));
        }

        text
    }
}

impl Default for ReplanEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// The trigger slot and every later skippable slot on the same day.
pub fn impacted_slots(plan: &SlotPlan, trigger_slot: &SlotId) -> Vec<PlanSlot> {
    let Some(origin) = plan.slot(trigger_slot) else {
        return Vec::new();
    };

    plan.slots
        .iter()
        .filter(|slot| slot.day == origin.day && slot.index >= origin.index)
        .filter(|slot| slot.is_skippable)
        .cloned()
        .collect()
}

/// Hard constraints of the impacted slots plus the fixed points later that day.
pub fn collect_constraints(plan: &SlotPlan, impacted: &[PlanSlot]) -> Vec<Constraint> {
    let mut constraints: Vec<Constraint> = impacted
        .iter()
        .flat_map(|slot| slot.constraints.iter())
        .filter(|constraint| constraint.is_hard())
        .cloned()
        .collect();

    let Some(first) = impacted.iter().min_by_key(|slot| slot.index) else {
        return constraints;
    };
    let later_fixed = plan
        .slots
        .iter()
        .filter(|slot| slot.day == first.day && slot.index > first.index)
        .filter(|slot| !impacted.iter().any(|impacted| impacted.id == slot.id))
        .flat_map(|slot| slot.constraints.iter())
        .filter(|constraint| constraint.is_hard())
        .filter(|constraint| {
            matches!(
                constraint.kind,
                ConstraintKind::Booking { .. } | ConstraintKind::Deadline { .. }
            )
        })
        .cloned();
    constraints.extend(later_fixed);
    constraints
}

fn end_key(option: &RecoveryOption, state: &TravelerState) -> u32 {
    option
        .duration_minutes()
        .map(|minutes| super::clock::minutes_of_day(state.current_time) + minutes)
        .unwrap_or(u32::MAX)
}
