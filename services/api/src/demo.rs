use crate::infra::{build_engine, build_extractor, parse_trigger};
use chrono::{NaiveTime, Utc};
use clap::Args;
use std::path::PathBuf;
use trip_replan::config::AppConfig;
use trip_replan::error::AppError;
use trip_replan::replan::{
    clock, Activity, ActivityValidation, BookedItem, BookingDetails, BudgetTier, CandidateSource,
    CompanionType, DayPlan, GeoPoint, Itinerary, ReplanPayload, ReplanRequest, ReplanResult,
    ReplanTrigger, ReturnConstraint, ScoredOption, SlotId, TravelerState, TriggerEvent,
    TripContext, WeatherCondition, WeatherInfo,
};

#[derive(Args, Debug)]
pub(crate) struct ScenarioArgs {
    /// JSON file holding `{itinerary, trigger, state, context}`
    #[arg(long)]
    pub(crate) scenario: PathBuf,
    /// Pretty-print the JSON result
    #[arg(long)]
    pub(crate) pretty: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Disruption to simulate: rain, fatigue or delay
    #[arg(long, default_value = "rain", value_parser = parse_trigger)]
    pub(crate) trigger: ReplanTrigger,
}

pub(crate) async fn run_scenario(args: ScenarioArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.scenario)?;
    let payload: ReplanPayload = serde_json::from_str(&raw)?;
    let result = replan(payload).await?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{rendered}");
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let payload = demo_payload(args.trigger);
    println!(
        "Replanning '{}' in {} after {} at {}",
        payload.itinerary.id,
        payload.itinerary.destination,
        args.trigger.label(),
        payload.trigger.slot_id
    );

    let result = replan(payload).await?;
    render_result(&result);
    Ok(())
}

async fn replan(payload: ReplanPayload) -> Result<ReplanResult, AppError> {
    let config = AppConfig::load()?;
    let engine = build_engine(&config.replan);
    let plan = build_extractor().extract(&payload.itinerary)?;

    let request = ReplanRequest {
        event: payload.trigger,
        plan,
        state: payload.state,
        context: payload.context,
    };
    Ok(engine.replan(&request).await)
}

fn render_result(result: &ReplanResult) {
    println!("\nStatus: {}", result.status.label());
    let impacted: Vec<&str> = result.impacted_slots.iter().map(|id| id.0.as_str()).collect();
    println!("Impacted slots: {}", impacted.join(", "));
    match &result.source {
        CandidateSource::Provider => println!("Candidates: provider"),
        CandidateSource::Fallback { reason } => {
            println!("Candidates: fallback catalog ({})", reason.label())
        }
    }

    if let Some(primary) = &result.primary {
        println!("\nPrimary");
        render_option(primary);
        println!("  signals:");
        for signal in &primary.breakdown.signals {
            println!(
                "    {:<20} raw {:>5.2}  weight {:>+5.2}",
                signal.name, signal.raw, signal.weight
            );
        }
    }

    if !result.alternatives.is_empty() {
        println!("\nAlternatives");
        for alternative in &result.alternatives {
            render_option(alternative);
        }
    }

    for rejected in &result.rejected {
        if let Some(violation) = &rejected.breakdown.violation {
            println!("  rejected {}: {}", rejected.option.id, violation.summary());
        }
    }

    println!("\n{}", result.explanation);
    println!("\nProcessed in {} ms", result.processing_time_ms);
}

fn render_option(scored: &ScoredOption) {
    let total = scored
        .breakdown
        .total
        .value()
        .map(|value| format!("{value:.3}"))
        .unwrap_or_else(|| "infeasible".to_string());
    let duration = scored
        .option
        .duration_minutes()
        .map(clock::format_span)
        .unwrap_or_else(|| "open-ended".to_string());
    println!(
        "  {:<12} {:<8} {:>10}  {}",
        scored.option.id,
        scored.option.category.label(),
        total,
        duration
    );
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn stop(time: &str, name: &str, description: &str) -> Activity {
    Activity {
        time: time.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        is_locked: false,
        must_visit: false,
        booking: None,
        validation: None,
        walking_limit_km: None,
    }
}

fn kyoto_classic() -> Itinerary {
    let mut fushimi = stop(
        "08:30-10:30",
        "Fushimi Inari Taisha",
        "Climb through the torii gates before the crowds arrive",
    );
    fushimi.must_visit = true;

    let mut kiyomizu = stop(
        "11:00-12:30",
        "Kiyomizu-dera",
        "Wooden stage views over the city",
    );
    kiyomizu.validation = Some(ActivityValidation {
        spot_name: "Kiyomizu-dera".to_string(),
        is_verified: true,
        opening_hours: vec!["06:00-18:00".to_string()],
        last_transit: None,
        closing_time: None,
    });

    let mut dinner = stop(
        "18:30-20:30",
        "Kaiseki dinner in Gion",
        "Seasonal course menu, reserved weeks ahead",
    );
    dinner.is_locked = true;
    dinner.booking = Some(BookingDetails {
        reference: "GION-4411".to_string(),
        time: Some("18:30".to_string()),
        movable: false,
        deadline: None,
    });

    let mut night_walk = stop(
        "21:00-22:00",
        "Gion night walk",
        "Lantern-lit Hanamikoji and Shirakawa",
    );
    night_walk.validation = Some(ActivityValidation {
        spot_name: "Hanamikoji".to_string(),
        is_verified: false,
        opening_hours: Vec::new(),
        last_transit: Some("22:45".to_string()),
        closing_time: None,
    });

    Itinerary {
        id: "kyoto-classic".to_string(),
        destination: "Kyoto".to_string(),
        days: vec![DayPlan {
            day: 1,
            title: "Temples, bamboo and Gion".to_string(),
            activities: vec![
                fushimi,
                kiyomizu,
                stop(
                    "13:30-15:30",
                    "Arashiyama bamboo grove",
                    "Walk the grove and the riverside",
                ),
                stop("16:00-17:30", "Nishiki market", "Snack along the covered market"),
                dinner,
                night_walk,
            ],
        }],
    }
}

/// Bundled Kyoto day disrupted at the bamboo grove.
pub(crate) fn demo_payload(trigger: ReplanTrigger) -> ReplanPayload {
    let (now, fatigue, delay_minutes, condition) = match trigger {
        ReplanTrigger::Rain => (at(13, 30), 0.35, 0, WeatherCondition::Rainy),
        ReplanTrigger::Fatigue => (at(14, 0), 0.8, 0, WeatherCondition::Cloudy),
        ReplanTrigger::Delay => (at(14, 15), 0.45, 45, WeatherCondition::Sunny),
    };

    ReplanPayload {
        itinerary: kyoto_classic(),
        trigger: TriggerEvent {
            trigger,
            slot_id: SlotId::for_position(1, 2),
            occurred_at: Utc::now(),
        },
        state: TravelerState {
            current_time: now,
            current_location: Some(GeoPoint {
                lat: 35.0170,
                lng: 135.6713,
            }),
            estimated_fatigue: fatigue,
            walking_distance_km: 7.5,
            delay_minutes,
        },
        context: TripContext {
            city: "Kyoto".to_string(),
            weather: Some(WeatherInfo {
                condition,
                temperature_celsius: Some(16.0),
                precipitation_probability: None,
            }),
            companion: CompanionType::Couple,
            budget: BudgetTier::Standard,
            return_by: Some(ReturnConstraint {
                label: "the last train to Osaka".to_string(),
                at: at(22, 50),
            }),
            bookings: vec![BookedItem {
                name: "Kaiseki dinner in Gion".to_string(),
                time: at(18, 30),
                location: Some("Gion".to_string()),
                is_cancellable: false,
            }],
        },
    }
}
