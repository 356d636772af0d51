use super::common::*;
use crate::replan::constraints::ConstraintDetector;
use crate::replan::domain::{
    ActivityValidation, BookingDetails, ConstraintKind, ConstraintSource, ConstraintStrength,
    SlotId, TimeWindow,
};
use crate::replan::slots::{ExtractionError, SlotExtractor};

fn slot_id() -> SlotId {
    SlotId::for_position(1, 3)
}

#[test]
fn bare_activity_yields_nothing() {
    let constraints = ConstraintDetector::new()
        .detect(&slot_id(), &activity("15:00", "Nishiki market"))
        .expect("valid activity");
    assert!(constraints.is_empty());
}

#[test]
fn detection_is_additive_and_ordered() {
    let mut dinner = activity("18:30-20:30", "Kaiseki dinner");
    dinner.booking = Some(BookingDetails {
        reference: "GION-4411".to_string(),
        time: Some("18:30".to_string()),
        movable: false,
        deadline: Some("21:00".to_string()),
    });
    dinner.validation = Some(ActivityValidation {
        spot_name: "Gion Karyo".to_string(),
        is_verified: true,
        opening_hours: vec!["17:00-22:00".to_string()],
        last_transit: Some("23:10".to_string()),
        closing_time: Some("22:00".to_string()),
    });
    dinner.walking_limit_km = Some(3.0);

    let constraints = ConstraintDetector::new()
        .detect(&slot_id(), &dinner)
        .expect("valid activity");

    let tags: Vec<&str> = constraints.iter().map(|c| c.kind.tag()).collect();
    assert_eq!(
        tags,
        vec!["booking", "deadline", "business_hours", "walking_distance"]
    );
    assert_eq!(constraints[0].id.0, "day1-slot3/booking");
    assert_eq!(constraints[0].strength, ConstraintStrength::Hard);
    assert_eq!(constraints[0].source, ConstraintSource::Booking);
    assert_eq!(
        constraints[1].kind,
        ConstraintKind::Deadline {
            at: at(21, 0),
            label: "booking deadline".to_string(),
        }
    );
    assert_eq!(
        constraints[2].kind,
        ConstraintKind::BusinessHours {
            window: TimeWindow {
                start: at(17, 0),
                end: at(22, 0),
            }
        }
    );
    assert_eq!(constraints[2].strength, ConstraintStrength::Soft);
    assert_eq!(constraints[3].source, ConstraintSource::User);
}

#[test]
fn movable_bookings_are_soft_unless_locked() {
    let mut lunch = activity("12:00", "Udon lunch");
    lunch.booking = Some(BookingDetails {
        reference: "UDON-7".to_string(),
        time: Some("12:00".to_string()),
        movable: true,
        deadline: None,
    });

    let detector = ConstraintDetector::new();
    let soft = detector.detect(&slot_id(), &lunch).expect("valid activity");
    assert_eq!(soft[0].strength, ConstraintStrength::Soft);

    lunch.is_locked = true;
    let hard = detector.detect(&slot_id(), &lunch).expect("valid activity");
    assert_eq!(hard[0].strength, ConstraintStrength::Hard);
}

#[test]
fn locked_activity_without_booking_is_pinned_at_its_start() {
    let mut show = activity("19:00-20:00", "Maiko performance");
    show.is_locked = true;

    let constraints = ConstraintDetector::new()
        .detect(&slot_id(), &show)
        .expect("valid activity");
    assert_eq!(
        constraints[0].kind,
        ConstraintKind::Booking {
            at: at(19, 0),
            reference: "Maiko performance".to_string(),
        }
    );
    assert!(constraints[0].is_hard());
}

#[test]
fn business_hours_span_every_open_period_and_skip_closed_days() {
    let mut museum = activity("14:00", "Kyoto National Museum");
    museum.validation = Some(validation(&["09:30-17:00", "closed", "09:30-20:00"]));

    let constraints = ConstraintDetector::new()
        .detect(&slot_id(), &museum)
        .expect("valid activity");
    assert_eq!(
        constraints[0].kind,
        ConstraintKind::BusinessHours {
            window: TimeWindow {
                start: at(9, 30),
                end: at(20, 0),
            }
        }
    );
}

#[test]
fn earliest_of_last_transit_and_closing_wins() {
    let mut bar = activity("21:00", "Pontocho bar");
    bar.validation = Some(ActivityValidation {
        spot_name: String::new(),
        is_verified: false,
        opening_hours: Vec::new(),
        last_transit: Some("23:05".to_string()),
        closing_time: Some("23:30".to_string()),
    });

    let constraints = ConstraintDetector::new()
        .detect(&slot_id(), &bar)
        .expect("valid activity");
    assert_eq!(constraints.len(), 1);
    assert_eq!(
        constraints[0].kind,
        ConstraintKind::Deadline {
            at: at(23, 5),
            label: "last transit".to_string(),
        }
    );
}

#[test]
fn configured_walking_cap_applies_unless_activity_sets_its_own() {
    let detector = ConstraintDetector::new().with_walking_limit(12.0);

    let default_cap = detector
        .detect(&slot_id(), &activity("10:00", "Philosopher's path"))
        .expect("valid activity");
    assert_eq!(
        default_cap[0].kind,
        ConstraintKind::WalkingDistance { max_km: 12.0 }
    );
    assert_eq!(default_cap[0].source, ConstraintSource::System);

    let mut hike = activity("10:00", "Kurama hike");
    hike.walking_limit_km = Some(0.0);
    assert!(matches!(
        detector.detect(&slot_id(), &hike),
        Err(ExtractionError::InvalidWalkingLimit { .. })
    ));
}

#[test]
fn unreadable_metadata_is_reported() {
    let mut shrine = activity("10:00", "Yasaka shrine");
    shrine.validation = Some(validation(&["all day"]));

    let extractor = SlotExtractor::new(ConstraintDetector::new());
    let mut itinerary = kyoto_itinerary();
    itinerary.days[1].activities.push(shrine);

    match extractor.extract(&itinerary) {
        Err(ExtractionError::MalformedMetadata { activity, field, value }) => {
            assert_eq!(activity, "Yasaka shrine");
            assert_eq!(field, "opening hours");
            assert_eq!(value, "all day");
        }
        other => panic!("expected malformed metadata, got {other:?}"),
    }
}
