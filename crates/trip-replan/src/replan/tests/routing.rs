use super::common::*;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::replan::domain::ReplanTrigger;
use crate::replan::engine::ReplanEngine;
use crate::replan::repository::ReplanId;
use crate::replan::service::{ReplanService, ReplanServiceError};
use crate::replan::slots::ExtractionError;
use crate::replan::{replan_router, ReplanStatus};

fn post_json(uri: &str, body: &impl serde::Serialize) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("payload serializes"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn service_stores_resolved_records() {
    let (service, repository) = build_service();

    let record = service
        .replan(payload(ReplanTrigger::Rain))
        .await
        .expect("replan succeeds");

    assert!(record.replan_id.0.starts_with("replan-"));
    assert_eq!(record.itinerary_id, "kyoto-weekend");
    assert_eq!(record.result.status, ReplanStatus::Resolved);
    assert!(repository
        .records
        .lock()
        .expect("repository mutex poisoned")
        .contains_key(&record.replan_id));

    let fetched = service.get(&record.replan_id).expect("record stored");
    assert_eq!(fetched, record);
}

#[tokio::test]
async fn service_rejects_malformed_itineraries() {
    let (service, _) = build_service();
    let mut payload = payload(ReplanTrigger::Delay);
    payload.itinerary.days[0].activities[0].time = "whenever".to_string();

    match service.replan(payload).await {
        Err(ReplanServiceError::Extraction(ExtractionError::InvalidTime { .. })) => {}
        other => panic!("expected extraction error, got {other:?}"),
    }
}

#[tokio::test]
async fn service_times_out_slow_replans() {
    let engine = ReplanEngine::new(engine_config()).with_provider(Arc::new(SlowProvider {
        delay: Duration::from_millis(500),
    }));
    let service = ReplanService::new(
        Arc::new(engine),
        Arc::new(MemoryRepository::default()),
        Duration::from_millis(10),
    );

    match service.replan(payload(ReplanTrigger::Rain)).await {
        Err(ReplanServiceError::TimedOut { after_ms }) => assert_eq!(after_ms, 10),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn replan_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(ReplanService::new(
        Arc::new(ReplanEngine::new(engine_config())),
        Arc::new(UnavailableRepository),
        Duration::from_secs(3),
    ));

    let response = crate::replan::router::replan_handler::<UnavailableRepository>(
        State(service),
        axum::Json(payload(ReplanTrigger::Fatigue)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn replan_route_returns_the_stored_record() {
    let (service, _) = build_service();
    let router = replan_router(Arc::new(service));

    let response = router
        .oneshot(post_json("/api/v1/replan", &payload(ReplanTrigger::Rain)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["result"]["status"], "resolved");
    assert_eq!(body["result"]["source"]["kind"], "fallback");
    assert_eq!(body["result"]["source"]["reason"]["reason"], "no_provider");
    assert!(body["result"]["primary"]["breakdown"]["signals"].is_array());
    assert!(body["replan_id"].as_str().is_some());
}

#[tokio::test]
async fn replan_route_rejects_malformed_itineraries() {
    let (service, _) = build_service();
    let router = replan_router(Arc::new(service));
    let mut payload = payload(ReplanTrigger::Rain);
    payload.itinerary.days[0].day = 0;

    let response = router
        .oneshot(post_json("/api/v1/replan", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("day number")));
}

#[tokio::test]
async fn record_route_returns_found_and_missing_records() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let record = service
        .replan(payload(ReplanTrigger::Delay))
        .await
        .expect("replan succeeds");

    let found = replan_router(service.clone())
        .oneshot(
            axum::http::Request::get(format!("/api/v1/replan/{}", record.replan_id))
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(found.status(), StatusCode::OK);
    let body = read_json_body(found).await;
    assert_eq!(body["replan_id"], record.replan_id.0.as_str());

    let missing_id = ReplanId("replan-999999".to_string());
    let missing = replan_router(service)
        .oneshot(
            axum::http::Request::get(format!("/api/v1/replan/{missing_id}"))
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
