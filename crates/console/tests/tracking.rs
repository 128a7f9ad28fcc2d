//! Instance tracking against a stub backend.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use civica_console::{InstanceTracker, TrackerError, TrackerSettings};
use civica_core::input::{InputCollector, InputComponent, InputRequest};
use civica_core::tracking::TrackingStage;
use common::{cache, spawn_backend, within};

#[derive(Default)]
struct Backend {
    status: String,
    submitted: Option<serde_json::Value>,
    track_calls: usize,
}

type Shared = Arc<Mutex<Backend>>;

fn progress_json(id: &str, status: &str) -> serde_json::Value {
    let paused = status == "paused";
    serde_json::json!({
        "instance_id": id,
        "workflow_name": "Licencia de obra",
        "status": status,
        "current_step": "firma",
        "current_step_name": "Firma del solicitante",
        "progress_percentage": if paused { 50.0 } else { 75.0 },
        "total_steps": 4,
        "completed_steps": if paused { 2 } else { 3 },
        "requires_input": paused,
        "waiting_for": if paused { Some("signature") } else { None },
        "input_form": if paused { Some(serde_json::json!({"step_id": "firma"})) } else { None },
    })
}

fn backend(initial: &str) -> (Router, Shared) {
    let state: Shared = Arc::new(Mutex::new(Backend {
        status: initial.to_string(),
        ..Default::default()
    }));
    let api = Router::new()
        .route(
            "/instances/{id}/track",
            get(|State(s): State<Shared>, Path(id): Path<String>| async move {
                let mut s = s.lock().unwrap();
                s.track_calls += 1;
                Json(progress_json(&id, &s.status))
            }),
        )
        .route(
            "/instances/{id}/submit-data",
            post(
                |State(s): State<Shared>, Json(body): Json<serde_json::Value>| async move {
                    let mut s = s.lock().unwrap();
                    s.submitted = Some(body);
                    s.status = "running".to_string();
                    Json(serde_json::json!({"status": "accepted"}))
                },
            ),
        )
        .route(
            "/instances/{id}/start",
            post(|State(s): State<Shared>| async move {
                let mut s = s.lock().unwrap();
                if s.status != "waiting_for_start" {
                    return (
                        StatusCode::CONFLICT,
                        Json(serde_json::json!({"detail": "Instance already started"})),
                    );
                }
                s.status = "running".to_string();
                (StatusCode::OK, Json(serde_json::json!({"status": "running"})))
            }),
        )
        .with_state(state.clone());
    (api, state)
}

fn settings() -> TrackerSettings {
    TrackerSettings {
        poll_interval: Duration::from_secs(30),
        submit_refresh_delay: Duration::from_millis(100),
    }
}

// ---------------------------------------------------------------------------
// Test: paused on a signature, sign, submit, tracker refreshes to running
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signature_submit_refreshes_to_running() {
    let (api, state) = backend("paused");
    let client = spawn_backend(api).await;
    let cache = cache();
    let mut tracker = InstanceTracker::mount(client.instances.clone(), &cache, "X", settings());

    let progress = within(tracker.loaded()).await.unwrap();
    assert!(progress.is_paused());
    assert_matches!(
        tracker.stage().unwrap(),
        TrackingStage::AwaitingInput(InputRequest::Signature { .. })
    );

    let mut collector = tracker.input_collector().unwrap();
    match &mut collector {
        InputCollector::Signature(signature) => {
            signature.set_value("signer_name", "Ana Ruiz").unwrap();
            signature.set_value("signer_id", "12345678").unwrap();
            signature.sign("Ana Ruiz");
            signature.accept_terms(true);
        }
        other => panic!("expected signature component, got {other:?}"),
    }
    assert_eq!(collector.step_id(), "firma");

    tracker.submit(&collector).await.unwrap();
    let calls_at_submit = state.lock().unwrap().track_calls;

    let body = state.lock().unwrap().submitted.clone().unwrap();
    let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["accepted_terms", "signature_data", "signed_at", "signer_id", "signer_name"]
    );
    assert_eq!(body["signer_name"], "Ana Ruiz");
    assert_eq!(body["signer_id"], "12345678");
    assert_eq!(body["signature_data"], "Ana Ruiz");
    assert_eq!(body["accepted_terms"], true);

    // Well inside the 100ms refresh delay.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(state.lock().unwrap().track_calls, calls_at_submit);
    assert!(tracker.progress().unwrap().is_paused());

    let progress = within(tracker.wait_for(|p| !p.is_paused())).await.unwrap();
    assert!(state.lock().unwrap().track_calls > calls_at_submit);
    assert_eq!(progress.status, "running");
    assert_eq!(tracker.stage().unwrap(), TrackingStage::Running);
    assert!(tracker.banner().is_none());
}

#[tokio::test]
async fn invalid_input_never_reaches_the_server() {
    let (api, state) = backend("paused");
    let client = spawn_backend(api).await;
    let cache = cache();
    let mut tracker = InstanceTracker::mount(client.instances.clone(), &cache, "X", settings());
    within(tracker.loaded()).await.unwrap();

    // nothing signed
    let collector = tracker.input_collector().unwrap();
    let err = tracker.submit(&collector).await.unwrap_err();
    assert_matches!(err, TrackerError::Api(civica_client::ApiError::Validation(_)));
    assert!(tracker.banner().unwrap().contains("Required fields missing"));
    assert!(state.lock().unwrap().submitted.is_none());
}

// ---------------------------------------------------------------------------
// Test: start action
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_refetches_progress() {
    let (api, _state) = backend("waiting_for_start");
    let client = spawn_backend(api).await;
    let cache = cache();
    let mut tracker = InstanceTracker::mount(client.instances.clone(), &cache, "X", settings());

    within(tracker.loaded()).await.unwrap();
    assert!(tracker.stage().unwrap().offers_start());

    tracker.start().await.unwrap();
    let progress = within(tracker.wait_for(|p| p.status == "running")).await.unwrap();
    assert_eq!(progress.completed_steps, 3);
}

#[tokio::test]
async fn rejected_start_sets_the_banner() {
    let (api, _state) = backend("running");
    let client = spawn_backend(api).await;
    let cache = cache();
    let mut tracker = InstanceTracker::mount(client.instances.clone(), &cache, "X", settings());
    within(tracker.loaded()).await.unwrap();

    let err = tracker.start().await.unwrap_err();
    assert_eq!(err.banner(), "Instance already started");
    assert_eq!(tracker.banner().as_deref(), Some("Instance already started"));
}

#[tokio::test]
async fn stopped_tracker_skips_the_delayed_refresh() {
    let (api, state) = backend("paused");
    let client = spawn_backend(api).await;
    let cache = cache();
    let mut tracker = InstanceTracker::mount(client.instances.clone(), &cache, "X", settings());
    within(tracker.loaded()).await.unwrap();

    let mut collector = tracker.input_collector().unwrap();
    if let InputCollector::Signature(signature) = &mut collector {
        signature.set_value("signer_name", "Ana Ruiz").unwrap();
        signature.set_value("signer_id", "1").unwrap();
        signature.sign("Ana Ruiz");
        signature.accept_terms(true);
    }
    tracker.submit(&collector).await.unwrap();
    let calls_before = state.lock().unwrap().track_calls;
    tracker.stop();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(state.lock().unwrap().track_calls, calls_before);
}
