//! Integration tests for the domain services' request shapes.

mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use civica_client::ApiError;
use civica_core::input::{FilePart, SubmitPayload};
use civica_core::models::{
    AdminDecision, AdminVerification, AssignmentListParams, CatalogDataQuery, SortOrder, TeamRole,
};
use common::{client_with_token, instance_json, spawn_backend};

// ---------------------------------------------------------------------------
// Test: catalog data query uses 0-based page and JSON-encoded filters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn catalog_data_query_string() {
    let captured: Arc<Mutex<Option<BTreeMap<String, String>>>> = Arc::default();
    let api = Router::new()
        .route(
            "/admin/catalogs/{id}/data",
            get(
                |State(slot): State<Arc<Mutex<Option<BTreeMap<String, String>>>>>,
                 Query(params): Query<BTreeMap<String, String>>| async move {
                    *slot.lock().unwrap() = Some(params);
                    Json(serde_json::json!({
                        "data": [{"id": 1, "name": "Norte"}],
                        "total": 41,
                        "page": 0,
                        "page_size": 20,
                    }))
                },
            ),
        )
        .with_state(captured.clone());
    let config = spawn_backend(api).await;

    let mut filters = BTreeMap::new();
    filters.insert("region".to_string(), "sur".to_string());
    let query = CatalogDataQuery {
        page: 0,
        page_size: 20,
        search: Some("nor".into()),
        sort_by: Some("name".into()),
        sort_order: Some(SortOrder::Desc),
        filters,
    };
    let page = client_with_token(&config, None)
        .catalogs
        .data("c-1", &query)
        .await
        .unwrap();
    assert_eq!(page.total_count, 41);
    assert_eq!(page.rows.len(), 1);

    let params = captured.lock().unwrap().clone().unwrap();
    assert_eq!(params["page"], "0");
    assert_eq!(params["page_size"], "20");
    assert_eq!(params["search"], "nor");
    assert_eq!(params["sort_by"], "name");
    assert_eq!(params["sort_order"], "desc");
    let filters: serde_json::Value = serde_json::from_str(&params["filters"]).unwrap();
    assert_eq!(filters, serde_json::json!({"region": "sur"}));
}

// ---------------------------------------------------------------------------
// Test: multipart submit-data carries one part per field and per file
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_data_multipart_parts() {
    let parts: Arc<Mutex<Vec<(String, Option<String>, Vec<u8>)>>> = Arc::default();
    let api = Router::new()
        .route(
            "/instances/{id}/submit-data",
            post(
                |State(parts): State<Arc<Mutex<Vec<(String, Option<String>, Vec<u8>)>>>>,
                 mut multipart: Multipart| async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().map(str::to_string);
                        let bytes = field.bytes().await.unwrap().to_vec();
                        parts.lock().unwrap().push((name, file_name, bytes));
                    }
                    Json(serde_json::json!({"status": "accepted"}))
                },
            ),
        )
        .with_state(parts.clone());
    let config = spawn_backend(api).await;

    let payload = SubmitPayload::Multipart {
        fields: vec![
            ("name".to_string(), "a".to_string()),
            ("age".to_string(), "3".to_string()),
        ],
        files: vec![FilePart {
            field: "doc".to_string(),
            filename: "cedula.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.4".to_vec(),
        }],
    };
    client_with_token(&config, None)
        .instances
        .submit_data("i-1", &payload)
        .await
        .unwrap();

    let parts = parts.lock().unwrap().clone();
    let names: Vec<&str> = parts.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(names, vec!["name", "age", "doc"]);
    assert_eq!(parts[0].2, b"a");
    assert_eq!(parts[2].1.as_deref(), Some("cedula.pdf"));
    assert_eq!(parts[2].2, b"%PDF-1.4");
    assert!(!names.contains(&"_files"));
}

#[tokio::test]
async fn submit_data_json_body() {
    let body: Arc<Mutex<Option<serde_json::Value>>> = Arc::default();
    let api = Router::new()
        .route(
            "/instances/{id}/submit-data",
            post(
                |State(slot): State<Arc<Mutex<Option<serde_json::Value>>>>,
                 Json(value): Json<serde_json::Value>| async move {
                    *slot.lock().unwrap() = Some(value);
                    Json(serde_json::json!({}))
                },
            ),
        )
        .with_state(body.clone());
    let config = spawn_backend(api).await;

    let payload = SubmitPayload::Json(serde_json::json!({"s1_selections": [{"id": 7}]}));
    client_with_token(&config, None)
        .instances
        .submit_data("i-1", &payload)
        .await
        .unwrap();

    assert_eq!(
        body.lock().unwrap().clone().unwrap(),
        serde_json::json!({"s1_selections": [{"id": 7}]})
    );
}

// ---------------------------------------------------------------------------
// Test: assignment target picks the endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assign_routes_by_target() {
    let hits: Arc<Mutex<Vec<String>>> = Arc::default();
    let assignment = |who: &'static str| {
        move |State(hits): State<Arc<Mutex<Vec<String>>>>, Json(body): Json<serde_json::Value>| async move {
            hits.lock().unwrap().push(who.to_string());
            Json(serde_json::json!({
                "instance_id": body["instance_id"],
                "assigned_user_id": body.get("assigned_user_id"),
                "assigned_team_id": body.get("assigned_team_id"),
                "assignment_status": "assigned",
            }))
        }
    };
    let api = Router::new()
        .route("/assignments/assign-user", post(assignment("user")))
        .route("/assignments/assign-team", post(assignment("team")))
        .with_state(hits.clone());
    let config = spawn_backend(api).await;
    let client = client_with_token(&config, None);

    let a = client
        .assignments
        .assign_user("i-1", "u-1", None)
        .await
        .unwrap();
    assert_eq!(a.assigned_user_id.as_deref(), Some("u-1"));
    client
        .assignments
        .assign_team("i-2", "t-1", Some("urgent".into()))
        .await
        .unwrap();

    assert_eq!(*hits.lock().unwrap(), vec!["user", "team"]);
}

#[tokio::test]
async fn empty_instance_id_never_reaches_server() {
    let config = civica_client::ClientConfig::default();
    let err = client_with_token(&config, None)
        .assignments
        .assign_user(" ", "u-1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Test: paginated lists accept either envelope spelling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pending_list_decodes_items_envelope() {
    let api = Router::new().route(
        "/assignments/pending",
        get(|| async {
            Json(serde_json::json!({
                "items": [instance_json("i-1", "waiting_for_start")],
                "total_count": 25,
                "page": 0,
                "page_size": 10,
            }))
        }),
    );
    let config = spawn_backend(api).await;

    let page = client_with_token(&config, None)
        .assignments
        .pending(&AssignmentListParams {
            page: 0,
            page_size: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 25);
    assert_eq!(page.total_pages(), 3);
}

// ---------------------------------------------------------------------------
// Test: directory, document and admin services
// ---------------------------------------------------------------------------

type Bodies = Arc<Mutex<Vec<serde_json::Value>>>;

#[tokio::test]
async fn team_membership_and_current_user() {
    let bodies: Bodies = Arc::default();
    let api = Router::new()
        .route(
            "/teams/{id}/members",
            get(|| async {
                Json(serde_json::json!([
                    {"user_id": "u-1", "role": "leader", "full_name": "Ana Ruiz"},
                    {"user_id": "u-2", "role": "member"},
                ]))
            })
            .post(
                |State(bodies): State<Bodies>, Json(body): Json<serde_json::Value>| async move {
                    bodies.lock().unwrap().push(body.clone());
                    Json(serde_json::json!({"user_id": body["user_id"], "role": body["role"]}))
                },
            ),
        )
        .route(
            "/auth/me",
            get(|| async { Json(serde_json::json!({"id": "u-1", "username": "ana"})) }),
        )
        .with_state(bodies.clone());
    let config = spawn_backend(api).await;
    let client = client_with_token(&config, Some("t"));

    let members = client.teams.members("t-1").await.unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].role, TeamRole::Leader);

    let added = client
        .teams
        .add_member("t-1", "u-3", TeamRole::Coordinator)
        .await
        .unwrap();
    assert_eq!(added.role, TeamRole::Coordinator);
    assert_eq!(
        bodies.lock().unwrap()[0],
        serde_json::json!({"user_id": "u-3", "role": "coordinator"})
    );

    let me = client.users.me().await.unwrap();
    assert_eq!(me.username, "ana");
    assert!(me.is_active);
}

#[tokio::test]
async fn document_analysis_and_verification() {
    let bodies: Bodies = Arc::default();
    let api = Router::new()
        .route(
            "/documents/{id}/analyze",
            get(|axum::extract::Path(id): axum::extract::Path<String>| async move {
                let confidence = if id == "bad" { 1.7 } else { 0.92 };
                Json(serde_json::json!({
                    "document_id": id,
                    "confidence_score": confidence,
                    "fraud_score": 0.03,
                    "recommendation": "approve",
                }))
            }),
        )
        .route(
            "/admin/documents/{id}/admin-verify",
            post(
                |State(bodies): State<Bodies>, Json(body): Json<serde_json::Value>| async move {
                    bodies.lock().unwrap().push(body);
                    Json(serde_json::json!({
                        "id": "d-1",
                        "filename": "cedula.pdf",
                        "status": "rejected",
                    }))
                },
            ),
        )
        .with_state(bodies.clone());
    let config = spawn_backend(api).await;
    let client = client_with_token(&config, None);

    let analysis = client.documents.analyze("d-1").await.unwrap();
    assert_eq!(analysis.recommendation.as_deref(), Some("approve"));

    let err = client.documents.analyze("bad").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let verification =
        AdminVerification::new(AdminDecision::Reject, Some("  Ilegible ".into())).unwrap();
    let document = client
        .documents
        .admin_verify("d-1", &verification)
        .await
        .unwrap();
    assert_eq!(document.status, "rejected");
    assert_eq!(
        bodies.lock().unwrap()[0],
        serde_json::json!({"decision": "reject", "comments": "Ilegible"})
    );
}

#[tokio::test]
async fn admin_inbox_and_stats() {
    let api = Router::new()
        .route(
            "/admin/inbox",
            get(|Query(params): Query<BTreeMap<String, String>>| async move {
                assert_eq!(params["page"], "1");
                assert_eq!(params["page_size"], "5");
                Json(serde_json::json!({
                    "data": [instance_json("i-9", "paused")],
                    "total": 6,
                }))
            }),
        )
        .route(
            "/admin/stats",
            get(|| async {
                Json(serde_json::json!({
                    "total_instances": 40,
                    "requires_action": 6,
                    "overdue": 2,
                }))
            }),
        );
    let config = spawn_backend(api).await;
    let client = client_with_token(&config, None);

    let inbox = client.admin.inbox(1, 5).await.unwrap();
    assert_eq!(inbox.items[0].instance_id, "i-9");
    assert_eq!(inbox.total, 6);

    let stats = client.admin.stats().await.unwrap();
    assert_eq!(stats.total_instances, 40);
    assert_eq!(stats.requires_action, 6);
    assert_eq!(stats.extra["overdue"], 2);
}
