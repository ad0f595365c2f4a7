use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use jobvault::config::StorageConfig;
use jobvault::leads::store::InMemoryLeadRepository;
use jobvault::leads::{
    lead_router, FallbackPolicy, JourneyTracker, LeadAdminService, LeadIntakeService,
    LeadServices, RecordingRelay,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn pipeline() -> (Router, RecordingRelay) {
    let repository = Arc::new(InMemoryLeadRepository::default());
    let relay = RecordingRelay::default();
    let storage = StorageConfig {
        url: None,
        api_key: None,
        table: "jv_sub_e".to_string(),
        timeout: std::time::Duration::from_secs(5),
    };

    let services = LeadServices {
        intake: Arc::new(LeadIntakeService::new(
            Arc::clone(&repository),
            Arc::new(relay.clone()),
            Arc::new(JourneyTracker::default()),
        )),
        admin: Arc::new(LeadAdminService::new(
            repository,
            FallbackPolicy::None,
            None,
        )),
        storage: storage.status(),
    };

    (lead_router(services), relay)
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.expect("response")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4)")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn patch_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

async fn json_body(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json payload")
}

#[tokio::test]
async fn hero_then_get_started_flows_into_dashboard_and_export() {
    let (router, relay) = pipeline();

    let hero = send(
        &router,
        post_json(
            "/api/webhook",
            json!({
                "email": "sam@ridgelinepainting.com",
                "source": "hero",
                "url": "/?utm_source=google&utm_medium=cpc&utm_campaign=spring",
                "viewportWidth": 390,
            }),
        ),
    )
    .await;
    assert_eq!(hero.status(), StatusCode::OK);
    let hero = json_body(hero).await;
    assert_eq!(hero["lead_id"], "1");

    let full = send(
        &router,
        post_json(
            "/api/webhook",
            json!({
                "name": "Sam Ortiz",
                "email": "Sam@RidgelinePainting.com",
                "company": "Ridgeline Painting",
                "jobVolume": "6-20",
                "formSource": "Get-Started",
                "url": "/get-started?from=hero",
                "submittedAt": "2025-04-02T15:00:00Z",
            }),
        ),
    )
    .await;
    assert_eq!(full.status(), StatusCode::OK);
    assert_eq!(json_body(full).await["relayed"], true);
    assert_eq!(relay.forwarded().len(), 2);

    let listing = json_body(send(&router, get("/api/admin/leads?source=get-started")).await).await;
    assert_eq!(listing["summary"]["total"], 2);
    assert_eq!(listing["summary"]["pending"], 2);
    assert_eq!(listing["summary"]["mobile"], 2);
    assert_eq!(listing["matched"], 1);
    let lead = &listing["leads"][0];
    assert_eq!(lead["id"], "2");
    assert_eq!(lead["form_source"], "get-started");
    assert_eq!(lead["properties"], "6-20");
    assert_eq!(lead["is_from_hero"], true);
    assert_eq!(lead["submitted_at"], "2025-04-02T15:00:00Z");

    let processed = send(
        &router,
        patch_json("/api/admin/leads/2/status", json!({ "status": "processed" })),
    )
    .await;
    assert_eq!(processed.status(), StatusCode::OK);

    let pending = json_body(send(&router, get("/api/admin/leads?status=pending")).await).await;
    assert_eq!(pending["matched"], 1);
    assert_eq!(pending["leads"][0]["id"], "1");

    let export = send(&router, get("/api/admin/leads/export?status=processed")).await;
    assert_eq!(export.status(), StatusCode::OK);
    let csv = String::from_utf8(body_bytes(export).await).expect("utf-8 csv");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].starts_with("2,Sam Ortiz,Sam@RidgelinePainting.com,Ridgeline Painting,6-20,processed,"));

    let deleted = send(
        &router,
        Request::builder()
            .method("DELETE")
            .uri("/api/admin/leads/1")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let summary = json_body(send(&router, get("/api/admin/leads/summary")).await).await;
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["processed"], 1);
}

#[tokio::test]
async fn storage_diagnostics_report_memory_mode() {
    let (router, _) = pipeline();

    let status = json_body(send(&router, get("/api/check-storage")).await).await;
    assert_eq!(status["isConfigured"], false);
    assert_eq!(status["keyPreview"], "Not set");

    let setup = send(&router, get("/api/setup-db")).await;
    assert_eq!(setup.status(), StatusCode::OK);
    assert_eq!(json_body(setup).await["success"], true);
}
