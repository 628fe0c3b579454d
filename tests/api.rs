use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vocalytics_dashboard::escalation::StatusChange;
use vocalytics_dashboard::memory::{Dataset, MemoryStore};
use vocalytics_dashboard::models::*;
use vocalytics_dashboard::store::{MetricsStore, StoreError, StoreResult};
use vocalytics_dashboard::router;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn demo_app() -> Router {
    router(Arc::new(MemoryStore::demo()))
}

fn tagged_call(data: &mut Dataset, call_id: &str, user_id: &str, tags: &[&str]) {
    data.calls.push(Call {
        call_id: call_id.to_string(),
        user_id: user_id.to_string(),
        duration_sec: 120,
        language: "English".to_string(),
    });
    data.sentiments.push(CallSentiment {
        call_id: call_id.to_string(),
        overall_sentiment: "positive".to_string(),
        sentiment_score: 0.9,
        conversation_tags: tags.iter().map(|t| t.to_string()).collect(),
        analyzed_at: Utc::now(),
    });
}

#[tokio::test]
async fn unknown_agent_gets_zeroes_and_empty_collections() {
    let app = demo_app();

    for uri in ["/api/calls-today/nobody", "/api/supervisor/calls-today/nobody"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "count": 0 }));
    }

    let (_, body) = get_json(&app, "/api/performance-score/nobody").await;
    assert_eq!(body, json!({ "score": null }));
    let (_, body) = get_json(&app, "/api/leaderboard-rank/nobody").await;
    assert_eq!(body, json!({ "rank": null }));
    let (_, body) = get_json(&app, "/api/weekly-volume/nobody").await;
    assert_eq!(body, json!([]));
    let (_, body) = get_json(&app, "/api/sentiment-distribution/nobody").await;
    assert_eq!(body, json!({ "sentiment": [] }));
    let (_, body) = get_json(&app, "/api/calls-by-tag/nobody").await;
    assert_eq!(body, json!({ "calls": [] }));
    let (_, body) = get_json(&app, "/api/recent-escalations/nobody").await;
    assert_eq!(body, json!({ "escalations": [] }));
    let (_, body) = get_json(&app, "/api/agent-insights/nobody").await;
    assert_eq!(body, json!({ "insights": [] }));
    let (_, body) = get_json(&app, "/api/supervisor/escalations/nobody").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn agent_view_shapes() {
    let app = demo_app();

    let (_, body) = get_json(&app, "/api/calls-today/A101").await;
    assert_eq!(body["count"], 2);

    let (_, body) = get_json(&app, "/api/performance-score/A101").await;
    let score = body["score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));

    let (_, body) = get_json(&app, "/api/recent-calls/A101").await;
    let calls = body["calls"].as_array().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2]["call_id"], "C1003");

    let (_, body) = get_json(&app, "/api/agent-insights/A101").await;
    assert_eq!(body["insights"].as_array().unwrap().len(), 1);
    assert_eq!(body["insights"][0]["user_id"], "A101");
}

#[tokio::test]
async fn tags_are_counted_individually() {
    let mut data = Dataset::default();
    tagged_call(&mut data, "C1", "A1", &["billing", "urgent"]);
    let app = router(Arc::new(MemoryStore::new(data)));

    let (_, body) = get_json(&app, "/api/calls-by-tag/A1").await;
    assert_eq!(
        body,
        json!({ "calls": [
            { "tag": "billing", "count": 1 },
            { "tag": "urgent", "count": 1 }
        ]})
    );
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let app = demo_app();
    let request = || {
        Request::builder()
            .uri("/api/supervisor/tag-sentiment-heatmap/S100")
            .body(Body::empty())
            .unwrap()
    };

    let (_, first) = send(&app, request()).await;
    let (_, second) = send(&app, request()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn supervisor_escalations_carry_status_display() {
    let app = demo_app();
    let (status, body) = get_json(&app, "/api/supervisor/escalations/S100").await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["call_id"], "C1003");
    assert_eq!(rows[0]["name"], "Avery Lee");
    assert_eq!(rows[0]["status_display"], "Not actioned since 2 days");
    assert_eq!(rows[1]["status_display"], "Last actioned 1 days ago");
}

#[tokio::test]
async fn compare_agents_drops_agents_without_calls() {
    let mut data = Dataset::default();
    data.users.push(User {
        user_id: "A1".to_string(),
        name: "Avery Lee".to_string(),
        supervisor_id: None,
    });
    data.users.push(User {
        user_id: "A2".to_string(),
        name: "Jules Moreno".to_string(),
        supervisor_id: None,
    });
    tagged_call(&mut data, "C1", "A1", &["billing"]);
    let app = router(Arc::new(MemoryStore::new(data)));

    let (_, body) = get_json(&app, "/api/supervisor/compare-agents?agent1=A1&agent2=A2").await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Avery Lee");
    assert_eq!(rows[0]["call_count"], 1);
}

#[tokio::test]
async fn leaderboard_served_on_both_paths() {
    let app = demo_app();
    let (_, legacy) = get_json(&app, "/api/supervisor/learderboad").await;
    let (_, fixed) = get_json(&app, "/api/supervisor/leaderboard").await;
    assert_eq!(legacy, fixed);
    assert_eq!(legacy[0]["rank"], 1);
    assert_eq!(legacy[0]["name"], "Kiara Patel");
}

#[tokio::test]
async fn sentiment_by_tag_is_the_reference_table() {
    let app = router(Arc::new(MemoryStore::default()));
    let (status, body) = get_json(&app, "/api/sentiment-by-tag").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 18);
    assert_eq!(body[3], json!({ "tag": "auto loan", "overall_sentiment": "positive", "count": 70 }));
}

#[tokio::test]
async fn update_status_changes_status_and_stamps_time() {
    let store = Arc::new(MemoryStore::demo());
    let app = router(store.clone());

    let (status, body) = post_json(
        &app,
        "/api/supervisor/update-status",
        json!({ "callId": "C1003", "newStatus": "InProgress" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call_id"], "C1003");
    assert_eq!(body["status"], "InProgress");
    assert!(body["last_actioned_at"].is_string());

    let record = store
        .snapshot()
        .escalations
        .into_iter()
        .find(|e| e.call_id == "C1003")
        .unwrap();
    assert_eq!(record.escalation_reason, "Customer disputes late fee");
    assert_eq!(record.possible_action.as_deref(), Some("Waive fee"));
    assert!(record.last_actioned_at.unwrap() > Utc::now() - Duration::minutes(1));
}

#[tokio::test]
async fn update_status_unknown_call_is_not_found() {
    let app = demo_app();
    let (status, body) = post_json(
        &app,
        "/api/supervisor/update-status",
        json!({ "callId": "C0000", "newStatus": "Closed" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Call not found" }));
}

/// Records whether the update reached the store.
#[derive(Default)]
struct FailingStore {
    touched: std::sync::atomic::AtomicBool,
}

fn broken() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl MetricsStore for FailingStore {
    async fn calls_today(&self, _: &str) -> StoreResult<i64> { Err(broken()) }
    async fn weekly_volume(&self, _: &str) -> StoreResult<Vec<DailyVolume>> { Err(broken()) }
    async fn performance_score(&self, _: &str) -> StoreResult<Option<f64>> { Err(broken()) }
    async fn leaderboard_rank(&self, _: &str) -> StoreResult<Option<i64>> { Err(broken()) }
    async fn sentiment_distribution(&self, _: &str) -> StoreResult<Vec<SentimentCount>> { Err(broken()) }
    async fn calls_by_tag(&self, _: &str) -> StoreResult<Vec<TagCount>> { Err(broken()) }
    async fn recent_escalations(&self, _: &str) -> StoreResult<Vec<RecentEscalation>> { Err(broken()) }
    async fn recent_calls(&self, _: &str) -> StoreResult<Vec<RecentCall>> { Err(broken()) }
    async fn agent_insights(&self, _: &str) -> StoreResult<Vec<AgentInsight>> { Err(broken()) }
    async fn team_calls_today(&self, _: &str) -> StoreResult<i64> { Err(broken()) }
    async fn team_weekly_volume(&self, _: &str) -> StoreResult<i64> { Err(broken()) }
    async fn monthly_escalations(&self, _: &str) -> StoreResult<i64> { Err(broken()) }
    async fn agent_performance(&self, _: &str) -> StoreResult<Vec<AgentPerformance>> { Err(broken()) }
    async fn tag_sentiment_heatmap(&self, _: &str) -> StoreResult<Vec<TagSentimentCount>> { Err(broken()) }
    async fn team_sentiment(&self, _: &str) -> StoreResult<Vec<SentimentCount>> { Err(broken()) }
    async fn supervisor_escalations(&self, _: &str) -> StoreResult<Vec<EscalationView>> { Err(broken()) }
    async fn leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>> { Err(broken()) }
    async fn compare_agents(&self, _: &str, _: &str) -> StoreResult<Vec<AgentComparison>> { Err(broken()) }
    async fn call_count_by_tag(&self) -> StoreResult<Vec<TagCount>> { Err(broken()) }
    async fn escalation_by_tag(&self) -> StoreResult<Vec<TagCount>> { Err(broken()) }

    async fn update_escalation_status(&self, _: &StatusChange) -> StoreResult<Option<StatusUpdate>> {
        self.touched.store(true, std::sync::atomic::Ordering::SeqCst);
        Err(broken())
    }
}

#[tokio::test]
async fn store_failures_are_opaque_server_errors() {
    let app = router(Arc::new(FailingStore::default()));

    for uri in [
        "/api/calls-today/A1",
        "/api/weekly-volume/A1",
        "/api/supervisor/team-sentiment/S1",
        "/api/escalation-by-tag",
    ] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, b"Server error");
    }
}

#[tokio::test]
async fn missing_status_is_rejected_before_store_access() {
    let store = Arc::new(FailingStore::default());
    let app = router(store.clone());

    for payload in [
        json!({ "callId": "C1", "newStatus": "" }),
        json!({ "callId": "C1" }),
        json!({ "newStatus": "Closed" }),
    ] {
        let (status, body) = post_json(&app, "/api/supervisor/update-status", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing callId or newStatus" }));
    }

    assert!(!store.touched.load(std::sync::atomic::Ordering::SeqCst));
}

async fn post_raw(app: &Router, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/supervisor/update-status");
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    let (status, body) = send(app, request.body(Body::from(body.to_string())).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn unusable_update_bodies_are_bad_requests() {
    let store = Arc::new(FailingStore::default());
    let app = router(store.clone());
    let missing = json!({ "error": "Missing callId or newStatus" });

    for (content_type, body) in [
        (None, ""),
        (None, r#"{"callId":"C1","newStatus":"Closed"}"#),
        (Some("application/json"), ""),
        (Some("application/json"), "null"),
        (Some("application/json"), "{not json"),
        (Some("application/json"), r#"[1, 2]"#),
        (Some("application/json"), r#"{"callId":0,"newStatus":"Closed"}"#),
        (Some("application/json"), r#"{"callId":"C1","newStatus":false}"#),
        (Some("application/json"), r#"{"callId":{"id":"C1"},"newStatus":"Closed"}"#),
        (Some("text/plain"), "callId=C1"),
    ] {
        let (status, reply) = post_raw(&app, content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(reply, missing, "{body}");
    }

    assert!(!store.touched.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
async fn numeric_status_and_call_id_are_used_as_text() {
    let mut data = Dataset::default();
    tagged_call(&mut data, "42", "A1", &["billing"]);
    data.escalations.push(Escalation {
        escalation_id: "E1".to_string(),
        call_id: "42".to_string(),
        agent_id: "A1".to_string(),
        supervisor_id: "S1".to_string(),
        escalation_reason: "Billing dispute".to_string(),
        possible_action: None,
        status: "Open".to_string(),
        created_at: Utc::now(),
        last_actioned_at: None,
    });
    let app = router(Arc::new(MemoryStore::new(data)));

    let (status, body) =
        post_raw(&app, Some("application/json"), r#"{"callId":42,"newStatus":5}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call_id"], "42");
    assert_eq!(body["status"], "5");
}

#[tokio::test]
async fn whitespace_call_id_is_looked_up() {
    let app = demo_app();
    let (status, body) = post_json(
        &app,
        "/api/supervisor/update-status",
        json!({ "callId": "   ", "newStatus": "Closed" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Call not found" }));
}
