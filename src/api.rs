//! HTTP surface of the aggregation service.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::escalation::StatusChange;
use crate::metrics;
use crate::models::{
    AgentComparison, AgentPerformance, CountResponse, DailyVolume, EscalationView,
    EscalationsEnvelope, InsightsEnvelope, LeaderboardEntry, RankResponse, RecentCallsEnvelope,
    ScoreResponse, SentimentCount, SentimentEnvelope, StatusUpdate, TagCallsEnvelope, TagCount,
    TagSentimentCount,
};
use crate::store::MetricsStore;

pub const API_PREFIX: &str = "/api";

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn MetricsStore>,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(store: Arc<dyn MetricsStore>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/calls-today/:agent_id", get(calls_today))
        .route("/weekly-volume/:agent_id", get(weekly_volume))
        .route("/performance-score/:agent_id", get(performance_score))
        .route("/leaderboard-rank/:agent_id", get(leaderboard_rank))
        .route("/sentiment-distribution/:agent_id", get(sentiment_distribution))
        .route("/calls-by-tag/:agent_id", get(calls_by_tag))
        .route("/recent-escalations/:agent_id", get(recent_escalations))
        .route("/recent-calls/:agent_id", get(recent_calls))
        .route("/agent-insights/:agent_id", get(agent_insights))
        .route("/supervisor/calls-today/:supervisor_id", get(team_calls_today))
        .route("/supervisor/weekly-volume/:supervisor_id", get(team_weekly_volume))
        .route(
            "/supervisor/monthly-escalations/:supervisor_id",
            get(monthly_escalations),
        )
        .route(
            "/supervisor/agent-performance/:supervisor_id",
            get(agent_performance),
        )
        .route(
            "/supervisor/tag-sentiment-heatmap/:supervisor_id",
            get(tag_sentiment_heatmap),
        )
        .route("/supervisor/team-sentiment/:supervisor_id", get(team_sentiment))
        .route("/supervisor/escalations/:supervisor_id", get(supervisor_escalations))
        // Legacy spelling kept for existing dashboards.
        .route("/supervisor/learderboad", get(leaderboard))
        .route("/supervisor/leaderboard", get(leaderboard))
        .route("/supervisor/compare-agents", get(compare_agents))
        .route("/supervisor/update-status", post(update_status))
        .route("/call-count-by-tag", get(call_count_by_tag))
        .route("/sentiment-by-tag", get(sentiment_by_tag))
        .route("/escalation-by-tag", get(escalation_by_tag))
        .with_state(AppState { store });

    Router::new()
        .nest(API_PREFIX, api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn calls_today(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<CountResponse> {
    let count = state
        .store
        .calls_today(&agent_id)
        .await
        .map_err(ApiError::server("calls-today"))?;
    Ok(Json(CountResponse { count }))
}

async fn weekly_volume(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<Vec<DailyVolume>> {
    let rows = state
        .store
        .weekly_volume(&agent_id)
        .await
        .map_err(ApiError::server("weekly-volume"))?;
    debug!(%agent_id, days = rows.len(), "weekly volume");
    Ok(Json(rows))
}

async fn performance_score(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<ScoreResponse> {
    let score = state
        .store
        .performance_score(&agent_id)
        .await
        .map_err(ApiError::server("performance-score"))?;
    Ok(Json(ScoreResponse { score }))
}

async fn leaderboard_rank(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<RankResponse> {
    let rank = state
        .store
        .leaderboard_rank(&agent_id)
        .await
        .map_err(ApiError::server("leaderboard-rank"))?;
    Ok(Json(RankResponse { rank }))
}

async fn sentiment_distribution(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<SentimentEnvelope> {
    let sentiment = state
        .store
        .sentiment_distribution(&agent_id)
        .await
        .map_err(ApiError::server("sentiment-distribution"))?;
    Ok(Json(SentimentEnvelope { sentiment }))
}

async fn calls_by_tag(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<TagCallsEnvelope> {
    let calls = state
        .store
        .calls_by_tag(&agent_id)
        .await
        .map_err(ApiError::server("calls-by-tag"))?;
    Ok(Json(TagCallsEnvelope { calls }))
}

async fn recent_escalations(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<EscalationsEnvelope> {
    let escalations = state
        .store
        .recent_escalations(&agent_id)
        .await
        .map_err(ApiError::server("recent-escalations"))?;
    Ok(Json(EscalationsEnvelope { escalations }))
}

async fn recent_calls(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<RecentCallsEnvelope> {
    let calls = state
        .store
        .recent_calls(&agent_id)
        .await
        .map_err(ApiError::server("recent-calls"))?;
    Ok(Json(RecentCallsEnvelope { calls }))
}

async fn agent_insights(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> ApiResult<InsightsEnvelope> {
    let insights = state
        .store
        .agent_insights(&agent_id)
        .await
        .map_err(ApiError::server("agent-insights"))?;
    Ok(Json(InsightsEnvelope { insights }))
}

async fn team_calls_today(
    State(state): State<AppState>,
    Path(supervisor_id): Path<String>,
) -> ApiResult<CountResponse> {
    let count = state
        .store
        .team_calls_today(&supervisor_id)
        .await
        .map_err(ApiError::server("supervisor/calls-today"))?;
    Ok(Json(CountResponse { count }))
}

async fn team_weekly_volume(
    State(state): State<AppState>,
    Path(supervisor_id): Path<String>,
) -> ApiResult<CountResponse> {
    let count = state
        .store
        .team_weekly_volume(&supervisor_id)
        .await
        .map_err(ApiError::server("supervisor/weekly-volume"))?;
    Ok(Json(CountResponse { count }))
}

async fn monthly_escalations(
    State(state): State<AppState>,
    Path(supervisor_id): Path<String>,
) -> ApiResult<CountResponse> {
    let count = state
        .store
        .monthly_escalations(&supervisor_id)
        .await
        .map_err(ApiError::server("supervisor/monthly-escalations"))?;
    Ok(Json(CountResponse { count }))
}

async fn agent_performance(
    State(state): State<AppState>,
    Path(supervisor_id): Path<String>,
) -> ApiResult<Vec<AgentPerformance>> {
    let rows = state
        .store
        .agent_performance(&supervisor_id)
        .await
        .map_err(ApiError::server("supervisor/agent-performance"))?;
    Ok(Json(rows))
}

async fn tag_sentiment_heatmap(
    State(state): State<AppState>,
    Path(supervisor_id): Path<String>,
) -> ApiResult<Vec<TagSentimentCount>> {
    let rows = state
        .store
        .tag_sentiment_heatmap(&supervisor_id)
        .await
        .map_err(ApiError::server("supervisor/tag-sentiment-heatmap"))?;
    Ok(Json(rows))
}

async fn team_sentiment(
    State(state): State<AppState>,
    Path(supervisor_id): Path<String>,
) -> ApiResult<Vec<SentimentCount>> {
    let rows = state
        .store
        .team_sentiment(&supervisor_id)
        .await
        .map_err(ApiError::server("supervisor/team-sentiment"))?;
    Ok(Json(rows))
}

async fn supervisor_escalations(
    State(state): State<AppState>,
    Path(supervisor_id): Path<String>,
) -> ApiResult<Vec<EscalationView>> {
    let rows = state
        .store
        .supervisor_escalations(&supervisor_id)
        .await
        .map_err(ApiError::server("supervisor/escalations"))?;
    Ok(Json(rows))
}

async fn leaderboard(State(state): State<AppState>) -> ApiResult<Vec<LeaderboardEntry>> {
    let rows = state
        .store
        .leaderboard()
        .await
        .map_err(ApiError::server("supervisor/leaderboard"))?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct CompareQuery {
    #[serde(default)]
    agent1: String,
    #[serde(default)]
    agent2: String,
}

async fn compare_agents(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> ApiResult<Vec<AgentComparison>> {
    let rows = state
        .store
        .compare_agents(&query.agent1, &query.agent2)
        .await
        .map_err(ApiError::server("supervisor/compare-agents"))?;
    Ok(Json(rows))
}

/// Text of a request field. Falsy values (`""`, `0`, `false`, `null`) and
/// structured values count as missing; numbers and `true` are used as text.
fn field_text(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

async fn update_status(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<StatusUpdate> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!(error = %rejection, "update-status body not usable");
            Value::Null
        }
    };
    let change = StatusChange::new(field_text(&body, "callId"), field_text(&body, "newStatus"))?;

    let updated = state
        .store
        .update_escalation_status(&change)
        .await
        .map_err(ApiError::server("supervisor/update-status"))?
        .ok_or_else(|| ApiError::NotFound("Call not found".to_string()))?;

    info!(call_id = %updated.call_id, status = %updated.status, "status updated");
    Ok(Json(updated))
}

async fn call_count_by_tag(State(state): State<AppState>) -> ApiResult<Vec<TagCount>> {
    let rows = state
        .store
        .call_count_by_tag()
        .await
        .map_err(ApiError::server("call-count-by-tag"))?;
    Ok(Json(rows))
}

async fn sentiment_by_tag() -> Json<Vec<TagSentimentCount>> {
    Json(metrics::sentiment_by_tag_reference())
}

async fn escalation_by_tag(State(state): State<AppState>) -> ApiResult<Vec<TagCount>> {
    let rows = state
        .store
        .escalation_by_tag()
        .await
        .map_err(ApiError::server("escalation-by-tag"))?;
    Ok(Json(rows))
}
