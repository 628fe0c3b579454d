//! Aggregation queries behind the dashboard endpoints.
//!
//! Each method is one named operation with typed parameters. Time windows are
//! evaluated against the current time when the method runs.

use async_trait::async_trait;
use thiserror::Error;

use crate::escalation::StatusChange;
use crate::models::{
    AgentComparison, AgentInsight, AgentPerformance, DailyVolume, EscalationView,
    LeaderboardEntry, RecentCall, RecentEscalation, SentimentCount, StatusUpdate, TagCount,
    TagSentimentCount,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MetricsStore: Send + Sync {
    // Agent view.
    async fn calls_today(&self, agent_id: &str) -> StoreResult<i64>;
    async fn weekly_volume(&self, agent_id: &str) -> StoreResult<Vec<DailyVolume>>;
    async fn performance_score(&self, agent_id: &str) -> StoreResult<Option<f64>>;
    async fn leaderboard_rank(&self, agent_id: &str) -> StoreResult<Option<i64>>;
    async fn sentiment_distribution(&self, agent_id: &str) -> StoreResult<Vec<SentimentCount>>;
    async fn calls_by_tag(&self, agent_id: &str) -> StoreResult<Vec<TagCount>>;
    async fn recent_escalations(&self, agent_id: &str) -> StoreResult<Vec<RecentEscalation>>;
    async fn recent_calls(&self, agent_id: &str) -> StoreResult<Vec<RecentCall>>;
    async fn agent_insights(&self, agent_id: &str) -> StoreResult<Vec<AgentInsight>>;

    // Supervisor view, scoped to the supervisor's direct reports.
    async fn team_calls_today(&self, supervisor_id: &str) -> StoreResult<i64>;
    async fn team_weekly_volume(&self, supervisor_id: &str) -> StoreResult<i64>;
    async fn monthly_escalations(&self, supervisor_id: &str) -> StoreResult<i64>;
    async fn agent_performance(&self, supervisor_id: &str) -> StoreResult<Vec<AgentPerformance>>;
    async fn tag_sentiment_heatmap(&self, supervisor_id: &str)
        -> StoreResult<Vec<TagSentimentCount>>;
    async fn team_sentiment(&self, supervisor_id: &str) -> StoreResult<Vec<SentimentCount>>;
    async fn supervisor_escalations(&self, supervisor_id: &str) -> StoreResult<Vec<EscalationView>>;
    async fn leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>>;
    async fn compare_agents(&self, first: &str, second: &str) -> StoreResult<Vec<AgentComparison>>;

    // Business view.
    async fn call_count_by_tag(&self) -> StoreResult<Vec<TagCount>>;
    async fn escalation_by_tag(&self) -> StoreResult<Vec<TagCount>>;

    /// Sets the status of the escalation for `change.call_id()` and stamps
    /// `last_actioned_at`. `None` when no escalation matches.
    async fn update_escalation_status(&self, change: &StatusChange)
        -> StoreResult<Option<StatusUpdate>>;
}
