use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Store records. These mirror the `vocalytics` relations one-to-one.

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub supervisor_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub call_id: String,
    pub user_id: String,
    pub duration_sec: i32,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct CallSentiment {
    pub call_id: String,
    pub overall_sentiment: String,
    pub sentiment_score: f64,
    pub conversation_tags: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Escalation {
    pub escalation_id: String,
    pub call_id: String,
    pub agent_id: String,
    pub supervisor_id: String,
    pub escalation_reason: String,
    pub possible_action: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_actioned_at: Option<DateTime<Utc>>,
}

/// Precomputed coaching notes for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentInsight {
    pub user_id: String,
    pub strengths: Option<String>,
    pub area_of_improvement: Option<String>,
    pub action_items: Option<String>,
}

impl AgentInsight {
    /// Action items are stored newline-delimited; blank lines are dropped.
    pub fn action_item_list(&self) -> Vec<&str> {
        self.action_items
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    #[serde(alias = "Name")]
    pub name: String,
    pub positive_calls: i64,
    pub negative_calls: i64,
    pub rank: i64,
    pub performance_score: f64,
}

// Aggregation rows.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyVolume {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SentimentCount {
    pub overall_sentiment: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagSentimentCount {
    pub tag: String,
    pub overall_sentiment: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecentEscalation {
    pub call_id: String,
    pub escalation_reason: String,
    pub possible_action: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecentCall {
    pub call_id: String,
    pub duration_sec: i32,
    pub language: String,
    pub overall_sentiment: String,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentPerformance {
    pub name: String,
    pub total_calls: i64,
    pub positive_calls: i64,
    pub negative_calls: i64,
}

/// Supervisor escalation row with the derived `status_display` label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationView {
    pub call_id: String,
    pub agent_id: String,
    pub escalation_reason: String,
    pub possible_action: Option<String>,
    pub escalation_id: String,
    pub status: String,
    pub name: String,
    pub status_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentComparison {
    pub name: String,
    pub call_count: i64,
    pub avg_sentiment: Option<f64>,
    pub negative_calls: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusUpdate {
    pub call_id: String,
    pub status: String,
    pub last_actioned_at: DateTime<Utc>,
}

// Response envelopes shared by the service and the client.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankResponse {
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentEnvelope {
    pub sentiment: Vec<SentimentCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCallsEnvelope {
    pub calls: Vec<TagCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCallsEnvelope {
    pub calls: Vec<RecentCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationsEnvelope {
    pub escalations: Vec<RecentEscalation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsEnvelope {
    pub insights: Vec<AgentInsight>,
}
