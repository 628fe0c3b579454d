//! Typed accessors over the aggregation service.
//!
//! Every accessor settles to a value: failures are logged and replaced with
//! `0` or an empty collection, so callers cannot tell "no data" apart from
//! "request failed".

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::models::{
    AgentComparison, AgentInsight, AgentPerformance, CountResponse, DailyVolume, EscalationView,
    EscalationsEnvelope, InsightsEnvelope, LeaderboardEntry, RankResponse, RecentCall,
    RecentCallsEnvelope, RecentEscalation, ScoreResponse, SentimentCount, SentimentEnvelope,
    StatusUpdate, TagCallsEnvelope, TagCount, TagSentimentCount,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("base url cannot carry a path: {0}")]
    BaseUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ReportingClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ReportingClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ClientError::BaseUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn agent(&self) -> AgentApi<'_> {
        AgentApi { client: self }
    }

    pub fn supervisor(&self) -> SupervisorApi<'_> {
        SupervisorApi { client: self }
    }

    pub fn business(&self) -> BusinessApi<'_> {
        BusinessApi { client: self }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

fn settle<T: Default>(endpoint: &str, result: Result<T, ClientError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(endpoint, error = %err, "reporting request failed, using default");
            T::default()
        }
    }
}

pub struct AgentApi<'a> {
    client: &'a ReportingClient,
}

impl AgentApi<'_> {
    pub async fn calls_today(&self, agent_id: &str) -> i64 {
        let result = self
            .client
            .get::<CountResponse>(&["calls-today", agent_id], &[])
            .await
            .map(|r| r.count);
        settle("calls-today", result)
    }

    pub async fn weekly_volume(&self, agent_id: &str) -> Vec<DailyVolume> {
        let result = self.client.get(&["weekly-volume", agent_id], &[]).await;
        settle("weekly-volume", result)
    }

    pub async fn performance_score(&self, agent_id: &str) -> f64 {
        let result = self
            .client
            .get::<ScoreResponse>(&["performance-score", agent_id], &[])
            .await
            .map(|r| r.score.unwrap_or_default());
        settle("performance-score", result)
    }

    pub async fn leaderboard_rank(&self, agent_id: &str) -> i64 {
        let result = self
            .client
            .get::<RankResponse>(&["leaderboard-rank", agent_id], &[])
            .await
            .map(|r| r.rank.unwrap_or_default());
        settle("leaderboard-rank", result)
    }

    pub async fn sentiment_distribution(&self, agent_id: &str) -> Vec<SentimentCount> {
        let result = self
            .client
            .get::<SentimentEnvelope>(&["sentiment-distribution", agent_id], &[])
            .await
            .map(|r| r.sentiment);
        settle("sentiment-distribution", result)
    }

    pub async fn calls_by_tag(&self, agent_id: &str) -> Vec<TagCount> {
        let result = self
            .client
            .get::<TagCallsEnvelope>(&["calls-by-tag", agent_id], &[])
            .await
            .map(|r| r.calls);
        settle("calls-by-tag", result)
    }

    pub async fn recent_escalations(&self, agent_id: &str) -> Vec<RecentEscalation> {
        let result = self
            .client
            .get::<EscalationsEnvelope>(&["recent-escalations", agent_id], &[])
            .await
            .map(|r| r.escalations);
        settle("recent-escalations", result)
    }

    pub async fn recent_calls(&self, agent_id: &str) -> Vec<RecentCall> {
        let result = self
            .client
            .get::<RecentCallsEnvelope>(&["recent-calls", agent_id], &[])
            .await
            .map(|r| r.calls);
        settle("recent-calls", result)
    }

    pub async fn insights(&self, agent_id: &str) -> Vec<AgentInsight> {
        let result = self
            .client
            .get::<InsightsEnvelope>(&["agent-insights", agent_id], &[])
            .await
            .map(|r| r.insights);
        settle("agent-insights", result)
    }
}

pub struct SupervisorApi<'a> {
    client: &'a ReportingClient,
}

impl SupervisorApi<'_> {
    pub async fn calls_today(&self, supervisor_id: &str) -> i64 {
        let result = self
            .client
            .get::<CountResponse>(&["supervisor", "calls-today", supervisor_id], &[])
            .await
            .map(|r| r.count);
        settle("supervisor/calls-today", result)
    }

    pub async fn weekly_volume(&self, supervisor_id: &str) -> i64 {
        let result = self
            .client
            .get::<CountResponse>(&["supervisor", "weekly-volume", supervisor_id], &[])
            .await
            .map(|r| r.count);
        settle("supervisor/weekly-volume", result)
    }

    pub async fn monthly_escalations(&self, supervisor_id: &str) -> i64 {
        let result = self
            .client
            .get::<CountResponse>(&["supervisor", "monthly-escalations", supervisor_id], &[])
            .await
            .map(|r| r.count);
        settle("supervisor/monthly-escalations", result)
    }

    pub async fn agent_performance(&self, supervisor_id: &str) -> Vec<AgentPerformance> {
        let result = self
            .client
            .get(&["supervisor", "agent-performance", supervisor_id], &[])
            .await;
        settle("supervisor/agent-performance", result)
    }

    pub async fn tag_sentiment_heatmap(&self, supervisor_id: &str) -> Vec<TagSentimentCount> {
        let result = self
            .client
            .get(&["supervisor", "tag-sentiment-heatmap", supervisor_id], &[])
            .await;
        settle("supervisor/tag-sentiment-heatmap", result)
    }

    pub async fn team_sentiment(&self, supervisor_id: &str) -> Vec<SentimentCount> {
        let result = self
            .client
            .get(&["supervisor", "team-sentiment", supervisor_id], &[])
            .await;
        settle("supervisor/team-sentiment", result)
    }

    pub async fn escalations(&self, supervisor_id: &str) -> Vec<EscalationView> {
        let result = self
            .client
            .get(&["supervisor", "escalations", supervisor_id], &[])
            .await;
        settle("supervisor/escalations", result)
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let result = self.client.get(&["supervisor", "learderboad"], &[]).await;
        settle("supervisor/learderboad", result)
    }

    pub async fn compare_agents(&self, first: &str, second: &str) -> Vec<AgentComparison> {
        let result = self
            .client
            .get(
                &["supervisor", "compare-agents"],
                &[("agent1", first), ("agent2", second)],
            )
            .await;
        settle("supervisor/compare-agents", result)
    }

    /// Returns the updated record, or `None` if the update failed for any reason.
    pub async fn update_status(&self, call_id: &str, new_status: &str) -> Option<StatusUpdate> {
        let body = json!({ "callId": call_id, "newStatus": new_status });
        let result = self
            .client
            .post::<_, StatusUpdate>(&["supervisor", "update-status"], &body)
            .await
            .map(Some);
        settle("supervisor/update-status", result)
    }
}

pub struct BusinessApi<'a> {
    client: &'a ReportingClient,
}

impl BusinessApi<'_> {
    pub async fn call_count_by_tag(&self) -> Vec<TagCount> {
        let result = self.client.get(&["call-count-by-tag"], &[]).await;
        settle("call-count-by-tag", result)
    }

    pub async fn sentiment_by_tag(&self) -> Vec<TagSentimentCount> {
        let result = self.client.get(&["sentiment-by-tag"], &[]).await;
        settle("sentiment-by-tag", result)
    }

    pub async fn escalation_by_tag(&self) -> Vec<TagCount> {
        let result = self.client.get(&["escalation-by-tag"], &[]).await;
        settle("escalation-by-tag", result)
    }
}
