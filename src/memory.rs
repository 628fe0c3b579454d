//! In-process store over fixture records, with the same aggregation
//! semantics as the Postgres queries. Backs `serve --demo` and the tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use crate::escalation::{self, StatusChange};
use crate::metrics::{self, AGENT_TOP_TAGS, BUSINESS_TOP_TAGS, ESCALATION_TOP_TAGS};
use crate::metrics::{HEATMAP_TOP_TAGS, LEADERBOARD_SIZE, RECENT_CALLS, RECENT_ESCALATIONS};
use crate::metrics::SUPERVISOR_ESCALATIONS;
use crate::models::{
    AgentComparison, AgentInsight, AgentPerformance, Call, CallSentiment, DailyVolume, Escalation,
    EscalationView, LeaderboardEntry, RecentCall, RecentEscalation, SentimentCount, StatusUpdate,
    TagCount, TagSentimentCount, User,
};
use crate::store::{MetricsStore, StoreResult};

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub users: Vec<User>,
    pub calls: Vec<Call>,
    pub sentiments: Vec<CallSentiment>,
    pub escalations: Vec<Escalation>,
    pub insights: Vec<AgentInsight>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// A call joined with its sentiment analysis.
struct Analyzed<'a> {
    call: &'a Call,
    sentiment: &'a CallSentiment,
}

impl Dataset {
    fn analyzed(&self) -> Vec<Analyzed<'_>> {
        let calls: HashMap<&str, &Call> =
            self.calls.iter().map(|c| (c.call_id.as_str(), c)).collect();

        self.sentiments
            .iter()
            .filter_map(|sentiment| {
                calls
                    .get(sentiment.call_id.as_str())
                    .map(|call| Analyzed { call, sentiment })
            })
            .collect()
    }

    fn analyzed_for(&self, agent_id: &str) -> Vec<Analyzed<'_>> {
        self.analyzed()
            .into_iter()
            .filter(|a| a.call.user_id == agent_id)
            .collect()
    }

    fn team(&self, supervisor_id: &str) -> HashSet<&str> {
        self.users
            .iter()
            .filter(|u| u.supervisor_id.as_deref() == Some(supervisor_id))
            .map(|u| u.user_id.as_str())
            .collect()
    }

    fn analyzed_for_team(&self, supervisor_id: &str) -> Vec<Analyzed<'_>> {
        let team = self.team(supervisor_id);
        self.analyzed()
            .into_iter()
            .filter(|a| team.contains(a.call.user_id.as_str()))
            .collect()
    }

    /// Per-user sentiment tallies for users in `user_ids`, omitting users
    /// without analysed calls.
    fn tallies<'a>(&'a self, user_ids: &HashSet<&str>) -> Vec<(&'a User, Vec<&'a CallSentiment>)> {
        let mut by_user: HashMap<&str, Vec<&CallSentiment>> = HashMap::new();
        for a in self.analyzed() {
            if user_ids.contains(a.call.user_id.as_str()) {
                by_user.entry(a.call.user_id.as_str()).or_default().push(a.sentiment);
            }
        }

        let mut rows: Vec<(&User, Vec<&CallSentiment>)> = self
            .users
            .iter()
            .filter_map(|u| by_user.remove(u.user_id.as_str()).map(|s| (u, s)))
            .collect();
        rows.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        rows
    }
}

fn is_today(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    at.date_naive() == now.date_naive()
}

fn count_sentiment(sentiments: &[&CallSentiment], label: &str) -> i64 {
    sentiments.iter().filter(|s| s.overall_sentiment == label).count() as i64
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Copy of the current records, for inspection after updates.
    pub fn snapshot(&self) -> Dataset {
        self.data.read().clone()
    }

    /// A small supervised team with calls spread over the last week.
    pub fn demo() -> Self {
        let now = Utc::now();
        let user = |id: &str, name: &str, supervisor: Option<&str>| User {
            user_id: id.to_string(),
            name: name.to_string(),
            supervisor_id: supervisor.map(str::to_string),
        };

        let mut data = Dataset {
            users: vec![
                user("S100", "Morgan Reyes", None),
                user("A101", "Avery Lee", Some("S100")),
                user("A102", "Jules Moreno", Some("S100")),
                user("A103", "Kiara Patel", Some("S100")),
            ],
            ..Dataset::default()
        };

        let calls = [
            ("C1001", "A101", "positive", 0.82, &["credit card", "billing"][..], 0),
            ("C1002", "A101", "neutral", 0.51, &["online banking"][..], 0),
            ("C1003", "A101", "negative", 0.18, &["billing", "urgent"][..], 2),
            ("C1004", "A102", "positive", 0.77, &["auto loan"][..], 1),
            ("C1005", "A102", "negative", 0.22, &["interest rate", "billing"][..], 3),
            ("C1006", "A103", "positive", 0.91, &["credit score"][..], 0),
            ("C1007", "A103", "neutral", 0.48, &["online banking", "urgent"][..], 5),
        ];
        for (call_id, user_id, sentiment, score, tags, days_ago) in calls {
            data.calls.push(Call {
                call_id: call_id.to_string(),
                user_id: user_id.to_string(),
                duration_sec: 240,
                language: "English".to_string(),
            });
            data.sentiments.push(CallSentiment {
                call_id: call_id.to_string(),
                overall_sentiment: sentiment.to_string(),
                sentiment_score: score,
                conversation_tags: tags.iter().map(|t| t.to_string()).collect(),
                analyzed_at: now - Duration::days(days_ago),
            });
        }

        data.escalations.push(Escalation {
            escalation_id: "E501".to_string(),
            call_id: "C1003".to_string(),
            agent_id: "A101".to_string(),
            supervisor_id: "S100".to_string(),
            escalation_reason: "Customer disputes late fee".to_string(),
            possible_action: Some("Waive fee".to_string()),
            status: escalation::OPEN.to_string(),
            created_at: now - Duration::days(2),
            last_actioned_at: None,
        });
        data.escalations.push(Escalation {
            escalation_id: "E502".to_string(),
            call_id: "C1005".to_string(),
            agent_id: "A102".to_string(),
            supervisor_id: "S100".to_string(),
            escalation_reason: "Rate quoted incorrectly".to_string(),
            possible_action: Some("Callback with corrected quote".to_string()),
            status: escalation::IN_PROGRESS.to_string(),
            created_at: now - Duration::days(3),
            last_actioned_at: Some(now - Duration::days(1)),
        });

        data.insights.push(AgentInsight {
            user_id: "A101".to_string(),
            strengths: Some("Calm tone under pressure".to_string()),
            area_of_improvement: Some("Explaining fee structures".to_string()),
            action_items: Some("Review the fee schedule\nConfirm resolution before closing".to_string()),
        });

        data.leaderboard = vec![
            LeaderboardEntry {
                name: "Kiara Patel".to_string(),
                positive_calls: 1,
                negative_calls: 0,
                rank: 1,
                performance_score: 0.75,
            },
            LeaderboardEntry {
                name: "Avery Lee".to_string(),
                positive_calls: 1,
                negative_calls: 1,
                rank: 2,
                performance_score: 0.5,
            },
        ];

        Self::new(data)
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn calls_today(&self, agent_id: &str) -> StoreResult<i64> {
        let now = Utc::now();
        let data = self.data.read();
        let calls = data.analyzed_for(agent_id);
        Ok(calls
            .iter()
            .filter(|a| is_today(a.sentiment.analyzed_at, now))
            .count() as i64)
    }

    async fn weekly_volume(&self, agent_id: &str) -> StoreResult<Vec<DailyVolume>> {
        let cutoff = metrics::weekly_cutoff(Utc::now());
        let data = self.data.read();
        let calls = data.analyzed_for(agent_id);
        Ok(metrics::daily_volume(
            calls
                .iter()
                .map(|a| a.sentiment.analyzed_at)
                .filter(|at| *at >= cutoff),
        ))
    }

    async fn performance_score(&self, agent_id: &str) -> StoreResult<Option<f64>> {
        let start = metrics::month_start(Utc::now());
        let data = self.data.read();
        let calls = data.analyzed_for(agent_id);
        Ok(metrics::performance_score(
            calls
                .iter()
                .filter(|a| a.sentiment.analyzed_at >= start)
                .map(|a| a.sentiment.overall_sentiment.as_str()),
        ))
    }

    async fn leaderboard_rank(&self, agent_id: &str) -> StoreResult<Option<i64>> {
        let start = metrics::month_start(Utc::now());
        let data = self.data.read();

        let mut volumes: HashMap<String, i64> = HashMap::new();
        for a in data.analyzed() {
            if a.sentiment.analyzed_at >= start {
                *volumes.entry(a.call.user_id.clone()).or_insert(0) += 1;
            }
        }

        Ok(metrics::rank_by_volume(&volumes).get(agent_id).copied())
    }

    async fn sentiment_distribution(&self, agent_id: &str) -> StoreResult<Vec<SentimentCount>> {
        let data = self.data.read();
        let calls = data.analyzed_for(agent_id);
        Ok(metrics::count_by_sentiment(
            calls
                .iter()
                .map(|a| a.sentiment.overall_sentiment.as_str()),
        ))
    }

    async fn calls_by_tag(&self, agent_id: &str) -> StoreResult<Vec<TagCount>> {
        let data = self.data.read();
        let calls = data.analyzed_for(agent_id);
        Ok(metrics::top_tags(
            calls
                .iter()
                .map(|a| a.sentiment.conversation_tags.as_slice()),
            AGENT_TOP_TAGS,
        ))
    }

    async fn recent_escalations(&self, agent_id: &str) -> StoreResult<Vec<RecentEscalation>> {
        let data = self.data.read();
        let mut rows: Vec<&Escalation> = data
            .escalations
            .iter()
            .filter(|e| e.agent_id == agent_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(rows
            .into_iter()
            .take(RECENT_ESCALATIONS)
            .map(|e| RecentEscalation {
                call_id: e.call_id.clone(),
                escalation_reason: e.escalation_reason.clone(),
                possible_action: e.possible_action.clone(),
                created_at: e.created_at,
            })
            .collect())
    }

    async fn recent_calls(&self, agent_id: &str) -> StoreResult<Vec<RecentCall>> {
        let data = self.data.read();
        let mut rows = data.analyzed_for(agent_id);
        rows.sort_by(|a, b| b.sentiment.analyzed_at.cmp(&a.sentiment.analyzed_at));

        Ok(rows
            .into_iter()
            .take(RECENT_CALLS)
            .map(|a| RecentCall {
                call_id: a.call.call_id.clone(),
                duration_sec: a.call.duration_sec,
                language: a.call.language.clone(),
                overall_sentiment: a.sentiment.overall_sentiment.clone(),
                analyzed_at: a.sentiment.analyzed_at,
            })
            .collect())
    }

    async fn agent_insights(&self, agent_id: &str) -> StoreResult<Vec<AgentInsight>> {
        let data = self.data.read();
        Ok(data
            .insights
            .iter()
            .filter(|i| i.user_id == agent_id)
            .cloned()
            .collect())
    }

    async fn team_calls_today(&self, supervisor_id: &str) -> StoreResult<i64> {
        let now = Utc::now();
        let data = self.data.read();
        let calls = data.analyzed_for_team(supervisor_id);
        Ok(calls
            .iter()
            .filter(|a| is_today(a.sentiment.analyzed_at, now))
            .count() as i64)
    }

    async fn team_weekly_volume(&self, supervisor_id: &str) -> StoreResult<i64> {
        let cutoff = metrics::weekly_cutoff(Utc::now());
        let data = self.data.read();
        let calls = data.analyzed_for_team(supervisor_id);
        Ok(calls
            .iter()
            .filter(|a| a.sentiment.analyzed_at >= cutoff)
            .count() as i64)
    }

    async fn monthly_escalations(&self, supervisor_id: &str) -> StoreResult<i64> {
        let start = metrics::month_start(Utc::now());
        let data = self.data.read();
        Ok(data
            .escalations
            .iter()
            .filter(|e| e.supervisor_id == supervisor_id && e.created_at >= start)
            .count() as i64)
    }

    async fn agent_performance(&self, supervisor_id: &str) -> StoreResult<Vec<AgentPerformance>> {
        let data = self.data.read();
        let team = data.team(supervisor_id);
        let tallies = data.tallies(&team);

        Ok(tallies
            .into_iter()
            .map(|(user, sentiments)| AgentPerformance {
                name: user.name.clone(),
                total_calls: sentiments.len() as i64,
                positive_calls: count_sentiment(&sentiments, "positive"),
                negative_calls: count_sentiment(&sentiments, "negative"),
            })
            .collect())
    }

    async fn tag_sentiment_heatmap(
        &self,
        supervisor_id: &str,
    ) -> StoreResult<Vec<TagSentimentCount>> {
        let data = self.data.read();
        let calls = data.analyzed_for_team(supervisor_id);
        let rows: Vec<(&[String], &str)> = calls
            .iter()
            .map(|a| {
                (
                    a.sentiment.conversation_tags.as_slice(),
                    a.sentiment.overall_sentiment.as_str(),
                )
            })
            .collect();

        Ok(metrics::tag_sentiment_heatmap(rows, HEATMAP_TOP_TAGS))
    }

    async fn team_sentiment(&self, supervisor_id: &str) -> StoreResult<Vec<SentimentCount>> {
        let data = self.data.read();
        let calls = data.analyzed_for_team(supervisor_id);
        Ok(metrics::count_by_sentiment(
            calls
                .iter()
                .map(|a| a.sentiment.overall_sentiment.as_str()),
        ))
    }

    async fn supervisor_escalations(
        &self,
        supervisor_id: &str,
    ) -> StoreResult<Vec<EscalationView>> {
        let today = Utc::now().date_naive();
        let data = self.data.read();
        let names: HashMap<&str, &str> = data
            .users
            .iter()
            .map(|u| (u.user_id.as_str(), u.name.as_str()))
            .collect();

        let mut rows: Vec<EscalationView> = data
            .escalations
            .iter()
            .filter(|e| e.supervisor_id == supervisor_id)
            .filter_map(|e| {
                names.get(e.agent_id.as_str()).map(|name| EscalationView {
                    call_id: e.call_id.clone(),
                    agent_id: e.agent_id.clone(),
                    escalation_reason: e.escalation_reason.clone(),
                    possible_action: e.possible_action.clone(),
                    escalation_id: e.escalation_id.clone(),
                    status: e.status.clone(),
                    name: name.to_string(),
                    status_display: escalation::status_display(
                        &e.status,
                        e.created_at,
                        e.last_actioned_at,
                        today,
                    ),
                })
            })
            .collect();

        rows.sort_by(|a, b| a.call_id.cmp(&b.call_id));
        rows.truncate(SUPERVISOR_ESCALATIONS);
        Ok(rows)
    }

    async fn leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        let data = self.data.read();
        let mut rows = data.leaderboard.clone();
        rows.sort_by_key(|entry| entry.rank);
        rows.truncate(LEADERBOARD_SIZE);
        Ok(rows)
    }

    async fn compare_agents(&self, first: &str, second: &str) -> StoreResult<Vec<AgentComparison>> {
        let data = self.data.read();
        let ids: HashSet<&str> = [first, second].into_iter().collect();
        let tallies = data.tallies(&ids);

        Ok(tallies
            .into_iter()
            .map(|(user, sentiments)| AgentComparison {
                name: user.name.clone(),
                call_count: sentiments.len() as i64,
                avg_sentiment: Some(
                    sentiments.iter().map(|s| s.sentiment_score).sum::<f64>()
                        / sentiments.len() as f64,
                ),
                negative_calls: count_sentiment(&sentiments, "negative"),
            })
            .collect())
    }

    async fn call_count_by_tag(&self) -> StoreResult<Vec<TagCount>> {
        let data = self.data.read();
        Ok(metrics::top_tags(
            data.sentiments.iter().map(|s| s.conversation_tags.as_slice()),
            BUSINESS_TOP_TAGS,
        ))
    }

    async fn escalation_by_tag(&self) -> StoreResult<Vec<TagCount>> {
        let data = self.data.read();
        let sentiments: HashMap<&str, &CallSentiment> = data
            .sentiments
            .iter()
            .map(|s| (s.call_id.as_str(), s))
            .collect();

        // One row per escalation, so a call escalated twice counts twice.
        Ok(metrics::top_tags(
            data.escalations
                .iter()
                .filter_map(|e| sentiments.get(e.call_id.as_str()))
                .map(|s| s.conversation_tags.as_slice()),
            ESCALATION_TOP_TAGS,
        ))
    }

    async fn update_escalation_status(
        &self,
        change: &StatusChange,
    ) -> StoreResult<Option<StatusUpdate>> {
        let now = Utc::now();
        let mut data = self.data.write();

        let mut updated = None;
        for record in data
            .escalations
            .iter_mut()
            .filter(|e| e.call_id == change.call_id())
        {
            let update = change.apply(record, now);
            updated.get_or_insert(update);
        }

        Ok(updated)
    }
}
