use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::escalation::{self, StatusChange};
use crate::metrics::{
    AGENT_TOP_TAGS, BUSINESS_TOP_TAGS, ESCALATION_TOP_TAGS, HEATMAP_TOP_TAGS, LEADERBOARD_SIZE,
    RECENT_CALLS, RECENT_ESCALATIONS, SUPERVISOR_ESCALATIONS,
};
use crate::models::{
    AgentComparison, AgentInsight, AgentPerformance, DailyVolume, EscalationView,
    LeaderboardEntry, RecentCall, RecentEscalation, SentimentCount, StatusUpdate, TagCount,
    TagSentimentCount,
};
use crate::store::{MetricsStore, StoreResult};

/// Postgres-backed store over the `vocalytics` schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens a pool whose sessions run in UTC so `CURRENT_DATE` agrees with
    /// the dates derived in Rust.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET TIME ZONE 'UTC'").await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;

        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        ("S100", "Morgan Reyes", "morgan.reyes@vocalytics.ai", "supervisor", None),
        ("A101", "Avery Lee", "avery.lee@vocalytics.ai", "agent", Some("S100")),
        ("A102", "Jules Moreno", "jules.moreno@vocalytics.ai", "agent", Some("S100")),
        ("A103", "Kiara Patel", "kiara.patel@vocalytics.ai", "agent", Some("S100")),
    ];

    for (user_id, name, email, role, supervisor_id) in users {
        sqlx::query(
            r#"
            INSERT INTO vocalytics.users (user_id, name, email, role, supervisor_id, team_name)
            VALUES ($1, $2, $3, $4, $5, 'Retail Banking')
            ON CONFLICT (user_id) DO UPDATE
            SET name = EXCLUDED.name, supervisor_id = EXCLUDED.supervisor_id
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(supervisor_id)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();
    let calls = vec![
        ("C1001", "A101", 312, "English", "positive", 0.82, vec!["credit card", "billing"], 0),
        ("C1002", "A101", 198, "English", "neutral", 0.51, vec!["online banking"], 0),
        ("C1003", "A101", 421, "Spanish", "negative", 0.18, vec!["billing", "urgent"], 2),
        ("C1004", "A102", 260, "English", "positive", 0.77, vec!["auto loan"], 1),
        ("C1005", "A102", 505, "English", "negative", 0.22, vec!["interest rate", "billing"], 3),
        ("C1006", "A103", 143, "English", "positive", 0.91, vec!["credit score"], 0),
        ("C1007", "A103", 377, "Hindi", "neutral", 0.48, vec!["online banking", "urgent"], 5),
    ];

    for (call_id, user_id, duration, language, sentiment, score, tags, days_ago) in calls {
        sqlx::query(
            r#"
            INSERT INTO vocalytics.calls (call_id, user_id, duration_sec, language, call_type)
            VALUES ($1, $2, $3, $4, 'inbound')
            ON CONFLICT (call_id) DO NOTHING
            "#,
        )
        .bind(call_id)
        .bind(user_id)
        .bind(duration)
        .bind(language)
        .execute(pool)
        .await?;

        let tags: Vec<String> = tags.into_iter().map(str::to_string).collect();
        sqlx::query(
            r#"
            INSERT INTO vocalytics.call_sentiments
            (call_id, overall_sentiment, sentiment_score, conversation_tags, analyzed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (call_id) DO NOTHING
            "#,
        )
        .bind(call_id)
        .bind(sentiment)
        .bind(score)
        .bind(Json(tags))
        .bind(now - Duration::days(days_ago))
        .execute(pool)
        .await?;
    }

    let escalations = vec![
        ("E501", "C1003", "A101", "Customer disputes late fee", "Waive fee", "Open", 2, None),
        ("E502", "C1005", "A102", "Rate quoted incorrectly", "Callback with corrected quote", "InProgress", 3, Some(1)),
        ("E503", "C1007", "A103", "Locked out of online banking", "Reset credentials", "Closed", 5, Some(4)),
    ];

    for (escalation_id, call_id, agent_id, reason, action, status, created_days, actioned_days) in
        escalations
    {
        let last_actioned: Option<DateTime<Utc>> =
            actioned_days.map(|days: i64| now - Duration::days(days));
        sqlx::query(
            r#"
            INSERT INTO vocalytics.escalations
            (escalation_id, call_id, agent_id, supervisor_id, escalation_reason,
             possible_action, created_at, status, last_actioned_at)
            VALUES ($1, $2, $3, 'S100', $4, $5, $6, $7, $8)
            ON CONFLICT (escalation_id) DO NOTHING
            "#,
        )
        .bind(escalation_id)
        .bind(call_id)
        .bind(agent_id)
        .bind(reason)
        .bind(action)
        .bind(now - Duration::days(created_days))
        .bind(status)
        .bind(last_actioned)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO vocalytics.agents_ai_insights
        (user_id, strengths, area_of_improvement, action_items, generated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind("A101")
    .bind("Calm tone under pressure")
    .bind("Explaining fee structures")
    .bind("Review the fee schedule\nConfirm resolution before closing")
    .execute(pool)
    .await?;

    let leaderboard = vec![
        ("Kiara Patel", 2, 1, 0, 0.75, 1),
        ("Avery Lee", 3, 1, 1, 0.5, 2),
        ("Jules Moreno", 2, 1, 1, 0.5, 2),
    ];

    for (user_name, total, positive, negative, score, rank) in leaderboard {
        sqlx::query(
            r#"
            INSERT INTO vocalytics.leaderboard
            (user_name, total_calls, positive_calls, negative_calls, performance_score, rank)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_name) DO UPDATE
            SET total_calls = EXCLUDED.total_calls, positive_calls = EXCLUDED.positive_calls,
                negative_calls = EXCLUDED.negative_calls,
                performance_score = EXCLUDED.performance_score, rank = EXCLUDED.rank
            "#,
        )
        .bind(user_name)
        .bind(total)
        .bind(positive)
        .bind(negative)
        .bind(score)
        .bind(rank)
        .execute(pool)
        .await?;
    }

    info!("seed data written");
    Ok(())
}

/// Loads analysed calls from CSV. Tags are `|`-separated; rows whose call
/// already has a sentiment record are skipped.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        call_id: Option<String>,
        user_id: String,
        duration_sec: i32,
        language: String,
        overall_sentiment: String,
        sentiment_score: f64,
        conversation_tags: String,
        analyzed_at: DateTime<Utc>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let call_id = row
            .call_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let tags: Vec<String> = row
            .conversation_tags
            .split('|')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        sqlx::query(
            r#"
            INSERT INTO vocalytics.calls (call_id, user_id, duration_sec, language)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (call_id) DO NOTHING
            "#,
        )
        .bind(&call_id)
        .bind(&row.user_id)
        .bind(row.duration_sec)
        .bind(&row.language)
        .execute(pool)
        .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO vocalytics.call_sentiments
            (call_id, overall_sentiment, sentiment_score, conversation_tags, analyzed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (call_id) DO NOTHING
            "#,
        )
        .bind(&call_id)
        .bind(&row.overall_sentiment)
        .bind(row.sentiment_score)
        .bind(Json(tags))
        .bind(row.analyzed_at)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[derive(sqlx::FromRow)]
struct EscalationRecord {
    call_id: String,
    agent_id: String,
    escalation_reason: String,
    possible_action: Option<String>,
    escalation_id: String,
    status: String,
    name: String,
    created_at: DateTime<Utc>,
    last_actioned_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl MetricsStore for PgStore {
    async fn calls_today(&self, agent_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM vocalytics.calls
            WHERE user_id = $1
              AND call_id IN (
                SELECT call_id FROM vocalytics.call_sentiments
                WHERE DATE(analyzed_at) = CURRENT_DATE
              )
            "#,
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn weekly_volume(&self, agent_id: &str) -> StoreResult<Vec<DailyVolume>> {
        let rows = sqlx::query_as::<_, DailyVolume>(
            r#"
            SELECT DATE(cs.analyzed_at) AS day, COUNT(*) AS count
            FROM vocalytics.call_sentiments cs
            JOIN vocalytics.calls c ON cs.call_id = c.call_id
            WHERE c.user_id = $1
              AND cs.analyzed_at >= CURRENT_DATE - INTERVAL '7 days'
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn performance_score(&self, agent_id: &str) -> StoreResult<Option<f64>> {
        let score: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT ROUND(AVG(CASE
                WHEN cs.overall_sentiment = 'positive' THEN 1.0
                WHEN cs.overall_sentiment = 'neutral' THEN 0.5
                ELSE 0 END), 2)::FLOAT8
            FROM vocalytics.calls c
            JOIN vocalytics.call_sentiments cs ON c.call_id = cs.call_id
            WHERE c.user_id = $1
              AND cs.analyzed_at >= date_trunc('month', CURRENT_DATE)
            "#,
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(score)
    }

    async fn leaderboard_rank(&self, agent_id: &str) -> StoreResult<Option<i64>> {
        let rank: Option<i64> = sqlx::query_scalar(
            r#"
            WITH scores AS (
                SELECT c.user_id, COUNT(*) AS call_volume
                FROM vocalytics.calls c
                JOIN vocalytics.call_sentiments cs ON c.call_id = cs.call_id
                WHERE cs.analyzed_at >= date_trunc('month', CURRENT_DATE)
                GROUP BY c.user_id
            ),
            ranked AS (
                SELECT user_id, RANK() OVER (ORDER BY call_volume DESC) AS rank
                FROM scores
            )
            SELECT rank FROM ranked WHERE user_id = $1
            "#,
        )
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rank)
    }

    async fn sentiment_distribution(&self, agent_id: &str) -> StoreResult<Vec<SentimentCount>> {
        let rows = sqlx::query_as::<_, SentimentCount>(
            r#"
            SELECT cs.overall_sentiment, COUNT(*) AS count
            FROM vocalytics.call_sentiments cs
            JOIN vocalytics.calls c ON cs.call_id = c.call_id
            WHERE c.user_id = $1
            GROUP BY cs.overall_sentiment
            ORDER BY cs.overall_sentiment
            "#,
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn calls_by_tag(&self, agent_id: &str) -> StoreResult<Vec<TagCount>> {
        let rows = sqlx::query_as::<_, TagCount>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM (
                SELECT jsonb_array_elements_text(cs.conversation_tags) AS tag
                FROM vocalytics.call_sentiments cs
                JOIN vocalytics.calls c ON cs.call_id = c.call_id
                WHERE c.user_id = $1
            ) t
            GROUP BY tag
            ORDER BY count DESC, tag
            LIMIT $2
            "#,
        )
        .bind(agent_id)
        .bind(AGENT_TOP_TAGS as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn recent_escalations(&self, agent_id: &str) -> StoreResult<Vec<RecentEscalation>> {
        let rows = sqlx::query_as::<_, RecentEscalation>(
            r#"
            SELECT call_id, escalation_reason, possible_action, created_at
            FROM vocalytics.escalations
            WHERE agent_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(agent_id)
        .bind(RECENT_ESCALATIONS as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn recent_calls(&self, agent_id: &str) -> StoreResult<Vec<RecentCall>> {
        let rows = sqlx::query_as::<_, RecentCall>(
            r#"
            SELECT c.call_id, c.duration_sec, c.language, cs.overall_sentiment, cs.analyzed_at
            FROM vocalytics.calls c
            JOIN vocalytics.call_sentiments cs ON c.call_id = cs.call_id
            WHERE c.user_id = $1
            ORDER BY cs.analyzed_at DESC
            LIMIT $2
            "#,
        )
        .bind(agent_id)
        .bind(RECENT_CALLS as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn agent_insights(&self, agent_id: &str) -> StoreResult<Vec<AgentInsight>> {
        let rows = sqlx::query_as::<_, AgentInsight>(
            r#"
            SELECT user_id, strengths, area_of_improvement, action_items
            FROM vocalytics.agents_ai_insights
            WHERE user_id = $1
            "#,
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn team_calls_today(&self, supervisor_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM vocalytics.calls
            WHERE user_id IN (
                SELECT user_id FROM vocalytics.users WHERE supervisor_id = $1
            )
              AND call_id IN (
                SELECT call_id FROM vocalytics.call_sentiments
                WHERE DATE(analyzed_at) = CURRENT_DATE
              )
            "#,
        )
        .bind(supervisor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn team_weekly_volume(&self, supervisor_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM vocalytics.call_sentiments cs
            JOIN vocalytics.calls c ON cs.call_id = c.call_id
            WHERE c.user_id IN (
                SELECT user_id FROM vocalytics.users WHERE supervisor_id = $1
            )
              AND cs.analyzed_at >= CURRENT_DATE - INTERVAL '7 days'
            "#,
        )
        .bind(supervisor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn monthly_escalations(&self, supervisor_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM vocalytics.escalations
            WHERE supervisor_id = $1
              AND created_at >= date_trunc('month', CURRENT_DATE)
            "#,
        )
        .bind(supervisor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn agent_performance(&self, supervisor_id: &str) -> StoreResult<Vec<AgentPerformance>> {
        let rows = sqlx::query_as::<_, AgentPerformance>(
            r#"
            SELECT u.name,
                   COUNT(cs.call_id) AS total_calls,
                   SUM(CASE WHEN cs.overall_sentiment = 'positive' THEN 1 ELSE 0 END)::BIGINT
                       AS positive_calls,
                   SUM(CASE WHEN cs.overall_sentiment = 'negative' THEN 1 ELSE 0 END)::BIGINT
                       AS negative_calls
            FROM vocalytics.users u
            JOIN vocalytics.calls c ON u.user_id = c.user_id
            JOIN vocalytics.call_sentiments cs ON c.call_id = cs.call_id
            WHERE u.supervisor_id = $1
            GROUP BY u.user_id, u.name
            ORDER BY u.name
            "#,
        )
        .bind(supervisor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn tag_sentiment_heatmap(
        &self,
        supervisor_id: &str,
    ) -> StoreResult<Vec<TagSentimentCount>> {
        let rows = sqlx::query_as::<_, TagSentimentCount>(
            r#"
            WITH team_tags AS (
                SELECT jsonb_array_elements_text(cs.conversation_tags) AS tag,
                       cs.overall_sentiment
                FROM vocalytics.call_sentiments cs
                JOIN vocalytics.calls c ON cs.call_id = c.call_id
                WHERE c.user_id IN (
                    SELECT user_id FROM vocalytics.users WHERE supervisor_id = $1
                )
            ),
            top_tags AS (
                SELECT tag
                FROM team_tags
                GROUP BY tag
                ORDER BY COUNT(*) DESC, tag
                LIMIT $2
            )
            SELECT tag, overall_sentiment, COUNT(*) AS count
            FROM team_tags
            WHERE tag IN (SELECT tag FROM top_tags)
            GROUP BY tag, overall_sentiment
            ORDER BY tag, overall_sentiment
            "#,
        )
        .bind(supervisor_id)
        .bind(HEATMAP_TOP_TAGS as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn team_sentiment(&self, supervisor_id: &str) -> StoreResult<Vec<SentimentCount>> {
        let rows = sqlx::query_as::<_, SentimentCount>(
            r#"
            SELECT cs.overall_sentiment, COUNT(*) AS count
            FROM vocalytics.call_sentiments cs
            JOIN vocalytics.calls c ON cs.call_id = c.call_id
            WHERE c.user_id IN (
                SELECT user_id FROM vocalytics.users WHERE supervisor_id = $1
            )
            GROUP BY cs.overall_sentiment
            ORDER BY cs.overall_sentiment
            "#,
        )
        .bind(supervisor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn supervisor_escalations(
        &self,
        supervisor_id: &str,
    ) -> StoreResult<Vec<EscalationView>> {
        let records = sqlx::query_as::<_, EscalationRecord>(
            r#"
            SELECT e.call_id, e.agent_id, e.escalation_reason, e.possible_action,
                   e.escalation_id, e.status, u.name, e.created_at, e.last_actioned_at
            FROM vocalytics.escalations e
            JOIN vocalytics.users u ON u.user_id = e.agent_id
            WHERE e.supervisor_id = $1
            ORDER BY e.call_id ASC
            LIMIT $2
            "#,
        )
        .bind(supervisor_id)
        .bind(SUPERVISOR_ESCALATIONS as i64)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        Ok(records
            .into_iter()
            .map(|r| EscalationView {
                status_display: escalation::status_display(
                    &r.status,
                    r.created_at,
                    r.last_actioned_at,
                    today,
                ),
                call_id: r.call_id,
                agent_id: r.agent_id,
                escalation_reason: r.escalation_reason,
                possible_action: r.possible_action,
                escalation_id: r.escalation_id,
                status: r.status,
                name: r.name,
            })
            .collect())
    }

    async fn leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        let rows = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT user_name AS name,
                   positive_calls::BIGINT AS positive_calls,
                   negative_calls::BIGINT AS negative_calls,
                   rank::BIGINT AS rank,
                   performance_score::FLOAT8 AS performance_score
            FROM vocalytics.leaderboard
            ORDER BY rank ASC
            LIMIT $1
            "#,
        )
        .bind(LEADERBOARD_SIZE as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn compare_agents(&self, first: &str, second: &str) -> StoreResult<Vec<AgentComparison>> {
        let rows = sqlx::query_as::<_, AgentComparison>(
            r#"
            SELECT u.name,
                   COUNT(cs.call_id) AS call_count,
                   AVG(cs.sentiment_score)::FLOAT8 AS avg_sentiment,
                   SUM(CASE WHEN cs.overall_sentiment = 'negative' THEN 1 ELSE 0 END)::BIGINT
                       AS negative_calls
            FROM vocalytics.users u
            JOIN vocalytics.calls c ON u.user_id = c.user_id
            JOIN vocalytics.call_sentiments cs ON c.call_id = cs.call_id
            WHERE u.user_id IN ($1, $2)
            GROUP BY u.user_id, u.name
            ORDER BY u.name
            "#,
        )
        .bind(first)
        .bind(second)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn call_count_by_tag(&self) -> StoreResult<Vec<TagCount>> {
        let rows = sqlx::query_as::<_, TagCount>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM (
                SELECT jsonb_array_elements_text(conversation_tags) AS tag
                FROM vocalytics.call_sentiments
            ) AS tag_data
            GROUP BY tag
            ORDER BY count DESC, tag
            LIMIT $1
            "#,
        )
        .bind(BUSINESS_TOP_TAGS as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn escalation_by_tag(&self) -> StoreResult<Vec<TagCount>> {
        let rows = sqlx::query_as::<_, TagCount>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM (
                SELECT jsonb_array_elements_text(cs.conversation_tags) AS tag
                FROM vocalytics.call_sentiments cs
                JOIN vocalytics.escalations e ON cs.call_id = e.call_id
            ) AS tag_escalations
            GROUP BY tag
            ORDER BY count DESC, tag
            LIMIT $1
            "#,
        )
        .bind(ESCALATION_TOP_TAGS as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_escalation_status(
        &self,
        change: &StatusChange,
    ) -> StoreResult<Option<StatusUpdate>> {
        let updated = sqlx::query_as::<_, StatusUpdate>(
            r#"
            UPDATE vocalytics.escalations
            SET status = $1, last_actioned_at = NOW()
            WHERE call_id = $2
            RETURNING call_id, status, last_actioned_at
            "#,
        )
        .bind(change.new_status())
        .bind(change.call_id())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(update) = &updated {
            debug!(call_id = %update.call_id, "escalation row updated");
        }
        Ok(updated)
    }
}
