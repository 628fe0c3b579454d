use std::fmt::Write;

use chrono::NaiveDate;

use crate::escalation;
use crate::models::{AgentPerformance, EscalationView, SentimentCount};
use crate::store::{MetricsStore, StoreResult};

/// Supervisor metrics gathered for one report.
#[derive(Debug, Clone, Default)]
pub struct TeamSnapshot {
    pub calls_today: i64,
    pub weekly_calls: i64,
    pub monthly_escalations: i64,
    pub sentiment: Vec<SentimentCount>,
    pub performance: Vec<AgentPerformance>,
    pub escalations: Vec<EscalationView>,
}

impl TeamSnapshot {
    pub async fn collect(store: &dyn MetricsStore, supervisor_id: &str) -> StoreResult<Self> {
        Ok(Self {
            calls_today: store.team_calls_today(supervisor_id).await?,
            weekly_calls: store.team_weekly_volume(supervisor_id).await?,
            monthly_escalations: store.monthly_escalations(supervisor_id).await?,
            sentiment: store.team_sentiment(supervisor_id).await?,
            performance: store.agent_performance(supervisor_id).await?,
            escalations: store.supervisor_escalations(supervisor_id).await?,
        })
    }
}

fn share(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

pub fn build_report(supervisor_id: &str, generated_on: NaiveDate, snapshot: &TeamSnapshot) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Team Call Report");
    let _ = writeln!(
        output,
        "Generated for supervisor {} on {}",
        supervisor_id, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Volume");
    let _ = writeln!(output, "- Calls today: {}", snapshot.calls_today);
    let _ = writeln!(output, "- Calls in the last 7 days: {}", snapshot.weekly_calls);
    let _ = writeln!(
        output,
        "- Escalations this month: {}",
        snapshot.monthly_escalations
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Team Sentiment");

    let total: i64 = snapshot.sentiment.iter().map(|s| s.count).sum();
    if snapshot.sentiment.is_empty() {
        let _ = writeln!(output, "No analysed calls for this team.");
    } else {
        for row in snapshot.sentiment.iter() {
            let _ = writeln!(
                output,
                "- {}: {} calls ({:.0}%)",
                row.overall_sentiment,
                row.count,
                share(row.count, total)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Agent Performance");

    if snapshot.performance.is_empty() {
        let _ = writeln!(output, "No agents with analysed calls.");
    } else {
        let mut agents = snapshot.performance.clone();
        agents.sort_by(|a, b| b.total_calls.cmp(&a.total_calls).then_with(|| a.name.cmp(&b.name)));
        for agent in agents.iter() {
            let _ = writeln!(
                output,
                "- {}: {} calls, {} positive, {} negative",
                agent.name, agent.total_calls, agent.positive_calls, agent.negative_calls
            );
        }
    }

    let open: Vec<&EscalationView> = snapshot
        .escalations
        .iter()
        .filter(|e| e.status != escalation::CLOSED)
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Open Escalations");

    if open.is_empty() {
        let _ = writeln!(output, "No open escalations.");
    } else {
        for item in open {
            let _ = writeln!(
                output,
                "- {} ({}, {}): {} [{}]",
                item.call_id, item.name, item.status, item.escalation_reason, item.status_display
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::Utc;

    fn escalation(call_id: &str, status: &str, display: &str) -> EscalationView {
        EscalationView {
            call_id: call_id.to_string(),
            agent_id: "A1".to_string(),
            escalation_reason: "Billing dispute".to_string(),
            possible_action: None,
            escalation_id: format!("E-{call_id}"),
            status: status.to_string(),
            name: "Avery Lee".to_string(),
            status_display: display.to_string(),
        }
    }

    #[test]
    fn empty_snapshot_renders_placeholders() {
        let report = build_report("S1", Utc::now().date_naive(), &TeamSnapshot::default());
        assert!(report.contains("- Calls today: 0"));
        assert!(report.contains("No analysed calls for this team."));
        assert!(report.contains("No agents with analysed calls."));
        assert!(report.contains("No open escalations."));
    }

    #[test]
    fn closed_escalations_are_left_out() {
        let snapshot = TeamSnapshot {
            sentiment: vec![
                SentimentCount { overall_sentiment: "negative".to_string(), count: 1 },
                SentimentCount { overall_sentiment: "positive".to_string(), count: 3 },
            ],
            escalations: vec![
                escalation("C1", "Closed", "Resolved"),
                escalation("C2", "Open", "Open today"),
            ],
            ..TeamSnapshot::default()
        };

        let report = build_report("S1", Utc::now().date_naive(), &snapshot);
        assert!(report.contains("- positive: 3 calls (75%)"));
        assert!(report.contains("C2 (Avery Lee, Open)"));
        assert!(!report.contains("C1 (Avery Lee"));
    }

    #[tokio::test]
    async fn collects_from_store() {
        let store = MemoryStore::demo();
        let snapshot = TeamSnapshot::collect(&store, "S100").await.unwrap();
        assert_eq!(snapshot.performance.len(), 3);
        assert_eq!(snapshot.escalations.len(), 2);
        assert!(snapshot.weekly_calls >= snapshot.calls_today);
    }
}
