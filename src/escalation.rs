use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{Escalation, StatusUpdate};

pub const OPEN: &str = "Open";
pub const IN_PROGRESS: &str = "InProgress";
pub const REOPEN: &str = "Reopen";
pub const CLOSED: &str = "Closed";

/// Human-readable state of an escalation as of `today`. Evaluated top to
/// bottom, first match wins.
pub fn status_display(
    status: &str,
    created_at: DateTime<Utc>,
    last_actioned_at: Option<DateTime<Utc>>,
    today: NaiveDate,
) -> String {
    let created = created_at.date_naive();

    if status == CLOSED {
        return "Resolved".to_string();
    }
    if status == OPEN && created == today {
        return "Open today".to_string();
    }
    if status == OPEN && created < today {
        return format!("Not actioned since {} days", (today - created).num_days());
    }
    if let Some(actioned) = last_actioned_at {
        let days = (today - actioned.date_naive()).num_days();
        return format!("Last actioned {days} days ago");
    }

    "Status Unknown".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing callId or newStatus")]
pub struct MissingStatusField;

/// A validated status transition. Any status may move to any other
/// non-empty status; nothing is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    call_id: String,
    new_status: String,
}

impl StatusChange {
    pub fn new(
        call_id: Option<String>,
        new_status: Option<String>,
    ) -> Result<Self, MissingStatusField> {
        let call_id = call_id.filter(|v| !v.is_empty()).ok_or(MissingStatusField)?;
        let new_status = new_status.filter(|v| !v.is_empty()).ok_or(MissingStatusField)?;

        Ok(Self { call_id, new_status })
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn new_status(&self) -> &str {
        &self.new_status
    }

    /// Applies the transition in place, stamping `last_actioned_at`.
    pub fn apply(&self, escalation: &mut Escalation, now: DateTime<Utc>) -> StatusUpdate {
        escalation.status = self.new_status.clone();
        escalation.last_actioned_at = Some(now);

        StatusUpdate {
            call_id: escalation.call_id.clone(),
            status: escalation.status.clone(),
            last_actioned_at: now,
        }
    }
}
