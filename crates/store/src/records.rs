//! Wire shapes of store records and their conversion to domain types.

use chrono::{DateTime, NaiveDateTime, Utc};
use deskpilot_core::error::StoreError;
use deskpilot_core::ticket::{Assignee, Ticket, TicketMessage};
use serde::Deserialize;

/// A paginated list response.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug)]
pub(crate) struct TicketRecord {
    id: String,
    status: String,
    title: String,
    created: String,
    assignee: Option<Assignee>,
}

impl TicketRecord {
    /// Parse a raw ticket record; the assignee comes from `expand.<field>`.
    pub fn from_value(value: serde_json::Value, assignee_field: &str) -> Result<Self, StoreError> {
        let text = |key: &str| value.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string();

        let id = text("id");
        if id.is_empty() {
            return Err(StoreError::MalformedRecord("ticket record has no id".into()));
        }

        let assignee = value
            .get("expand")
            .and_then(|e| e.get(assignee_field))
            .and_then(|user| {
                let user_id = user.get("id")?.as_str()?.to_string();
                let name = ["name", "username", "email"]
                    .iter()
                    .find_map(|k| user.get(*k).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
                    .unwrap_or(user_id.as_str())
                    .to_string();
                Some(Assignee { id: user_id, name })
            });

        Ok(Self {
            id,
            status: text("status"),
            title: text("title"),
            created: text("created"),
            assignee,
        })
    }

    pub fn into_ticket(self) -> Result<Ticket, StoreError> {
        Ok(Ticket {
            created: parse_timestamp(&self.created)?,
            id: self.id,
            status: self.status,
            title: self.title,
            assignee: self.assignee,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRecord {
    #[serde(default)]
    ticket: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    created: String,
}

impl MessageRecord {
    pub fn into_message(self) -> Result<TicketMessage, StoreError> {
        Ok(TicketMessage {
            created: parse_timestamp(&self.created)?,
            ticket_id: self.ticket,
            content: self.content,
        })
    }
}

/// Parse a store timestamp. Records use `2024-01-05 10:00:00.123Z`;
/// RFC 3339 is accepted too.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::MalformedRecord(format!("bad timestamp '{raw}': {e}")))
}
