//! Helpdesk records (tickets and their messages) and the store trait
//! the ticket tools read them through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

/// The person a ticket is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: String,
    pub name: String,
}

/// A helpdesk ticket. Read-only from DeskPilot's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub status: String,
    pub title: String,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
}

/// A message posted on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub ticket_id: String,
    pub content: String,
    pub created: DateTime<Utc>,
}

/// Paging and ordering for message listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page: u32,
    pub page_size: u32,
    /// Sort expression in the store's syntax; `created` is ascending,
    /// `-created` descending.
    pub sort: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
            sort: "created".into(),
        }
    }
}

/// Read access to the remote record database.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one ticket, with its assignee expanded when present.
    async fn get_ticket(&self, id: &str) -> Result<Ticket, StoreError>;

    /// List the messages of a ticket.
    async fn list_messages(
        &self,
        ticket_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<TicketMessage>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_options_defaults() {
        let opts = ListOptions::default();
        assert_eq!(opts.page, 1);
        assert_eq!(opts.page_size, 50);
        assert_eq!(opts.sort, "created");
    }

    #[test]
    fn ticket_without_assignee_omits_field() {
        let ticket = Ticket {
            id: "c3oi15w89jl52t3".into(),
            status: "open".into(),
            title: "Login issue".into(),
            created: Utc::now(),
            assignee: None,
        };
        let json = serde_json::to_value(&ticket).unwrap();
        assert!(json.get("assignee").is_none());
        assert_eq!(json["status"], "open");
    }
}
