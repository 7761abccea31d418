//! In-memory record store for tests in downstream crates.
//!
//! Enabled with the `testing` feature.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpilot_core::error::StoreError;
use deskpilot_core::ticket::{Assignee, ListOptions, RecordStore, Ticket, TicketMessage};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryStore {
    tickets: HashMap<String, Ticket>,
    messages: Vec<TicketMessage>,
    calls: Mutex<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(
        mut self,
        id: &str,
        status: &str,
        title: &str,
        assignee: Option<&str>,
    ) -> Self {
        self.tickets.insert(
            id.to_string(),
            Ticket {
                id: id.to_string(),
                status: status.to_string(),
                title: title.to_string(),
                created: parse("2024-01-05T09:00:00Z"),
                assignee: assignee.map(|name| Assignee {
                    id: format!("user-{name}"),
                    name: name.to_string(),
                }),
            },
        );
        self
    }

    /// Add a message; `created` is RFC 3339.
    pub fn with_message(mut self, ticket_id: &str, content: &str, created: &str) -> Self {
        self.messages.push(TicketMessage {
            ticket_id: ticket_id.to_string(),
            content: content.to_string(),
            created: parse(created),
        });
        self
    }

    /// Number of store calls made so far.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

fn parse(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|_| panic!("bad test timestamp {raw}"))
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get_ticket(&self, id: &str) -> Result<Ticket, StoreError> {
        *self.calls.lock().unwrap() += 1;
        self.tickets.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            collection: "tickets".into(),
            id: id.to_string(),
        })
    }

    async fn list_messages(
        &self,
        ticket_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<TicketMessage>, StoreError> {
        *self.calls.lock().unwrap() += 1;
        let mut messages: Vec<TicketMessage> = self
            .messages
            .iter()
            .filter(|m| m.ticket_id == ticket_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created);
        if options.sort.starts_with('-') {
            messages.reverse();
        }

        let skip = (options.page.saturating_sub(1) * options.page_size) as usize;
        Ok(messages
            .into_iter()
            .skip(skip)
            .take(options.page_size as usize)
            .collect())
    }
}
