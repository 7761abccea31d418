//! `ticket_messages`: the conversation on a ticket, oldest first.

use crate::format::{fetch_all_messages, parse_ticket_id, render_messages};
use async_trait::async_trait;
use deskpilot_core::error::ToolError;
use deskpilot_core::ticket::RecordStore;
use deskpilot_core::tool::Tool;
use std::sync::Arc;

pub struct TicketMessagesTool {
    store: Arc<dyn RecordStore>,
    page_size: u32,
}

impl TicketMessagesTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, page_size: 50 }
    }
}

#[async_trait]
impl Tool for TicketMessagesTool {
    fn name(&self) -> &str {
        "ticket_messages"
    }

    fn description(&self) -> &str {
        "List the messages posted on a helpdesk ticket in chronological order. Input: the ticket id."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let id = parse_ticket_id(self.name(), input)?;
        let listing = fetch_all_messages(self.store.as_ref(), &id, self.page_size).await?;
        Ok(format!("Ticket {id}\n{}", render_messages(&id, &listing)))
    }
}
