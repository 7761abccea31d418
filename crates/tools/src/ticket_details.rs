//! `ticket_details`: status, title, creation time and assignee.

use crate::format::{parse_ticket_id, render_details};
use async_trait::async_trait;
use deskpilot_core::error::ToolError;
use deskpilot_core::ticket::RecordStore;
use deskpilot_core::tool::Tool;
use std::sync::Arc;

pub struct TicketDetailsTool {
    store: Arc<dyn RecordStore>,
}

impl TicketDetailsTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TicketDetailsTool {
    fn name(&self) -> &str {
        "ticket_details"
    }

    fn description(&self) -> &str {
        "Get a helpdesk ticket's status, title, creation date and the name of the person it is \
         assigned to. Input: the ticket id."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let id = parse_ticket_id(self.name(), input)?;
        let ticket = self.store.get_ticket(&id).await?;
        Ok(render_details(&ticket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_store::testing::InMemoryStore;

    #[tokio::test]
    async fn renders_details() {
        let store = Arc::new(InMemoryStore::new().with_ticket("t1", "pending", "VPN drops", None));
        let out = TicketDetailsTool::new(store).invoke("t1").await.unwrap();
        assert_eq!(
            out,
            "Ticket t1\nStatus: pending\nTitle: VPN drops\nCreated: 2024-01-05 09:00 UTC\nAssigned to: Unassigned"
        );
    }
}
