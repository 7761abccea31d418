//! `ticket_context`: everything the summary flow needs in one call.

use crate::format::{fetch_all_messages, parse_ticket_id, render_details, render_messages};
use async_trait::async_trait;
use deskpilot_core::error::ToolError;
use deskpilot_core::ticket::RecordStore;
use deskpilot_core::tool::Tool;
use std::sync::Arc;
use tracing::debug;

pub struct TicketContextTool {
    store: Arc<dyn RecordStore>,
    page_size: u32,
}

impl TicketContextTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, page_size: 50 }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl Tool for TicketContextTool {
    fn name(&self) -> &str {
        "ticket_context"
    }

    fn description(&self) -> &str {
        "Fetch a helpdesk ticket with its status, title, assignee and all of its messages in \
         chronological order. Input: the ticket id."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let id = parse_ticket_id(self.name(), input)?;
        debug!(ticket_id = %id, "ticket_context invoked");

        let ticket = self.store.get_ticket(&id).await?;
        let listing = fetch_all_messages(self.store.as_ref(), &id, self.page_size).await?;

        Ok(format!(
            "{}\n{}",
            render_details(&ticket),
            render_messages(&id, &listing)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_core::error::StoreError;
    use deskpilot_store::testing::InMemoryStore;

    fn store() -> Arc<InMemoryStore> {
        Arc::new(
            InMemoryStore::new()
                .with_ticket("c3oi15w89jl52t3", "open", "Login issue", Some("Dana"))
                .with_message("c3oi15w89jl52t3", "Password reset sent", "2024-01-05T10:05:00Z")
                .with_message("c3oi15w89jl52t3", "I cannot log in", "2024-01-05T10:00:00Z")
                .with_message("other", "Unrelated", "2024-01-05T10:01:00Z"),
        )
    }

    #[tokio::test]
    async fn renders_ticket_and_ordered_messages() {
        let tool = TicketContextTool::new(store());
        let out = tool.invoke(" c3oi15w89jl52t3 ").await.unwrap();

        assert!(out.contains("Status: open"));
        assert!(out.contains("Title: Login issue"));
        assert!(out.contains("Assigned to: Dana"));
        assert!(out.contains("Messages (2):"));
        assert!(!out.contains("Unrelated"));
        let first = out.find("I cannot log in").unwrap();
        let second = out.find("Password reset sent").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn pages_through_messages() {
        let store = store();
        let tool = TicketContextTool::new(store.clone()).with_page_size(1);
        let out = tool.invoke("c3oi15w89jl52t3").await.unwrap();
        assert!(out.contains("Messages (2):"));
        // one ticket fetch plus three message pages (1, 1, then empty)
        assert_eq!(store.call_count(), 4);
    }

    #[tokio::test]
    async fn unknown_ticket_fails() {
        let tool = TicketContextTool::new(store());
        match tool.invoke("missing").await {
            Err(ToolError::Store(StoreError::NotFound { id, .. })) => assert_eq!(id, "missing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
