//! Ticket tools for the DeskPilot agent.
//!
//! Every tool takes a ticket id as text and answers with a plain-text
//! rendering of what it read from the record store.

pub mod format;
pub mod ticket_context;
pub mod ticket_details;
pub mod ticket_messages;

pub use ticket_context::TicketContextTool;
pub use ticket_details::TicketDetailsTool;
pub use ticket_messages::TicketMessagesTool;

use deskpilot_core::error::ToolError;
use deskpilot_core::ticket::RecordStore;
use deskpilot_core::tool::ToolRegistry;
use std::sync::Arc;

/// Tools available to the summary flow.
pub fn summary_registry(store: Arc<dyn RecordStore>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(TicketContextTool::new(store)))?;
    Ok(registry)
}

/// Tools available to the letter flow.
pub fn letter_registry(store: Arc<dyn RecordStore>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(TicketMessagesTool::new(store.clone())))?;
    registry.register(Box::new(TicketDetailsTool::new(store)))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_store::testing::InMemoryStore;

    #[test]
    fn summary_registry_contents() {
        let registry = summary_registry(Arc::new(InMemoryStore::new())).unwrap();
        assert_eq!(registry.names(), vec!["ticket_context"]);
    }

    #[test]
    fn letter_registry_contents() {
        let registry = letter_registry(Arc::new(InMemoryStore::new())).unwrap();
        assert_eq!(registry.names(), vec!["ticket_details", "ticket_messages"]);
    }
}
