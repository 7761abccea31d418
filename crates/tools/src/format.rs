//! Shared input parsing and text rendering for the ticket tools.

use chrono::{DateTime, Utc};
use deskpilot_core::error::ToolError;
use deskpilot_core::ticket::{ListOptions, RecordStore, Ticket, TicketMessage};
use tracing::warn;

/// Upper bound on pages fetched for one listing.
const MAX_PAGES: u32 = 10;

/// Extract a ticket id from free-form model input.
///
/// Accepts a bare id, a quoted id, or a JSON object with `ticket_id`/`id`.
pub fn parse_ticket_id(tool_name: &str, input: &str) -> Result<String, ToolError> {
    let trimmed = input.trim();

    let id = if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
            ToolError::InvalidInput(format!("{tool_name}: input is not a ticket id: {e}"))
        })?;
        value
            .get("ticket_id")
            .or_else(|| value.get("id"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string()
    } else {
        trimmed
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .trim()
            .to_string()
    };

    if id.is_empty() {
        return Err(ToolError::InvalidInput(format!(
            "{tool_name}: a ticket id is required"
        )));
    }
    Ok(id)
}

/// Messages of one ticket, oldest first.
#[derive(Debug, Default)]
pub struct MessageListing {
    pub messages: Vec<TicketMessage>,
    /// More messages exist past the page limit.
    pub truncated: bool,
}

/// Fetch the messages of a ticket in ascending creation order, up to
/// `MAX_PAGES` pages.
pub async fn fetch_all_messages(
    store: &dyn RecordStore,
    ticket_id: &str,
    page_size: u32,
) -> Result<MessageListing, ToolError> {
    let page_options = |page| ListOptions {
        page,
        page_size,
        ..ListOptions::default()
    };

    let mut listing = MessageListing::default();
    for page in 1..=MAX_PAGES {
        let batch = store.list_messages(ticket_id, &page_options(page)).await?;
        let done = (batch.len() as u32) < page_size;
        listing.messages.extend(batch);
        if done {
            return Ok(listing);
        }
    }

    // Every page was full; look one page further to tell a limit hit from an exact fit.
    let overflow = store.list_messages(ticket_id, &page_options(MAX_PAGES + 1)).await?;
    if !overflow.is_empty() {
        warn!(
            ticket_id = %ticket_id,
            shown = listing.messages.len(),
            max_pages = MAX_PAGES,
            "Message listing truncated at the page limit"
        );
        listing.truncated = true;
    }
    Ok(listing)
}

pub fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn render_details(ticket: &Ticket) -> String {
    let assignee = ticket
        .assignee
        .as_ref()
        .map(|a| a.name.as_str())
        .unwrap_or("Unassigned");
    format!(
        "Ticket {}\nStatus: {}\nTitle: {}\nCreated: {}\nAssigned to: {}",
        ticket.id,
        ticket.status,
        ticket.title,
        timestamp(&ticket.created),
        assignee
    )
}

pub fn render_messages(ticket_id: &str, listing: &MessageListing) -> String {
    if listing.messages.is_empty() {
        return format!("No messages on ticket {ticket_id}.");
    }
    let mut out = format!("Messages ({}):", listing.messages.len());
    for m in &listing.messages {
        out.push_str(&format!("\n[{}] {}", timestamp(&m.created), m.content.trim()));
    }
    if listing.truncated {
        out.push_str(&format!(
            "\n(truncated: only the first {} messages are shown)",
            listing.messages.len()
        ));
    }
    out
}
