//! Flow configurations: the prompt and tool set of each agent-backed
//! endpoint, spelled out per flow rather than shared.

use crate::error::AgentError;
use crate::react::ReactAgent;
use deskpilot_core::error::PromptError;
use deskpilot_core::prompt::PromptTemplate;
use deskpilot_core::ticket::RecordStore;
use deskpilot_providers::{CompletionClient, CompletionOptions};
use std::sync::Arc;

/// Prompt and tool set for one agent flow.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub name: String,
    pub system_prompt: String,
    /// Rendered with the request bindings to form the task text.
    pub task_template: PromptTemplate,
    /// Tools this flow expects in its registry.
    pub tools: Vec<String>,
}

const SUMMARY_SYSTEM: &str = "\
You are a helpdesk assistant that writes concise, factual summaries of support tickets.
Always read the ticket with your tools before answering. Never invent details the tools did not return.";

const SUMMARY_TASK: &str = "\
Summarize helpdesk ticket {ticket_id}.
Write the summary in Markdown with these sections:
- **Status**: the ticket's current status and title
- **Conversation**: every message, in chronological order, one bullet each
- **Next steps**: what remains to be done, if anything";

const LETTER_SYSTEM: &str = "\
You are a helpdesk assistant that writes short, warm status letters to customers about their support tickets.
Always read the ticket's details and messages with your tools before writing. Never invent details the tools did not return.";

const LETTER_TASK: &str = "\
Write a status letter for helpdesk ticket {ticket_id}.
The letter must have exactly this structure:
1. A greeting that names the person the ticket is assigned to (use \"our support team\" if it is unassigned)
2. A plain explanation of the ticket's current status and what has happened so far
3. A sentence acknowledging the customer's inconvenience with empathy
4. A courteous closing";

impl FlowConfig {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        task_template: &str,
        tools: &[&str],
    ) -> Result<Self, PromptError> {
        Ok(Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            task_template: PromptTemplate::parse(task_template)?,
            tools: tools.iter().map(|t| t.to_string()).collect(),
        })
    }

    /// Ticket summary: one tool returning the ticket and its messages.
    pub fn summary() -> Result<Self, PromptError> {
        Self::new("summary", SUMMARY_SYSTEM, SUMMARY_TASK, &["ticket_context"])
    }

    /// Customer letter: separate tools for messages and details.
    pub fn letter() -> Result<Self, PromptError> {
        Self::new(
            "letter",
            LETTER_SYSTEM,
            LETTER_TASK,
            &["ticket_messages", "ticket_details"],
        )
    }
}

/// Build the summary agent over `store`.
pub fn summary_agent(
    client: CompletionClient,
    options: CompletionOptions,
    store: Arc<dyn RecordStore>,
    max_iterations: u32,
) -> Result<ReactAgent, AgentError> {
    let registry = deskpilot_tools::summary_registry(store)?;
    Ok(ReactAgent::new(client, registry, FlowConfig::summary()?)?
        .with_options(options)
        .with_max_iterations(max_iterations))
}

/// Build the letter agent over `store`.
pub fn letter_agent(
    client: CompletionClient,
    options: CompletionOptions,
    store: Arc<dyn RecordStore>,
    max_iterations: u32,
) -> Result<ReactAgent, AgentError> {
    let registry = deskpilot_tools::letter_registry(store)?;
    Ok(ReactAgent::new(client, registry, FlowConfig::letter()?)?
        .with_options(options)
        .with_max_iterations(max_iterations))
}
