//! Bounded ReAct loop: Thought → Action → Observation.
//!
//! Each iteration renders the whole transcript (instructions, tool
//! catalogue, task, scratchpad of prior steps) into one completion call and
//! parses the reply with [`parser::parse`](crate::parser::parse).
//!
//! # Bounds
//!
//! At most `max_iterations` tool invocations per run, so at most
//! `max_iterations + 1` completion calls. Once the budget is spent the
//! model gets one last turn; if it still asks for a tool, the run ends with
//! its best-effort text and `capped = true`. Reaching the cap is not an
//! error.

use crate::error::AgentError;
use crate::flows::FlowConfig;
use crate::parser::{self, ReactOutput};
use deskpilot_core::message::Message;
use deskpilot_core::tool::ToolRegistry;
use deskpilot_providers::{CompletionClient, CompletionOptions};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a run is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Thinking,
    ToolCall,
    Observation,
    Final,
}

/// One iteration of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentStep {
    pub thought: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
}

/// The outcome of one agent run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    /// The rendered task text the run started from.
    pub input: String,
    pub output: String,
    pub steps: Vec<AgentStep>,
    /// `Final` when the model produced an answer, `Thinking` when capped.
    pub state: AgentState,
    pub tool_calls: usize,
    pub capped: bool,
}

pub struct ReactAgent {
    client: CompletionClient,
    options: CompletionOptions,
    tools: Arc<ToolRegistry>,
    flow: FlowConfig,
    max_iterations: u32,
}

impl ReactAgent {
    /// Create an agent for `flow`. Every tool the flow names must be in
    /// `tools`.
    pub fn new(
        client: CompletionClient,
        tools: ToolRegistry,
        flow: FlowConfig,
    ) -> Result<Self, AgentError> {
        if let Some(missing) = flow.tools.iter().find(|t| !tools.contains(t)) {
            return Err(AgentError::MissingTool {
                flow: flow.name.clone(),
                tool: missing.clone(),
            });
        }

        Ok(Self {
            client,
            options: CompletionOptions::new("gpt-4", 0.0),
            tools: Arc::new(tools),
            flow,
            max_iterations: 3,
        })
    }

    /// Set the sampling options. A stop sequence on `Observation:` is
    /// always added so the model cannot invent tool results.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the maximum number of tool calls per run (at least 1).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn flow(&self) -> &FlowConfig {
        &self.flow
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Run the flow for one ticket.
    pub async fn run_ticket(&self, ticket_id: &str) -> Result<AgentRun, AgentError> {
        self.run(&[("ticket_id", ticket_id)]).await
    }

    /// Run the loop with the task template rendered from `bindings`.
    pub async fn run(&self, bindings: &[(&str, &str)]) -> Result<AgentRun, AgentError> {
        let task = self.flow.task_template.render_pairs(bindings)?;
        let system = self.system_message();
        let options = self.completion_options();
        let budget = self.max_iterations as usize;

        let mut steps: Vec<AgentStep> = Vec::new();
        let mut tool_calls = 0usize;

        info!(flow = %self.flow.name, max_iter = self.max_iterations, "ReAct loop starting");

        loop {
            debug!(flow = %self.flow.name, iteration = steps.len() + 1, "Thinking");
            let transcript = self.transcript(&task, &steps, tool_calls >= budget);
            let text = self
                .client
                .complete_messages(
                    vec![Message::system(system.as_str()), Message::user(transcript)],
                    &options,
                )
                .await?;

            match parser::parse(&text) {
                ReactOutput::Final { thought, answer } => {
                    steps.push(AgentStep {
                        thought,
                        final_answer: Some(answer.clone()),
                        ..AgentStep::default()
                    });
                    info!(flow = %self.flow.name, tool_calls, "ReAct loop completed");
                    return Ok(AgentRun {
                        input: task,
                        output: answer,
                        steps,
                        state: AgentState::Final,
                        tool_calls,
                        capped: false,
                    });
                }

                ReactOutput::Action { thought, tool, input } => {
                    if !self.tools.contains(&tool) {
                        warn!(flow = %self.flow.name, tool = %tool, "Model requested unknown tool");
                        return Err(AgentError::ToolResolution {
                            tool,
                            available: self.tools.names().iter().map(|n| n.to_string()).collect(),
                        });
                    }

                    if tool_calls >= budget {
                        warn!(
                            flow = %self.flow.name,
                            requested = %tool,
                            "ReAct: max iterations reached ({})",
                            self.max_iterations
                        );
                        let output = if thought.is_empty() {
                            text.trim().to_string()
                        } else {
                            thought.clone()
                        };
                        steps.push(AgentStep {
                            thought,
                            ..AgentStep::default()
                        });
                        return Ok(AgentRun {
                            input: task,
                            output,
                            steps,
                            state: AgentState::Thinking,
                            tool_calls,
                            capped: true,
                        });
                    }

                    tool_calls += 1;
                    debug!(tool = %tool, input = %input, "Invoking tool");
                    let observation = match self.tools.invoke(&tool, &input).await {
                        Ok(output) => output,
                        Err(e) => {
                            warn!(tool = %tool, error = %e, "Tool failed");
                            format!("Error: {e}")
                        }
                    };

                    steps.push(AgentStep {
                        thought,
                        tool: Some(tool),
                        tool_input: Some(input),
                        observation: Some(observation),
                        final_answer: None,
                    });
                }
            }
        }
    }

    fn completion_options(&self) -> CompletionOptions {
        let mut options = self.options.clone();
        if !options.stop.iter().any(|s| s == "\nObservation:") {
            options.stop.push("\nObservation:".into());
        }
        options
    }

    fn system_message(&self) -> String {
        let catalogue: Vec<String> = self
            .tools
            .descriptions()
            .into_iter()
            .map(|(name, description)| format!("{name}: {description}"))
            .collect();
        let names = self.tools.names().join(", ");

        format!(
            "{system}\n\n\
             You have access to the following tools:\n\n\
             {catalogue}\n\n\
             Use the following format:\n\n\
             Thought: think about what to do next\n\
             Action: the tool to use, one of [{names}]\n\
             Action Input: the input to the tool\n\
             Observation: the result of the tool\n\
             ... (Thought/Action/Action Input/Observation can repeat)\n\
             Thought: I now know the final answer\n\
             Final Answer: the answer to the task",
            system = self.flow.system_prompt,
            catalogue = catalogue.join("\n"),
        )
    }

    fn transcript(&self, task: &str, steps: &[AgentStep], budget_spent: bool) -> String {
        let mut out = format!("{task}\n");
        for step in steps {
            if !step.thought.is_empty() {
                out.push_str(&format!("\nThought: {}", step.thought));
            }
            if let (Some(tool), Some(input)) = (&step.tool, &step.tool_input) {
                out.push_str(&format!("\nAction: {tool}\nAction Input: {input}"));
            }
            if let Some(observation) = &step.observation {
                out.push_str(&format!("\nObservation: {observation}"));
            }
        }
        if budget_spent {
            out.push_str("\n\nYou have no tool calls left. Give your Final Answer now.");
        }
        out.push_str("\nThought:");
        out
    }
}
