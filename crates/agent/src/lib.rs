//! The DeskPilot agent loop.
//!
//! A bounded, text-mediated ReAct loop:
//!
//! 1. **Think**: render the transcript and ask the model what to do
//! 2. **Act**: invoke the tool it names from the flow's registry
//! 3. **Observe**: append the tool output (or its error) to the transcript
//!
//! The loop ends when the model gives a final answer or the tool-call
//! budget is spent. Each endpoint runs its own [`FlowConfig`].

pub mod error;
pub mod flows;
pub mod parser;
pub mod react;

pub use error::AgentError;
pub use flows::{FlowConfig, letter_agent, summary_agent};
pub use parser::ReactOutput;
pub use react::{AgentRun, AgentState, AgentStep, ReactAgent};
