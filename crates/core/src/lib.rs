//! # DeskPilot Core
//!
//! Domain types, traits, and error definitions shared by every DeskPilot
//! crate. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion provider, vector index, record
//! store) and every agent capability is a trait here. Implementations live
//! in their respective crates, so handlers and the agent loop can be tested
//! against scripted stand-ins.

pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod retrieval;
pub mod ticket;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use prompt::PromptTemplate;
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retrieval::{Document, Retriever};
pub use ticket::{Assignee, ListOptions, RecordStore, Ticket, TicketMessage};
pub use tool::{Tool, ToolRegistry};
