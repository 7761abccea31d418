//! The abstraction over agent capabilities.
//!
//! Tools are what let the agent reach the record store: fetch a ticket,
//! list its messages. Every tool has a text-in/text-out contract so the
//! model can drive it from a plain-text transcript.

use async_trait::async_trait;
use std::collections::BTreeMap;
use crate::error::ToolError;

/// The core Tool trait.
///
/// Each tool is registered in a [`ToolRegistry`] and made available to
/// the agent loop, which dispatches by exact name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "ticket_context").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// Run the tool on a text input and return its text output.
    async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError>;
}

/// A registry of available tools, keyed by name.
///
/// The agent loop uses this to:
/// 1. Describe the available tools to the LLM
/// 2. Resolve and invoke the tool the LLM names
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Names are unique; a second tool with the same
    /// name is rejected.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Invoke a tool by name.
    pub async fn invoke(&self, name: &str, input: &str) -> std::result::Result<String, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.invoke(input).await
    }

    /// `(name, description)` pairs in name order.
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        self.tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError> {
            Ok(input.to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str { "fail" }
        fn description(&self) -> &str { "Always fails" }
        async fn invoke(&self, _input: &str) -> std::result::Result<String, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "fail".into(),
                reason: "boom".into(),
            })
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert!(registry.contains("echo"));
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(ref n) if n == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_descriptions_in_name_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool)).unwrap();
        registry.register(Box::new(EchoTool)).unwrap();
        let descs = registry.descriptions();
        assert_eq!(descs[0], ("echo", "Echoes back the input"));
        assert_eq!(descs[1].0, "fail");
        assert_eq!(registry.names(), vec!["echo", "fail"]);
    }

    #[tokio::test]
    async fn registry_invoke_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let out = registry.invoke("echo", "hello world").await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn registry_invoke_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nonexistent", "").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn registry_propagates_tool_failure() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool)).unwrap();
        let err = registry.invoke("fail", "x").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
