//! Tool registry with per-tool deadlines.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use travel_agent_core::{Tool, ToolError, ToolInput, ToolOutput};

/// Executes registered tools by name
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool with the given input
    async fn execute(&self, name: &str, input: ToolInput) -> Result<ToolOutput, ToolError>;

    /// Names of all registered tools
    fn list_tools(&self) -> Vec<String>;

    /// Look up a tool by name
    fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>>;
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, input: ToolInput) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let deadline = Duration::from_secs(tool.timeout_secs());

        match tokio::time::timeout(deadline, tool.execute(input)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(tool = name, timeout_secs = tool.timeout_secs(), "tool call timed out");
                Err(ToolError::Timeout)
            }
        }
    }

    fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its arguments"
        }

        async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new(input.arguments))
        }
    }

    struct StallingTool;

    #[async_trait]
    impl Tool for StallingTool {
        fn name(&self) -> &str {
            "stall"
        }

        fn description(&self) -> &str {
            "Never completes"
        }

        fn timeout_secs(&self) -> u64 {
            0
        }

        async fn execute(&self, _input: ToolInput) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ToolOutput::new(json!({})))
        }
    }

    #[tokio::test]
    async fn test_execute_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let output = registry
            .execute("echo", ToolInput::new(json!({"x": 1})))
            .await
            .unwrap();
        assert_eq!(output.result["x"], 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.execute("nope", ToolInput::new(json!({}))).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn test_tool_deadline() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StallingTool));

        let result = registry.execute("stall", ToolInput::new(json!({}))).await;
        assert!(matches!(result, Err(ToolError::Timeout)));
    }

    #[test]
    fn test_list_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.list_tools(), vec!["echo".to_string()]);
        assert!(registry.get_tool("echo").is_some());
    }
}
