//! Tool Registry
//!
//! Maps tool names to capability units. Registration happens once,
//! during startup, before any run begins; after that the registry is
//! read-only and safe to share across concurrent runs via `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ToolError;
use crate::types::{AnalysisTool, ToolOutput};

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AnalysisTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name.
    ///
    /// Duplicate registration is last-registration-wins: the new tool
    /// replaces the previous one and a warning is logged.
    pub fn register(&mut self, tool: Arc<dyn AnalysisTool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "tool re-registered, previous registration replaced");
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn AnalysisTool>> {
        self.tools.get(name).cloned()
    }

    /// Invoke a tool by name.
    ///
    /// Fails with [`ToolError::NotFound`] for unresolved names. Errors
    /// raised by the capability itself are classified: a `ToolError`
    /// passes through, anything else becomes `Unclassified`. No retries
    /// happen here; retry policy belongs to the caller.
    pub async fn invoke(
        &self,
        name: &str,
        input: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .resolve(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        match tool.invoke(input).await {
            Ok(output) => Ok(output),
            Err(err) => match err.downcast::<ToolError>() {
                Ok(tool_err) => Err(tool_err),
                Err(other) => Err(ToolError::Unclassified(other.to_string())),
            },
        }
    }

    /// Registered tool names, sorted for stable display.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl AnalysisTool for StaticTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "static reply for tests"
        }
        fn parameters(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }
        async fn invoke(&self, _input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::text(self.reply))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl AnalysisTool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn parameters(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }
        async fn invoke(&self, _input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
            Err(anyhow::anyhow!("backing store is on fire"))
        }
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("nope", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool {
            name: "echo",
            reply: "first",
        }));
        registry.register(Arc::new(StaticTool {
            name: "echo",
            reply: "second",
        }));
        assert_eq!(registry.len(), 1);

        let output = registry.invoke("echo", &Map::new()).await.unwrap();
        assert_eq!(output.summary, "second");
    }

    #[tokio::test]
    async fn test_untyped_error_is_unclassified() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool));

        let err = registry.invoke("failing", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Unclassified(_)));
    }

    #[tokio::test]
    async fn test_tool_error_passes_through() {
        struct DomainFailTool;

        #[async_trait]
        impl AnalysisTool for DomainFailTool {
            fn name(&self) -> &str {
                "domain_fail"
            }
            fn description(&self) -> &str {
                "raises a typed tool error"
            }
            fn parameters(&self) -> Value {
                json!({ "type": "object", "properties": {} })
            }
            async fn invoke(&self, _input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
                Err(ToolError::Execution("no matching data".to_string()).into())
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(DomainFailTool));

        let err = registry.invoke("domain_fail", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution(msg) if msg == "no matching data"));
    }
}
