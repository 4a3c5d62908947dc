//! Tool resolution against an agent's declared schema.
//!
//! The stored schema is JSON text of the form
//! `{"tools": {name: {"description": ..., "parameters": ...}}}`. When that
//! text fails to parse (or carries no `tools` object) resolution falls
//! through to allowing the call with an unchecked contract instead of
//! rejecting it; agents that need strict validation must register a
//! well-formed schema.

use serde_json::Value;
use std::fmt;

use crate::models::Agent;

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The schema parsed but does not declare the requested tool.
    Unknown(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Unknown(name) => {
                write!(f, "Tool '{}' not found for this agent", name)
            }
        }
    }
}

/// Parameter contract of one declared tool. Documentation only: parameters
/// are passed through to the webhook untyped and unvalidated.
#[derive(Debug, Clone)]
pub struct ToolContract {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Option<Value>,
    /// False when the schema could not be parsed and the call was allowed
    /// through unchecked.
    pub validated: bool,
}

pub fn resolve(agent: &Agent, tool_name: &str) -> Result<ToolContract, ResolveError> {
    let schema: Value = match serde_json::from_str(&agent.tool_schema) {
        Ok(v) => v,
        Err(e) => {
            log::warn!(
                "Agent {} has unparseable tool schema ({}); allowing '{}' unchecked",
                agent.id,
                e,
                tool_name
            );
            return Ok(ToolContract {
                name: tool_name.to_string(),
                description: None,
                parameters: None,
                validated: false,
            });
        }
    };

    let tools = match schema.get("tools").and_then(Value::as_object) {
        Some(t) => t,
        None => {
            log::warn!(
                "Agent {} schema has no tools object; allowing '{}' unchecked",
                agent.id,
                tool_name
            );
            return Ok(ToolContract {
                name: tool_name.to_string(),
                description: None,
                parameters: None,
                validated: false,
            });
        }
    };

    let entry = tools
        .get(tool_name)
        .ok_or_else(|| ResolveError::Unknown(tool_name.to_string()))?;

    Ok(ToolContract {
        name: tool_name.to_string(),
        description: entry
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        parameters: entry.get("parameters").cloned(),
        validated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn agent_with_schema(schema: &str) -> Agent {
        Agent {
            id: "agent-1".to_string(),
            name: "calc".to_string(),
            image_url: String::new(),
            price: 1,
            api_key: String::new(),
            webhook_url: String::new(),
            tool_schema: schema.to_string(),
            owner: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_declared_tool() {
        let agent = agent_with_schema(
            r#"{"tools":{"add":{"description":"Add two numbers","parameters":{"a":"int","b":"int"}}}}"#,
        );
        let contract = resolve(&agent, "add").unwrap();
        assert!(contract.validated);
        assert_eq!(contract.description.as_deref(), Some("Add two numbers"));
        assert!(contract.parameters.is_some());
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let agent = agent_with_schema(r#"{"tools":{"add":{}}}"#);
        let err = resolve(&agent, "subtract").unwrap_err();
        assert_eq!(err, ResolveError::Unknown("subtract".to_string()));
    }

    #[test]
    fn test_unparseable_schema_falls_through_open() {
        let agent = agent_with_schema("not json at all {");
        let contract = resolve(&agent, "anything").unwrap();
        assert!(!contract.validated);
    }

    #[test]
    fn test_schema_without_tools_object_falls_through_open() {
        let agent = agent_with_schema(r#"{"available_tools": ["add"]}"#);
        let contract = resolve(&agent, "add").unwrap();
        assert!(!contract.validated);
    }
}
