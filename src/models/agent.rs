use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registered external tool provider reachable via webhook.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub image_url: String,
    /// Price per call in minor units (wei-style, 1 unit = 1e-18 of display currency).
    pub price: i64,
    pub api_key: String,
    pub webhook_url: String,
    /// JSON text: `{"tools": {name: {"description": ..., "parameters": ...}}}`.
    /// Stored as submitted; parsed lazily at resolution time.
    pub tool_schema: String,
    /// 42-character 0x-prefixed address of the registering user.
    pub owner: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Display-currency cost of one call, frozen onto each ToolCall at creation.
    pub fn cost_per_call(&self) -> f64 {
        self.price as f64 / 1e18
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    pub name: String,
    pub image_url: String,
    pub price: i64,
    pub api_key: String,
    pub webhook_url: String,
    pub tool_schema: Value,
    pub owner: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAgentRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<i64>,
    pub webhook_url: Option<String>,
    pub tool_schema: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub price: i64,
    pub webhook_url: String,
    pub tool_schema: Value,
    pub owner: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Agent> for AgentResponse {
    fn from(agent: Agent) -> Self {
        // Schema text that no longer parses is surfaced as a raw string rather
        // than dropped, matching the lenient resolution path.
        let tool_schema = serde_json::from_str(&agent.tool_schema)
            .unwrap_or_else(|_| Value::String(agent.tool_schema.clone()));
        AgentResponse {
            id: agent.id,
            name: agent.name,
            image_url: agent.image_url,
            price: agent.price,
            webhook_url: agent.webhook_url,
            tool_schema,
            owner: agent.owner,
            is_active: agent.is_active,
            created_at: agent.created_at,
            updated_at: agent.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AgentListResponse {
    pub agents: Vec<AgentResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}
