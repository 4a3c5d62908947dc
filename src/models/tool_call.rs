use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payment state of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// One recorded invocation of a tool. Created when dispatch begins, mutated
/// exactly once to attach result + completion, never deleted.
///
/// Invariant: `completed_at` is set if and only if `result` is non-null.
/// `cost` is fixed at creation time.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub agent_id: String,
    pub caller_user_id: String,
    pub tool_name: String,
    pub parameters: Value,
    pub result: Option<Value>,
    pub cost: f64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    pub id: String,
    pub agent_id: String,
    pub caller_user_id: String,
    pub tool_name: String,
    pub parameters: Value,
    pub result: Option<Value>,
    pub cost: f64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ToolCall> for ToolCallResponse {
    fn from(tc: ToolCall) -> Self {
        ToolCallResponse {
            id: tc.id,
            agent_id: tc.agent_id,
            caller_user_id: tc.caller_user_id,
            tool_name: tc.tool_name,
            parameters: tc.parameters,
            result: tc.result,
            cost: tc.cost,
            payment_status: tc.payment_status,
            created_at: tc.created_at,
            completed_at: tc.completed_at,
        }
    }
}
