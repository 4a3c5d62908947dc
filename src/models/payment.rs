use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settlement state reported by the external checkout provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Completed,
    Failed,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Completed => "completed",
            SettlementStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SettlementStatus::Pending),
            "completed" => Some(SettlementStatus::Completed),
            "failed" => Some(SettlementStatus::Failed),
            _ => None,
        }
    }
}

/// One payment attempt for a tool call. The checkout reference is assigned
/// after creation, once the external provider has issued it.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: String,
    pub tool_call_id: String,
    pub amount: f64,
    pub currency: String,
    pub checkout_id: Option<String>,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub tool_call_id: String,
    pub amount: f64,
    pub currency: String,
    pub checkout_id: Option<String>,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        PaymentResponse {
            id: p.id,
            tool_call_id: p.tool_call_id,
            amount: p.amount,
            currency: p.currency,
            checkout_id: p.checkout_id,
            status: p.status,
            created_at: p.created_at,
            completed_at: p.completed_at,
        }
    }
}
