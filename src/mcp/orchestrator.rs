//! Tool-call orchestration: create the record, invoke the webhook, persist
//! the outcome, expose polling.
//!
//! A tool call moves `created -> dispatched -> completed`. There is no failed
//! terminal state: dispatch errors land inside `result` as an `{"error": ...}`
//! payload and the record still completes, so cost bookkeeping always runs.
//! Callers detect tool failure by inspecting the result, not a status field.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::db::Database;
use crate::mcp::auth::{AuthError, TokenAuthenticator};
use crate::mcp::webhook::WebhookDispatcher;
use crate::models::{PaymentStatus, ToolCall};

#[derive(Debug)]
pub enum DispatchError {
    Auth(AuthError),
    /// The record vanished between creation and finalization.
    NotFound,
    /// A concurrent finalizer got there first.
    AlreadyCompleted,
    Storage(rusqlite::Error),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Auth(e) => write!(f, "{}", e),
            DispatchError::NotFound => write!(f, "Tool call not found"),
            DispatchError::AlreadyCompleted => write!(f, "Tool call already completed"),
            DispatchError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl From<AuthError> for DispatchError {
    fn from(e: AuthError) -> Self {
        DispatchError::Auth(e)
    }
}

impl From<rusqlite::Error> for DispatchError {
    fn from(e: rusqlite::Error) -> Self {
        DispatchError::Storage(e)
    }
}

#[derive(Debug)]
pub enum FinalizeError {
    NotFound,
    AlreadyCompleted,
    Storage(rusqlite::Error),
}

/// Synchronous dispatch response: the record id, the webhook's payload, and
/// the cost frozen at creation.
#[derive(Debug, Serialize)]
pub struct DispatchOutcome {
    pub tool_call_id: String,
    pub agent_id: String,
    pub tool_name: String,
    pub result: Value,
    pub cost: f64,
}

/// Read-only poll snapshot, always re-read from the store.
#[derive(Debug, Serialize)]
pub struct PollStatus {
    pub tool_call_id: String,
    pub status: &'static str,
    pub result: Option<Value>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
}

pub struct ToolCallOrchestrator {
    db: Arc<Database>,
    authenticator: Arc<TokenAuthenticator>,
    dispatcher: WebhookDispatcher,
}

impl ToolCallOrchestrator {
    pub fn new(
        db: Arc<Database>,
        authenticator: Arc<TokenAuthenticator>,
        dispatcher: WebhookDispatcher,
    ) -> Self {
        ToolCallOrchestrator {
            db,
            authenticator,
            dispatcher,
        }
    }

    /// Full dispatch flow. Aborts before any record exists when
    /// authentication or resolution fails.
    pub async fn dispatch(
        &self,
        bearer: Option<&str>,
        tool_name: &str,
        parameters: Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        let ctx = self.authenticator.authenticate(bearer, tool_name)?;

        // Cost is computed from the agent's pricing at this instant and never
        // touched again, even if the agent is repriced later.
        let cost = ctx.agent.cost_per_call();
        let tool_call = self.db.create_tool_call(
            &ctx.agent.id,
            &ctx.user_id,
            tool_name,
            &parameters,
            cost,
        )?;

        log::info!(
            "Dispatching tool call {} ({} on agent {}, validated={})",
            tool_call.id,
            tool_name,
            ctx.agent.id,
            ctx.contract.validated
        );

        let result = self
            .dispatcher
            .invoke(&ctx.agent.webhook_url, tool_name, &parameters, &tool_call.id)
            .await;

        let finalized = self.finalize(&tool_call.id, &result).map_err(|e| match e {
            FinalizeError::NotFound => DispatchError::NotFound,
            FinalizeError::AlreadyCompleted => DispatchError::AlreadyCompleted,
            FinalizeError::Storage(e) => DispatchError::Storage(e),
        })?;

        Ok(DispatchOutcome {
            tool_call_id: finalized.id,
            agent_id: ctx.agent.id,
            tool_name: tool_name.to_string(),
            result,
            cost,
        })
    }

    /// The single mutation point for result + completion. Refuses to touch a
    /// record whose `completed_at` is already set.
    pub fn finalize(&self, tool_call_id: &str, result: &Value) -> Result<ToolCall, FinalizeError> {
        let affected = self
            .db
            .finalize_tool_call(tool_call_id, result)
            .map_err(FinalizeError::Storage)?;

        if affected == 0 {
            return match self.db.get_tool_call(tool_call_id) {
                Ok(Some(_)) => Err(FinalizeError::AlreadyCompleted),
                Ok(None) => Err(FinalizeError::NotFound),
                Err(e) => Err(FinalizeError::Storage(e)),
            };
        }

        self.db
            .get_tool_call(tool_call_id)
            .map_err(FinalizeError::Storage)?
            .ok_or(FinalizeError::NotFound)
    }

    /// Poll the current record state. No caching: this always reflects the
    /// latest persisted state.
    pub fn poll(&self, tool_call_id: &str) -> Result<Option<PollStatus>, rusqlite::Error> {
        let tool_call = match self.db.get_tool_call(tool_call_id)? {
            Some(tc) => tc,
            None => return Ok(None),
        };
        Ok(Some(PollStatus {
            tool_call_id: tool_call.id,
            status: if tool_call.completed_at.is_some() {
                "completed"
            } else {
                "pending"
            },
            result: tool_call.result,
            completed_at: tool_call.completed_at,
            payment_status: tool_call.payment_status,
        }))
    }
}
