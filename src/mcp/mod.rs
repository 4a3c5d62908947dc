//! Authenticated tool-dispatch core: token validation, schema resolution,
//! outbound webhook invocation, and the tool-call state machine.

pub mod auth;
pub mod cache;
pub mod orchestrator;
pub mod resolver;
pub mod webhook;

pub use auth::{AuthContext, AuthError, TokenAuthenticator};
pub use cache::AgentCache;
pub use orchestrator::{DispatchError, DispatchOutcome, FinalizeError, ToolCallOrchestrator};
pub use resolver::{resolve, ResolveError, ToolContract};
pub use webhook::WebhookDispatcher;
