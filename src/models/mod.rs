pub mod agent;
pub mod payment;
pub mod token;
pub mod tool_call;

pub use agent::{Agent, AgentListResponse, AgentResponse, RegisterAgentRequest, UpdateAgentRequest};
pub use payment::{Payment, PaymentResponse, SettlementStatus};
pub use token::{
    AccessToken, CreateTokenRequest, MaskedTokenResponse, TokenListResponse, TokenResponse,
};
pub use tool_call::{PaymentStatus, ToolCall, ToolCallResponse};
