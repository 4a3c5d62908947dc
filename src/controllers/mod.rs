pub mod agents;
pub mod health;
pub mod mcp;
pub mod payments;
pub mod tokens;
