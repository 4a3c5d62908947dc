//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table.

mod access_tokens; // access_tokens (bearer credentials)
mod agents;        // agents (registry)
mod payments;      // payments (checkout ledger)
mod tool_calls;    // tool_calls (invocation ledger)
