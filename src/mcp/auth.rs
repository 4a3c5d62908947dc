//! Bearer-token authentication for tool dispatch.
//!
//! `authenticate` is the security boundary: downstream components receive the
//! returned context and never re-check authorization.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::db::Database;
use crate::mcp::cache::AgentCache;
use crate::mcp::resolver::{self, ResolveError, ToolContract};
use crate::models::{AccessToken, Agent};

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token present on the request.
    Missing,
    /// Token absent, revoked, or past expiry.
    InvalidOrExpired,
    /// The bound agent is missing or inactive.
    AgentInactive,
    /// The requested tool is not declared by the bound agent.
    ToolNotFound(String),
    /// Token store read failed.
    Storage(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Missing => write!(f, "Missing or invalid Authorization header"),
            AuthError::InvalidOrExpired => write!(f, "Invalid or expired token"),
            AuthError::AgentInactive => write!(f, "Agent not found or inactive"),
            AuthError::ToolNotFound(name) => {
                write!(f, "Tool '{}' not found for this agent", name)
            }
            AuthError::Storage(e) => write!(f, "Token lookup failed: {}", e),
        }
    }
}

/// Authorization context threaded through the rest of the call.
#[derive(Debug)]
pub struct AuthContext {
    pub agent: Agent,
    pub user_id: String,
    pub contract: ToolContract,
}

pub struct TokenAuthenticator {
    db: Arc<Database>,
    agents: Arc<AgentCache>,
}

impl TokenAuthenticator {
    pub fn new(db: Arc<Database>, agents: Arc<AgentCache>) -> Self {
        TokenAuthenticator { db, agents }
    }

    /// Validate a bearer credential and check the requested tool against the
    /// bound agent's schema. Read-only.
    pub fn authenticate(
        &self,
        bearer: Option<&str>,
        tool_name: &str,
    ) -> Result<AuthContext, AuthError> {
        let bearer = match bearer {
            Some(b) if !b.is_empty() => b,
            _ => return Err(AuthError::Missing),
        };

        let token = self
            .db
            .get_access_token(bearer)
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::InvalidOrExpired)?;

        if !token.is_active || token.is_expired(Utc::now()) {
            return Err(AuthError::InvalidOrExpired);
        }

        let agent = self
            .agents
            .get_active(&token.agent_id)
            .ok_or(AuthError::AgentInactive)?;

        let contract = resolver::resolve(&agent, tool_name).map_err(|e| match e {
            ResolveError::Unknown(name) => AuthError::ToolNotFound(name),
        })?;

        Ok(AuthContext {
            agent,
            user_id: token.user_id,
            contract,
        })
    }

    /// Issue a fresh token for an (agent, user) pair. Tokens are never renewed
    /// in place; a new expiry means a new token.
    pub fn issue_token(
        &self,
        agent_id: &str,
        user_id: &str,
        expires_in_days: Option<i64>,
    ) -> Result<Option<AccessToken>, rusqlite::Error> {
        if self.db.get_active_agent(agent_id)?.is_none() {
            return Ok(None);
        }

        let value = generate_token_value();
        let expires_at = expires_in_days.map(|days| Utc::now() + Duration::days(days));
        let token = self
            .db
            .create_access_token(&value, agent_id, user_id, expires_at)?;
        Ok(Some(token))
    }
}

/// 32 bytes from the OS CSPRNG, URL-safe base64 without padding. Matches the
/// 256-bit entropy floor for bearer credentials.
pub fn generate_token_value() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SCHEMA: &str = r#"{"tools":{"add":{"description":"Add two numbers"}}}"#;

    fn setup() -> (tempfile::TempDir, Arc<Database>, Arc<AgentCache>, TokenAuthenticator) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap());
        let cache = Arc::new(AgentCache::new(db.clone()));
        let auth = TokenAuthenticator::new(db.clone(), cache.clone());
        (dir, db, cache, auth)
    }

    fn register_agent(db: &Database) -> Agent {
        db.create_agent(
            "calc",
            "img",
            1_000_000_000_000_000,
            "key",
            "http://localhost:1/webhook",
            SCHEMA,
            "0x1111111111111111111111111111111111111111",
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_resolves_agent_and_tool() {
        let (_dir, db, _cache, auth) = setup();
        let agent = register_agent(&db);
        let token = auth.issue_token(&agent.id, "user-1", Some(30)).unwrap().unwrap();

        let ctx = auth.authenticate(Some(&token.token), "add").unwrap();
        assert_eq!(ctx.agent.id, agent.id);
        assert_eq!(ctx.user_id, "user-1");
        assert!(ctx.contract.validated);
    }

    #[test]
    fn test_missing_bearer() {
        let (_dir, _db, _cache, auth) = setup();
        assert_eq!(auth.authenticate(None, "add").unwrap_err(), AuthError::Missing);
        assert_eq!(
            auth.authenticate(Some(""), "add").unwrap_err(),
            AuthError::Missing
        );
    }

    #[test]
    fn test_unknown_revoked_and_expired_tokens_rejected() {
        let (_dir, db, _cache, auth) = setup();
        let agent = register_agent(&db);

        assert_eq!(
            auth.authenticate(Some("no-such-token"), "add").unwrap_err(),
            AuthError::InvalidOrExpired
        );

        let revoked = auth.issue_token(&agent.id, "u", None).unwrap().unwrap();
        db.revoke_access_token(&revoked.id).unwrap();
        assert_eq!(
            auth.authenticate(Some(&revoked.token), "add").unwrap_err(),
            AuthError::InvalidOrExpired
        );

        // Expired regardless of which tool is asked for
        let expired = db
            .create_access_token(
                "tok_expired",
                &agent.id,
                "u",
                Some(Utc::now() - Duration::days(1)),
            )
            .unwrap();
        assert_eq!(
            auth.authenticate(Some(&expired.token), "add").unwrap_err(),
            AuthError::InvalidOrExpired
        );
        assert_eq!(
            auth.authenticate(Some(&expired.token), "anything").unwrap_err(),
            AuthError::InvalidOrExpired
        );
    }

    #[test]
    fn test_inactive_agent_rejected_for_any_tool() {
        let (_dir, db, cache, auth) = setup();
        let agent = register_agent(&db);
        let token = auth.issue_token(&agent.id, "u", None).unwrap().unwrap();
        db.deactivate_agent(&agent.id).unwrap();
        cache.invalidate(&agent.id);

        assert_eq!(
            auth.authenticate(Some(&token.token), "add").unwrap_err(),
            AuthError::AgentInactive
        );
        assert_eq!(
            auth.authenticate(Some(&token.token), "other").unwrap_err(),
            AuthError::AgentInactive
        );
    }

    #[test]
    fn test_undeclared_tool_rejected() {
        let (_dir, db, _cache, auth) = setup();
        let agent = register_agent(&db);
        let token = auth.issue_token(&agent.id, "u", None).unwrap().unwrap();

        assert_eq!(
            auth.authenticate(Some(&token.token), "subtract").unwrap_err(),
            AuthError::ToolNotFound("subtract".to_string())
        );
    }

    #[test]
    fn test_issue_token_requires_active_agent() {
        let (_dir, db, _cache, auth) = setup();
        assert!(auth.issue_token("missing", "u", None).unwrap().is_none());

        let agent = register_agent(&db);
        db.deactivate_agent(&agent.id).unwrap();
        assert!(auth.issue_token(&agent.id, "u", None).unwrap().is_none());
    }

    #[test]
    fn test_generated_tokens_are_long_and_distinct() {
        let values: HashSet<String> = (0..64).map(|_| generate_token_value()).collect();
        assert_eq!(values.len(), 64);
        // 32 bytes -> 43 chars of URL-safe base64 without padding
        assert!(values.iter().all(|v| v.len() == 43));
    }
}
