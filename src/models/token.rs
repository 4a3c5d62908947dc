use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque bearer credential bound to one (agent, user) pair.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub id: String,
    pub token: String,
    pub agent_id: String,
    pub user_id: String,
    pub is_active: bool,
    /// None means the token never expires; expiry requires reissuance.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub agent_id: String,
    pub user_id: String,
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub token: String,
    pub agent_id: String,
    pub user_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AccessToken> for TokenResponse {
    fn from(t: AccessToken) -> Self {
        TokenResponse {
            id: t.id,
            token: t.token,
            agent_id: t.agent_id,
            user_id: t.user_id,
            expires_at: t.expires_at,
            created_at: t.created_at,
        }
    }
}

/// Listing view of a token. The value is truncated to its first 16 characters;
/// the full credential is only ever returned at issuance.
#[derive(Debug, Serialize)]
pub struct MaskedTokenResponse {
    pub id: String,
    pub token: String,
    pub agent_id: String,
    pub user_id: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AccessToken> for MaskedTokenResponse {
    fn from(t: AccessToken) -> Self {
        let visible = t.token.chars().take(16).collect::<String>();
        MaskedTokenResponse {
            id: t.id,
            token: format!("{}...", visible),
            agent_id: t.agent_id,
            user_id: t.user_id,
            is_active: t.is_active,
            expires_at: t.expires_at,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub tokens: Vec<MaskedTokenResponse>,
    pub total: usize,
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_response_truncates_token_value() {
        let token = AccessToken {
            id: "t-1".to_string(),
            token: "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFG".to_string(),
            agent_id: "agent-1".to_string(),
            user_id: "user-1".to_string(),
            is_active: true,
            expires_at: None,
            created_at: Utc::now(),
        };

        let masked = MaskedTokenResponse::from(token);
        assert_eq!(masked.token, "abcdefghijklmnop...");
    }
}
