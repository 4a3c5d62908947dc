//! Database methods for the access_tokens table

use chrono::{DateTime, Utc};
use rusqlite::{Result as SqliteResult, Row};
use uuid::Uuid;

use crate::db::Database;
use crate::models::AccessToken;

fn row_to_token(row: &Row) -> rusqlite::Result<AccessToken> {
    let expires_at: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(AccessToken {
        id: row.get(0)?,
        token: row.get(1)?,
        agent_id: row.get(2)?,
        user_id: row.get(3)?,
        is_active: row.get::<_, i32>(4)? != 0,
        expires_at: expires_at.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .unwrap()
                .with_timezone(&Utc)
        }),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .unwrap()
            .with_timezone(&Utc),
    })
}

impl Database {
    pub fn create_access_token(
        &self,
        token: &str,
        agent_id: &str,
        user_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> SqliteResult<AccessToken> {
        let conn = self.conn();
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO access_tokens (id, token, agent_id, user_id, is_active, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            rusqlite::params![
                &id,
                token,
                agent_id,
                user_id,
                expires_at.map(|t| t.to_rfc3339()),
                &created_at.to_rfc3339()
            ],
        )?;

        Ok(AccessToken {
            id,
            token: token.to_string(),
            agent_id: agent_id.to_string(),
            user_id: user_id.to_string(),
            is_active: true,
            expires_at,
            created_at,
        })
    }

    /// Exact-match lookup by token value. Expiry and active checks live in the
    /// authenticator, which also needs to distinguish the failure modes.
    pub fn get_access_token(&self, token: &str) -> SqliteResult<Option<AccessToken>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, token, agent_id, user_id, is_active, expires_at, created_at
             FROM access_tokens WHERE token = ?1",
        )?;
        let record = stmt.query_row([token], row_to_token).ok();
        Ok(record)
    }

    /// Active tokens owned by one user, newest first. Revoked tokens are
    /// omitted rather than flagged.
    pub fn list_access_tokens_for_user(&self, user_id: &str) -> SqliteResult<Vec<AccessToken>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, token, agent_id, user_id, is_active, expires_at, created_at
             FROM access_tokens WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at DESC",
        )?;
        let tokens = stmt
            .query_map([user_id], row_to_token)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(tokens)
    }

    /// Revocation is a flag flip; tokens are never renewed in place.
    pub fn revoke_access_token(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let affected = conn.execute(
            "UPDATE access_tokens SET is_active = 0 WHERE id = ?1",
            [id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_token_roundtrip() {
        let (_dir, db) = test_db();
        let expires = Utc::now() + Duration::days(30);
        let created = db
            .create_access_token("tok_abc", "agent-1", "user-1", Some(expires))
            .unwrap();

        let fetched = db.get_access_token("tok_abc").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.agent_id, "agent-1");
        assert_eq!(fetched.user_id, "user-1");
        assert!(fetched.expires_at.is_some());
        assert!(fetched.is_active);

        assert!(db.get_access_token("tok_missing").unwrap().is_none());
    }

    #[test]
    fn test_list_for_user_skips_revoked_and_other_users() {
        let (_dir, db) = test_db();
        db.create_access_token("tok_a", "agent-1", "user-1", None)
            .unwrap();
        db.create_access_token("tok_b", "agent-2", "user-1", None)
            .unwrap();
        db.create_access_token("tok_c", "agent-1", "user-2", None)
            .unwrap();
        let revoked = db
            .create_access_token("tok_d", "agent-1", "user-1", None)
            .unwrap();
        db.revoke_access_token(&revoked.id).unwrap();

        let tokens = db.list_access_tokens_for_user("user-1").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| t.user_id == "user-1" && t.is_active));
        assert!(tokens.iter().all(|t| t.token != "tok_d"));

        assert!(db.list_access_tokens_for_user("user-3").unwrap().is_empty());
    }

    #[test]
    fn test_revoke_flips_flag() {
        let (_dir, db) = test_db();
        let created = db
            .create_access_token("tok_x", "agent-1", "user-1", None)
            .unwrap();

        assert!(db.revoke_access_token(&created.id).unwrap());
        let fetched = db.get_access_token("tok_x").unwrap().unwrap();
        assert!(!fetched.is_active);
        // Revoking again affects nothing
        assert!(!db.revoke_access_token("nope").unwrap());
    }
}
