//! Database methods for the agents table

use chrono::{DateTime, Utc};
use rusqlite::{Result as SqliteResult, Row};
use uuid::Uuid;

use crate::db::Database;
use crate::models::Agent;

fn row_to_agent(row: &Row) -> rusqlite::Result<Agent> {
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        image_url: row.get(2)?,
        price: row.get(3)?,
        api_key: row.get(4)?,
        webhook_url: row.get(5)?,
        tool_schema: row.get(6)?,
        owner: row.get(7)?,
        is_active: row.get::<_, i32>(8)? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .unwrap()
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at)
            .unwrap()
            .with_timezone(&Utc),
    })
}

const AGENT_COLUMNS: &str =
    "id, name, image_url, price, api_key, webhook_url, tool_schema, owner, is_active, created_at, updated_at";

impl Database {
    pub fn create_agent(
        &self,
        name: &str,
        image_url: &str,
        price: i64,
        api_key: &str,
        webhook_url: &str,
        tool_schema: &str,
        owner: &str,
    ) -> SqliteResult<Agent> {
        let conn = self.conn();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO agents (id, name, image_url, price, api_key, webhook_url, tool_schema, owner, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)",
            rusqlite::params![
                &id,
                name,
                image_url,
                price,
                api_key,
                webhook_url,
                tool_schema,
                owner,
                &now.to_rfc3339()
            ],
        )?;

        Ok(Agent {
            id,
            name: name.to_string(),
            image_url: image_url.to_string(),
            price,
            api_key: api_key.to_string(),
            webhook_url: webhook_url.to_string(),
            tool_schema: tool_schema.to_string(),
            owner: owner.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch an agent regardless of active state (update/delete paths).
    pub fn get_agent(&self, id: &str) -> SqliteResult<Option<Agent>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM agents WHERE id = ?1",
            AGENT_COLUMNS
        ))?;
        let agent = stmt.query_row([id], row_to_agent).ok();
        Ok(agent)
    }

    /// Fetch an agent visible to lookup and dispatch. Inactive agents are not
    /// returned here.
    pub fn get_active_agent(&self, id: &str) -> SqliteResult<Option<Agent>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM agents WHERE id = ?1 AND is_active = 1",
            AGENT_COLUMNS
        ))?;
        let agent = stmt.query_row([id], row_to_agent).ok();
        Ok(agent)
    }

    /// Page through active agents, optionally filtered by owner address.
    /// Returns the page plus the total count matching the filter.
    pub fn list_active_agents(
        &self,
        owner: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> SqliteResult<(Vec<Agent>, i64)> {
        let conn = self.conn();
        let offset = (page - 1) * per_page;

        let (total, agents) = match owner {
            Some(owner) => {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM agents WHERE is_active = 1 AND owner = ?1",
                    [owner],
                    |row| row.get(0),
                )?;
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM agents WHERE is_active = 1 AND owner = ?1
                     ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                    AGENT_COLUMNS
                ))?;
                let agents = stmt
                    .query_map(rusqlite::params![owner, per_page, offset], row_to_agent)?
                    .filter_map(|r| r.ok())
                    .collect();
                (total, agents)
            }
            None => {
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM agents WHERE is_active = 1",
                    [],
                    |row| row.get(0),
                )?;
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM agents WHERE is_active = 1
                     ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                    AGENT_COLUMNS
                ))?;
                let agents = stmt
                    .query_map(rusqlite::params![per_page, offset], row_to_agent)?
                    .filter_map(|r| r.ok())
                    .collect();
                (total, agents)
            }
        };

        Ok((agents, total))
    }

    /// Write back mutable agent fields and bump updated_at.
    pub fn update_agent(&self, agent: &Agent) -> SqliteResult<bool> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE agents SET name = ?1, image_url = ?2, price = ?3, api_key = ?4,
             webhook_url = ?5, tool_schema = ?6, updated_at = ?7 WHERE id = ?8",
            rusqlite::params![
                &agent.name,
                &agent.image_url,
                agent.price,
                &agent.api_key,
                &agent.webhook_url,
                &agent.tool_schema,
                &now,
                &agent.id
            ],
        )?;
        Ok(affected > 0)
    }

    /// Soft delete: flip is_active, never remove the row.
    pub fn deactivate_agent(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE agents SET is_active = 0, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![&now, id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_create_and_get_agent() {
        let (_dir, db) = test_db();
        let agent = db
            .create_agent(
                "calc",
                "https://example.com/calc.png",
                1_000_000_000_000_000,
                "key",
                "https://example.com/webhook",
                r#"{"tools":{"add":{"description":"Add two numbers"}}}"#,
                "0x1111111111111111111111111111111111111111",
            )
            .unwrap();

        let fetched = db.get_active_agent(&agent.id).unwrap().unwrap();
        assert_eq!(fetched.name, "calc");
        assert_eq!(fetched.price, 1_000_000_000_000_000);
        assert!(fetched.is_active);
    }

    #[test]
    fn test_deactivated_agent_invisible_to_active_lookup() {
        let (_dir, db) = test_db();
        let agent = db
            .create_agent("a", "img", 1, "k", "http://w", "{}", "0xabc")
            .unwrap();

        assert!(db.deactivate_agent(&agent.id).unwrap());
        assert!(db.get_active_agent(&agent.id).unwrap().is_none());
        // Still reachable for admin paths
        let raw = db.get_agent(&agent.id).unwrap().unwrap();
        assert!(!raw.is_active);
    }

    #[test]
    fn test_list_active_agents_filters_and_pages() {
        let (_dir, db) = test_db();
        let owner_a = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let owner_b = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
        for i in 0..3 {
            db.create_agent(&format!("a{}", i), "img", 1, "k", "http://w", "{}", owner_a)
                .unwrap();
        }
        let other = db
            .create_agent("b0", "img", 1, "k", "http://w", "{}", owner_b)
            .unwrap();
        db.deactivate_agent(&other.id).unwrap();

        let (agents, total) = db.list_active_agents(Some(owner_a), 1, 2).unwrap();
        assert_eq!(total, 3);
        assert_eq!(agents.len(), 2);

        let (all, total) = db.list_active_agents(None, 1, 10).unwrap();
        assert_eq!(total, 3);
        assert!(all.iter().all(|a| a.owner == owner_a));
    }
}
