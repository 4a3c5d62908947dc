//! Read-through cache over active-agent lookups.
//!
//! Dispatch hits the agent row on every call; this keeps the hot path off
//! SQLite. Invalidation is explicit only: registration, update, and delete
//! call `invalidate`, so readers never observe a half-reloaded entry - the
//! cache swaps whole `Agent` snapshots atomically.

use std::sync::Arc;

use moka::sync::Cache;

use crate::db::Database;
use crate::models::Agent;

const CACHE_CAPACITY: u64 = 1024;

pub struct AgentCache {
    db: Arc<Database>,
    cache: Cache<String, Agent>,
}

impl AgentCache {
    pub fn new(db: Arc<Database>) -> Self {
        AgentCache {
            db,
            cache: Cache::builder().max_capacity(CACHE_CAPACITY).build(),
        }
    }

    /// Fetch an active agent, reading through to the database on a miss.
    /// Inactive and unknown agents are never cached, so a freshly registered
    /// or reactivated agent is visible immediately.
    pub fn get_active(&self, agent_id: &str) -> Option<Agent> {
        self.cache.optionally_get_with(agent_id.to_string(), || {
            match self.db.get_active_agent(agent_id) {
                Ok(agent) => agent,
                Err(e) => {
                    log::error!("Agent cache read-through failed for {}: {}", agent_id, e);
                    None
                }
            }
        })
    }

    pub fn invalidate(&self, agent_id: &str) {
        self.cache.invalidate(agent_id);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Arc<Database>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        (dir, Arc::new(db))
    }

    #[test]
    fn test_read_through_and_invalidate() {
        let (_dir, db) = test_db();
        let cache = AgentCache::new(db.clone());
        let agent = db
            .create_agent("a", "img", 1, "k", "http://w", "{}", "0xabc")
            .unwrap();

        assert_eq!(cache.get_active(&agent.id).unwrap().name, "a");

        // Deactivation is invisible until the entry is invalidated
        db.deactivate_agent(&agent.id).unwrap();
        assert!(cache.get_active(&agent.id).is_some());
        cache.invalidate(&agent.id);
        assert!(cache.get_active(&agent.id).is_none());
    }

    #[test]
    fn test_miss_is_not_cached() {
        let (_dir, db) = test_db();
        let cache = AgentCache::new(db.clone());
        let agent = db
            .create_agent("a", "img", 1, "k", "http://w", "{}", "0xabc")
            .unwrap();
        db.deactivate_agent(&agent.id).unwrap();

        // Inactive lookup misses and must not pin a negative entry
        assert!(cache.get_active(&agent.id).is_none());
        db.conn()
            .execute("UPDATE agents SET is_active = 1 WHERE id = ?1", [&agent.id])
            .unwrap();
        assert!(cache.get_active(&agent.id).is_some());
    }
}
